//! Declarative management of vShield Edge firewall rules.
//!
//! Each desired rule is reconciled against the rules an edge currently holds,
//! as reported by the vShield Manager REST API. Rules are matched by name,
//! names of address sets, services and service groups are resolved to manager
//! object identifiers, and only the properties that drifted are written back.
//!
//! # Architecture
//!
//! ## Remote state
//!
//! - [`api`] — Endpoint paths for an edge
//! - [`transport`] — The [`transport::Transport`] seam, plus in-memory and dry-run transports
//! - [`http`] — Live transport with basic auth and XML bodies
//! - [`snapshot`] — Offline transport backed by captured XML responses
//! - [`loader`] — Fetch rules, ipsets, applications and application groups
//!
//! ## Rules
//!
//! - [`model`] — Wire shapes of rules and named objects
//! - [`matcher`] — Locate the managed rule with a given name
//! - [`normalize`] — Turn a wire rule into a [`model::FirewallRule`] with every field present
//! - [`resolve`] — Name → identifier resolution, special address tokens
//! - [`accessors`] — Identifier → name read-back and the set of staged properties
//!
//! ## Reconciliation
//!
//! - [`desired`] — Declared rule state
//! - [`session`] — One reconciliation pass: exists, create, flush
//! - [`reconcile`] — Drift detection and per-rule outcomes
//! - [`config`] — TOML rules files
//! - [`report`] — Colored terminal output
//!
//! # Examples
//!
//! ```ignore
//! use vshield_fw::config::load_config;
//! use vshield_fw::reconcile::reconcile_all;
//! use vshield_fw::snapshot::load_snapshot;
//!
//! let config = load_config("rules.toml".as_ref())?;
//! let transport = load_snapshot("captures/edge-12".as_ref(), &config.edge)?;
//! for report in reconcile_all(&transport, &config.edge, &config.select(None)?) {
//!     println!("{}: {:?}", report.rule, report.outcome);
//! }
//! ```
//!
//! # Built on edge-xml
//!
//! The manager speaks XML. `edge-xml` parses and writes it and converts
//! documents to and from JSON values; everything vShield-specific lives here.

pub mod accessors;
pub mod api;
pub mod config;
pub mod desired;
pub mod error;
pub mod http;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod session;
pub mod snapshot;
pub mod transport;
