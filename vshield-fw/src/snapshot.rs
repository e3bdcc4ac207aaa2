//! Offline edge state captured as XML files.
//!
//! A snapshot directory holds the raw responses of the four read endpoints:
//!
//! | File                   | Endpoint                                      |
//! |------------------------|-----------------------------------------------|
//! | `ipset.xml`            | `/api/2.0/services/ipset/scope/{edge}`        |
//! | `application.xml`      | `/api/2.0/services/application/scope/{edge}` |
//! | `applicationgroup.xml` | `/api/2.0/services/applicationgroup/scope/{edge}` |
//! | `firewall.xml`         | `/api/3.0/edges/{edge}/firewall/config`       |
//!
//! A missing file reads as an empty response.

use std::path::Path;

use edge_xml::{parse_file, to_value};
use serde_json::Value;
use tracing::debug;

use crate::api;
use crate::transport::{MemoryTransport, TransportError};

pub const SNAPSHOT_FILES: [&str; 4] = [
    "ipset.xml",
    "application.xml",
    "applicationgroup.xml",
    "firewall.xml",
];

/// Load a snapshot directory into a [`MemoryTransport`] serving `edge`.
pub fn load_snapshot(dir: &Path, edge: &str) -> Result<MemoryTransport, TransportError> {
    let endpoints = [
        api::ipset_list(edge),
        api::application_list(edge),
        api::application_group_list(edge),
        api::firewall_config(edge),
    ];
    let mut transport = MemoryTransport::new();
    for (file, endpoint) in SNAPSHOT_FILES.iter().zip(endpoints) {
        let document = read_document(&dir.join(file))?;
        transport.insert(endpoint, document);
    }
    Ok(transport)
}

fn read_document(path: &Path) -> Result<Value, TransportError> {
    if !path.exists() {
        debug!(path = %path.display(), "snapshot file missing; treating as empty");
        return Ok(Value::Null);
    }
    let node = parse_file(path).map_err(|source| match source {
        edge_xml::ParseError::Io(source) => TransportError::Io {
            path: path.display().to_string(),
            source,
        },
        other => TransportError::Decode {
            path: path.display().to_string(),
            source: other,
        },
    })?;
    Ok(to_value(&node))
}
