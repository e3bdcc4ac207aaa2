//! Transport boundary between the reconciler and the manager API.
//!
//! The reconciler only ever sees loosely typed documents (`serde_json::Value`)
//! shaped the way the manager's XML converts: a collection with one member
//! arrives as a bare object. Three implementations live in this crate:
//!
//! - [`crate::http::HttpTransport`]: live manager over HTTPS
//! - [`MemoryTransport`]: canned documents, records writes (snapshots, tests)
//! - [`DryRun`]: wraps another transport, serves its reads, records writes

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failures raised by a transport. The reconciler passes these through as-is.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{method} {path} failed: {source}")]
    Request {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: edge_xml::ParseError,
    },
    #[error("failed to encode request body for {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error("failed to read snapshot file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no document is available for {0}")]
    UnknownPath(String),
}

/// Read and write access to the manager API.
pub trait Transport {
    /// Fetch the document at `path`. An empty response body yields `Value::Null`.
    fn get(&self, path: &str) -> Result<Value, TransportError>;
    /// Submit `body` as a new object under `path`.
    fn post(&self, path: &str, body: &Value) -> Result<(), TransportError>;
    /// Replace the object at `path` with `body`.
    fn put(&self, path: &str, body: &Value) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        (**self).get(path)
    }

    fn post(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        (**self).post(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        (**self).put(path, body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Put,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write request as issued (or, for dry runs, as it would have been issued).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteCall {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

/// In-memory transport serving canned documents by path.
///
/// Writes are recorded and never applied to the stored documents, so a
/// pass against a `MemoryTransport` always sees the same remote state.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    documents: BTreeMap<String, Value>,
    writes: RefCell<Vec<WriteCall>>,
    requests: Cell<usize>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for GET requests to `path`.
    pub fn insert(&mut self, path: impl Into<String>, document: Value) {
        self.documents.insert(path.into(), document);
    }

    /// Builder form of [`MemoryTransport::insert`].
    pub fn with(mut self, path: impl Into<String>, document: Value) -> Self {
        self.insert(path, document);
        self
    }

    /// Writes received so far, in order.
    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.borrow().clone()
    }

    /// Total requests received, reads and writes.
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn record(&self, method: Method, path: &str, body: &Value) {
        self.requests.set(self.requests.get() + 1);
        self.writes.borrow_mut().push(WriteCall {
            method,
            path: path.to_string(),
            body: body.clone(),
        });
    }
}

impl Transport for MemoryTransport {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.requests.set(self.requests.get() + 1);
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPath(path.to_string()))
    }

    fn post(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.record(Method::Post, path, body);
        Ok(())
    }

    fn put(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.record(Method::Put, path, body);
        Ok(())
    }
}

/// Serves reads from `inner` and captures writes instead of sending them.
pub struct DryRun<T> {
    inner: T,
    writes: RefCell<Vec<WriteCall>>,
}

impl<T: Transport> DryRun<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Drain the writes captured since the last call.
    pub fn take_writes(&self) -> Vec<WriteCall> {
        std::mem::take(&mut *self.writes.borrow_mut())
    }

    fn capture(&self, method: Method, path: &str, body: &Value) {
        debug!(%method, path, "dry run: write suppressed");
        self.writes.borrow_mut().push(WriteCall {
            method,
            path: path.to_string(),
            body: body.clone(),
        });
    }
}

impl<T: Transport> Transport for DryRun<T> {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.inner.get(path)
    }

    fn post(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.capture(Method::Post, path, body);
        Ok(())
    }

    fn put(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.capture(Method::Put, path, body);
        Ok(())
    }
}
