use std::time::Duration;

use edge_xml::{from_value, parse, to_value, write};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::config::ManagerConfig;
use crate::transport::{Method, Transport, TransportError};

const XML: &str = "application/xml";

/// Live transport to a vShield Manager over HTTP(S) with basic authentication.
///
/// Bodies are exchanged as XML and converted with `edge-xml`. No retries are
/// attempted; a failed request is reported to the caller as-is.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpTransport {
    pub fn new(manager: &ManagerConfig, password: String) -> Result<Self, TransportError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(manager.insecure)
            .timeout(Duration::from_secs(manager.timeout_secs))
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            base_url: manager.url.trim_end_matches('/').to_string(),
            username: manager.username.clone(),
            password,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(
        &self,
        method: &'static str,
        path: &str,
        request: RequestBuilder,
    ) -> Result<String, TransportError> {
        debug!(method, path, "sending request");
        let response = request
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, XML)
            .send()
            .map_err(|source| TransportError::Request {
                method,
                path: path.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response.text().map_err(|source| TransportError::Request {
            method,
            path: path.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(TransportError::Status {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn write_body(&self, method: Method, path: &str, body: &Value) -> Result<(), TransportError> {
        let encoded = encode(path, body)?;
        let request = match method {
            Method::Post => self.client.post(self.url(path)),
            Method::Put => self.client.put(self.url(path)),
        };
        let request = request.header(CONTENT_TYPE, XML).body(encoded);
        self.send(method.as_str(), path, request)?;
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> Result<Value, TransportError> {
        let body = self.send("GET", path, self.client.get(self.url(path)))?;
        decode(path, &body)
    }

    fn post(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.write_body(Method::Post, path, body)
    }

    fn put(&self, path: &str, body: &Value) -> Result<(), TransportError> {
        self.write_body(Method::Put, path, body)
    }
}

fn decode(path: &str, body: &str) -> Result<Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let node = parse(body.as_bytes()).map_err(|source| TransportError::Decode {
        path: path.to_string(),
        source,
    })?;
    Ok(to_value(&node))
}

fn encode(path: &str, body: &Value) -> Result<Vec<u8>, TransportError> {
    let encode_error = |reason: String| TransportError::Encode {
        path: path.to_string(),
        reason,
    };
    let node = from_value(body).map_err(|err| encode_error(err.to_string()))?;
    write(&node).map_err(|err| encode_error(err.to_string()))
}
