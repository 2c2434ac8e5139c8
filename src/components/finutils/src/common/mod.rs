//!
//! # Ledger REST access
//!
//! Error kinds surfaced to callers, the transport seam and the uniform
//! request helper every REST call goes through.
//!

pub mod loopback;
pub mod utils;

mod test;

use {
    ruc::*,
    thiserror::Error,
    tracing::{debug, warn},
};

/// Content type of an encoded `BatchList`.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Errors surfaced by the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Rejected before anything left the process.
    #[error("Invalid input: {0}")]
    Validation(String),
    /// A payload or response could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Transport failure or a non-success HTTP status other than 404.
    #[error("{0}")]
    Network(String),
    #[error("internal error {0}")]
    #[allow(missing_docs)]
    Internal(String),
}

#[allow(missing_docs)]
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Lift internal `ruc` results into a `ClientError` of the given kind.
pub trait ClientResultTrait<T> {
    #[allow(missing_docs)]
    fn to_client_result(
        self,
        kind: fn(String) -> ClientError,
        prefix: &str,
    ) -> ClientResult<T>;
}

impl<T> ClientResultTrait<T> for Result<T> {
    #[inline(always)]
    fn to_client_result(
        self,
        kind: fn(String) -> ClientError,
        prefix: &str,
    ) -> ClientResult<T> {
        self.map_err(|e| kind(format!("{}: {}", prefix, e.get_lowest_msg())))
    }
}

/// What came back from the REST API, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    #[allow(missing_docs)]
    pub status: u16,
    /// Canonical reason phrase of `status`.
    pub reason: String,
    #[allow(missing_docs)]
    pub body: String,
}

impl RawResponse {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// How requests reach the ledger. Connection-level failures are errors,
/// any HTTP status is a response.
pub trait LedgerTransport {
    #[allow(missing_docs)]
    fn get(&self, url: &str) -> ClientResult<RawResponse>;

    #[allow(missing_docs)]
    fn post(&self, url: &str, body: &[u8], content_type: &str) -> ClientResult<RawResponse>;
}

impl<T: LedgerTransport + ?Sized> LedgerTransport for &T {
    #[inline(always)]
    fn get(&self, url: &str) -> ClientResult<RawResponse> {
        (**self).get(url)
    }

    #[inline(always)]
    fn post(&self, url: &str, body: &[u8], content_type: &str) -> ClientResult<RawResponse> {
        (**self).post(url, body, content_type)
    }
}

/// Blocking HTTP(S) over `attohttpc`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpTransport;

impl HttpTransport {
    fn finish(
        resp: std::result::Result<attohttpc::Response, attohttpc::Error>,
    ) -> ClientResult<RawResponse> {
        let resp = resp.map_err(|e| {
            ClientError::Network(format!("Failed to connect to REST API: {e}"))
        })?;
        let status = resp.status();
        let body = resp.text().map_err(|e| {
            ClientError::Network(format!("Failed to read REST API response: {e}"))
        })?;
        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_owned(),
            body,
        })
    }
}

impl LedgerTransport for HttpTransport {
    fn get(&self, url: &str) -> ClientResult<RawResponse> {
        HttpTransport::finish(attohttpc::get(url).send())
    }

    fn post(&self, url: &str, body: &[u8], content_type: &str) -> ClientResult<RawResponse> {
        HttpTransport::finish(
            attohttpc::post(url)
                .header(attohttpc::header::CONTENT_TYPE, content_type)
                .bytes(body)
                .send(),
        )
    }
}

/// `base_url` joined with `suffix`; `http://` is assumed when no scheme
/// is given.
pub fn full_url(base_url: &str, suffix: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let suffix = suffix.trim_start_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{base}/{suffix}")
    } else {
        format!("http://{base}/{suffix}")
    }
}

/// Issue a GET (no `data`) or POST (with `data`) against the REST API.
///
/// 404 is passed through to the caller, as it only means "nothing there".
/// Every other non-success status becomes `ClientError::Network`.
pub fn send_request<T: LedgerTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    suffix: &str,
    data: Option<&[u8]>,
    content_type: Option<&str>,
) -> ClientResult<(String, u16)> {
    let url = full_url(base_url, suffix);
    debug!(%url, post = data.is_some(), "ledger request");

    let resp = match data {
        Some(body) => transport.post(&url, body, content_type.unwrap_or(OCTET_STREAM)),
        None => transport.get(&url),
    }?;

    if !resp.is_success() && resp.status != 404 {
        warn!(%url, status = resp.status, "ledger request failed");
        return Err(ClientError::Network(format!(
            "Error {}: {}",
            resp.status, resp.reason
        )));
    }

    Ok((resp.body, resp.status))
}
