//!
//! A `LedgerTransport` answering REST calls from an in-process
//! `LedgerState`, for local runs and tests without a validator.
//!

use {
    super::{ClientError, ClientResult, LedgerTransport, RawResponse},
    crate::api::{
        BatchStatusData, BatchStatusEntry, BatchStatusesResponse, ErrorResponse,
        RestError, StateData, StateEntry, StateResponse, SubmitResponse,
    },
    ledger::store::LedgerState,
    serde::Serialize,
    std::{
        collections::BTreeMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    },
    tracing::debug,
};

/// Serves `state`, `batches` and `batch_statuses` from a shared ledger.
pub struct LoopbackTransport {
    ledger: Arc<LedgerState>,
    commit_after: Option<usize>,
    polls: AtomicUsize,
    requests: AtomicUsize,
}

impl LoopbackTransport {
    #[allow(missing_docs)]
    pub fn new(ledger: Arc<LedgerState>) -> Self {
        LoopbackTransport {
            ledger,
            commit_after: None,
            polls: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    /// Commit pending batches once `n` status polls have been served,
    /// for ledgers running in manual commit mode.
    pub fn commit_after_polls(mut self, n: usize) -> Self {
        self.commit_after = Some(n);
        self
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    /// Requests served so far.
    #[inline(always)]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// `batch_statuses` requests served so far.
    #[inline(always)]
    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    fn get_state(&self, query: &BTreeMap<&str, &str>) -> ClientResult<RawResponse> {
        let address = match query.get("address") {
            Some(a) => *a,
            None => return error_response(400, 53, "Invalid Address", "address is required"),
        };
        let entries = self
            .ledger
            .get_state(address)
            .map(|bytes| StateEntry {
                address: address.to_owned(),
                data: base64::encode(bytes),
            })
            .into_iter()
            .collect();
        json_response(
            200,
            &StateResponse {
                data: Some(StateData::Entries(entries)),
                head: None,
                link: None,
            },
        )
    }

    fn post_batches(&self, body: &[u8]) -> ClientResult<RawResponse> {
        match self.ledger.submit_batch_list(body) {
            Ok(ids) => json_response(
                202,
                &SubmitResponse {
                    link: format!("http://loopback/batch_statuses?id={}", ids.join(",")),
                },
            ),
            Err(e) => error_response(
                400,
                35,
                "Submitted Batches Invalid",
                &e.get_lowest_msg().to_string(),
            ),
        }
    }

    fn get_batch_statuses(&self, query: &BTreeMap<&str, &str>) -> ClientResult<RawResponse> {
        let polls = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.commit_after.map_or(false, |n| polls >= n) {
            let n = self.ledger.commit_pending();
            debug!(committed = n, "loopback committed pending batches");
        }

        let ids = match query.get("id").filter(|v| !v.is_empty()) {
            Some(ids) => ids.split(','),
            None => return error_response(400, 66, "Id Query Invalid or Missing", "id is required"),
        };
        let entries = ids
            .map(|id| BatchStatusEntry {
                id: id.to_owned(),
                status: self.ledger.batch_status(id),
                invalid_transactions: vec![],
            })
            .collect();
        json_response(
            200,
            &BatchStatusesResponse {
                data: BatchStatusData::List(entries),
                link: None,
            },
        )
    }
}

impl LedgerTransport for LoopbackTransport {
    fn get(&self, url: &str) -> ClientResult<RawResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let (path, query) = split_url(url);
        match path {
            "state" => self.get_state(&query),
            "batch_statuses" => self.get_batch_statuses(&query),
            _ => error_response(404, 404, "Not Found", path),
        }
    }

    fn post(&self, url: &str, body: &[u8], _content_type: &str) -> ClientResult<RawResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match split_url(url).0 {
            "batches" => self.post_batches(body),
            path => error_response(404, 404, "Not Found", path),
        }
    }
}

/// Path without the leading slash, and the query pairs.
fn split_url(url: &str) -> (&str, BTreeMap<&str, &str>) {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .unwrap_or(url);
    let path_and_query = rest.split_once('/').map(|(_, p)| p).unwrap_or("");
    let (path, query) = path_and_query
        .split_once('?')
        .unwrap_or((path_and_query, ""));
    let query = query
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .collect();
    (path.trim_end_matches('/'), query)
}

fn json_response<T: Serialize>(status: u16, body: &T) -> ClientResult<RawResponse> {
    let body = serde_json::to_string(body)
        .map_err(|e| ClientError::Internal(format!("loopback response: {e}")))?;
    Ok(RawResponse {
        status,
        reason: reason(status).to_owned(),
        body,
    })
}

fn error_response(
    status: u16,
    code: u16,
    title: &str,
    message: &str,
) -> ClientResult<RawResponse> {
    json_response(
        status,
        &ErrorResponse {
            error: RestError {
                code,
                title: title.to_owned(),
                message: message.to_owned(),
            },
        },
    )
}

#[inline(always)]
fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "",
    }
}
