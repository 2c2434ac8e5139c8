//!
//! Submission, commit tracking and state reads on top of `send_request`
//!

use {
    super::{send_request, ClientError, ClientResult, LedgerTransport, OCTET_STREAM},
    crate::api::{BatchStatusesResponse, StateResponse},
    ledger::data_model::{BatchList, CommitStatus},
    std::time::{Duration, Instant},
    tracing::{debug, info, warn},
};

/// Shortest gap between two `batch_statuses` requests.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Post an encoded batch list, returning the raw response body and status.
pub fn submit_batch_list<T: LedgerTransport + ?Sized>(
    transport: &T,
    url: &str,
    batch_list: &BatchList,
) -> ClientResult<(String, u16)> {
    let ids = batch_list.batch_ids();
    let (body, status) = send_request(
        transport,
        url,
        "batches",
        Some(batch_list.to_bytes().as_slice()),
        Some(OCTET_STREAM),
    )?;
    if 404 == status {
        warn!(batches = ?ids, "batch endpoint not found");
    } else {
        info!(batches = ?ids, "batch list submitted");
    }
    Ok((body, status))
}

/// Poll `batch_statuses` until the batch leaves `PENDING` or `timeout`
/// runs out.
///
/// No timeout, or a zero one, returns `Ok(None)` without touching the
/// network. Otherwise the last observed status is returned, which is still
/// `Pending` when the deadline passed first.
pub fn wait_for_commit<T: LedgerTransport + ?Sized>(
    transport: &T,
    url: &str,
    batch_id: &str,
    timeout: Option<Duration>,
) -> ClientResult<Option<CommitStatus>> {
    let timeout = match timeout {
        Some(t) if !t.is_zero() => t,
        _ => return Ok(None),
    };

    let start = Instant::now();
    loop {
        let sent = Instant::now();
        let left = timeout.saturating_sub(start.elapsed());
        let suffix = format!("batch_statuses?id={}&wait={}", batch_id, wait_secs(left));
        let (body, _) = send_request(transport, url, &suffix, None, None)?;
        let status = parse_batch_status(&body, batch_id)?;

        if !status.is_pending() {
            debug!(batch = batch_id, %status, "batch settled");
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            warn!(batch = batch_id, "timed out waiting for commit");
            return Ok(Some(status));
        }

        let pause = POLL_INTERVAL
            .saturating_sub(sent.elapsed())
            .min(timeout.saturating_sub(start.elapsed()));
        std::thread::sleep(pause);
    }
}

/// Whole seconds for the `wait` parameter, rounded up and never zero.
#[inline(always)]
fn wait_secs(left: Duration) -> u64 {
    let secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
    secs.max(1)
}

/// The status of `batch_id` in a `batch_statuses` body. While any listed
/// batch is still pending the answer is `Pending`.
pub fn parse_batch_status(body: &str, batch_id: &str) -> ClientResult<CommitStatus> {
    let resp = serde_json::from_str::<BatchStatusesResponse>(body).map_err(|e| {
        ClientError::Serialization(format!("unreadable batch status response: {e}"))
    })?;
    let statuses = resp.data.statuses();

    if statuses.iter().any(|(_, s)| s.is_pending()) {
        return Ok(CommitStatus::Pending);
    }
    Ok(statuses
        .iter()
        .find(|(id, _)| *id == batch_id)
        .map(|(_, s)| *s)
        .unwrap_or(CommitStatus::Unknown))
}

/// Raw bytes stored at `address`; `None` when the ledger holds nothing.
pub fn get_state<T: LedgerTransport + ?Sized>(
    transport: &T,
    url: &str,
    address: &str,
) -> ClientResult<Option<Vec<u8>>> {
    let (body, status) =
        send_request(transport, url, &format!("state?address={address}"), None, None)?;
    if status == 404 {
        return Ok(None);
    }

    let resp = serde_json::from_str::<StateResponse>(&body).map_err(|e| {
        ClientError::Serialization(format!("unreadable state response: {e}"))
    })?;
    resp.data_for(address)
        .map(|b64| {
            base64::decode(b64).map_err(|e| {
                ClientError::Serialization(format!("state data is not base64: {e}"))
            })
        })
        .transpose()
}
