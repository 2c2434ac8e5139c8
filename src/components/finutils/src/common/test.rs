#![cfg(test)]
#![allow(missing_docs)]

use {
    super::{utils::*, *},
    ledger::data_model::CommitStatus,
    std::{cell::RefCell, time::Duration},
};

/// Answers every request with the same canned response.
struct Canned {
    status: u16,
    reason: &'static str,
    body: String,
    urls: RefCell<Vec<String>>,
}

impl Canned {
    fn new(status: u16, body: &str) -> Self {
        Canned {
            status,
            reason: if status == 404 { "Not Found" } else { "Whatever" },
            body: body.to_owned(),
            urls: RefCell::new(vec![]),
        }
    }

    fn calls(&self) -> usize {
        self.urls.borrow().len()
    }
}

impl LedgerTransport for Canned {
    fn get(&self, url: &str) -> ClientResult<RawResponse> {
        self.urls.borrow_mut().push(url.to_owned());
        Ok(RawResponse {
            status: self.status,
            reason: self.reason.to_owned(),
            body: self.body.clone(),
        })
    }

    fn post(&self, url: &str, _body: &[u8], _ct: &str) -> ClientResult<RawResponse> {
        self.get(url)
    }
}

struct Unreachable;

impl LedgerTransport for Unreachable {
    fn get(&self, _url: &str) -> ClientResult<RawResponse> {
        Err(ClientError::Network("Failed to connect to REST API".to_owned()))
    }

    fn post(&self, url: &str, _body: &[u8], _ct: &str) -> ClientResult<RawResponse> {
        self.get(url)
    }
}

#[test]
fn urls_get_a_scheme() {
    assert_eq!(full_url("127.0.0.1:8008", "state"), "http://127.0.0.1:8008/state");
    assert_eq!(full_url("http://h:1/", "/batches"), "http://h:1/batches");
    assert_eq!(full_url("https://h", "batches"), "https://h/batches");
}

#[test]
fn status_handling() {
    let ok = Canned::new(200, "{}");
    assert_eq!(
        send_request(&ok, "h", "state", None, None).unwrap(),
        ("{}".to_owned(), 200)
    );
    assert_eq!(ok.urls.borrow()[0], "http://h/state");

    let missing = Canned::new(404, "gone");
    assert_eq!(
        send_request(&missing, "h", "state", None, None).unwrap().1,
        404
    );

    let broken = Canned {
        reason: "Internal Server Error",
        ..Canned::new(500, "")
    };
    assert_eq!(
        send_request(&broken, "h", "batches", Some(b"x"), None),
        Err(ClientError::Network("Error 500: Internal Server Error".to_owned()))
    );

    assert!(matches!(
        send_request(&Unreachable, "h", "state", None, None),
        Err(ClientError::Network(_))
    ));
}

#[test]
fn batch_status_forms() {
    let list = r#"{"data":[{"id":"a","status":"COMMITTED"},{"id":"b","status":"INVALID"}]}"#;
    assert_eq!(parse_batch_status(list, "a").unwrap(), CommitStatus::Committed);
    assert_eq!(parse_batch_status(list, "b").unwrap(), CommitStatus::Invalid);
    assert_eq!(parse_batch_status(list, "c").unwrap(), CommitStatus::Unknown);

    let pending = r#"{"data":[{"id":"a","status":"COMMITTED"},{"id":"b","status":"PENDING"}]}"#;
    assert_eq!(parse_batch_status(pending, "a").unwrap(), CommitStatus::Pending);

    let map = r#"{"data":{"a":"COMMITTED","b":{"status":"INVALID"}}}"#;
    assert_eq!(parse_batch_status(map, "a").unwrap(), CommitStatus::Committed);
    assert_eq!(parse_batch_status(map, "b").unwrap(), CommitStatus::Invalid);

    assert!(matches!(
        parse_batch_status("<html>", "a"),
        Err(ClientError::Serialization(_))
    ));
    assert!(matches!(
        parse_batch_status(r#"{"data":[{"id":"a","status":"DONE"}]}"#, "a"),
        Err(ClientError::Serialization(_))
    ));
}

#[test]
fn zero_timeout_never_polls() {
    let t = Canned::new(200, "not even json");
    assert_eq!(wait_for_commit(&t, "h", "a", None).unwrap(), None);
    assert_eq!(wait_for_commit(&t, "h", "a", Some(Duration::ZERO)).unwrap(), None);
    assert_eq!(t.calls(), 0);
}

#[test]
fn polling_stops_when_settled() {
    let t = Canned::new(200, r#"{"data":[{"id":"a","status":"INVALID"}]}"#);
    assert_eq!(
        wait_for_commit(&t, "h", "a", Some(Duration::from_secs(30))).unwrap(),
        Some(CommitStatus::Invalid)
    );
    assert_eq!(t.calls(), 1);
    assert!(t.urls.borrow()[0].starts_with("http://h/batch_statuses?id=a&wait="));
}

#[test]
fn polling_gives_up_at_the_deadline() {
    let t = Canned::new(200, r#"{"data":[{"id":"a","status":"PENDING"}]}"#);
    assert_eq!(
        wait_for_commit(&t, "h", "a", Some(Duration::from_millis(20))).unwrap(),
        Some(CommitStatus::Pending)
    );
    assert!(t.calls() >= 1);

    let garbage = Canned::new(200, "{");
    assert!(wait_for_commit(&garbage, "h", "a", Some(Duration::from_secs(5))).is_err());
    assert_eq!(garbage.calls(), 1);
}

#[test]
fn state_forms() {
    let addr = "abc";
    let listing = Canned::new(200, r#"{"data":[{"address":"abc","data":"AQID"}]}"#);
    assert_eq!(get_state(&listing, "h", addr).unwrap(), Some(vec![1, 2, 3]));
    assert_eq!(listing.urls.borrow()[0], "http://h/state?address=abc");

    let single = Canned::new(200, r#"{"data":"AQID"}"#);
    assert_eq!(get_state(&single, "h", addr).unwrap(), Some(vec![1, 2, 3]));

    assert_eq!(get_state(&Canned::new(200, r#"{"data":[]}"#), "h", addr).unwrap(), None);
    assert_eq!(get_state(&Canned::new(200, "{}"), "h", addr).unwrap(), None);
    assert_eq!(get_state(&Canned::new(404, "nope"), "h", addr).unwrap(), None);

    assert!(matches!(
        get_state(&Canned::new(200, r#"{"data":"!!"}"#), "h", addr),
        Err(ClientError::Serialization(_))
    ));
}

#[test]
fn short_timeouts_are_paced() {
    let t = Canned::new(200, r#"{"data":[{"id":"a","status":"PENDING"}]}"#);
    assert_eq!(
        wait_for_commit(&t, "h", "a", Some(Duration::from_millis(200))).unwrap(),
        Some(CommitStatus::Pending)
    );
    assert!(t.calls() <= 4, "{} polls in 200ms", t.calls());
    assert!(t.urls.borrow().iter().all(|u| u.ends_with("&wait=1")));

    let t = Canned::new(200, r#"{"data":[{"id":"a","status":"COMMITTED"}]}"#);
    wait_for_commit(&t, "h", "a", Some(Duration::from_millis(1500))).unwrap();
    assert!(t.urls.borrow()[0].ends_with("&wait=2"));
}

#[test]
fn submit_reports_the_status() {
    let list = ledger::data_model::BatchList { batches: vec![] };
    assert_eq!(
        submit_batch_list(&Canned::new(202, "{}"), "h", &list).unwrap(),
        ("{}".to_owned(), 202)
    );
    assert_eq!(
        submit_batch_list(&Canned::new(404, "gone"), "h", &list).unwrap(),
        ("gone".to_owned(), 404)
    );
}
