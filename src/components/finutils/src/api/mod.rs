//!
//! Bodies exchanged with the ledger REST API, and the aggregate rows the
//! client hands back.
//!

use {
    ledger::data_model::{CommitStatus, TxnType},
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// `GET state?address=..`
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StateResponse {
    /// Absent means no state.
    #[serde(default)]
    pub data: Option<StateData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub head: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub link: Option<String>,
}

/// Listing form or single-address form of `data`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateData {
    #[allow(missing_docs)]
    Entries(Vec<StateEntry>),
    /// Base64 bytes of exactly the requested address.
    Single(String),
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StateEntry {
    pub address: String,
    /// Base64.
    pub data: String,
}

impl StateResponse {
    /// Base64 data stored at `address`, if the response carries any.
    pub fn data_for(&self, address: &str) -> Option<&str> {
        match self.data.as_ref()? {
            StateData::Single(d) => Some(d.as_str()),
            StateData::Entries(es) => es
                .iter()
                .find(|e| e.address == address)
                .map(|e| e.data.as_str()),
        }
    }
}

/// `POST batches`
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SubmitResponse {
    pub link: String,
}

/// `GET batch_statuses?id=..&wait=..`
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BatchStatusesResponse {
    pub data: BatchStatusData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// List form `[{id, status}]` or map form `{id: status}`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchStatusData {
    List(Vec<BatchStatusEntry>),
    Map(BTreeMap<String, StatusField>),
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BatchStatusEntry {
    pub id: String,
    pub status: CommitStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_transactions: Vec<InvalidTransaction>,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InvalidTransaction {
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusField {
    Plain(CommitStatus),
    Detailed { status: CommitStatus },
}

impl StatusField {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn status(&self) -> CommitStatus {
        match self {
            StatusField::Plain(s) | StatusField::Detailed { status: s } => *s,
        }
    }
}

impl BatchStatusData {
    /// `(id, status)` pairs in response order.
    pub fn statuses(&self) -> Vec<(&str, CommitStatus)> {
        match self {
            BatchStatusData::List(l) => l.iter().map(|e| (e.id.as_str(), e.status)).collect(),
            BatchStatusData::Map(m) => m.iter().map(|(k, v)| (k.as_str(), v.status())).collect(),
        }
    }
}

/// Error body of the REST API.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: RestError,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RestError {
    pub code: u16,
    pub title: String,
    pub message: String,
}

/// Totals of one `(symbol, type)` group.
#[allow(missing_docs)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rollup {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: TxnType,
    pub total_amount: Decimal,
    pub total_coins: Decimal,
}

/// Net position in one coin: purchases minus sales.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CoinRollup {
    #[allow(missing_docs)]
    pub symbol: String,
    /// Coins held.
    pub coins: Decimal,
    /// Net spend in currency units (amounts are recorded in cents).
    pub total_cost: Decimal,
}
