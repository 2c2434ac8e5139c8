//!
//! The cryptoport data model: family identity, state addressing,
//! the canonical payload codec and the holding records kept in state.
//!

mod protos;
mod test;

pub use protos::{
    Batch, BatchHeader, BatchList, Transaction, TransactionHeader, TRANSACTION_ID_LEN,
};

use {
    globutils::{is_lower_hex, sha512_hex},
    lazy_static::lazy_static,
    once_cell::unsync::OnceCell,
    ruc::*,
    rust_decimal::Decimal,
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{collections::BTreeMap, fmt, str::FromStr},
};

/// Name of the transaction family registered with the ledger.
pub const FAMILY_NAME: &str = "cryptoport";

/// The only family version this code speaks.
pub const FAMILY_VERSION: &str = "1.0";

/// Upper bound, in characters, of an entity name.
pub const MAX_NAME_LENGTH: usize = 20;

/// Length of the family namespace prefix, in hex characters.
pub const NAMESPACE_PREFIX_LEN: usize = 6;

/// Length of a full state address, in hex characters.
pub const ADDRESS_LEN: usize = 70;

/// Payload map keys.
pub const VERB_KEY: &str = "Verb";
#[allow(missing_docs)]
pub const NAME_KEY: &str = "Name";
#[allow(missing_docs)]
pub const VALUE_KEY: &str = "Value";

lazy_static! {
    /// `sha512("cryptoport")[..6]`, shared by every address of the family.
    pub static ref NAMESPACE_PREFIX: String =
        sha512_hex(FAMILY_NAME)[..NAMESPACE_PREFIX_LEN].to_owned();
}

/// The 6-character namespace of the family.
#[inline(always)]
pub fn namespace_prefix() -> &'static str {
    NAMESPACE_PREFIX.as_str()
}

/// Map a logical entity name onto its 70-character state address.
///
/// Client and transaction handler must agree on this byte for byte,
/// otherwise writes land where reads never look.
#[inline(always)]
pub fn derive_address(name: &str) -> String {
    let mut addr = String::with_capacity(ADDRESS_LEN);
    addr.push_str(&NAMESPACE_PREFIX);
    addr.push_str(&sha512_hex(name)[..ADDRESS_LEN - NAMESPACE_PREFIX_LEN]);
    addr
}

/// Whether `addr` is a well-formed address inside the cryptoport namespace.
#[inline(always)]
pub fn is_family_address(addr: &str) -> bool {
    is_lower_hex(addr, ADDRESS_LEN) && addr.starts_with(NAMESPACE_PREFIX.as_str())
}

/// Operations a payload may carry.
///
/// Only `insert` exists; anything else is rejected at apply time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Verb {
    /// Append an entry to the named sequence.
    Insert,
}

impl Verb {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Insert => "insert",
        }
    }
}

impl FromStr for Verb {
    type Err = Box<dyn RucError>;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "insert" => Ok(Verb::Insert),
            _ => Err(eg!(format!("unknown verb: {s}"))),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{Verb, Name, Value}` triple carried by every cryptoport transaction.
///
/// `Value` travels as JSON text. The CBOR encoding sorts map keys, so the
/// same triple produces the same bytes (and so the same digest and header
/// signature) on every host. Both are computed at most once per instance.
#[derive(Debug)]
pub struct Payload {
    verb: String,
    name: String,
    value: String,
    cbor: OnceCell<Vec<u8>>,
    sha512: OnceCell<String>,
}

impl Clone for Payload {
    fn clone(&self) -> Self {
        Self::from_raw(self.verb.clone(), self.name.clone(), self.value.clone())
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.verb == other.verb && self.name == other.name && self.value == other.value
    }
}

impl Eq for Payload {}

impl Payload {
    /// Build a payload, JSON-encoding `value`.
    pub fn new<T: Serialize + ?Sized>(verb: Verb, name: &str, value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .c(d!("value is not JSON-serializable"))
            .map(|v| Self::from_raw(verb.as_str().to_owned(), name.to_owned(), v))
    }

    /// Build a payload from already-encoded parts, with no validation at all.
    #[inline(always)]
    pub fn from_raw(verb: String, name: String, value: String) -> Self {
        Payload {
            verb,
            name,
            value,
            cbor: OnceCell::new(),
            sha512: OnceCell::new(),
        }
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The JSON text of the value.
    #[inline(always)]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn to_map(&self) -> BTreeMap<&'static str, &str> {
        let mut m = BTreeMap::new();
        m.insert(VERB_KEY, self.verb.as_str());
        m.insert(NAME_KEY, self.name.as_str());
        m.insert(VALUE_KEY, self.value.as_str());
        m
    }

    /// Canonical CBOR bytes of the payload.
    pub fn to_cbor(&self) -> Result<&[u8]> {
        self.cbor
            .get_or_try_init(|| serde_cbor::to_vec(&self.to_map()).c(d!()))
            .map(|v| v.as_slice())
    }

    /// Hex SHA-512 of the canonical bytes.
    pub fn sha512(&self) -> Result<&str> {
        let cbor = self.to_cbor().c(d!())?;
        Ok(self.sha512.get_or_init(|| sha512_hex(cbor)).as_str())
    }

    /// Inverse of `to_cbor`: the bytes must hold a map with three text
    /// fields `Verb`, `Name` and `Value`.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut fields: BTreeMap<String, String> =
            serde_cbor::from_slice(bytes).c(d!("invalid payload serialization"))?;
        let mut take = |k: &str| {
            fields
                .remove(k)
                .ok_or_else(|| eg!(format!("{k} is required")))
        };
        let verb = take(VERB_KEY)?;
        let name = take(NAME_KEY)?;
        let value = take(VALUE_KEY)?;
        Ok(Self::from_raw(verb, name, value))
    }
}

/// The state stored at one address: entity name to its ordered entries.
///
/// `BTreeMap` keeps the encoding independent of insertion order.
pub type EntityState = BTreeMap<String, Vec<serde_cbor::Value>>;

/// Decode the bytes stored at an address; empty input is an empty state.
pub fn decode_state(bytes: &[u8]) -> Result<EntityState> {
    if bytes.is_empty() {
        return Ok(EntityState::new());
    }
    serde_cbor::from_slice(bytes).c(d!("failed to load state data"))
}

/// Canonical bytes of a state value.
pub fn encode_state(state: &EntityState) -> Result<Vec<u8>> {
    serde_cbor::to_vec(state).c(d!())
}

/// Typed view of the entries `name` holds in the bytes of its address.
pub fn decode_holdings(bytes: &[u8], name: &str) -> Result<Vec<HoldingEntry>> {
    if bytes.is_empty() {
        return Ok(vec![]);
    }
    let mut state: BTreeMap<String, Vec<HoldingEntry>> =
        serde_cbor::from_slice(bytes).c(d!("state does not hold portfolio entries"))?;
    Ok(state.remove(name).unwrap_or_default())
}

/// Direction of a portfolio transaction, `1` and `0` on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum TxnType {
    /// Coins sold.
    Sold = 0,
    /// Coins bought.
    Bought = 1,
}

impl TxnType {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of `code`.
    #[inline(always)]
    pub fn from_code(v: u8) -> Option<Self> {
        match v {
            0 => Some(TxnType::Sold),
            1 => Some(TxnType::Bought),
            _ => None,
        }
    }
}

impl Serialize for TxnType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for TxnType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = u8::deserialize(deserializer)?;
        TxnType::from_code(v)
            .ok_or_else(|| de::Error::custom(format!("invalid transaction type: {v}")))
    }
}

/// One portfolio transaction, as appended to an entity's sequence.
///
/// Money and quantities are fixed-point; they serialize as decimal strings
/// and also accept JSON/CBOR numbers written by older clients.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HoldingEntry {
    /// Owner-chosen label of the entry.
    pub name: String,
    /// Ticker, e.g. `BTC`.
    pub symbol: String,
    /// Bought or sold.
    #[serde(rename = "type")]
    pub kind: TxnType,
    /// Amount paid or received, in cents.
    pub amount: Decimal,
    /// `MM-DD-YYYY`.
    pub time_transacted: String,
    /// `MM-DD-YYYY`.
    pub time_created: String,
    #[allow(missing_docs)]
    pub price_purchased_at: Decimal,
    #[allow(missing_docs)]
    pub no_of_coins: Decimal,
}

/// Batch states reported by the ledger's `batch_statuses` endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitStatus {
    /// Applied and part of the chain.
    Committed,
    /// Rejected; none of its transactions took effect.
    Invalid,
    /// Accepted but not yet committed.
    Pending,
    /// The ledger has never heard of the batch.
    Unknown,
}

impl CommitStatus {
    /// Whether polling should continue.
    #[inline(always)]
    pub fn is_pending(self) -> bool {
        matches!(self, CommitStatus::Pending)
    }
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            CommitStatus::Committed => "COMMITTED",
            CommitStatus::Invalid => "INVALID",
            CommitStatus::Pending => "PENDING",
            CommitStatus::Unknown => "UNKNOWN",
        })
    }
}

impl FromStr for CommitStatus {
    type Err = Box<dyn RucError>;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "COMMITTED" => Ok(CommitStatus::Committed),
            "INVALID" => Ok(CommitStatus::Invalid),
            "PENDING" => Ok(CommitStatus::Pending),
            "UNKNOWN" => Ok(CommitStatus::Unknown),
            _ => Err(eg!(format!("unknown batch status: {s}"))),
        }
    }
}
