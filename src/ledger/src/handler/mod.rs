//!
//! # The cryptoport transaction handler
//!
//! Runs on every ledger node, once per transaction. The outcome depends on
//! the transaction bytes and the prior state only: no clock, no randomness
//! and no I/O besides the context's state reads and writes.
//!


use {
    crate::data_model::{
        decode_state, derive_address, encode_state, namespace_prefix, EntityState,
        TransactionHeader, Verb,
        FAMILY_NAME, FAMILY_VERSION, MAX_NAME_LENGTH, NAME_KEY,
        VALUE_KEY, VERB_KEY,
    },
    ruc::*,
    serde_cbor::Value as CborValue,
    std::collections::BTreeMap,
    thiserror::Error,
    tracing::debug,
};

/// Why a transaction was refused. Always caused by the submitter,
/// resubmitting the same bytes fails the same way.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidReason {
    #[error("Invalid payload serialization")]
    #[allow(missing_docs)]
    InvalidPayload,
    /// Carries the name of the absent field.
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Verb must be \"insert\"")]
    #[allow(missing_docs)]
    InvalidVerb,
    #[error("Name must be a string of no more than 20 characters")]
    #[allow(missing_docs)]
    InvalidName,
    #[error("Value must be JSON")]
    #[allow(missing_docs)]
    InvalidValue,
    /// The header addresses another family or version.
    #[error("unsupported family {0}")]
    WrongFamily(String),
}

/// Failure of `apply`; either way the transaction leaves no trace in state.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ApplyError {
    /// Client-caused, never retried.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] InvalidReason),
    /// The host refused a read or write, or stored state is unreadable.
    #[error("internal error: {0}")]
    Internal(String),
}

/// State access granted to a transaction by the host engine.
pub trait TransactionContext {
    /// Bytes currently stored at `address`, if any.
    fn get_state_entry(&self, address: &str) -> Result<Option<Vec<u8>>>;

    /// Stage a write; the engine may refuse it.
    fn set_state_entry(&mut self, address: String, data: Vec<u8>) -> Result<()>;
}

/// The fields of a payload that survived validation.
#[derive(Clone, Debug, PartialEq)]
struct Unpacked {
    verb: Verb,
    name: String,
    value: serde_json::Value,
}

/// Handler registered for the `cryptoport` family.
#[derive(Clone, Copy, Debug, Default)]
pub struct CryptoportHandler;

impl CryptoportHandler {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn family_name(&self) -> &'static str {
        FAMILY_NAME
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn family_versions(&self) -> Vec<&'static str> {
        vec![FAMILY_VERSION]
    }

    /// State namespaces this handler reads and writes.
    #[inline(always)]
    pub fn namespaces(&self) -> Vec<String> {
        vec![namespace_prefix().to_owned()]
    }

    /// Validate one transaction and fold it into state.
    pub fn apply(
        &self,
        header: &TransactionHeader,
        payload: &[u8],
        context: &mut dyn TransactionContext,
    ) -> std::result::Result<(), ApplyError> {
        if header.family_name != FAMILY_NAME || header.family_version != FAMILY_VERSION {
            return Err(InvalidReason::WrongFamily(format!(
                "{}/{}",
                header.family_name, header.family_version
            ))
            .into());
        }

        let tx = unpack_transaction(payload)?;
        debug!(verb = %tx.verb, name = %tx.name, "applying cryptoport transaction");

        let state = get_state_data(&tx.name, context)?;
        let updated = match tx.verb {
            Verb::Insert => do_insert(&tx.name, tx.value, state)?,
        };
        set_state_data(&tx.name, &updated, context)
    }
}

fn unpack_transaction(payload: &[u8]) -> std::result::Result<Unpacked, InvalidReason> {
    let mut content = decode_payload(payload)?;

    let mut field = |key: &'static str| {
        content
            .remove(&CborValue::Text(key.to_owned()))
            .ok_or(InvalidReason::MissingField(key))
    };
    let verb = field(VERB_KEY)?;
    let name = field(NAME_KEY)?;
    let value = field(VALUE_KEY)?;

    Ok(Unpacked {
        verb: validate_verb(verb)?,
        name: validate_name(name)?,
        value: validate_value(value)?,
    })
}

fn decode_payload(
    payload: &[u8],
) -> std::result::Result<BTreeMap<CborValue, CborValue>, InvalidReason> {
    match serde_cbor::from_slice(payload) {
        Ok(CborValue::Map(m)) => Ok(m),
        _ => Err(InvalidReason::InvalidPayload),
    }
}

fn validate_verb(verb: CborValue) -> std::result::Result<Verb, InvalidReason> {
    match verb {
        CborValue::Text(v) => v.parse::<Verb>().map_err(|_| InvalidReason::InvalidVerb),
        _ => Err(InvalidReason::InvalidVerb),
    }
}

fn validate_name(name: CborValue) -> std::result::Result<String, InvalidReason> {
    match name {
        CborValue::Text(n) if n.chars().count() <= MAX_NAME_LENGTH => Ok(n),
        _ => Err(InvalidReason::InvalidName),
    }
}

fn validate_value(value: CborValue) -> std::result::Result<serde_json::Value, InvalidReason> {
    match value {
        CborValue::Text(v) => {
            serde_json::from_str(&v).map_err(|_| InvalidReason::InvalidValue)
        }
        _ => Err(InvalidReason::InvalidValue),
    }
}

fn get_state_data(
    name: &str,
    context: &dyn TransactionContext,
) -> std::result::Result<EntityState, ApplyError> {
    let address = derive_address(name);
    match context.get_state_entry(&address) {
        Ok(Some(bytes)) => decode_state(&bytes).map_err(|e| internal("Failed to load state data", e)),
        Ok(None) => Ok(Default::default()),
        Err(e) => Err(internal("State error", e)),
    }
}

fn set_state_data(
    name: &str,
    state: &EntityState,
    context: &mut dyn TransactionContext,
) -> std::result::Result<(), ApplyError> {
    let address = derive_address(name);
    let encoded = encode_state(state).map_err(|e| internal("State error", e))?;
    context
        .set_state_entry(address, encoded)
        .map_err(|e| internal("State error", e))
}

fn do_insert(
    name: &str,
    value: serde_json::Value,
    mut state: EntityState,
) -> std::result::Result<EntityState, ApplyError> {
    let value = serde_cbor::value::to_value(value)
        .map_err(|e| ApplyError::Internal(format!("unencodable value: {e}")))?;
    state.entry(name.to_owned()).or_default().push(value);
    Ok(state)
}

#[inline(always)]
fn internal(msg: &str, e: Box<dyn RucError>) -> ApplyError {
    ApplyError::Internal(format!("{msg}: {e}"))
}
