//!
//! # Portfolio client
//!
//! Appends holding entries to the ledger and reads them back, raw or
//! aggregated.
//!

use {
    crate::{
        api::{CoinRollup, Rollup},
        common::{
            utils::{get_state, submit_batch_list, wait_for_commit},
            ClientError, ClientResult, ClientResultTrait, HttpTransport, LedgerTransport,
        },
        txn_builder::TransactionBuilder,
    },
    config::ClientConfig,
    globutils::ecdsa::{SecpPair, Signer},
    ledger::data_model::{decode_holdings, derive_address, HoldingEntry, TxnType},
    rust_decimal::Decimal,
    std::{collections::BTreeMap, time::Duration},
    tracing::{info, warn},
};

/// Entity every portfolio entry is filed under.
pub const DEFAULT_ENTITY: &str = "name";

/// Signs with one key and talks to one REST API.
pub struct CryptoportClient<T: LedgerTransport = HttpTransport> {
    url: String,
    signer: SecpPair,
    transport: T,
}

impl CryptoportClient<HttpTransport> {
    /// Client over HTTP for `cfg`. Without a keyfile a throwaway key signs.
    #[inline(always)]
    pub fn new(cfg: &ClientConfig) -> ClientResult<Self> {
        Self::with_transport(cfg, HttpTransport)
    }
}

impl<T: LedgerTransport> CryptoportClient<T> {
    #[allow(missing_docs)]
    pub fn with_transport(cfg: &ClientConfig, transport: T) -> ClientResult<Self> {
        let signer = match cfg.keyfile.as_ref() {
            Some(path) => SecpPair::from_file(path)
                .to_client_result(ClientError::Validation, "Unable to load private key")?,
            None => SecpPair::generate(),
        };
        Ok(Self::with_signer(&cfg.url, signer, transport))
    }

    #[allow(missing_docs)]
    pub fn with_signer(url: &str, signer: SecpPair, transport: T) -> Self {
        CryptoportClient {
            url: url.to_owned(),
            signer,
            transport,
        }
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn public_key(&self) -> String {
        self.signer.public_key_hex()
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Append one entry; see `insert_all`.
    #[inline(always)]
    pub fn insert(&self, entry: &HoldingEntry, wait: Option<Duration>) -> ClientResult<String> {
        self.insert_all(std::slice::from_ref(entry), wait)
    }

    /// Append `entries` in order, atomically, as one batch.
    ///
    /// Returns the body of the submission response once the batch settled
    /// or `wait` ran out. A zero or absent `wait` returns right after
    /// submission.
    pub fn insert_all(
        &self,
        entries: &[HoldingEntry],
        wait: Option<Duration>,
    ) -> ClientResult<String> {
        if entries.is_empty() {
            return Err(ClientError::Validation("no value provided".to_owned()));
        }

        let mut builder = TransactionBuilder::new(&self.signer);
        for entry in entries {
            builder
                .add_operation_insert(DEFAULT_ENTITY, entry)
                .to_client_result(ClientError::Serialization, "Failed to build transaction")?;
        }
        let batch_list = builder
            .build()
            .to_client_result(ClientError::Internal, "Failed to build batch")?;
        let batch_id = batch_list.batch_ids().remove(0);

        let (body, status) = submit_batch_list(&self.transport, &self.url, &batch_list)?;
        if 404 == status {
            return Err(ClientError::Network(format!("Error 404: {body}")));
        }
        match wait_for_commit(&self.transport, &self.url, &batch_id, wait)? {
            Some(status) if status.is_pending() => {
                warn!(batch = %batch_id, "batch still pending after waiting")
            }
            Some(status) => info!(batch = %batch_id, %status, "batch settled"),
            None => {}
        }
        Ok(body)
    }

    /// Every entry filed under the default entity, oldest first.
    pub fn list(&self) -> ClientResult<Vec<HoldingEntry>> {
        let address = derive_address(DEFAULT_ENTITY);
        match get_state(&self.transport, &self.url, &address)? {
            Some(bytes) => decode_holdings(&bytes, DEFAULT_ENTITY)
                .to_client_result(ClientError::Serialization, "Failed to decode state"),
            None => Ok(vec![]),
        }
    }

    /// Totals per `(symbol, type)`, sorted by symbol then type.
    pub fn rollups(&self) -> ClientResult<Vec<Rollup>> {
        Ok(rollups(&self.list()?))
    }

    /// Net position per symbol, sorted by symbol.
    pub fn rollups_by_coin(&self) -> ClientResult<Vec<CoinRollup>> {
        Ok(rollups_by_coin(&self.list()?))
    }
}

/// Group `entries` by `(symbol, type)`, summing amounts and coins.
pub fn rollups(entries: &[HoldingEntry]) -> Vec<Rollup> {
    let mut groups: BTreeMap<(&str, TxnType), (Decimal, Decimal)> = BTreeMap::new();
    for e in entries {
        let g = groups.entry((e.symbol.as_str(), e.kind)).or_default();
        g.0 += e.amount;
        g.1 += e.no_of_coins;
    }
    groups
        .into_iter()
        .map(|((symbol, kind), (total_amount, total_coins))| Rollup {
            symbol: symbol.to_owned(),
            kind,
            total_amount,
            total_coins,
        })
        .collect()
}

/// Group `entries` by symbol; purchases add and sales subtract.
/// Amounts are in cents, `total_cost` is in currency units.
pub fn rollups_by_coin(entries: &[HoldingEntry]) -> Vec<CoinRollup> {
    let mut coins: BTreeMap<&str, CoinRollup> = BTreeMap::new();
    for e in entries {
        let c = coins.entry(e.symbol.as_str()).or_insert_with(|| CoinRollup {
            symbol: e.symbol.clone(),
            coins: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        });
        let cost = e.amount / Decimal::ONE_HUNDRED;
        match e.kind {
            TxnType::Bought => {
                c.coins += e.no_of_coins;
                c.total_cost += cost;
            }
            TxnType::Sold => {
                c.coins -= e.no_of_coins;
                c.total_cost -= cost;
            }
        }
    }
    coins.into_values().collect()
}
