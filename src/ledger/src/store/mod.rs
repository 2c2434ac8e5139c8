//!
//! # In-memory ledger state
//!
//! A single-node stand-in for the replicated state tree: it verifies
//! submitted batches, runs their transactions through the cryptoport handler
//! and commits each batch atomically. Used by local runs and the test suites.
//!


use {
    crate::{
        data_model::{is_family_address, Batch, BatchList, CommitStatus, TransactionHeader},
        handler::{CryptoportHandler, TransactionContext},
    },
    parking_lot::RwLock,
    ruc::*,
    std::collections::{BTreeMap, HashMap, HashSet},
    tracing::{info, warn},
};

/// When accepted batches become visible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitMode {
    /// Every batch is applied as soon as it arrives.
    EveryBatch,
    /// Batches wait as `PENDING` until `commit_pending` is called.
    Manual,
}

/// Writes staged by the transactions of one batch, visible to the later
/// transactions of the same batch and to nobody else until committed.
#[derive(Debug, Default)]
pub struct BatchEffect {
    writes: BTreeMap<String, Vec<u8>>,
    txn_ids: Vec<String>,
}

impl BatchEffect {
    /// Addresses the batch wrote, in address order.
    #[inline(always)]
    pub fn touched(&self) -> Vec<&str> {
        self.writes.keys().map(|k| k.as_str()).collect()
    }
}

/// The view of state one transaction gets: reads and writes are confined to
/// the addresses its header declares.
struct TxnScope<'a> {
    committed: &'a BTreeMap<String, Vec<u8>>,
    effect: &'a mut BatchEffect,
    header: &'a TransactionHeader,
}

impl TransactionContext for TxnScope<'_> {
    fn get_state_entry(&self, address: &str) -> Result<Option<Vec<u8>>> {
        if !self.header.inputs.iter().any(|i| address.starts_with(i.as_str())) {
            return Err(eg!(format!("address {address} is not a declared input")));
        }
        Ok(self
            .effect
            .writes
            .get(address)
            .or_else(|| self.committed.get(address))
            .cloned())
    }

    fn set_state_entry(&mut self, address: String, data: Vec<u8>) -> Result<()> {
        if !self.header.outputs.iter().any(|o| address.starts_with(o.as_str())) {
            return Err(eg!(format!("address {address} is not a declared output")));
        }
        if !is_family_address(&address) {
            return Err(eg!(format!("address {address} is outside the namespace")));
        }
        self.effect.writes.insert(address, data);
        Ok(())
    }
}

/// Committed state and the ids of every transaction that produced it.
///
/// Both live behind one lock so a batch is checked, applied and committed
/// against a single consistent view.
#[derive(Debug, Default)]
struct Chain {
    state: BTreeMap<String, Vec<u8>>,
    committed_txns: HashSet<String>,
}

impl Chain {
    fn run(&self, handler: &CryptoportHandler, batch: &Batch) -> Result<BatchEffect> {
        let headers = batch.verify().c(d!())?;
        let mut effect = BatchEffect::default();

        for (tx, header) in batch.transactions.iter().zip(headers.iter()) {
            if self.committed_txns.contains(tx.id())
                || effect.txn_ids.iter().any(|i| i == tx.id())
            {
                return Err(eg!(format!("duplicate transaction {}", tx.id())));
            }
            if header.dependencies.iter().any(|d| {
                !self.committed_txns.contains(d) && !effect.txn_ids.iter().any(|i| i == d)
            }) {
                return Err(eg!(format!("unmet dependency in transaction {}", tx.id())));
            }

            let mut scope = TxnScope {
                committed: &self.state,
                effect: &mut effect,
                header,
            };
            handler
                .apply(header, &tx.payload, &mut scope)
                .map_err(|e| eg!(format!("transaction {}: {e}", tx.id())))?;
            effect.txn_ids.push(tx.id().to_owned());
        }

        Ok(effect)
    }

    fn commit(&mut self, effect: BatchEffect) {
        self.state.extend(effect.writes);
        self.committed_txns.extend(effect.txn_ids);
    }
}

/// single node ledger
///
/// Lock order, where more than one is held: `chain`, `statuses`, `pending`.
pub struct LedgerState {
    handler: CryptoportHandler,
    mode: CommitMode,
    chain: RwLock<Chain>,
    statuses: RwLock<HashMap<String, CommitStatus>>,
    pending: RwLock<Vec<Batch>>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new(CommitMode::EveryBatch)
    }
}

impl LedgerState {
    #[allow(missing_docs)]
    pub fn new(mode: CommitMode) -> Self {
        LedgerState {
            handler: CryptoportHandler,
            mode,
            chain: RwLock::new(Chain::default()),
            statuses: RwLock::new(HashMap::new()),
            pending: RwLock::new(vec![]),
        }
    }

    /// Accept an encoded `BatchList`, as posted to `POST batches`.
    ///
    /// Fails only when the bytes are not a batch list at all; invalid batches
    /// are recorded as `INVALID` and leave state untouched. A batch already
    /// `PENDING` or `COMMITTED` is accepted again without effect.
    pub fn submit_batch_list(&self, bytes: &[u8]) -> Result<Vec<String>> {
        let list = BatchList::from_bytes(bytes).c(d!())?;
        let ids = list.batch_ids();

        for batch in list.batches {
            match self.mode {
                CommitMode::EveryBatch => self.process_batch(batch),
                CommitMode::Manual => {
                    let mut statuses = self.statuses.write();
                    if is_settled(statuses.get(batch.id())) {
                        info!(batch = %batch.id(), "batch already known");
                        continue;
                    }
                    statuses.insert(batch.id().to_owned(), CommitStatus::Pending);
                    self.pending.write().push(batch);
                }
            }
        }

        Ok(ids)
    }

    /// Process every pending batch in arrival order, returning how many ran.
    pub fn commit_pending(&self) -> usize {
        let pending = std::mem::take(&mut *self.pending.write());
        let n = pending.len();
        pending.into_iter().for_each(|b| self.process_batch(b));
        n
    }

    fn process_batch(&self, batch: Batch) {
        let mut chain = self.chain.write();
        if matches!(
            self.statuses.read().get(batch.id()),
            Some(CommitStatus::Committed)
        ) {
            info!(batch = %batch.id(), "batch already committed");
            return;
        }

        let status = match chain.run(&self.handler, &batch) {
            Ok(effect) => {
                info!(batch = %batch.id(), writes = effect.writes.len(), "batch committed");
                chain.commit(effect);
                CommitStatus::Committed
            }
            Err(e) => {
                warn!(batch = %batch.id(), "batch rejected: {}", e);
                CommitStatus::Invalid
            }
        };
        self.statuses.write().insert(batch.id().to_owned(), status);
    }

    /// Run all transactions of `batch` against a scratch overlay of the
    /// committed state, without committing anything.
    pub fn apply_batch(&self, batch: &Batch) -> Result<BatchEffect> {
        self.chain.read().run(&self.handler, batch)
    }

    /// Committed bytes at `address`.
    #[inline(always)]
    pub fn get_state(&self, address: &str) -> Option<Vec<u8>> {
        self.chain.read().state.get(address).cloned()
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn batch_status(&self, batch_id: &str) -> CommitStatus {
        self.statuses
            .read()
            .get(batch_id)
            .copied()
            .unwrap_or(CommitStatus::Unknown)
    }

    /// Number of addresses holding state.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.chain.read().state.len()
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[inline(always)]
fn is_settled(status: Option<&CommitStatus>) -> bool {
    matches!(status, Some(CommitStatus::Committed | CommitStatus::Pending))
}
