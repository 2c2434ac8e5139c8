//!
//! Utils for building cryptoport transactions and batches
//!


use {
    globutils::ecdsa::Signer,
    ledger::data_model::{
        derive_address, Batch, BatchHeader, BatchList, Payload, Transaction,
        TransactionHeader, Verb, FAMILY_NAME, FAMILY_VERSION,
    },
    ruc::*,
    serde::Serialize,
};

/// A random 64-bit nonce, `0x`-prefixed lower hex.
#[inline(always)]
pub fn gen_nonce() -> String {
    format!("0x{:x}", rand::random::<u64>())
}

/// Sign one transaction carrying `{verb, name, value}`.
///
/// The transaction reads and writes the address of `name` only, and
/// `signer` acts as both transaction signer and batcher.
pub fn create_transaction<T: Serialize + ?Sized>(
    verb: Verb,
    name: &str,
    value: &T,
    signer: &dyn Signer,
    dependencies: &[String],
) -> Result<Transaction> {
    let payload = Payload::new(verb, name, value).c(d!())?;
    let payload_sha512 = payload.sha512().c(d!())?.to_owned();
    let address = derive_address(name);
    let public_key = signer.public_key_hex();

    let header = TransactionHeader {
        batcher_public_key: public_key.clone(),
        dependencies: dependencies.to_vec(),
        family_name: FAMILY_NAME.to_owned(),
        family_version: FAMILY_VERSION.to_owned(),
        inputs: vec![address.clone()],
        nonce: gen_nonce(),
        outputs: vec![address],
        payload_sha512,
        signer_public_key: public_key,
    }
    .to_bytes();
    let header_signature = signer.sign(&header).c(d!("fail to sign transaction"))?;

    Ok(Transaction {
        header,
        header_signature,
        payload: payload.to_cbor().c(d!())?.to_vec(),
    })
}

/// Wrap `transactions`, in order, into one batch signed by `signer`.
pub fn create_batch(transactions: Vec<Transaction>, signer: &dyn Signer) -> Result<Batch> {
    if transactions.is_empty() {
        return Err(eg!("a batch needs at least one transaction"));
    }

    let header = BatchHeader {
        signer_public_key: signer.public_key_hex(),
        transaction_ids: transactions.iter().map(|t| t.id().to_owned()).collect(),
    }
    .to_bytes();
    let header_signature = signer.sign(&header).c(d!("fail to sign batch"))?;

    Ok(Batch {
        header,
        header_signature,
        transactions,
        trace: false,
    })
}

/// Accumulates transactions for a single batch.
///
/// Each added operation depends on the one added before it, so the ledger
/// never reorders them.
pub struct TransactionBuilder<'a> {
    signer: &'a dyn Signer,
    txns: Vec<Transaction>,
}

impl<'a> TransactionBuilder<'a> {
    #[inline(always)]
    #[allow(missing_docs)]
    pub fn new(signer: &'a dyn Signer) -> Self {
        TransactionBuilder {
            signer,
            txns: vec![],
        }
    }

    #[allow(missing_docs)]
    pub fn add_operation<T: Serialize + ?Sized>(
        &mut self,
        verb: Verb,
        name: &str,
        value: &T,
    ) -> Result<&mut Self> {
        let deps = self
            .txns
            .last()
            .map(|t| vec![t.id().to_owned()])
            .unwrap_or_default();
        let tx = create_transaction(verb, name, value, self.signer, &deps).c(d!())?;
        self.txns.push(tx);
        Ok(self)
    }

    /// Shorthand for `add_operation(Verb::Insert, ..)`.
    #[inline(always)]
    pub fn add_operation_insert<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<&mut Self> {
        self.add_operation(Verb::Insert, name, value).c(d!())
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.txns.len()
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.txns.is_empty()
    }

    /// Sign the accumulated transactions as one batch, ready to post.
    pub fn build(self) -> Result<BatchList> {
        create_batch(self.txns, self.signer)
            .c(d!())
            .map(|b| BatchList { batches: vec![b] })
    }
}
