//!
//! Wire messages exchanged with the ledger's REST boundary.
//!
//! Field numbers follow the validator's protobuf definitions, so the bytes
//! produced here are exactly what the validator hashes and verifies.
//!

#![allow(missing_docs)]

use {
    globutils::{ecdsa, sha512_hex},
    prost::Message,
    ruc::*,
};

/// Header signatures double as transaction and batch ids.
pub const TRANSACTION_ID_LEN: usize = ecdsa::SIGNATURE_HEX_LEN;

#[derive(Clone, PartialEq, Message)]
pub struct TransactionHeader {
    #[prost(string, tag = "1")]
    pub batcher_public_key: String,
    #[prost(string, repeated, tag = "2")]
    pub dependencies: Vec<String>,
    #[prost(string, tag = "3")]
    pub family_name: String,
    #[prost(string, tag = "4")]
    pub family_version: String,
    #[prost(string, repeated, tag = "5")]
    pub inputs: Vec<String>,
    #[prost(string, tag = "6")]
    pub nonce: String,
    #[prost(string, repeated, tag = "7")]
    pub outputs: Vec<String>,
    #[prost(string, tag = "9")]
    pub payload_sha512: String,
    #[prost(string, tag = "10")]
    pub signer_public_key: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchHeader {
    #[prost(string, tag = "1")]
    pub signer_public_key: String,
    #[prost(string, repeated, tag = "2")]
    pub transaction_ids: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Batch {
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    #[prost(string, tag = "2")]
    pub header_signature: String,
    #[prost(message, repeated, tag = "3")]
    pub transactions: Vec<Transaction>,
    #[prost(bool, tag = "4")]
    pub trace: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct BatchList {
    #[prost(message, repeated, tag = "1")]
    pub batches: Vec<Batch>,
}

impl TransactionHeader {
    /// The bytes that get signed.
    #[inline(always)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

impl BatchHeader {
    /// The bytes that get signed.
    #[inline(always)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }
}

impl Transaction {
    /// The transaction id.
    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    #[inline(always)]
    pub fn decode_header(&self) -> Result<TransactionHeader> {
        TransactionHeader::decode(self.header.as_slice()).c(d!("invalid transaction header"))
    }

    /// Check the header signature and the payload digest,
    /// returning the decoded header on success.
    pub fn verify(&self) -> Result<TransactionHeader> {
        let header = self.decode_header().c(d!())?;
        if !ecdsa::verify(&self.header_signature, &self.header, &header.signer_public_key) {
            return Err(eg!("invalid transaction signature"));
        }
        if sha512_hex(&self.payload) != header.payload_sha512 {
            return Err(eg!("payload does not match its digest"));
        }
        Ok(header)
    }
}

impl Batch {
    /// The batch id.
    #[inline(always)]
    pub fn id(&self) -> &str {
        &self.header_signature
    }

    #[inline(always)]
    pub fn decode_header(&self) -> Result<BatchHeader> {
        BatchHeader::decode(self.header.as_slice()).c(d!("invalid batch header"))
    }

    /// Structural and cryptographic validity of a batch: its signature, every
    /// transaction's signature, the batcher key each transaction names, and
    /// the header id list matching the body transaction for transaction.
    pub fn verify(&self) -> Result<Vec<TransactionHeader>> {
        let header = self.decode_header().c(d!())?;
        if !ecdsa::verify(&self.header_signature, &self.header, &header.signer_public_key) {
            return Err(eg!("invalid batch signature"));
        }
        if header.transaction_ids.len() != self.transactions.len()
            || header
                .transaction_ids
                .iter()
                .zip(self.transactions.iter())
                .any(|(id, tx)| id != tx.id())
        {
            return Err(eg!("batch header does not list its transactions in order"));
        }

        self.transactions
            .iter()
            .map(|tx| {
                let th = tx.verify().c(d!())?;
                if th.batcher_public_key != header.signer_public_key {
                    return Err(eg!("transaction names a different batcher"));
                }
                Ok(th)
            })
            .collect()
    }
}

impl BatchList {
    #[inline(always)]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    #[inline(always)]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        BatchList::decode(bytes).c(d!("invalid batch list"))
    }

    /// Ids of the wrapped batches, in order.
    #[inline(always)]
    pub fn batch_ids(&self) -> Vec<String> {
        self.batches.iter().map(|b| b.id().to_owned()).collect()
    }
}
