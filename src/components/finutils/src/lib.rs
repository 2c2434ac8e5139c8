//!
//! # Cryptoport client collection
//!
//! Builds, signs and submits cryptoport transactions to a ledger's REST
//! API, tracks their commit status and reads portfolios back.
//!

#![deny(missing_docs)]

pub mod api;
pub mod client;
pub mod common;
pub mod txn_builder;

pub use {
    client::{CryptoportClient, DEFAULT_ENTITY},
    common::{ClientError, ClientResult},
};
