//!
//! The cryptoport ledger core: data model, transaction handler
//! and an in-memory state store
//!

#![deny(missing_docs)]

pub mod data_model;
pub mod handler;
pub mod store;
