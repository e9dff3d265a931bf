// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Programmable transactions: a table of inputs and an ordered list of
//! commands whose arguments reference those inputs or the results of earlier
//! commands.
//!
//! [`ProgrammableTransactionBuilder`] assembles a transaction and rejects
//! malformed references as they are appended, [`decoder`] renders an existing
//! transaction for display, and [`gateway`] describes the execution node the
//! finished [`TransactionBatch`] is handed to.

pub mod base_types;
pub mod config;
pub mod decoder;
pub mod error;
pub mod gateway;
pub mod programmable_transaction_builder;
pub mod sui_serde;
pub mod transaction;

pub use base_types::{ObjectID, ObjectRef, SuiAddress};
pub use config::PtbConfig;
pub use decoder::{decode, DecodedTransaction, InputClassification};
pub use error::{PtbError, PtbResult};
pub use programmable_transaction_builder::{ProgrammableTransactionBuilder, TransactionBatch};
pub use transaction::{Argument, CallArg, Command, CommandKind, ObjectArg, ProgrammableTransaction};
