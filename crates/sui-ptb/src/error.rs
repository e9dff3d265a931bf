// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::base_types::ObjectIDParseError;
use crate::transaction::{Argument, CommandKind};

#[macro_export]
macro_rules! fp_bail {
    ($e:expr) => {
        return Err($e)
    };
}

#[macro_export(local_inner_macros)]
macro_rules! fp_ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            fp_bail!($e);
        }
    };
}

pub type PtbResult<T = ()> = Result<T, PtbError>;

/// Structural errors raised while assembling a programmable transaction.
///
/// Every variant is detected locally, before anything reaches an execution
/// node, and only aborts the call that produced it: the builder is left
/// exactly as it was before that call.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Error)]
pub enum PtbError {
    #[error("Invalid or duplicate input: {reason}")]
    DuplicateOrInvalidInput { reason: String },
    #[error(
        "Command {command} references {argument}, which does not exist at this point: {reason}"
    )]
    DanglingReference {
        command: u16,
        argument: Argument,
        reason: String,
    },
    #[error("Arity mismatch for {kind} command: {reason}")]
    ArityMismatch { kind: CommandKind, reason: String },
    #[error("Invalid Move identifier {identifier:?}")]
    InvalidIdentifier { identifier: String },
    #[error("{field} is already set to {current}, refusing to overwrite it with {attempted}")]
    AlreadySet {
        field: String,
        current: String,
        attempted: String,
    },
    #[error("Transaction sender must be set before the transaction can be finalized")]
    MissingSender,
    #[error("Size limit exceeded: {what} is {value}, the limit is {limit}")]
    SizeLimitExceeded {
        what: String,
        value: u64,
        limit: u64,
    },
    #[error("Transaction kind serialization failed: {error}")]
    Serialization { error: String },
}

impl PtbError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::DuplicateOrInvalidInput {
            reason: reason.into(),
        }
    }

    pub fn arity(kind: CommandKind, reason: impl Into<String>) -> Self {
        Self::ArityMismatch {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether the error comes from a malformed append, as opposed to a
    /// lifecycle or encoding problem.
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Self::DanglingReference { .. } | Self::ArityMismatch { .. }
        )
    }
}

impl From<ObjectIDParseError> for PtbError {
    fn from(error: ObjectIDParseError) -> Self {
        Self::invalid_input(error.to_string())
    }
}

impl From<bcs::Error> for PtbError {
    fn from(error: bcs::Error) -> Self {
        Self::Serialization {
            error: error.to_string(),
        }
    }
}
