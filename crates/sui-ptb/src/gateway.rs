// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The boundary to whatever actually executes transactions. Nothing here
//! talks to the network: implementations of [`ExecutionGateway`] do, and
//! their errors are passed back to the caller untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use thiserror::Error;
use tracing::{info, warn};

use crate::base_types::SuiAddress;
use crate::error::PtbError;
use crate::programmable_transaction_builder::TransactionBatch;
use crate::sui_serde::{Base64, Readable};

#[derive(Eq, PartialEq, Clone, Debug, Error)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote error ({status}): {message}")]
    Remote { status: String, message: String },
    #[error("Signing failed: {0}")]
    Signing(String),
    #[error("Dry run failed: {error}")]
    DryRunFailed { error: String },
    #[error(transparent)]
    Transaction(#[from] PtbError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ExecutionStatus {
    Success,
    Failure { error: String },
}

impl ExecutionStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResponse {
    pub status: ExecutionStatus,
    /// Effects as reported by the node, left uninterpreted.
    pub effects: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub digest: String,
    pub status: ExecutionStatus,
    pub effects: serde_json::Value,
}

/// A user signature over the bytes of a batch.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSignature {
    pub signer: SuiAddress,
    #[serde_as(as = "Readable<Base64, _>")]
    pub signature: Vec<u8>,
}

/// A batch together with the signatures that authorize it: the sender's,
/// and the gas owner's when the transaction is sponsored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedBatch {
    pub batch: TransactionBatch,
    pub signatures: Vec<BatchSignature>,
}

impl SignedBatch {
    pub fn is_fully_signed(&self) -> bool {
        let signed_by = |address: SuiAddress| self.signatures.iter().any(|s| s.signer == address);
        signed_by(self.batch.sender()) && signed_by(self.batch.gas_owner())
    }

    /// Add a further signature, typically the sponsor's, over the same bytes.
    pub fn co_sign(&mut self, signer: &dyn BatchSigner) -> GatewayResult<()> {
        let bytes = self.batch.to_bytes()?;
        self.signatures.push(BatchSignature {
            signer: signer.address(),
            signature: signer.sign_bytes(&bytes)?,
        });
        Ok(())
    }
}

/// Key material stays behind this trait.
pub trait BatchSigner: Send + Sync {
    fn address(&self) -> SuiAddress;

    fn sign_bytes(&self, bytes: &[u8]) -> GatewayResult<Vec<u8>>;
}

#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn dry_run(&self, batch: &TransactionBatch) -> GatewayResult<DryRunResponse>;

    /// Take ownership of `batch` and attach `signer`'s signature to it.
    async fn sign(
        &self,
        batch: TransactionBatch,
        signer: &dyn BatchSigner,
    ) -> GatewayResult<SignedBatch> {
        sign_batch(batch, &[signer])
    }

    async fn submit(&self, signed: SignedBatch) -> GatewayResult<ExecutionResponse>;
}

/// Sign the BCS bytes of `batch` with every signer, in order.
pub fn sign_batch(
    batch: TransactionBatch,
    signers: &[&dyn BatchSigner],
) -> GatewayResult<SignedBatch> {
    let bytes = batch.to_bytes()?;
    let signatures = signers
        .iter()
        .map(|signer| {
            Ok(BatchSignature {
                signer: signer.address(),
                signature: signer.sign_bytes(&bytes)?,
            })
        })
        .collect::<GatewayResult<Vec<_>>>()?;
    Ok(SignedBatch { batch, signatures })
}

#[derive(Clone, Copy, Debug)]
pub struct ExecuteOptions {
    /// Dry run before signing and refuse to submit when the dry run fails.
    pub dry_run_first: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run_first: true,
        }
    }
}

/// Dry-run, sign and submit `batch`. Any gateway failure aborts the whole
/// attempt and is returned as reported.
pub async fn execute_batch(
    gateway: &dyn ExecutionGateway,
    batch: TransactionBatch,
    signer: &dyn BatchSigner,
    options: ExecuteOptions,
) -> GatewayResult<ExecutionResponse> {
    let sender = batch.sender();
    if options.dry_run_first {
        let response = gateway.dry_run(&batch).await?;
        if let ExecutionStatus::Failure { error } = response.status {
            warn!(%sender, "Dry run failed: {error}");
            return Err(GatewayError::DryRunFailed { error });
        }
    }
    let signed = gateway.sign(batch, signer).await?;
    let response = gateway.submit(signed).await?;
    info!(%sender, digest = %response.digest, "Submitted programmable transaction");
    Ok(response)
}
