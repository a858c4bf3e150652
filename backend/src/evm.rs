//! JSON-RPC transport against a deployed FHELockClaims contract.

use crate::abi::{CallOutput, ClaimRecord, ContractCall, IFHELockClaims};
use crate::config::ContractConfig;
use crate::gateway::{ContractTransport, TransportError, WriteReceipt};
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};

pub struct EvmTransport {
    rpc_url: String,
    signer: Option<PrivateKeySigner>,
}

impl EvmTransport {
    pub fn new(rpc_url: impl Into<String>, signer: Option<PrivateKeySigner>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            signer,
        }
    }

    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    fn read_provider(&self) -> Result<impl Provider, TransportError> {
        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| TransportError::Rpc(format!("invalid RPC URL: {e}")))?;
        Ok(ProviderBuilder::new().connect_http(rpc_url))
    }

    /// A fresh provider with the signer attached. Not cached between transactions.
    fn signing_provider(&self, from: Address) -> Result<impl Provider, TransportError> {
        let signer = self
            .signer
            .clone()
            .ok_or(TransportError::Unsupported("sending requires PRIVATE_KEY"))?;
        if signer.address() != from {
            return Err(TransportError::Rejected(format!(
                "signer {} cannot send as {from}",
                signer.address()
            )));
        }

        let rpc_url = self
            .rpc_url
            .parse()
            .map_err(|e| TransportError::Rpc(format!("invalid RPC URL: {e}")))?;
        Ok(ProviderBuilder::new().wallet(EthereumWallet::from(signer)).connect_http(rpc_url))
    }
}

fn contract_error(e: alloy::contract::Error) -> TransportError {
    if e.as_revert_data().is_some() {
        TransportError::Rejected(e.to_string())
    } else {
        TransportError::Rpc(e.to_string())
    }
}

fn to_u64(field: &str, value: U256) -> Result<u64, TransportError> {
    u64::try_from(value).map_err(|_| TransportError::Decode(format!("{field} does not fit in u64: {value}")))
}

fn format_tx_hash(hash: TxHash) -> String {
    format!("0x{hash:x}")
}

#[async_trait]
impl ContractTransport for EvmTransport {
    async fn call(&self, contract: &ContractConfig, call: &ContractCall) -> Result<CallOutput, TransportError> {
        let ContractCall::GetClaimInfo { claim_id } = call else {
            return Err(TransportError::Unsupported("only getClaimInfo is read over RPC"));
        };

        let provider = self.read_provider()?;
        let claims = IFHELockClaims::new(contract.address, &provider);

        let info = claims
            .getClaimInfo(U256::from(*claim_id))
            .call()
            .await
            .map_err(contract_error)?;

        debug!(claim_id, "getClaimInfo returned");
        Ok(CallOutput::ClaimInfo(ClaimRecord {
            claim_id: *claim_id,
            description: info.description,
            amount: vec![info.amount],
            policy_number: vec![info.policyNumber],
            claim_type: vec![info.claimType],
            status: info.status,
            priority: info.priority,
            is_active: info.isActive,
            is_verified: info.isVerified,
            claimant: info.claimant,
            insurer: info.insurer,
            submission_time: to_u64("submissionTime", info.submissionTime)?,
            last_updated: to_u64("lastUpdated", info.lastUpdated)?,
        }))
    }

    async fn send(
        &self,
        contract: &ContractConfig,
        from: Address,
        call: &ContractCall,
    ) -> Result<WriteReceipt, TransportError> {
        let provider = self.signing_provider(from)?;
        let claims = IFHELockClaims::new(contract.address, &provider);

        // Each write is simulated first; the simulation yields the id the transaction will return.
        let (id, receipt) = match call {
            ContractCall::SubmitClaim {
                description,
                claim_amount,
                policy_number,
                claim_type,
                priority,
                input_proof,
            } => {
                let builder = claims.submitClaim(
                    description.clone(),
                    Bytes::from(claim_amount.to_bytes()),
                    Bytes::from(policy_number.to_bytes()),
                    Bytes::from(claim_type.to_bytes()),
                    Bytes::from(priority.to_bytes()),
                    Bytes::from(input_proof.to_bytes()),
                );
                let id = builder.call().await.map_err(contract_error)?;
                let pending = builder.send().await.map_err(contract_error)?;
                let receipt = pending
                    .get_receipt()
                    .await
                    .map_err(|e| TransportError::Rpc(e.to_string()))?;
                (CallOutput::ClaimId(to_u64("claimId", id)?), receipt)
            }
            ContractCall::UploadDocument {
                claim_id,
                document_hash,
                document_type,
            } => {
                let builder =
                    claims.uploadDocument(U256::from(*claim_id), document_hash.clone(), document_type.clone());
                let id = builder.call().await.map_err(contract_error)?;
                let pending = builder.send().await.map_err(contract_error)?;
                let receipt = pending
                    .get_receipt()
                    .await
                    .map_err(|e| TransportError::Rpc(e.to_string()))?;
                (CallOutput::DocumentId(to_u64("documentId", id)?), receipt)
            }
            ContractCall::GetClaimInfo { .. } => {
                return Err(TransportError::Unsupported("getClaimInfo is a view function"));
            }
        };

        let tx_hash = format_tx_hash(receipt.transaction_hash);
        if !receipt.status() {
            return Err(TransportError::Rejected(format!("transaction {tx_hash} reverted")));
        }

        info!(
            function = call.function().name(),
            %tx_hash,
            block = receipt.block_number.unwrap_or_default(),
            "transaction mined"
        );
        Ok(WriteReceipt {
            tx_hash: Some(tx_hash),
            output: id,
        })
    }
}
