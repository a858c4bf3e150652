//! Typed read/write gateway to the claims contract.

use crate::abi::{CallOutput, ClaimRecord, ContractCall, MalformedCall};
use crate::activity::ActivityFlag;
use crate::config::ContractConfig;
use alloy::primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    /// The contract reverted or the node refused the transaction.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unsupported call: {0}")]
    Unsupported(&'static str),
}

/// Result of an accepted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReceipt {
    pub tx_hash: Option<String>,
    pub output: CallOutput,
}

/// Wire to one contract deployment. Implemented by the local ledger and the EVM client.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    async fn call(&self, contract: &ContractConfig, call: &ContractCall) -> Result<CallOutput, TransportError>;

    async fn send(
        &self,
        contract: &ContractConfig,
        from: Address,
        call: &ContractCall,
    ) -> Result<WriteReceipt, TransportError>;
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no wallet connected")]
    NotConnected,

    #[error("malformed call: {0}")]
    Malformed(#[from] MalformedCall),

    #[error("{function} is not a view function")]
    NotAView { function: &'static str },

    #[error("{function} rejected: {source}")]
    Rejected {
        function: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("unexpected output from {function}")]
    UnexpectedOutput { function: &'static str },
}

pub struct ContractGateway {
    contract: Arc<ContractConfig>,
    transport: Arc<dyn ContractTransport>,
    identity: Option<Address>,
    pending: ActivityFlag,
}

impl ContractGateway {
    pub fn new(
        contract: Arc<ContractConfig>,
        transport: Arc<dyn ContractTransport>,
        identity: Option<Address>,
    ) -> Self {
        Self {
            contract,
            transport,
            identity,
            pending: ActivityFlag::new(),
        }
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    pub fn identity(&self) -> Option<Address> {
        self.identity
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// True while any write is waiting on the remote.
    pub fn is_pending(&self) -> bool {
        self.pending.is_raised()
    }

    /// Issue a view call.
    ///
    /// Returns `Ok(None)` without touching the transport when the key argument
    /// is not valid.
    pub async fn read(&self, call: ContractCall) -> Result<Option<CallOutput>, GatewayError> {
        let function = call.function();
        if !function.is_view() {
            return Err(GatewayError::NotAView { function: function.name() });
        }
        if !call.has_valid_key() {
            debug!(function = function.name(), "read skipped: invalid key");
            return Ok(None);
        }
        call.validate()?;

        let output = self
            .transport
            .call(&self.contract, &call)
            .await
            .map_err(|source| GatewayError::Rejected {
                function: function.name(),
                source,
            })?;

        Ok(Some(output))
    }

    /// Issue a state-changing call. Resolves once the remote accepts it.
    pub async fn write(&self, call: ContractCall) -> Result<WriteReceipt, GatewayError> {
        let from = self.identity.ok_or(GatewayError::NotConnected)?;
        call.validate()?;

        let function = call.function();
        let _pending = self.pending.raise();

        debug!(function = function.name(), %from, "sending transaction");
        let receipt = self
            .transport
            .send(&self.contract, from, &call)
            .await
            .map_err(|source| GatewayError::Rejected {
                function: function.name(),
                source,
            })?;

        info!(
            function = function.name(),
            tx_hash = receipt.tx_hash.as_deref().unwrap_or("-"),
            "transaction accepted"
        );
        Ok(receipt)
    }

    /// `getClaimInfo`, with remote failures folded into "no data".
    pub async fn claim_info(&self, claim_id: u64) -> Option<ClaimRecord> {
        match self.read(ContractCall::GetClaimInfo { claim_id }).await {
            Ok(Some(CallOutput::ClaimInfo(record))) => Some(record),
            Ok(Some(_)) => {
                warn!(claim_id, "getClaimInfo returned an unexpected output");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(claim_id, error = %e, "claim read failed");
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn read_with_non_positive_id_never_reaches_the_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = gateway(transport.clone(), Some(wallet()));

        let out = gw.read(ContractCall::GetClaimInfo { claim_id: 0 }).await.unwrap();
        assert!(out.is_none());
        assert!(gw.claim_info(0).await.is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn read_refuses_state_changing_functions() {
        let gw = gateway(Arc::new(RecordingTransport::default()), Some(wallet()));
        let err = gw
            .read(ContractCall::UploadDocument {
                claim_id: 1,
                document_hash: "h".to_string(),
                document_type: "pdf".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotAView { function: "uploadDocument" }));
    }

    #[tokio::test]
    async fn remote_read_failure_surfaces_as_no_data() {
        let transport = Arc::new(RecordingTransport::failing("node down"));
        let gw = gateway(transport.clone(), None);
        assert!(gw.claim_info(3).await.is_none());
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn write_without_identity_is_pre_empted() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = gateway(transport.clone(), None);
        let err = gw
            .write(ContractCall::UploadDocument {
                claim_id: 1,
                document_hash: "h".to_string(),
                document_type: "pdf".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConnected));
        assert_eq!(transport.send_count(), 0);
    }

    #[tokio::test]
    async fn malformed_write_is_pre_empted() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = gateway(transport.clone(), Some(wallet()));
        let err = gw
            .write(ContractCall::UploadDocument {
                claim_id: 1,
                document_hash: String::new(),
                document_type: "pdf".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Malformed(_)));
        assert_eq!(transport.send_count(), 0);
    }

    #[tokio::test]
    async fn rejected_write_clears_the_pending_flag() {
        let transport = Arc::new(RecordingTransport::failing("execution reverted"));
        let gw = gateway(transport.clone(), Some(wallet()));
        let err = gw
            .write(ContractCall::UploadDocument {
                claim_id: 2,
                document_hash: "h".to_string(),
                document_type: "pdf".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { function: "uploadDocument", .. }));
        assert!(!gw.is_pending());
        assert_eq!(transport.send_count(), 1);
    }

    #[tokio::test]
    async fn accepted_write_returns_the_receipt() {
        let transport = Arc::new(RecordingTransport::default());
        let gw = gateway(transport.clone(), Some(wallet()));
        let receipt = gw
            .write(ContractCall::UploadDocument {
                claim_id: 2,
                document_hash: "h".to_string(),
                document_type: "pdf".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(receipt.output, CallOutput::DocumentId(1));
        assert!(!gw.is_pending());
        assert_eq!(transport.sends.lock().unwrap()[0].0, wallet());
    }
}
