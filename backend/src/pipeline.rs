//! Encrypted claim submission.
//!
//! A submission encrypts the amount, policy number, claim type, and priority one by one.
//! It then proves the encrypted amount and sends one `submitClaim` transaction.
//! The draft is only read. Callers clear it after success, or use
//! [`ClaimPipeline::submit_and_clear`].

use crate::abi::{CallOutput, ContractCall};
use crate::activity::{ActivityFlag, ExclusiveGate};
use crate::claims::{ClaimDraft, ClaimType, DraftError};
use crate::gateway::{ContractGateway, GatewayError};
use crate::notice::{Notice, NoticeLevel, NoticeSink, SUBMIT_FAILED, SUBMIT_SUCCEEDED, WALLET_REQUIRED};
use claim_crypto::{CryptoError, EncryptedField, FieldCipher, Proof, ProofSystem};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Cipher and proof system behind one "encrypting" indicator.
pub struct FieldEncryptor {
    cipher: Arc<dyn FieldCipher>,
    prover: Arc<dyn ProofSystem>,
    busy: ActivityFlag,
}

impl FieldEncryptor {
    pub fn new(cipher: Arc<dyn FieldCipher>, prover: Arc<dyn ProofSystem>) -> Self {
        Self {
            cipher,
            prover,
            busy: ActivityFlag::new(),
        }
    }

    pub fn scheme(&self) -> &'static str {
        self.cipher.scheme()
    }

    pub fn proof_system(&self) -> &'static str {
        self.prover.name()
    }

    pub fn is_encrypting(&self) -> bool {
        self.busy.is_raised()
    }

    pub async fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CryptoError> {
        let _busy = self.busy.raise();
        self.cipher.encrypt(plaintext)
    }

    /// Proof generation runs on the blocking pool; commitment schemes are CPU-bound.
    pub async fn generate_proof(&self, field: &EncryptedField) -> Result<Proof, CryptoError> {
        let _busy = self.busy.raise();
        let prover = self.prover.clone();
        let field = field.clone();
        tokio::task::spawn_blocking(move || prover.generate(&field))
            .await
            .map_err(|e| CryptoError::Proof(format!("proof task failed: {e}")))?
    }
}

/// Why an accepted draft did not make it onto the contract.
#[derive(Debug, Error)]
pub enum SubmitFailure {
    #[error("encryption: {0}")]
    Crypto(#[from] CryptoError),

    #[error("contract: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no wallet connected")]
    WalletRequired,

    #[error("invalid draft: {0}")]
    Invalid(#[from] DraftError),

    #[error("a claim submission is already in progress")]
    InFlight,

    #[error("claim submission failed: {0}")]
    Failed(#[source] SubmitFailure),
}

impl SubmitError {
    /// What the claimant is told. Failures are deliberately not told apart.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::WalletRequired => WALLET_REQUIRED.to_string(),
            SubmitError::Invalid(e) => e.to_string(),
            SubmitError::InFlight => "A claim submission is already in progress".to_string(),
            SubmitError::Failed(_) => SUBMIT_FAILED.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedClaim {
    pub claim_id: u64,
    pub tx_hash: Option<String>,
}

pub struct ClaimPipeline {
    gateway: Arc<ContractGateway>,
    encryptor: FieldEncryptor,
    in_flight: ExclusiveGate,
    notices: Arc<dyn NoticeSink>,
}

impl ClaimPipeline {
    pub fn new(gateway: Arc<ContractGateway>, encryptor: FieldEncryptor, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            gateway,
            encryptor,
            in_flight: ExclusiveGate::new(),
            notices,
        }
    }

    pub fn gateway(&self) -> &ContractGateway {
        &self.gateway
    }

    pub fn encryptor(&self) -> &FieldEncryptor {
        &self.encryptor
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_held()
    }

    /// True while any "in progress" indicator is raised.
    pub fn is_busy(&self) -> bool {
        self.is_submitting() || self.encryptor.is_encrypting() || self.gateway.is_pending()
    }

    pub async fn submit(&self, draft: &ClaimDraft) -> Result<SubmittedClaim, SubmitError> {
        if !self.gateway.is_connected() {
            self.notices.notify(Notice::new(NoticeLevel::Blocking, WALLET_REQUIRED));
            return Err(SubmitError::WalletRequired);
        }

        let claim_type = draft.validate()?;
        let _pass = self.in_flight.try_enter().ok_or(SubmitError::InFlight)?;

        let submission_id = Uuid::new_v4();
        let span = info_span!("submit_claim", %submission_id, claim_type = %claim_type);

        match self.encrypt_and_send(draft, claim_type).instrument(span).await {
            Ok(submitted) => {
                info!(%submission_id, claim_id = submitted.claim_id, "claim submitted");
                self.notices.notify(Notice::new(NoticeLevel::Success, SUBMIT_SUCCEEDED));
                Ok(submitted)
            }
            Err(cause) => {
                error!(%submission_id, error = %cause, "claim submission failed");
                self.notices.notify(Notice::new(NoticeLevel::Error, SUBMIT_FAILED));
                Err(SubmitError::Failed(cause))
            }
        }
    }

    /// Submit, then reset the draft. A failed submission leaves it untouched.
    pub async fn submit_and_clear(&self, draft: &mut ClaimDraft) -> Result<SubmittedClaim, SubmitError> {
        let submitted = self.submit(draft).await?;
        draft.clear();
        Ok(submitted)
    }

    async fn encrypt_and_send(&self, draft: &ClaimDraft, claim_type: ClaimType) -> Result<SubmittedClaim, SubmitFailure> {
        // Fields are encrypted as typed; trimming only applies to validation.
        let claim_amount = self.encryptor.encrypt(&draft.amount).await?;
        let policy_number = self.encryptor.encrypt(&draft.policy_number).await?;
        let claim_type = self.encryptor.encrypt(claim_type.as_str()).await?;
        let priority = self.encryptor.encrypt(draft.priority.as_str()).await?;

        // Only the amount is proven; the contract checks the proof against it.
        let input_proof = self.encryptor.generate_proof(&claim_amount).await?;

        let receipt = self
            .gateway
            .write(ContractCall::SubmitClaim {
                description: draft.description.clone(),
                claim_amount,
                policy_number,
                claim_type,
                priority,
                input_proof,
            })
            .await?;

        match receipt.output {
            CallOutput::ClaimId(claim_id) => Ok(SubmittedClaim {
                claim_id,
                tx_hash: receipt.tx_hash,
            }),
            _ => Err(GatewayError::UnexpectedOutput { function: "submitClaim" }.into()),
        }
    }

    /// Record a supporting document's hash against a submitted claim.
    pub async fn attach_document(
        &self,
        claim_id: u64,
        document_hash: &str,
        document_type: &str,
    ) -> Result<u64, GatewayError> {
        let receipt = self
            .gateway
            .write(ContractCall::UploadDocument {
                claim_id,
                document_hash: document_hash.to_string(),
                document_type: document_type.to_string(),
            })
            .await
            .inspect_err(|e| error!(claim_id, error = %e, "document upload failed"))?;

        match receipt.output {
            CallOutput::DocumentId(document_id) => {
                info!(claim_id, document_id, "document recorded");
                Ok(document_id)
            }
            _ => Err(GatewayError::UnexpectedOutput { function: "uploadDocument" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::CallArg;
    use crate::claims::fender_bender;
    use crate::config::ContractConfig;
    use crate::gateway::testing::{gateway, wallet, HeldTransport, RecordingTransport};
    use crate::notice::NoticeBoard;
    use alloy::primitives::Address;
    use claim_crypto::{Base64Placeholder, PoseidonBinding, PrefixProof};

    fn pipeline_over(
        transport: Arc<RecordingTransport>,
        identity: Option<Address>,
        cipher: Arc<dyn FieldCipher>,
        prover: Arc<dyn ProofSystem>,
    ) -> (ClaimPipeline, Arc<NoticeBoard>) {
        let board = Arc::new(NoticeBoard::new());
        let gw = Arc::new(gateway(transport, identity));
        let encryptor = FieldEncryptor::new(cipher, prover);
        (ClaimPipeline::new(gw, encryptor, board.clone()), board)
    }

    fn pipeline_with(
        transport: Arc<RecordingTransport>,
        identity: Option<Address>,
        prover: Arc<dyn ProofSystem>,
    ) -> (ClaimPipeline, Arc<NoticeBoard>) {
        pipeline_over(transport, identity, Arc::new(Base64Placeholder), prover)
    }

    /// Cipher that refuses one plaintext.
    struct RefusingCipher(&'static str);

    impl FieldCipher for RefusingCipher {
        fn scheme(&self) -> &'static str {
            "refusing"
        }

        fn encrypt(&self, plaintext: &str) -> Result<EncryptedField, CryptoError> {
            if plaintext == self.0 {
                return Err(CryptoError::Encoding(format!("cannot encrypt {plaintext:?}")));
            }
            Base64Placeholder.encrypt(plaintext)
        }

        fn decrypt(&self, field: &EncryptedField) -> Result<String, CryptoError> {
            Base64Placeholder.decrypt(field)
        }
    }

    struct BrokenProver;

    impl ProofSystem for BrokenProver {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn generate(&self, _field: &EncryptedField) -> Result<Proof, CryptoError> {
            Err(CryptoError::Proof("prover unavailable".to_string()))
        }
    }

    async fn assert_crypto_failure(p: &ClaimPipeline, board: &NoticeBoard, transport: &RecordingTransport) {
        let mut draft = fender_bender();
        let before = draft.clone();
        let err = p.submit_and_clear(&mut draft).await.unwrap_err();

        assert!(matches!(err, SubmitError::Failed(SubmitFailure::Crypto(_))));
        assert_eq!(err.user_message(), SUBMIT_FAILED);
        assert_eq!(draft, before);
        assert_eq!(transport.send_count(), 0);

        let notices = board.recent(10);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, SUBMIT_FAILED);
        assert!(!p.is_busy());
    }

    #[tokio::test]
    async fn encryption_failure_is_a_generic_failure_without_a_write() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, board) = pipeline_over(
            transport.clone(),
            Some(wallet()),
            Arc::new(RefusingCipher("POL-1")),
            Arc::new(PrefixProof),
        );
        assert_crypto_failure(&p, &board, &transport).await;
    }

    #[tokio::test]
    async fn proof_failure_is_a_generic_failure_without_a_write() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, board) = pipeline_with(transport.clone(), Some(wallet()), Arc::new(BrokenProver));
        assert_crypto_failure(&p, &board, &transport).await;
    }

    #[tokio::test]
    async fn fields_are_encrypted_as_typed() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport.clone(), Some(wallet()));

        let mut d = fender_bender();
        d.amount = " 500 ".to_string();
        d.policy_number = " POL-1 ".to_string();
        p.submit(&d).await.unwrap();

        let sends = transport.sends.lock().unwrap();
        let args = sends[0].1.arguments();
        assert_eq!(decode(&args[1]), " 500 ");
        assert_eq!(decode(&args[2]), " POL-1 ");
    }

    fn pipeline(transport: Arc<RecordingTransport>, identity: Option<Address>) -> (ClaimPipeline, Arc<NoticeBoard>) {
        pipeline_with(transport, identity, Arc::new(PrefixProof))
    }

    fn decode(arg: &CallArg) -> String {
        let CallArg::Bytes(bytes) = arg else {
            panic!("expected bytes, got {arg:?}");
        };
        let field = EncryptedField::from_bytes(bytes).unwrap();
        Base64Placeholder.decrypt(&field).unwrap()
    }

    #[tokio::test]
    async fn fender_bender_submits_six_ordered_arguments() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, board) = pipeline(transport.clone(), Some(wallet()));

        let submitted = p.submit(&fender_bender()).await.unwrap();
        assert_eq!(submitted.claim_id, 1);
        assert!(submitted.tx_hash.is_some());

        let sends = transport.sends.lock().unwrap();
        assert_eq!(sends.len(), 1);
        let (from, call) = &sends[0];
        assert_eq!(*from, wallet());

        let args = call.arguments();
        assert_eq!(args.len(), 6);
        assert_eq!(args[0], CallArg::String("fender bender".to_string()));
        assert_eq!(decode(&args[1]), "500");
        assert_eq!(decode(&args[2]), "POL-1");
        assert_eq!(decode(&args[3]), "auto");
        assert_eq!(decode(&args[4]), "low");

        let expected_proof = PrefixProof.generate(&Base64Placeholder.encrypt("500").unwrap()).unwrap();
        assert_eq!(args[5], CallArg::Bytes(expected_proof.to_bytes()));

        let notices = board.recent(10);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn success_leaves_every_indicator_idle() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport, Some(wallet()));

        p.submit(&fender_bender()).await.unwrap();
        assert!(!p.is_busy());
        assert!(!p.is_submitting());
        assert!(!p.encryptor().is_encrypting());
        assert!(!p.gateway().is_pending());
    }

    #[tokio::test]
    async fn missing_required_text_never_writes() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, board) = pipeline(transport.clone(), Some(wallet()));

        let mut d = fender_bender();
        d.description = String::new();
        assert!(matches!(p.submit(&d).await, Err(SubmitError::Invalid(DraftError::MissingDescription))));

        let mut d = fender_bender();
        d.policy_number = String::new();
        assert!(matches!(p.submit(&d).await, Err(SubmitError::Invalid(DraftError::MissingPolicyNumber))));

        assert_eq!(transport.send_count(), 0);
        assert_eq!(board.len(), 0);
    }

    #[tokio::test]
    async fn bad_amounts_never_write() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport.clone(), Some(wallet()));

        for amount in ["-5", "five hundred"] {
            let mut d = fender_bender();
            d.amount = amount.to_string();
            assert!(matches!(p.submit(&d).await, Err(SubmitError::Invalid(DraftError::InvalidAmount(_)))));
        }
        assert_eq!(transport.send_count(), 0);
    }

    #[tokio::test]
    async fn no_wallet_raises_a_blocking_notice_and_never_writes() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, board) = pipeline(transport.clone(), None);

        let err = p.submit(&fender_bender()).await.unwrap_err();
        assert!(matches!(err, SubmitError::WalletRequired));
        assert_eq!(err.user_message(), WALLET_REQUIRED);
        assert_eq!(transport.send_count(), 0);

        let notices = board.recent(10);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Blocking);
    }

    #[tokio::test]
    async fn failed_write_keeps_the_draft_and_notifies_once() {
        let transport = Arc::new(RecordingTransport::failing("execution reverted"));
        let (p, board) = pipeline(transport.clone(), Some(wallet()));

        let mut draft = fender_bender();
        let before = draft.clone();
        let err = p.submit_and_clear(&mut draft).await.unwrap_err();

        assert!(matches!(err, SubmitError::Failed(SubmitFailure::Gateway(_))));
        assert_eq!(err.user_message(), SUBMIT_FAILED);
        assert_eq!(draft, before);

        let notices = board.recent(10);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, SUBMIT_FAILED);
        assert!(!p.is_busy());
    }

    #[tokio::test]
    async fn successful_submit_and_clear_resets_the_draft() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport, Some(wallet()));

        let mut draft = fender_bender();
        p.submit_and_clear(&mut draft).await.unwrap();
        assert_eq!(draft, ClaimDraft::default());
    }

    #[tokio::test]
    async fn resubmitting_creates_a_new_record() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport.clone(), Some(wallet()));

        let first = p.submit(&fender_bender()).await.unwrap();
        let second = p.submit(&fender_bender()).await.unwrap();
        assert_ne!(first.claim_id, second.claim_id);

        // The placeholder cipher is deterministic, so ciphertexts repeat.
        let sends = transport.sends.lock().unwrap();
        assert_eq!(sends[0].1, sends[1].1);
    }

    #[tokio::test]
    async fn poseidon_proof_covers_the_encrypted_amount() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline_with(transport.clone(), Some(wallet()), Arc::new(PoseidonBinding));
        assert_eq!(p.encryptor().proof_system(), "poseidon");

        p.submit(&fender_bender()).await.unwrap();

        let sends = transport.sends.lock().unwrap();
        let ContractCall::SubmitClaim {
            claim_amount,
            input_proof,
            ..
        } = &sends[0].1
        else {
            panic!("expected submitClaim");
        };
        assert!(PoseidonBinding.verify(claim_amount, input_proof));
    }

    #[tokio::test]
    async fn second_submission_is_refused_while_one_is_in_flight() {
        let transport = Arc::new(HeldTransport::default());
        let gw = Arc::new(ContractGateway::new(
            Arc::new(ContractConfig::for_tests()),
            transport.clone(),
            Some(wallet()),
        ));
        let encryptor = FieldEncryptor::new(Arc::new(Base64Placeholder), Arc::new(PrefixProof));
        let p = Arc::new(ClaimPipeline::new(gw, encryptor, Arc::new(NoticeBoard::new())));

        let first = tokio::spawn({
            let p = p.clone();
            async move { p.submit(&fender_bender()).await }
        });

        while !p.gateway().is_pending() {
            tokio::task::yield_now().await;
        }
        assert!(p.is_busy());
        assert!(matches!(p.submit(&fender_bender()).await, Err(SubmitError::InFlight)));

        transport.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap().claim_id, 9);
        assert!(!p.is_busy());
    }

    #[tokio::test]
    async fn documents_attach_to_a_claim() {
        let transport = Arc::new(RecordingTransport::default());
        let (p, _) = pipeline(transport.clone(), Some(wallet()));

        let document_id = p.attach_document(4, "QmHash", "pdf").await.unwrap();
        assert_eq!(document_id, 1);
        assert!(matches!(
            p.attach_document(0, "QmHash", "pdf").await,
            Err(GatewayError::Malformed(_))
        ));
        assert_eq!(transport.send_count(), 1);
    }
}
