use crate::abi::{ClaimRecord, ClaimStatus, FunctionSchema};
use crate::claims::Priority;
use crate::notice::Notice;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitClaimResponse {
    pub claim_id: u64,
    pub tx_hash: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimInfoResponse {
    /// The id as requested.
    pub claim_id: String,

    /// `None` when there is no data: an id that is not a positive integer, an unknown claim, or a failed read.
    pub claim: Option<ClaimView>,
}

#[derive(Debug, Serialize)]
pub struct ClaimView {
    pub description: String,

    /// Encrypted fields stay opaque; hex of the stored bytes.
    pub amount_hex: String,
    pub policy_number_hex: String,
    pub claim_type_hex: String,

    pub status: ClaimStatus,
    pub status_code: u8,
    pub priority: Option<Priority>,
    pub priority_level: u8,
    pub is_active: bool,
    pub is_verified: bool,
    pub claimant: String,
    pub insurer: String,
    pub submission_time: u64,
    pub last_updated: u64,
}

impl From<ClaimRecord> for ClaimView {
    fn from(r: ClaimRecord) -> Self {
        Self {
            amount_hex: hex::encode(&r.amount),
            policy_number_hex: hex::encode(&r.policy_number),
            claim_type_hex: hex::encode(&r.claim_type),
            status: r.status(),
            status_code: r.status,
            priority: Priority::from_level(r.priority),
            priority_level: r.priority,
            is_active: r.is_active,
            is_verified: r.is_verified,
            claimant: r.claimant.to_string(),
            insurer: r.insurer.to_string(),
            submission_time: r.submission_time,
            last_updated: r.last_updated,
            description: r.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadDocumentRequest {
    /// Content hash of the document (e.g. an IPFS CID). The file itself is never sent.
    pub document_hash: String,
    pub document_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadDocumentResponse {
    pub claim_id: u64,
    pub document_id: u64,
}

#[derive(Debug, Serialize)]
pub struct ContractInfoResponse {
    pub address: String,
    pub network: String,
    pub chain_id: Option<u64>,
    pub deployed_at: String,
    pub functions: &'static [FunctionSchema],
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub wallet: Option<String>,
    pub connected: bool,
    pub submitting: bool,
    pub encrypting: bool,
    pub pending: bool,
    pub cipher: &'static str,
    pub proof_system: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct NoticeParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct NoticeListResponse {
    pub notices: Vec<Notice>,
}
