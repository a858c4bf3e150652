//! Fixed interface of the FHELockClaims contract.
//!
//! The alloy bindings drive the EVM transport. The static schema table is what
//! the gateway validates calls against and what `/api/v1/contract` reports.

use alloy::primitives::Address;
use alloy::sol;
use claim_crypto::{EncryptedField, Proof};
use serde::Serialize;
use thiserror::Error;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IFHELockClaims {
        function submitClaim(
            string _description,
            bytes _claimAmount,
            bytes _policyNumber,
            bytes _claimType,
            bytes _priority,
            bytes inputProof
        ) external returns (uint256);

        function uploadDocument(
            uint256 _claimId,
            string _documentHash,
            string _documentType
        ) external returns (uint256);

        function getClaimInfo(uint256 _claimId) external view returns (
            string description,
            uint8 amount,
            uint8 policyNumber,
            uint8 claimType,
            uint8 status,
            uint8 priority,
            bool isActive,
            bool isVerified,
            address claimant,
            address insurer,
            uint256 submissionTime,
            uint256 lastUpdated
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutability {
    Nonpayable,
    View,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: &'static str,
}

const fn param(name: &'static str, ty: &'static str) -> Param {
    Param { name, ty }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FunctionSchema {
    pub name: &'static str,
    pub inputs: &'static [Param],
    pub outputs: &'static [Param],
    pub state_mutability: StateMutability,
}

pub const SUBMIT_CLAIM: FunctionSchema = FunctionSchema {
    name: "submitClaim",
    inputs: &[
        param("_description", "string"),
        param("_claimAmount", "bytes"),
        param("_policyNumber", "bytes"),
        param("_claimType", "bytes"),
        param("_priority", "bytes"),
        param("inputProof", "bytes"),
    ],
    outputs: &[param("", "uint256")],
    state_mutability: StateMutability::Nonpayable,
};

pub const UPLOAD_DOCUMENT: FunctionSchema = FunctionSchema {
    name: "uploadDocument",
    inputs: &[
        param("_claimId", "uint256"),
        param("_documentHash", "string"),
        param("_documentType", "string"),
    ],
    outputs: &[param("", "uint256")],
    state_mutability: StateMutability::Nonpayable,
};

pub const GET_CLAIM_INFO: FunctionSchema = FunctionSchema {
    name: "getClaimInfo",
    inputs: &[param("_claimId", "uint256")],
    outputs: &[
        param("description", "string"),
        param("amount", "uint8"),
        param("policyNumber", "uint8"),
        param("claimType", "uint8"),
        param("status", "uint8"),
        param("priority", "uint8"),
        param("isActive", "bool"),
        param("isVerified", "bool"),
        param("claimant", "address"),
        param("insurer", "address"),
        param("submissionTime", "uint256"),
        param("lastUpdated", "uint256"),
    ],
    state_mutability: StateMutability::View,
};

/// Every function the client is allowed to call.
pub const SCHEMA: [FunctionSchema; 3] = [SUBMIT_CLAIM, UPLOAD_DOCUMENT, GET_CLAIM_INFO];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractFunction {
    SubmitClaim,
    UploadDocument,
    GetClaimInfo,
}

impl ContractFunction {
    pub fn schema(self) -> &'static FunctionSchema {
        match self {
            ContractFunction::SubmitClaim => &SUBMIT_CLAIM,
            ContractFunction::UploadDocument => &UPLOAD_DOCUMENT,
            ContractFunction::GetClaimInfo => &GET_CLAIM_INFO,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    pub fn is_view(self) -> bool {
        self.schema().state_mutability == StateMutability::View
    }
}

/// One positional argument of a contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallArg {
    String(String),
    Bytes(Vec<u8>),
    Uint(u64),
}

impl CallArg {
    pub fn abi_type(&self) -> &'static str {
        match self {
            CallArg::String(_) => "string",
            CallArg::Bytes(_) => "bytes",
            CallArg::Uint(_) => "uint256",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedCall {
    #[error("{function} expects {expected} arguments, got {got}")]
    Arity {
        function: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{function} argument {index} must be {expected}, got {got}")]
    ArgType {
        function: &'static str,
        index: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("{function}: {field} must not be empty")]
    Empty {
        function: &'static str,
        field: &'static str,
    },

    #[error("{function}: claim id must be positive")]
    ClaimId { function: &'static str },
}

/// A typed call against the contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    SubmitClaim {
        description: String,
        claim_amount: EncryptedField,
        policy_number: EncryptedField,
        claim_type: EncryptedField,
        priority: EncryptedField,
        input_proof: Proof,
    },
    UploadDocument {
        claim_id: u64,
        document_hash: String,
        document_type: String,
    },
    GetClaimInfo {
        claim_id: u64,
    },
}

impl ContractCall {
    pub fn function(&self) -> ContractFunction {
        match self {
            ContractCall::SubmitClaim { .. } => ContractFunction::SubmitClaim,
            ContractCall::UploadDocument { .. } => ContractFunction::UploadDocument,
            ContractCall::GetClaimInfo { .. } => ContractFunction::GetClaimInfo,
        }
    }

    /// Arguments in contract order.
    pub fn arguments(&self) -> Vec<CallArg> {
        match self {
            ContractCall::SubmitClaim {
                description,
                claim_amount,
                policy_number,
                claim_type,
                priority,
                input_proof,
            } => vec![
                CallArg::String(description.clone()),
                CallArg::Bytes(claim_amount.to_bytes()),
                CallArg::Bytes(policy_number.to_bytes()),
                CallArg::Bytes(claim_type.to_bytes()),
                CallArg::Bytes(priority.to_bytes()),
                CallArg::Bytes(input_proof.to_bytes()),
            ],
            ContractCall::UploadDocument {
                claim_id,
                document_hash,
                document_type,
            } => vec![
                CallArg::Uint(*claim_id),
                CallArg::String(document_hash.clone()),
                CallArg::String(document_type.clone()),
            ],
            ContractCall::GetClaimInfo { claim_id } => vec![CallArg::Uint(*claim_id)],
        }
    }

    /// The predicate reads are gated on. A failing key means "no data", not an error.
    pub fn has_valid_key(&self) -> bool {
        match self {
            ContractCall::SubmitClaim { .. } => true,
            ContractCall::UploadDocument { claim_id, .. } | ContractCall::GetClaimInfo { claim_id } => {
                *claim_id > 0
            }
        }
    }

    /// Caller-side argument checks, run before anything leaves the process.
    pub fn validate(&self) -> Result<(), MalformedCall> {
        let schema = self.function().schema();
        let args = self.arguments();

        if args.len() != schema.inputs.len() {
            return Err(MalformedCall::Arity {
                function: schema.name,
                expected: schema.inputs.len(),
                got: args.len(),
            });
        }
        for (index, (arg, p)) in args.iter().zip(schema.inputs).enumerate() {
            if arg.abi_type() != p.ty {
                return Err(MalformedCall::ArgType {
                    function: schema.name,
                    index,
                    expected: p.ty,
                    got: arg.abi_type(),
                });
            }
        }

        let empty = |field: &'static str| MalformedCall::Empty {
            function: schema.name,
            field,
        };

        match self {
            ContractCall::SubmitClaim {
                description,
                claim_amount,
                policy_number,
                input_proof,
                ..
            } => {
                if description.trim().is_empty() {
                    return Err(empty("description"));
                }
                if claim_amount.is_empty() {
                    return Err(empty("claim amount"));
                }
                if policy_number.is_empty() {
                    return Err(empty("policy number"));
                }
                if input_proof.as_str().is_empty() {
                    return Err(empty("input proof"));
                }
            }
            ContractCall::UploadDocument {
                document_hash,
                document_type,
                ..
            } => {
                if !self.has_valid_key() {
                    return Err(MalformedCall::ClaimId { function: schema.name });
                }
                if document_hash.trim().is_empty() {
                    return Err(empty("document hash"));
                }
                if document_type.trim().is_empty() {
                    return Err(empty("document type"));
                }
            }
            ContractCall::GetClaimInfo { .. } => {
                if !self.has_valid_key() {
                    return Err(MalformedCall::ClaimId { function: schema.name });
                }
            }
        }

        Ok(())
    }
}

/// Status codes as the dashboard labels them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Encrypted,
    Settled,
    Unknown,
}

impl ClaimStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => ClaimStatus::Pending,
            1 => ClaimStatus::Encrypted,
            2 => ClaimStatus::Settled,
            _ => ClaimStatus::Unknown,
        }
    }
}

/// Contract-held claim, as returned by `getClaimInfo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRecord {
    pub claim_id: u64,
    pub description: String,
    /// Encrypted fields are opaque. Chains that expose FHE handles report a single byte.
    pub amount: Vec<u8>,
    pub policy_number: Vec<u8>,
    pub claim_type: Vec<u8>,
    pub status: u8,
    pub priority: u8,
    pub is_active: bool,
    pub is_verified: bool,
    pub claimant: Address,
    pub insurer: Address,
    pub submission_time: u64,
    pub last_updated: u64,
}

impl ClaimRecord {
    pub fn status(&self) -> ClaimStatus {
        ClaimStatus::from_code(self.status)
    }
}

/// Decoded result of a contract call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutput {
    ClaimId(u64),
    DocumentId(u64),
    ClaimInfo(ClaimRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_call() -> ContractCall {
        ContractCall::SubmitClaim {
            description: "fender bender".to_string(),
            claim_amount: EncryptedField::new("NTAw"),
            policy_number: EncryptedField::new("UE9MLTE="),
            claim_type: EncryptedField::new("YXV0bw=="),
            priority: EncryptedField::new("bG93"),
            input_proof: Proof::new("proof_NTAw"),
        }
    }

    #[test]
    fn schema_lists_the_three_functions() {
        let names: Vec<_> = SCHEMA.iter().map(|f| f.name).collect();
        assert_eq!(names, ["submitClaim", "uploadDocument", "getClaimInfo"]);
        assert!(ContractFunction::GetClaimInfo.is_view());
        assert!(!ContractFunction::SubmitClaim.is_view());
        assert_eq!(GET_CLAIM_INFO.outputs.len(), 12);
    }

    #[test]
    fn submit_arguments_follow_contract_order() {
        let args = submit_call().arguments();
        assert_eq!(
            args,
            vec![
                CallArg::String("fender bender".to_string()),
                CallArg::Bytes(b"NTAw".to_vec()),
                CallArg::Bytes(b"UE9MLTE=".to_vec()),
                CallArg::Bytes(b"YXV0bw==".to_vec()),
                CallArg::Bytes(b"bG93".to_vec()),
                CallArg::Bytes(b"proof_NTAw".to_vec()),
            ]
        );
        assert_eq!(submit_call().validate(), Ok(()));
    }

    #[test]
    fn empty_submit_fields_are_malformed() {
        let ContractCall::SubmitClaim {
            claim_amount,
            policy_number,
            claim_type,
            priority,
            input_proof,
            ..
        } = submit_call()
        else {
            unreachable!()
        };
        let call = ContractCall::SubmitClaim {
            description: " ".to_string(),
            claim_amount,
            policy_number,
            claim_type,
            priority,
            input_proof,
        };
        assert!(matches!(call.validate(), Err(MalformedCall::Empty { field: "description", .. })));
    }

    #[test]
    fn claim_id_zero_is_not_a_valid_key() {
        let read = ContractCall::GetClaimInfo { claim_id: 0 };
        assert!(!read.has_valid_key());
        assert!(matches!(read.validate(), Err(MalformedCall::ClaimId { .. })));

        let upload = ContractCall::UploadDocument {
            claim_id: 0,
            document_hash: "Qm123".to_string(),
            document_type: "pdf".to_string(),
        };
        assert!(matches!(upload.validate(), Err(MalformedCall::ClaimId { .. })));
        assert!(ContractCall::GetClaimInfo { claim_id: 7 }.has_valid_key());
    }

    #[test]
    fn status_codes_map_to_dashboard_labels() {
        assert_eq!(ClaimStatus::from_code(0), ClaimStatus::Pending);
        assert_eq!(ClaimStatus::from_code(1), ClaimStatus::Encrypted);
        assert_eq!(ClaimStatus::from_code(2), ClaimStatus::Settled);
        assert_eq!(ClaimStatus::from_code(200), ClaimStatus::Unknown);
    }
}
