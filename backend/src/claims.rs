//! Client-side claim drafts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Auto,
    Property,
    Health,
    Life,
    Travel,
    Other,
}

impl ClaimType {
    pub const ALL: [ClaimType; 6] = [
        ClaimType::Auto,
        ClaimType::Property,
        ClaimType::Health,
        ClaimType::Life,
        ClaimType::Travel,
        ClaimType::Other,
    ];

    /// Plaintext fed to the cipher.
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimType::Auto => "auto",
            ClaimType::Property => "property",
            ClaimType::Health => "health",
            ClaimType::Life => "life",
            ClaimType::Travel => "travel",
            ClaimType::Other => "other",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimType {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClaimType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DraftError::UnknownClaimType(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Small-integer level the contract reports for this priority.
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Priority::ALL.get(level as usize).copied()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DraftError::UnknownPriority(s.to_string()))
    }
}

/// Supporting file listed on a draft. Never encrypted, never uploaded by `submit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAttachment {
    pub name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("claim type is required")]
    MissingClaimType,

    #[error("description is required")]
    MissingDescription,

    #[error("amount is required")]
    MissingAmount,

    #[error("amount must be a non-negative number, got {0:?}")]
    InvalidAmount(String),

    #[error("policy number is required")]
    MissingPolicyNumber,

    #[error("unknown claim type {0:?}")]
    UnknownClaimType(String),

    #[error("unknown priority {0:?}")]
    UnknownPriority(String),
}

/// A claim as the claimant is filling it in.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimDraft {
    pub claim_type: Option<ClaimType>,
    pub description: String,
    pub amount: String,
    pub policy_number: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub documents: Vec<DocumentAttachment>,
}

impl ClaimDraft {
    /// Check the fields the submission form marks as required.
    ///
    /// Returns the selected claim type so callers don't unwrap it again.
    pub fn validate(&self) -> Result<ClaimType, DraftError> {
        let claim_type = self.claim_type.ok_or(DraftError::MissingClaimType)?;

        if self.description.trim().is_empty() {
            return Err(DraftError::MissingDescription);
        }

        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(DraftError::MissingAmount);
        }
        match amount.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => return Err(DraftError::InvalidAmount(self.amount.clone())),
        }

        if self.policy_number.trim().is_empty() {
            return Err(DraftError::MissingPolicyNumber);
        }

        Ok(claim_type)
    }

    /// Reset to an empty form.
    pub fn clear(&mut self) {
        *self = ClaimDraft::default();
    }
}


#[cfg(test)]
pub(crate) use tests::fender_bender;
