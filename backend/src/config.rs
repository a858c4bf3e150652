//! Process settings and the contract deployment record.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("deployment record i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("deployment record json: {0}")]
    Json(#[from] serde_json::Error),
}

/// `deployedAt` is written the way `Date.toISOString()` writes it.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Record produced by a deployment and read at start to locate the contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub address: String,
    pub network: String,
    #[serde(rename = "deployedAt", with = "iso_millis")]
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentInfo {
    pub fn new(address: Address, network: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            network: network.into(),
            deployed_at: Utc::now(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Validate a 0x-prefixed, 20-byte hex address.
fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    if !value.starts_with("0x") {
        return Err(ConfigError::Invalid(format!("{field} must start with 0x")));
    }
    if value.len() != 42 {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 42 characters (0x + 40 hex), got {}",
            value.len()
        )));
    }
    if !value[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid(format!("{field} must contain only hex characters after 0x")));
    }
    Address::from_str(value).map_err(|e| ConfigError::Invalid(format!("{field}: {e}")))
}

/// Chain id of the well-known networks a deployment record may name.
pub fn chain_id_for_network(network: &str) -> Option<u64> {
    match network {
        "mainnet" => Some(1),
        "sepolia" => Some(11_155_111),
        "holesky" => Some(17_000),
        "localhost" | "hardhat" | "anvil" => Some(31_337),
        _ => None,
    }
}

/// Immutable location of the claims contract, shared read-only by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractConfig {
    pub address: Address,
    pub network: String,
    pub deployed_at: DateTime<Utc>,
}

impl ContractConfig {
    pub fn from_deployment(info: &DeploymentInfo) -> Result<Self, ConfigError> {
        if info.network.trim().is_empty() {
            return Err(ConfigError::Invalid("network cannot be empty".to_string()));
        }
        Ok(Self {
            address: parse_address("address", &info.address)?,
            network: info.network.clone(),
            deployed_at: info.deployed_at,
        })
    }

    pub fn chain_id(&self) -> Option<u64> {
        chain_id_for_network(&self.network)
    }

    pub fn deployed_at_iso(&self) -> String {
        self.deployed_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            address: Address::repeat_byte(0xc1),
            network: "localhost".to_string(),
            deployed_at: DateTime::parse_from_rfc3339("2025-01-01T00:00:00.000Z")
                .map(|t| t.with_timezone(&Utc))
                .unwrap(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractBackend {
    /// sqlite stand-in for the contract.
    Local,
    /// JSON-RPC against a deployed contract.
    Evm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofSystemKind {
    Prefix,
    Poseidon,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub deployment_file: PathBuf,
    pub backend: ContractBackend,
    pub network: String,
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub wallet_address: Option<String>,
    pub proof_system: ProofSystemKind,
    pub api_key: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key/value source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("CONTRACT_BACKEND").as_deref() {
            None | Some("local") => ContractBackend::Local,
            Some("evm") => ContractBackend::Evm,
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "CONTRACT_BACKEND must be 'local' or 'evm', got {other:?}"
                )));
            }
        };

        let proof_system = match get("PROOF_SYSTEM").as_deref() {
            None | Some("prefix") => ProofSystemKind::Prefix,
            Some("poseidon") => ProofSystemKind::Poseidon,
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "PROOF_SYSTEM must be 'prefix' or 'poseidon', got {other:?}"
                )));
            }
        };

        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let deployment_file = get("DEPLOYMENT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("contract-info.json"));

        let network = get("NETWORK").unwrap_or_else(|| match backend {
            ContractBackend::Local => "localhost".to_string(),
            ContractBackend::Evm => "sepolia".to_string(),
        });

        let settings = Self {
            bind_addr: get("BACKEND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            data_dir,
            deployment_file,
            backend,
            network,
            rpc_url: get("RPC_URL"),
            private_key: get("PRIVATE_KEY"),
            wallet_address: get("WALLET_ADDRESS"),
            proof_system,
            api_key: get("API_KEY").unwrap_or_else(|| "dev-secret-key".to_string()),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == ContractBackend::Evm {
            let rpc_url = self.rpc_url.as_deref().ok_or(ConfigError::Missing("RPC_URL"))?;
            if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
                return Err(ConfigError::Invalid("RPC_URL must start with http:// or https://".to_string()));
            }
        }

        if let Some(pk) = &self.private_key {
            if !pk.starts_with("0x") || pk.len() != 66 || !pk[2..].chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Invalid(
                    "PRIVATE_KEY must be 0x followed by 64 hex characters".to_string(),
                ));
            }
        }

        if let Some(addr) = &self.wallet_address {
            parse_address("WALLET_ADDRESS", addr)?;
        }

        if self.api_key.len() < 8 {
            return Err(ConfigError::Invalid("API_KEY must be at least 8 characters".to_string()));
        }

        Ok(())
    }

    pub fn signer(&self) -> Result<Option<PrivateKeySigner>, ConfigError> {
        self.private_key
            .as_deref()
            .map(|pk| {
                pk.parse::<PrivateKeySigner>()
                    .map_err(|e| ConfigError::Invalid(format!("PRIVATE_KEY: {e}")))
            })
            .transpose()
    }

    /// Wallet the service acts as. A configured key wins over a bare address.
    pub fn identity(&self) -> Result<Option<Address>, ConfigError> {
        if let Some(signer) = self.signer()? {
            return Ok(Some(signer.address()));
        }
        self.wallet_address
            .as_deref()
            .map(|a| parse_address("WALLET_ADDRESS", a))
            .transpose()
    }
}
