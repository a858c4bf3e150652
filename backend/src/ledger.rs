//! sqlite stand-in for the FHELockClaims contract.
//!
//! Enforces the contract's revert conditions so the whole submission path can
//! run without a chain. Encrypted fields are stored exactly as submitted.

use crate::abi::{CallOutput, ClaimRecord, ContractCall};
use crate::claims::Priority;
use crate::config::ContractConfig;
use crate::gateway::{ContractTransport, TransportError, WriteReceipt};
use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::Utc;
use claim_crypto::{EncryptedField, FieldCipher, Proof, ProofSystem};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

pub type Db = Pool<Sqlite>;

pub async fn connect(db_url: &str) -> Result<Db, sqlx::Error> {
    // Every in-memory connection is its own database.
    let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
}

pub async fn init_schema(db: &Db) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS claims (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  description TEXT NOT NULL,
  amount BLOB NOT NULL,
  policy_number BLOB NOT NULL,
  claim_type BLOB NOT NULL,
  priority BLOB NOT NULL,
  priority_level INTEGER NOT NULL,
  input_proof BLOB NOT NULL,
  status INTEGER NOT NULL,
  is_active INTEGER NOT NULL,
  is_verified INTEGER NOT NULL,
  claimant TEXT NOT NULL,
  insurer TEXT NOT NULL,
  submission_time INTEGER NOT NULL,
  last_updated INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  claim_id INTEGER NOT NULL REFERENCES claims(id),
  document_hash TEXT NOT NULL,
  document_type TEXT NOT NULL,
  uploaded_by TEXT NOT NULL,
  uploaded_at INTEGER NOT NULL
);
"#,
    )
    .execute(db)
    .await?;

    Ok(())
}

fn ledger_error(e: sqlx::Error) -> TransportError {
    TransportError::Rpc(format!("ledger: {e}"))
}

fn revert(reason: &str) -> TransportError {
    TransportError::Rejected(format!("execution reverted: {reason}"))
}

pub struct LocalLedger {
    db: Db,
    cipher: Arc<dyn FieldCipher>,
    prover: Arc<dyn ProofSystem>,
    insurer: Address,
}

impl LocalLedger {
    pub async fn open(
        db_url: &str,
        cipher: Arc<dyn FieldCipher>,
        prover: Arc<dyn ProofSystem>,
        insurer: Address,
    ) -> Result<Self, sqlx::Error> {
        let db = connect(db_url).await?;
        init_schema(&db).await?;
        Ok(Self {
            db,
            cipher,
            prover,
            insurer,
        })
    }

    /// Address a deployer's first contract creation lands on.
    pub fn deployment_address(deployer: Address) -> Address {
        deployer.create(0)
    }

    /// The contract's own evaluation of the encrypted priority.
    fn priority_level(&self, priority: &EncryptedField) -> Option<u8> {
        let plaintext = self.cipher.decrypt(priority).ok()?;
        plaintext.parse::<Priority>().ok().map(Priority::level)
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_claim(
        &self,
        from: Address,
        description: &str,
        amount: &EncryptedField,
        policy_number: &EncryptedField,
        claim_type: &EncryptedField,
        priority: &EncryptedField,
        input_proof: &Proof,
    ) -> Result<u64, TransportError> {
        if description.is_empty() || input_proof.as_str().is_empty() {
            return Err(revert("invalid input"));
        }
        if !self.prover.verify(amount, input_proof) {
            return Err(revert("invalid proof"));
        }
        let priority_level = self.priority_level(priority).ok_or_else(|| revert("invalid priority"))?;

        let now = Utc::now().timestamp();
        let result = sqlx::query(
            r#"INSERT INTO claims
               (description, amount, policy_number, claim_type, priority, priority_level, input_proof,
                status, is_active, is_verified, claimant, insurer, submission_time, last_updated)
               VALUES (?, ?, ?, ?, ?, ?, ?, 0, 1, 0, ?, ?, ?, ?)"#,
        )
        .bind(description)
        .bind(amount.to_bytes())
        .bind(policy_number.to_bytes())
        .bind(claim_type.to_bytes())
        .bind(priority.to_bytes())
        .bind(priority_level as i64)
        .bind(input_proof.to_bytes())
        .bind(from.to_string())
        .bind(self.insurer.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ledger_error)?;

        let claim_id = result.last_insert_rowid() as u64;
        info!(claim_id, claimant = %from, "ledger: claim stored");
        Ok(claim_id)
    }

    async fn upload_document(
        &self,
        from: Address,
        claim_id: u64,
        document_hash: &str,
        document_type: &str,
    ) -> Result<u64, TransportError> {
        let row = sqlx::query(r#"SELECT claimant, is_active FROM claims WHERE id = ?"#)
            .bind(claim_id as i64)
            .fetch_optional(&self.db)
            .await
            .map_err(ledger_error)?;

        let Some(row) = row else {
            return Err(revert("claim does not exist"));
        };
        let claimant: String = row.get(0);
        let is_active: i64 = row.get(1);

        if is_active != 1 {
            return Err(revert("claim is not active"));
        }
        if claimant != from.to_string() {
            return Err(revert("only the claimant can upload documents"));
        }

        let now = Utc::now().timestamp();
        let result = sqlx::query(
            r#"INSERT INTO documents (claim_id, document_hash, document_type, uploaded_by, uploaded_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(claim_id as i64)
        .bind(document_hash)
        .bind(document_type)
        .bind(from.to_string())
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(ledger_error)?;

        sqlx::query(r#"UPDATE claims SET last_updated = ? WHERE id = ?"#)
            .bind(now)
            .bind(claim_id as i64)
            .execute(&self.db)
            .await
            .map_err(ledger_error)?;

        Ok(result.last_insert_rowid() as u64)
    }

    async fn claim_info(&self, claim_id: u64) -> Result<ClaimRecord, TransportError> {
        let row = sqlx::query(
            r#"SELECT description, amount, policy_number, claim_type, status, priority_level,
                      is_active, is_verified, claimant, insurer, submission_time, last_updated
               FROM claims WHERE id = ?"#,
        )
        .bind(claim_id as i64)
        .fetch_optional(&self.db)
        .await
        .map_err(ledger_error)?;

        let Some(row) = row else {
            return Err(revert("claim does not exist"));
        };

        let address = |i: usize| -> Result<Address, TransportError> {
            let s: String = row.get(i);
            Address::from_str(&s).map_err(|e| TransportError::Decode(format!("stored address {s:?}: {e}")))
        };
        let status: i64 = row.get(4);
        let priority: i64 = row.get(5);
        let is_active: i64 = row.get(6);
        let is_verified: i64 = row.get(7);
        let submission_time: i64 = row.get(10);
        let last_updated: i64 = row.get(11);

        Ok(ClaimRecord {
            claim_id,
            description: row.get(0),
            amount: row.get(1),
            policy_number: row.get(2),
            claim_type: row.get(3),
            status: status as u8,
            priority: priority as u8,
            is_active: is_active == 1,
            is_verified: is_verified == 1,
            claimant: address(8)?,
            insurer: address(9)?,
            submission_time: submission_time as u64,
            last_updated: last_updated as u64,
        })
    }
}

#[async_trait]
impl ContractTransport for LocalLedger {
    async fn call(&self, _contract: &ContractConfig, call: &ContractCall) -> Result<CallOutput, TransportError> {
        match call {
            ContractCall::GetClaimInfo { claim_id } => Ok(CallOutput::ClaimInfo(self.claim_info(*claim_id).await?)),
            _ => Err(TransportError::Unsupported("the local ledger only simulates view calls")),
        }
    }

    async fn send(
        &self,
        contract: &ContractConfig,
        from: Address,
        call: &ContractCall,
    ) -> Result<WriteReceipt, TransportError> {
        debug!(contract = %contract.address, function = call.function().name(), "ledger: applying call");

        let output = match call {
            ContractCall::SubmitClaim {
                description,
                claim_amount,
                policy_number,
                claim_type,
                priority,
                input_proof,
            } => CallOutput::ClaimId(
                self.submit_claim(from, description, claim_amount, policy_number, claim_type, priority, input_proof)
                    .await?,
            ),
            ContractCall::UploadDocument {
                claim_id,
                document_hash,
                document_type,
            } => CallOutput::DocumentId(self.upload_document(from, *claim_id, document_hash, document_type).await?),
            ContractCall::GetClaimInfo { .. } => {
                return Err(TransportError::Unsupported("getClaimInfo is a view function"));
            }
        };

        // Local "transactions" have no chain hash; a random id keeps logs correlatable.
        Ok(WriteReceipt {
            tx_hash: Some(format!("local-{}", Uuid::new_v4())),
            output,
        })
    }
}
