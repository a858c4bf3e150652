mod abi;
mod activity;
mod api;
mod claims;
mod config;
mod errors;
mod evm;
mod gateway;
mod ledger;
mod models;
mod notice;
mod pipeline;
mod state;

use crate::config::{ConfigError, ContractBackend, ContractConfig, DeploymentInfo, ProofSystemKind, Settings};
use crate::errors::ApiError;
use crate::evm::EvmTransport;
use crate::gateway::{ContractGateway, ContractTransport};
use crate::ledger::LocalLedger;
use crate::notice::NoticeBoard;
use crate::pipeline::{ClaimPipeline, FieldEncryptor};
use crate::state::AppState;
use alloy::primitives::Address;
use claim_crypto::{Base64Placeholder, FieldCipher, PoseidonBinding, PrefixProof, ProofSystem};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;

    // Local state lives under DATA_DIR (ignored by git).
    std::fs::create_dir_all(&settings.data_dir).map_err(|_| ApiError::Internal)?;

    let identity = settings.identity()?;
    if identity.is_none() {
        tracing::warn!("no wallet configured; claim submissions will be refused");
    }

    let cipher: Arc<dyn FieldCipher> = Arc::new(Base64Placeholder);
    let prover: Arc<dyn ProofSystem> = match settings.proof_system {
        ProofSystemKind::Prefix => Arc::new(PrefixProof),
        ProofSystemKind::Poseidon => Arc::new(PoseidonBinding),
    };

    let (transport, deployment): (Arc<dyn ContractTransport>, DeploymentInfo) = match settings.backend {
        ContractBackend::Local => {
            let deployer = identity.unwrap_or(Address::ZERO);
            let deployment = load_or_deploy_local(&settings, deployer)?;

            let db_path = settings.data_dir.join("ledger.sqlite");
            let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
            let ledger = LocalLedger::open(&db_url, cipher.clone(), prover.clone(), deployer).await?;
            (Arc::new(ledger), deployment)
        }
        ContractBackend::Evm => {
            let rpc_url = settings.rpc_url.clone().ok_or(ConfigError::Missing("RPC_URL"))?;
            let deployment = DeploymentInfo::load(&settings.deployment_file)?;
            let transport = EvmTransport::new(rpc_url, settings.signer()?);
            if identity.is_some() && !transport.can_sign() {
                tracing::warn!("WALLET_ADDRESS without PRIVATE_KEY; transactions cannot be signed");
            }
            (Arc::new(transport), deployment)
        }
    };

    let contract = Arc::new(ContractConfig::from_deployment(&deployment)?);
    tracing::info!(
        address = %contract.address,
        network = %contract.network,
        backend = ?settings.backend,
        "contract loaded"
    );

    let notices = Arc::new(NoticeBoard::new());
    let gateway = Arc::new(ContractGateway::new(contract, transport, identity));
    let pipeline = Arc::new(ClaimPipeline::new(
        gateway.clone(),
        FieldEncryptor::new(cipher, prover),
        notices.clone(),
    ));

    let state = AppState::new(pipeline, gateway, notices, settings.api_key.as_str());

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(addr = %settings.bind_addr, "backend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(())
}

/// Read the deployment record, writing one for the local ledger on first start.
fn load_or_deploy_local(settings: &Settings, deployer: Address) -> Result<DeploymentInfo, ConfigError> {
    if settings.deployment_file.exists() {
        return DeploymentInfo::load(&settings.deployment_file);
    }

    let deployment = DeploymentInfo::new(LocalLedger::deployment_address(deployer), settings.network.clone());
    deployment.save(&settings.deployment_file)?;
    tracing::info!(
        address = %deployment.address,
        path = %settings.deployment_file.display(),
        "local ledger deployed"
    );
    Ok(deployment)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
