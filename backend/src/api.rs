use crate::abi::SCHEMA;
use crate::claims::ClaimDraft;
use crate::errors::ApiError;
use crate::models::*;
use crate::notice::SUBMIT_SUCCEEDED;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_NOTICE_LIMIT: usize = 20;
const MAX_NOTICE_LIMIT: usize = 100;

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/claims", post(submit_claim))
        .route("/api/v1/claims/:id/documents", post(upload_document))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/contract", get(get_contract))
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/claims/:id", get(get_claim))
        .route("/api/v1/notices", get(list_notices))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(provided_key) = headers.get("X-API-KEY") {
        if provided_key.as_bytes() == state.api_key.as_bytes() {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!("unauthorized access attempt");
    Err(StatusCode::UNAUTHORIZED)
}

async fn get_contract(State(state): State<AppState>) -> Json<ContractInfoResponse> {
    let contract = state.gateway.contract();
    Json(ContractInfoResponse {
        address: contract.address.to_string(),
        network: contract.network.clone(),
        chain_id: contract.chain_id(),
        deployed_at: contract.deployed_at_iso(),
        functions: &SCHEMA,
    })
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let encryptor = state.pipeline.encryptor();
    Json(StatusResponse {
        wallet: state.gateway.identity().map(|a| a.to_string()),
        connected: state.gateway.is_connected(),
        submitting: state.pipeline.is_submitting(),
        encrypting: encryptor.is_encrypting(),
        pending: state.gateway.is_pending(),
        cipher: encryptor.scheme(),
        proof_system: encryptor.proof_system(),
    })
}

async fn get_claim(State(state): State<AppState>, Path(id): Path<String>) -> Json<ClaimInfoResponse> {
    // Anything that is not a positive integer is "no data", like a zero id.
    let claim = match id.parse::<u64>() {
        Ok(claim_id) => state.gateway.claim_info(claim_id).await.map(ClaimView::from),
        Err(_) => None,
    };
    Json(ClaimInfoResponse { claim_id: id, claim })
}

async fn list_notices(State(state): State<AppState>, Query(params): Query<NoticeParams>) -> Json<NoticeListResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_NOTICE_LIMIT).min(MAX_NOTICE_LIMIT);
    Json(NoticeListResponse {
        notices: state.notices.recent(limit),
    })
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "write task failed");
    ApiError::Internal
}

/// Writes run detached so a dropped connection cannot abort an issued transaction.
async fn submit_claim(
    State(state): State<AppState>,
    Json(draft): Json<ClaimDraft>,
) -> Result<Json<SubmitClaimResponse>, ApiError> {
    let pipeline = state.pipeline.clone();
    let submitted = tokio::spawn(async move { pipeline.submit(&draft).await })
        .await
        .map_err(join_error)??;

    Ok(Json(SubmitClaimResponse {
        claim_id: submitted.claim_id,
        tx_hash: submitted.tx_hash,
        message: SUBMIT_SUCCEEDED.to_string(),
    }))
}

async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UploadDocumentRequest>,
) -> Result<Json<UploadDocumentResponse>, ApiError> {
    let claim_id = u64::try_from(id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest("claim id must be positive".to_string()))?;

    let pipeline = state.pipeline.clone();
    let document_id = tokio::spawn(async move {
        pipeline
            .attach_document(claim_id, &req.document_hash, &req.document_type)
            .await
    })
    .await
    .map_err(join_error)??;

    Ok(Json(UploadDocumentResponse { claim_id, document_id }))
}
