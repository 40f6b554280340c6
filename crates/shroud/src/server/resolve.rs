use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use shroud_core::ptm::PrivateTransactionManager;
use shroud_core::types::Feature;
use shroud_core::{CoreError, HexBytes, ResolvedFields, Transaction};

use super::auth::check_auth;
use super::error::AppError;
use super::SharedState;

/// Upper bound on transactions per batch request.
pub(crate) const MAX_BATCH_INPUTS: usize = 256;

// ==============================================================================
// DTOs
// ==============================================================================

#[derive(Deserialize)]
pub(super) struct ResolveRequest {
    input: String,
}

#[derive(Deserialize)]
pub(super) struct ResolveBatchRequest {
    inputs: Vec<String>,
}

/// Resolved fields of one transaction. A failed field is `null` and its
/// failure is listed in `errors`; the request itself still succeeds.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResolveResponse {
    is_private: bool,
    private_input_data: Option<HexBytes>,
    errors: Vec<FieldError>,
}

#[derive(Serialize)]
pub(super) struct FieldError {
    field: &'static str,
    message: String,
}

#[derive(Serialize)]
pub(super) struct ManagerResponse {
    backend: &'static str,
    features: Vec<Feature>,
}

impl From<ResolvedFields> for ResolveResponse {
    fn from(fields: ResolvedFields) -> Self {
        field_response(fields.is_private, fields.private_input_data)
    }
}

fn field_response(is_private: bool, data: Result<HexBytes, CoreError>) -> ResolveResponse {
    match data {
        Ok(data) => ResolveResponse {
            is_private,
            private_input_data: Some(data),
            errors: Vec::new(),
        },
        Err(err) => ResolveResponse {
            is_private,
            private_input_data: None,
            errors: vec![FieldError {
                field: "privateInputData",
                message: err.to_string(),
            }],
        },
    }
}

fn parse_input(input: &str) -> Result<Transaction, AppError> {
    let bytes: HexBytes = input
        .parse()
        .map_err(|e| AppError::BadRequest(format!("invalid input hex: {e}")))?;
    Ok(Transaction::new(bytes.into_inner()))
}

// ==============================================================================
// Handlers
// ==============================================================================

pub(super) async fn resolve_tx(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ResolveResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let tx = parse_input(&request.input)?;
    let view = state.resolver.view(tx);
    let data = view.private_input_data().await.cloned();

    Ok(Json(field_response(view.is_private(), data)))
}

pub(super) async fn resolve_batch(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ResolveBatchRequest>, JsonRejection>,
) -> Result<Json<Vec<ResolveResponse>>, AppError> {
    check_auth(&state.api_token, &headers)?;
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.inputs.len() > MAX_BATCH_INPUTS {
        return Err(AppError::BadRequest(format!(
            "too many inputs: {} (max {MAX_BATCH_INPUTS})",
            request.inputs.len()
        )));
    }

    let txs = request
        .inputs
        .iter()
        .map(|input| parse_input(input))
        .collect::<Result<Vec<_>, _>>()?;

    let fields = state
        .resolver
        .resolve_all(&txs, state.resolve_concurrency)
        .await;

    Ok(Json(fields.into_iter().map(ResolveResponse::from).collect()))
}

pub(super) async fn get_manager(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<ManagerResponse>, AppError> {
    check_auth(&state.api_token, &headers)?;

    let manager = state.resolver.manager().current();
    Ok(Json(ManagerResponse {
        backend: manager.name(),
        features: manager.features().iter().collect(),
    }))
}
