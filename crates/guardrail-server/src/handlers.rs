//! API route handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, error, info};

use guardrail_core::model::REDACTED_KEY;
use guardrail_core::{Direction, ModelSettings};

use crate::error::{ApiError, Result};
use crate::models::{HealthResponse, InspectRequest, InspectResponse, ReloadResponse};
use crate::state::AppState;

/// POST /api/inspect/input - Inspect a user prompt.
pub async fn inspect_input(
    State(state): State<AppState>,
    Json(req): Json<InspectRequest>,
) -> (StatusCode, Json<InspectResponse>) {
    inspect(state, Direction::Input, req).await
}

/// POST /api/inspect/output - Inspect a model response.
pub async fn inspect_output(
    State(state): State<AppState>,
    Json(req): Json<InspectRequest>,
) -> (StatusCode, Json<InspectResponse>) {
    inspect(state, Direction::Output, req).await
}

async fn inspect(
    state: AppState,
    direction: Direction,
    req: InspectRequest,
) -> (StatusCode, Json<InspectResponse>) {
    debug!(
        asset_id = %req.asset_id,
        direction = %direction,
        text_len = req.text.len(),
        "Inspecting text"
    );

    // A panic inside the pipeline surfaces as a JoinError instead of dropping the connection.
    let guardrail = Arc::clone(&state.guardrail);
    let task = tokio::spawn(async move {
        guardrail
            .inspect(&req.asset_id, direction, &req.text)
            .await
    });

    match task.await {
        Ok(verdict) => (StatusCode::OK, Json(InspectResponse::ok(verdict))),
        Err(e) => {
            error!(direction = %direction, error = %e, "Inspection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InspectResponse::internal(&e.to_string())),
            )
        }
    }
}

/// GET /api/model/config - Current model settings, API key masked.
pub async fn get_model_config(State(state): State<AppState>) -> Json<ModelSettings> {
    Json(state.guardrail.models().current().redacted())
}

/// POST /api/model/config - Select the model used by the judge until the next reload.
///
/// A missing, empty or masked `api_key` keeps the key already in use, so a
/// client can post back what it read.
pub async fn set_model_config(
    State(state): State<AppState>,
    Json(mut settings): Json<ModelSettings>,
) -> Result<Json<ModelSettings>> {
    let models = state.guardrail.models();
    if models.provider(&settings.provider).is_none() {
        return Err(ApiError::BadRequest(format!(
            "provider '{}' is not configured",
            settings.provider
        )));
    }

    let keep_key = settings
        .api_key
        .as_deref()
        .is_none_or(|key| key.is_empty() || key == REDACTED_KEY);
    if keep_key {
        settings.api_key = models.current().api_key;
    }

    models.set_current(settings);
    Ok(Json(models.current().redacted()))
}

/// POST /api/model/reload - Re-read the model configuration.
pub async fn reload_models(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    state.guardrail.reload_models()?;
    let current = state.guardrail.models().current();
    info!(provider = %current.provider, "Model configuration reloaded via API");

    Ok(Json(ReloadResponse {
        success: true,
        message: format!("Model configuration reloaded, current provider '{}'", current.provider),
    }))
}

/// POST /api/policy/reload - Re-read the policy file.
pub async fn reload_policy(State(state): State<AppState>) -> Result<Json<ReloadResponse>> {
    state.guardrail.reload_policy()?;
    let tenants = state.guardrail.policy().snapshot().len();
    info!(tenants, "Policy reloaded via API");

    Ok(Json(ReloadResponse {
        success: true,
        message: format!("Policy reloaded with {} tenants", tenants),
    }))
}

/// GET /api/health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
