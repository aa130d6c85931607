//! API request and response models.

use guardrail_core::{Suggestion, Verdict, DEFAULT_TENANT};
use serde::{Deserialize, Serialize};

/// Result code for a completed inspection.
pub const CODE_OK: u16 = 200;
/// Result code for an inspection that failed inside the guardrail.
pub const CODE_INTERNAL: u16 = 500;

/// Request body for POST /api/inspect/input and /api/inspect/output.
#[derive(Debug, Deserialize)]
pub struct InspectRequest {
    /// Tenant whose policy applies.
    #[serde(default = "default_asset_id")]
    pub asset_id: String,
    /// Text to inspect.
    pub text: String,
}

fn default_asset_id() -> String {
    DEFAULT_TENANT.to_string()
}

/// Response body for the inspection endpoints.
#[derive(Debug, Serialize)]
pub struct InspectResponse {
    #[serde(rename = "errCode")]
    pub err_code: u16,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub suggestion: Suggestion,
    pub categories: Vec<String>,
    pub answer: String,
}

impl InspectResponse {
    /// Wraps a verdict from a completed inspection.
    pub fn ok(verdict: Verdict) -> Self {
        let (suggestion, categories, answer) = verdict.into_parts();
        Self {
            err_code: CODE_OK,
            err_msg: String::new(),
            suggestion,
            categories,
            answer,
        }
    }

    /// Reports an internal fault with an error verdict.
    pub fn internal(message: &str) -> Self {
        let (suggestion, categories, answer) = Verdict::error(message).into_parts();
        Self {
            err_code: CODE_INTERNAL,
            err_msg: message.to_string(),
            suggestion,
            categories,
            answer,
        }
    }
}

/// Response body for the reload endpoints.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub success: bool,
    pub message: String,
}

/// Response body for GET /api/health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
