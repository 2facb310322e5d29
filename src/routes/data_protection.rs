use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::protection::{AuditEntry, CryptoError, Protector, Role, Sensitivity};
use crate::response::{ok, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProtectionRequest {
    /// classify, encrypt, decrypt, mask or protect
    pub action: String,
    /// Who is asking; recorded in the audit log
    #[serde(default = "default_actor")]
    pub actor: String,
    /// Field name for mask, encrypt and decrypt
    pub field: Option<String>,
    /// Field names for classify
    #[serde(default)]
    pub fields: Vec<String>,
    /// Input for encrypt (plaintext), decrypt (ciphertext) and mask (any JSON value)
    pub value: Option<Value>,
    /// Role for protect; unknown roles are treated as viewer
    pub role: Option<String>,
    /// JSON object for protect
    pub record: Option<Value>,
}

fn default_actor() -> String {
    "anonymous".to_string()
}

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct ProtectionResult {
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<BTreeMap<String, Sensitivity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Number of most recent entries (default 50)
    limit: Option<usize>,
}

fn string_value(value: Option<&Value>, what: &str) -> Result<String, AppError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AppError::UnprocessableEntity(format!("{} must be a string", what))),
        None => Err(AppError::InvalidRequest(format!("value ({}) is required", what))),
    }
}

/// Key derivation is deliberately slow, so encryption and decryption run on the blocking pool.
async fn with_key<F>(state: &AppState, req: &ProtectionRequest, op: F) -> Result<String, AppError>
where
    F: FnOnce(&Protector, &str, Option<&str>) -> Result<String, CryptoError> + Send + 'static,
{
    let protector = Arc::clone(&state.protector);
    let actor = req.actor.clone();
    let field = req.field.clone();
    let span = tracing::Span::current();
    let outcome = tokio::task::spawn_blocking(move || {
        let _enter = span.enter();
        op(&protector, &actor, field.as_deref())
    })
    .await
    .map_err(|e| AppError::InternalError(format!("key derivation task failed: {}", e)))?;
    Ok(outcome?)
}

/// Classify, encrypt, decrypt or mask sensitive fields
#[utoipa::path(
    post,
    path = "/api/data-protection",
    request_body = ProtectionRequest,
    responses(
        (status = 200, description = "Action result", body = ProtectionResult),
        (status = 400, description = "Unknown action or missing input"),
        (status = 422, description = "Ciphertext could not be decrypted")
    ),
    tag = "data-protection"
)]
#[tracing::instrument(skip_all, fields(action = %req.action, actor = %req.actor))]
pub async fn protect(State(state): State<AppState>, Json(req): Json<ProtectionRequest>) -> ApiResult<ProtectionResult> {
    let protector = &state.protector;
    let action = req.action.trim().to_lowercase();
    let mut result = ProtectionResult {
        action: action.clone(),
        ..Default::default()
    };

    match action.as_str() {
        "classify" => {
            let mut fields: Vec<&str> = req.fields.iter().map(String::as_str).collect();
            if let Some(field) = req.field.as_deref() {
                fields.push(field);
            }
            if fields.is_empty() {
                return Err(AppError::InvalidRequest("fields are required for classify".to_string()));
            }
            result.classification = Some(protector.classify_fields(&req.actor, fields));
        }
        "encrypt" => {
            let plaintext = string_value(req.value.as_ref(), "plaintext")?;
            let ciphertext = with_key(&state, &req, move |p, actor, field| p.encrypt(actor, field, &plaintext)).await?;
            result.ciphertext = Some(ciphertext);
        }
        "decrypt" => {
            let ciphertext = string_value(req.value.as_ref(), "ciphertext")?;
            let plaintext = with_key(&state, &req, move |p, actor, field| p.decrypt(actor, field, &ciphertext)).await?;
            result.plaintext = Some(plaintext);
        }
        "mask" => {
            let field = req
                .field
                .as_deref()
                .ok_or_else(|| AppError::InvalidRequest("field is required for mask".to_string()))?;
            let value = req.value.unwrap_or(Value::Null);
            result.masked = Some(protector.mask(&req.actor, field, &value));
        }
        "protect" => {
            let record = match req.record.as_ref() {
                Some(Value::Object(map)) => map,
                Some(_) => return Err(AppError::UnprocessableEntity("record must be a JSON object".to_string())),
                None => return Err(AppError::InvalidRequest("record is required for protect".to_string())),
            };
            let role = Role::parse(req.role.as_deref().unwrap_or("viewer"));
            result.role = Some(role);
            result.record = Some(Value::Object(protector.protect_record(&req.actor, role, record)));
        }
        other => {
            return Err(AppError::InvalidRequest(format!(
                "unknown action {:?}; expected classify, encrypt, decrypt, mask or protect",
                other
            )))
        }
    }

    ok(result)
}

/// Recent audit log entries
#[utoipa::path(
    get,
    path = "/api/data-protection/audit",
    params(AuditQuery),
    responses((status = 200, description = "Audit entries, oldest first", body = Vec<AuditEntry>)),
    tag = "data-protection"
)]
pub async fn audit_log(State(state): State<AppState>, Query(query): Query<AuditQuery>) -> ApiResult<Vec<AuditEntry>> {
    ok(state.protector.audit_tail(query.limit.unwrap_or(50)))
}
