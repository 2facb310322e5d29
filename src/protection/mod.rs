//! Field classification, encryption, masking and an in-memory audit trail.
//!
//! Nothing here is persisted: the audit log lives for the lifetime of the
//! process and keeps only the most recent entries.

pub mod crypto;
pub mod policy;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use utoipa::ToSchema;

use crate::error::AppError;
pub use crypto::CryptoError;
pub use policy::{Role, Sensitivity};

pub const AUDIT_CAPACITY: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Classify,
    Encrypt,
    Decrypt,
    Mask,
    Access,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: AuditAction,
    pub field: Option<String>,
    pub outcome: String,
}

struct AuditLog {
    next_seq: u64,
    entries: VecDeque<AuditEntry>,
}

pub struct Protector {
    secret: String,
    iterations: u32,
    audit: Mutex<AuditLog>,
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::EncryptionFailed => AppError::InternalError(err.to_string()),
            _ => AppError::UnprocessableEntity(err.to_string()),
        }
    }
}

impl Protector {
    pub fn new(secret: impl Into<String>) -> Self {
        Self::with_iterations(secret, crypto::DEFAULT_ITERATIONS)
    }

    /// Lower iteration counts are only meant for tests.
    pub fn with_iterations(secret: impl Into<String>, iterations: u32) -> Self {
        Self {
            secret: secret.into(),
            iterations,
            audit: Mutex::new(AuditLog {
                next_seq: 1,
                entries: VecDeque::with_capacity(AUDIT_CAPACITY),
            }),
        }
    }

    fn record(&self, actor: &str, action: AuditAction, field: Option<&str>, outcome: impl Into<String>) {
        // A poisoned lock only means another request panicked mid-push; the log itself is still usable.
        let mut log = self.audit.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let seq = log.next_seq;
        log.next_seq += 1;
        if log.entries.len() == AUDIT_CAPACITY {
            log.entries.pop_front();
        }
        log.entries.push_back(AuditEntry {
            seq,
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action,
            field: field.map(str::to_string),
            outcome: outcome.into(),
        });
    }

    /// Most recent entries, newest last.
    pub fn audit_tail(&self, limit: usize) -> Vec<AuditEntry> {
        let log = self.audit.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let skip = log.entries.len().saturating_sub(limit);
        log.entries.iter().skip(skip).cloned().collect()
    }

    pub fn classify_fields<'a>(&self, actor: &str, fields: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, Sensitivity> {
        let classified: BTreeMap<String, Sensitivity> = fields
            .into_iter()
            .map(|f| (f.to_string(), policy::classify_field(f)))
            .collect();
        self.record(actor, AuditAction::Classify, None, format!("{} fields", classified.len()));
        classified
    }

    pub fn encrypt(&self, actor: &str, field: Option<&str>, plaintext: &str) -> Result<String, CryptoError> {
        let result = crypto::encrypt(&self.secret, self.iterations, plaintext);
        self.record(actor, AuditAction::Encrypt, field, outcome_of(&result));
        result
    }

    pub fn decrypt(&self, actor: &str, field: Option<&str>, envelope: &str) -> Result<String, CryptoError> {
        let result = crypto::decrypt(&self.secret, self.iterations, envelope);
        if let Err(e) = &result {
            tracing::warn!(actor, "decrypt rejected: {}", e);
        }
        self.record(actor, AuditAction::Decrypt, field, outcome_of(&result));
        result
    }

    pub fn mask(&self, actor: &str, field: &str, value: &Value) -> Value {
        self.record(actor, AuditAction::Mask, Some(field), "masked");
        policy::mask_value(field, value)
    }

    /// Copy `record`, masking every field above `role`'s clearance.
    pub fn protect_record(&self, actor: &str, role: Role, record: &Map<String, Value>) -> Map<String, Value> {
        let mut masked_fields = 0;
        let protected = record
            .iter()
            .map(|(field, value)| {
                let level = policy::classify_field(field);
                if role.can_read(level) {
                    (field.clone(), value.clone())
                } else {
                    masked_fields += 1;
                    self.record(actor, AuditAction::Access, Some(field), format!("masked ({:?} above {:?})", level, role.clearance()));
                    (field.clone(), policy::mask_value(field, value))
                }
            })
            .collect();

        if masked_fields == 0 {
            self.record(actor, AuditAction::Access, None, "granted");
        }
        protected
    }
}

fn outcome_of<T>(result: &Result<T, CryptoError>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn protector() -> Protector {
        Protector::with_iterations("test-secret", 1_000)
    }

    #[test]
    fn protect_record_masks_above_clearance() {
        let p = protector();
        let record = json!({
            "name": "Keystone",
            "amount_usd": 12_000_000,
            "email": "ceo@keystone.io",
        });
        let record = record.as_object().unwrap();

        let viewer = p.protect_record("u1", Role::Viewer, record);
        assert_eq!(viewer["name"], "Keystone");
        assert_eq!(viewer["amount_usd"], "$10M-$50M");
        assert_eq!(viewer["email"], "c****@keystone.io");

        let analyst = p.protect_record("u2", Role::Analyst, record);
        assert_eq!(analyst["amount_usd"], 12_000_000);
        assert_eq!(analyst["email"], "c****@keystone.io");

        let admin = p.protect_record("u3", Role::Admin, record);
        assert_eq!(&admin, record);
    }

    #[test]
    fn audit_records_each_operation() {
        let p = protector();
        let sealed = p.encrypt("alice", Some("term_sheet"), "secret terms").unwrap();
        p.decrypt("alice", Some("term_sheet"), &sealed).unwrap();
        assert!(p.decrypt("mallory", None, "garbage").is_err());
        p.mask("bob", "email", &json!("bob@corp.io"));

        let tail = p.audit_tail(10);
        assert_eq!(tail.len(), 4);
        assert_eq!(tail[0].action, AuditAction::Encrypt);
        assert_eq!(tail[0].field.as_deref(), Some("term_sheet"));
        assert_eq!(tail[2].actor, "mallory");
        assert!(tail[2].outcome.starts_with("failed"));
        assert_eq!(tail[3].action, AuditAction::Mask);
        assert!(tail.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[test]
    fn audit_log_is_bounded() {
        let p = protector();
        for _ in 0..(AUDIT_CAPACITY + 5) {
            p.mask("bulk", "notes", &json!("x"));
        }
        let all = p.audit_tail(usize::MAX);
        assert_eq!(all.len(), AUDIT_CAPACITY);
        assert_eq!(all[0].seq, 6);
        assert_eq!(p.audit_tail(3).len(), 3);
    }
}
