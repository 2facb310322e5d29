use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Sensitivity levels, ordered from least to most sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Public,
    Internal,
    Confidential,
    Restricted,
}

const CLASSIFICATION: &[(&str, Sensitivity)] = &[
    ("id", Sensitivity::Public),
    ("name", Sensitivity::Public),
    ("category", Sensitivity::Public),
    ("description", Sensitivity::Public),
    ("website", Sensitivity::Public),
    ("headquarters", Sensitivity::Public),
    ("founded_year", Sensitivity::Public),
    ("stage", Sensitivity::Public),
    ("title", Sensitivity::Public),
    ("announced_on", Sensitivity::Public),
    ("employee_count", Sensitivity::Internal),
    ("total_funding_usd", Sensitivity::Internal),
    ("amount_usd", Sensitivity::Internal),
    ("lead_investor", Sensitivity::Internal),
    ("investors", Sensitivity::Internal),
    ("source", Sensitivity::Internal),
    ("linkedin_url", Sensitivity::Confidential),
    ("valuation_usd", Sensitivity::Confidential),
    ("notes", Sensitivity::Confidential),
    ("email", Sensitivity::Restricted),
    ("phone", Sensitivity::Restricted),
    ("term_sheet", Sensitivity::Restricted),
    ("bank_account", Sensitivity::Restricted),
    ("api_key", Sensitivity::Restricted),
];

/// Look up a field's sensitivity. Unlisted fields default to `Internal`.
pub fn classify_field(field: &str) -> Sensitivity {
    let field = field.to_lowercase();
    CLASSIFICATION
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, level)| *level)
        .unwrap_or(Sensitivity::Internal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Analyst,
    Manager,
    Admin,
}

impl Role {
    /// Unknown role names get the least privilege.
    pub fn parse(name: &str) -> Role {
        match name.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "manager" => Role::Manager,
            "analyst" => Role::Analyst,
            _ => Role::Viewer,
        }
    }

    /// Highest sensitivity this role may read in the clear.
    pub fn clearance(&self) -> Sensitivity {
        match self {
            Role::Viewer => Sensitivity::Public,
            Role::Analyst => Sensitivity::Internal,
            Role::Manager => Sensitivity::Confidential,
            Role::Admin => Sensitivity::Restricted,
        }
    }

    pub fn can_read(&self, level: Sensitivity) -> bool {
        level <= self.clearance()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaskKind {
    Email,
    Phone,
    Amount,
    Generic,
}

fn mask_kind(field: &str) -> MaskKind {
    let field = field.to_lowercase();
    if field.contains("email") {
        MaskKind::Email
    } else if field.contains("phone") {
        MaskKind::Phone
    } else if field.ends_with("_usd") || field.contains("amount") || field.contains("valuation") {
        MaskKind::Amount
    } else {
        MaskKind::Generic
    }
}

/// Mask `value` according to the rule for `field`'s kind. Nulls stay null.
pub fn mask_value(field: &str, value: &Value) -> Value {
    let kind = mask_kind(field);
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(match kind {
            MaskKind::Email => mask_email(s),
            MaskKind::Phone => mask_phone(s),
            MaskKind::Amount => match s.parse::<f64>() {
                Ok(n) => amount_bucket(n).to_string(),
                Err(_) => mask_generic(s),
            },
            MaskKind::Generic => mask_generic(s),
        }),
        Value::Number(n) => match (kind, n.as_f64()) {
            (MaskKind::Amount, Some(amount)) => Value::String(amount_bucket(amount).to_string()),
            _ => Value::String("***".to_string()),
        },
        Value::Bool(_) => Value::String("***".to_string()),
        Value::Array(_) | Value::Object(_) => Value::String("[redacted]".to_string()),
    }
}

/// `alice@example.com` -> `a****@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first: String = local.chars().take(1).collect();
            format!("{}****@{}", first, domain)
        }
        _ => mask_generic(email),
    }
}

/// Replace every digit but the last four, keeping separators.
pub fn mask_phone(phone: &str) -> String {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let mut seen = 0;
    phone
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen + 4 > digits {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}

/// Keep the first and last character.
pub fn mask_generic(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 2 {
        return "*".repeat(chars.len().max(2));
    }
    let mut out = String::with_capacity(s.len());
    out.push(chars[0]);
    out.push_str(&"*".repeat(chars.len() - 2));
    out.push(chars[chars.len() - 1]);
    out
}

pub fn amount_bucket(amount: f64) -> &'static str {
    const MILLION: f64 = 1_000_000.0;
    if amount < MILLION {
        "<$1M"
    } else if amount < 10.0 * MILLION {
        "$1M-$10M"
    } else if amount < 50.0 * MILLION {
        "$10M-$50M"
    } else if amount < 100.0 * MILLION {
        "$50M-$100M"
    } else {
        ">$100M"
    }
}
