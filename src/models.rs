use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ClientError;

// ============ Customer Records ============

/// Backend-assigned customer identifier.
///
/// Opaque to the client. The backend currently emits numeric ids, but any
/// JSON number or string is accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        CustomerId(value)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        CustomerId(value.to_string())
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => CustomerId(n.to_string()),
            RawId::Text(s) => CustomerId(s),
        })
    }
}

/// Employment status choices offered by the customer form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmploymentStatus {
    #[default]
    Employed,
    #[serde(rename = "Self-Employed")]
    SelfEmployed,
    Unemployed,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 3] = [
        EmploymentStatus::Employed,
        EmploymentStatus::SelfEmployed,
        EmploymentStatus::Unemployed,
    ];

    /// Wire and display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "Employed",
            EmploymentStatus::SelfEmployed => "Self-Employed",
            EmploymentStatus::Unemployed => "Unemployed",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmploymentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ClientError::InvalidForm(format!(
                    "Employment status must be one of Employed, Self-Employed, Unemployed (got '{}')",
                    wanted
                ))
            })
    }
}

/// A customer record as returned by the backend.
///
/// `loan_eligible`, `max_loan_amount` and the timestamps are computed or
/// managed by the backend. They are never sent back; see [`CustomerFields`]
/// for the submittable subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "decimal_amount")]
    pub monthly_salary: Option<BigDecimal>,
    pub credit_score: Option<i32>,
    /// Kept as text so unknown statuses from the backend do not break the list.
    pub employment_status: Option<String>,
    pub loan_eligible: Option<bool>,
    #[serde(default, deserialize_with = "decimal_amount")]
    pub max_loan_amount: Option<BigDecimal>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<NaiveDateTime>,
}

/// Reads a money amount from its JSON text rather than its binary value.
///
/// The backend emits amounts as JSON numbers; going through `f64` would turn
/// `5200.10` into `5200.1000000000003637...`. Strings are accepted too.
fn decimal_amount<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a decimal amount, got {}",
                other
            )))
        }
    };
    BigDecimal::from_str(text.trim())
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid decimal amount '{}': {}", text, e)))
}

/// Accepts ISO-8601 local timestamps and ignores anything else.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<NaiveDateTime>().ok()))
}

/// The editable subset of a customer, as submitted on create and update.
///
/// Optional text fields serialize as explicit `null` so that an update
/// replaces them fully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFields {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub monthly_salary: BigDecimal,
    pub credit_score: i32,
    pub employment_status: EmploymentStatus,
}

// ============ Authentication ============

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Failure body the backend may attach to a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
