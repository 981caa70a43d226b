//! Customer editor form.
//!
//! Holds user input as entered and converts it into [`CustomerFields`] under
//! the same constraints an HTML form enforces on its inputs (`required`,
//! `type=email`, `min`/`max`/`step`). No other validation happens client-side.

use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::errors::ClientError;
use crate::models::{Customer, CustomerFields, EmploymentStatus};

pub const MIN_CREDIT_SCORE: i32 = 300;
pub const MAX_CREDIT_SCORE: i32 = 850;

/// Editable fields as typed into the form.
///
/// Every text input starts as the empty string, never as a missing value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerForm {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub monthly_salary: String,
    pub credit_score: String,
    pub employment_status: EmploymentStatus,
}

impl CustomerForm {
    /// Pre-fills the form from an existing record.
    ///
    /// Absent values become empty strings; an absent or unrecognised
    /// employment status falls back to the form default.
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            surname: customer.surname.clone(),
            username: customer.username.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
            address: customer.address.clone().unwrap_or_default(),
            monthly_salary: customer
                .monthly_salary
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default(),
            credit_score: customer
                .credit_score
                .map(|s| s.to_string())
                .unwrap_or_default(),
            employment_status: customer
                .employment_status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Converts the input into submittable fields.
    pub fn to_fields(&self) -> Result<CustomerFields, ClientError> {
        let name = required("First name", &self.name)?;
        let surname = required("Last name", &self.surname)?;
        let username = required("Username", &self.username)?;
        let email = required("Email", &self.email)?;
        if !is_valid_email(&email) {
            return Err(ClientError::InvalidForm(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        let monthly_salary = parse_salary(&self.monthly_salary)?;
        let credit_score = parse_credit_score(&self.credit_score)?;

        Ok(CustomerFields {
            name,
            surname,
            username,
            email,
            phone: optional(&self.phone),
            address: optional(&self.address),
            monthly_salary,
            credit_score,
            employment_status: self.employment_status,
        })
    }
}

fn required(label: &str, value: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidForm(format!("{} is required", label)));
    }
    Ok(trimmed.to_string())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `type=number min=0 step=0.01`
fn parse_salary(raw: &str) -> Result<BigDecimal, ClientError> {
    let raw = required("Monthly salary", raw)?;
    let salary = BigDecimal::from_str(&raw)
        .map_err(|_| ClientError::InvalidForm("Monthly salary must be a number".to_string()))?;

    if salary < BigDecimal::zero() {
        return Err(ClientError::InvalidForm(
            "Monthly salary must be at least 0".to_string(),
        ));
    }
    if salary.with_scale(2) != salary {
        return Err(ClientError::InvalidForm(
            "Monthly salary must be a multiple of 0.01".to_string(),
        ));
    }
    Ok(salary)
}

/// `type=number min=300 max=850`
fn parse_credit_score(raw: &str) -> Result<i32, ClientError> {
    let raw = required("Credit score", raw)?;
    let score: i32 = raw.parse().map_err(|_| {
        ClientError::InvalidForm("Credit score must be a whole number".to_string())
    })?;

    if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) {
        return Err(ClientError::InvalidForm(format!(
            "Credit score must be between {} and {}",
            MIN_CREDIT_SCORE, MAX_CREDIT_SCORE
        )));
    }
    Ok(score)
}

/// The "valid e-mail address" production browsers apply to `type=email`.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    });
    regex.is_match(email)
}
