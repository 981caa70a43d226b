//! Display values derived from customer records.
//!
//! Everything here is a pure function of its input. Eligibility itself is
//! never computed client-side; it is only rendered.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, Zero};
use std::fmt;

use crate::models::Customer;

pub const NOT_AVAILABLE: &str = "N/A";

/// Formats an amount as US dollars, e.g. `$1,234.56` or `-$12.00`.
///
/// Rounds half away from zero to whole cents.
pub fn format_currency(amount: &BigDecimal) -> String {
    let negative = amount < &BigDecimal::zero();
    let half_cent = BigDecimal::new(BigInt::from(5), 1);
    let cents = (amount.abs() * BigDecimal::from(100) + half_cent).with_scale(0);
    let (digits, _) = cents.as_bigint_and_exponent();

    let digits = format!("{:0>3}", digits.to_string());
    let (whole, fraction) = digits.split_at(digits.len() - 2);

    let sign = if negative && digits.chars().any(|c| c != '0') {
        "-"
    } else {
        ""
    };
    format!("{}${}.{}", sign, group_thousands(whole), fraction)
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Credit-score band. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CreditBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl CreditBand {
    pub fn from_score(score: i32) -> Self {
        if score >= 750 {
            CreditBand::Excellent
        } else if score >= 650 {
            CreditBand::Good
        } else if score >= 550 {
            CreditBand::Fair
        } else {
            CreditBand::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CreditBand::Excellent => "excellent",
            CreditBand::Good => "good",
            CreditBand::Fair => "fair",
            CreditBand::Poor => "poor",
        }
    }
}

impl fmt::Display for CreditBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state eligibility indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotEligible,
    Unknown,
}

impl Eligibility {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Eligibility::Eligible,
            Some(false) => Eligibility::NotEligible,
            None => Eligibility::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Eligibility::Eligible => "✓ Eligible",
            Eligibility::NotEligible => "✗ Not Eligible",
            Eligibility::Unknown => NOT_AVAILABLE,
        }
    }
}

/// Max loan column: the amount only when the backend marked the customer
/// eligible and supplied one.
pub fn max_loan_label(customer: &Customer) -> String {
    match (customer.loan_eligible, &customer.max_loan_amount) {
        (Some(true), Some(amount)) => format_currency(amount),
        (Some(false), _) => "Not Eligible".to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Summary cards shown above the customer table.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub total: usize,
    pub eligible: usize,
    /// Sum of `maxLoanAmount`, absent amounts counted as zero.
    pub total_loan_capacity: BigDecimal,
}

pub fn summarize(customers: &[Customer]) -> CustomerSummary {
    CustomerSummary {
        total: customers.len(),
        eligible: customers
            .iter()
            .filter(|c| c.loan_eligible == Some(true))
            .count(),
        total_loan_capacity: customers
            .iter()
            .filter_map(|c| c.max_loan_amount.as_ref())
            .fold(BigDecimal::zero(), |sum, amount| sum + amount),
    }
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub id: String,
    pub initials: String,
    pub full_name: String,
    pub handle: String,
    pub email: String,
    pub phone: String,
    pub salary: String,
    pub credit_score: String,
    pub credit_band: Option<CreditBand>,
    pub employment: String,
    pub eligibility: Eligibility,
    pub max_loan: String,
}

impl CustomerRow {
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            id: customer.id.to_string(),
            initials: initials(customer),
            full_name: format!("{} {}", customer.name, customer.surname)
                .trim()
                .to_string(),
            handle: format!("@{}", customer.username),
            email: customer.email.clone(),
            phone: non_empty_or_na(customer.phone.as_deref()),
            salary: customer
                .monthly_salary
                .as_ref()
                .map(format_currency)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            credit_score: customer
                .credit_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            credit_band: customer.credit_score.map(CreditBand::from_score),
            employment: non_empty_or_na(customer.employment_status.as_deref()),
            eligibility: Eligibility::from_flag(customer.loan_eligible),
            max_loan: max_loan_label(customer),
        }
    }
}

fn initials(customer: &Customer) -> String {
    customer
        .name
        .chars()
        .next()
        .into_iter()
        .chain(customer.surname.chars().next())
        .collect()
}

fn non_empty_or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}
