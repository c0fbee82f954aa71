//! Invoice form input, validation and the state reported back to the form.

use crate::models::InvoiceStatus;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::{Validate, ValidationError, ValidationErrors};

pub const CUSTOMER_ID_FIELD: &str = "customerId";
pub const AMOUNT_FIELD: &str = "amount";
pub const STATUS_FIELD: &str = "status";

/// Raw invoice form submission. Every field is optional so that a missing
/// field surfaces as a field error instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceForm {
    #[validate(
        required(message = "customer ID is required"),
        custom(function = "validate_customer_id")
    )]
    pub customer_id: Option<String>,
    // Missing amount coerces to 0.
    #[validate(
        required(message = "Amount must be greater than 0"),
        custom(function = "validate_amount")
    )]
    pub amount: Option<String>,
    #[validate(
        required(message = "One of statuses must be selected"),
        custom(function = "validate_status")
    )]
    pub status: Option<String>,
}

/// Validated, typed invoice fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFields {
    pub customer_id: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

impl TryFrom<&InvoiceForm> for InvoiceFields {
    type Error = ValidationErrors;

    /// Validate every field, collecting all failures keyed by form field
    /// name, then derive the typed values.
    fn try_from(form: &InvoiceForm) -> Result<Self, Self::Error> {
        form.validate()?;

        let customer_id = form
            .customer_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let amount_cents = amount_to_cents(form.amount.as_deref())
            .map_err(|e| single_error(AMOUNT_FIELD, e))?;
        let status = form
            .status
            .as_deref()
            .and_then(InvoiceStatus::parse)
            .ok_or_else(|| single_error(STATUS_FIELD, invalid_status()))?;

        Ok(Self {
            customer_id,
            amount_cents,
            status,
        })
    }
}

fn validate_customer_id(customer_id: &str) -> Result<(), ValidationError> {
    if customer_id.trim().is_empty() {
        return Err(field_error("required", "customer ID is required"));
    }
    Ok(())
}

fn validate_amount(amount: &str) -> Result<(), ValidationError> {
    amount_to_cents(Some(amount)).map(|_| ())
}

/// Blank counts as not selected; anything else must match exactly.
fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status.trim().is_empty() {
        return Err(field_error("required", "One of statuses must be selected"));
    }
    match InvoiceStatus::parse(status) {
        Some(_) => Ok(()),
        None => Err(invalid_status()),
    }
}

fn invalid_status() -> ValidationError {
    field_error("enum", "Invalid status, expected 'pending' or 'paid'")
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn single_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

/// Form field name for a struct field reported by the validator.
fn form_field_name(field: &str) -> &str {
    match field {
        "customer_id" => CUSTOMER_ID_FIELD,
        other => other,
    }
}

/// Coerce a submitted amount to integer cents.
///
/// Blank or missing input counts as zero. Sub-cent remainders round to the
/// nearest cent, ties away from zero.
pub fn amount_to_cents(raw: Option<&str>) -> Result<i64, ValidationError> {
    let trimmed = raw.unwrap_or_default().trim();

    let amount = if trimmed.is_empty() {
        Decimal::ZERO
    } else {
        match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
            Ok(amount) => amount,
            Err(_) => return Err(out_of_range(trimmed)),
        }
    };

    if amount <= Decimal::ZERO {
        return Err(field_error("range", "Amount must be greater than 0"));
    }

    let cents = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|c| c.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|c| c.to_i64())
        .ok_or_else(too_large)?;

    if cents < 1 {
        return Err(field_error("range", "Amount must be at least 0.01"));
    }

    Ok(cents)
}

/// Classify input `Decimal` cannot hold. Well-formed finite numbers are out
/// of range rather than malformed.
fn out_of_range(raw: &str) -> ValidationError {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            if value <= 0.0 {
                field_error("range", "Amount must be greater than 0")
            } else if value < 0.01 {
                field_error("range", "Amount must be at least 0.01")
            } else {
                too_large()
            }
        }
        _ => field_error("number", "Amount must be a number"),
    }
}

fn too_large() -> ValidationError {
    field_error("overflow", "Amount is too large")
}

/// Result state handed back to the form for re-rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl State {
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (form_field_name(field).to_string(), messages)
            })
            .collect();

        Self {
            errors: Some(fields),
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            errors: None,
            message: Some(message.into()),
        }
    }

    /// Messages recorded for one form field, empty when the field passed.
    pub fn field_messages(&self, field: &str) -> &[String] {
        self.errors
            .as_ref()
            .and_then(|e| e.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(customer_id: Option<&str>, amount: Option<&str>, status: Option<&str>) -> InvoiceForm {
        InvoiceForm {
            customer_id: customer_id.map(String::from),
            amount: amount.map(String::from),
            status: status.map(String::from),
        }
    }

    fn messages(form: &InvoiceForm, field: &str) -> Vec<String> {
        let errors = InvoiceFields::try_from(form).expect_err("expected validation failure");
        State::from_validation(&errors).field_messages(field).to_vec()
    }

    #[test]
    fn valid_form_converts_amount_to_cents() {
        let fields = InvoiceFields::try_from(&form(Some("c1"), Some("10.50"), Some("pending")))
            .unwrap();
        assert_eq!(
            fields,
            InvoiceFields {
                customer_id: "c1".to_string(),
                amount_cents: 1050,
                status: InvoiceStatus::Pending,
            }
        );
    }

    #[test]
    fn decimal_conversion_is_exact() {
        assert_eq!(amount_to_cents(Some("0.29")).unwrap(), 29);
        assert_eq!(amount_to_cents(Some("19.99")).unwrap(), 1999);
        assert_eq!(amount_to_cents(Some(" 42 ")).unwrap(), 4200);
    }

    #[test]
    fn sub_cent_amounts_round_half_away_from_zero() {
        assert_eq!(amount_to_cents(Some("1.005")).unwrap(), 101);
        assert_eq!(amount_to_cents(Some("1.004")).unwrap(), 100);
    }

    #[test]
    fn scientific_notation_is_accepted() {
        assert_eq!(amount_to_cents(Some("1e3")).unwrap(), 100_000);
    }

    #[test]
    fn zero_negative_and_blank_amounts_are_rejected() {
        for raw in ["0", "-5", "", "   "] {
            assert_eq!(
                messages(&form(Some("c1"), Some(raw), Some("paid")), AMOUNT_FIELD),
                vec!["Amount must be greater than 0".to_string()],
                "amount {raw:?}"
            );
        }
        assert_eq!(
            messages(&form(Some("c1"), None, Some("paid")), AMOUNT_FIELD),
            vec!["Amount must be greater than 0".to_string()]
        );
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        assert_eq!(
            messages(&form(Some("c1"), Some("ten"), Some("paid")), AMOUNT_FIELD),
            vec!["Amount must be a number".to_string()]
        );
    }

    #[test]
    fn amount_below_one_cent_is_rejected() {
        assert_eq!(
            messages(&form(Some("c1"), Some("0.001"), Some("paid")), AMOUNT_FIELD),
            vec!["Amount must be at least 0.01".to_string()]
        );
    }

    #[test]
    fn huge_amount_is_rejected() {
        assert_eq!(
            messages(
                &form(Some("c1"), Some("99999999999999999999"), Some("paid")),
                AMOUNT_FIELD
            ),
            vec!["Amount is too large".to_string()]
        );
    }

    #[test]
    fn empty_customer_id_is_rejected() {
        for customer in [None, Some(""), Some("  ")] {
            assert_eq!(
                messages(&form(customer, Some("1"), Some("paid")), CUSTOMER_ID_FIELD),
                vec!["customer ID is required".to_string()]
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(
            messages(&form(Some("c1"), Some("1"), Some("overdue")), STATUS_FIELD),
            vec!["Invalid status, expected 'pending' or 'paid'".to_string()]
        );
        assert_eq!(
            messages(&form(Some("c1"), Some("1"), None), STATUS_FIELD),
            vec!["One of statuses must be selected".to_string()]
        );
    }

    #[test]
    fn padded_status_is_rejected() {
        for status in [" paid ", "pending ", "PAID"] {
            assert_eq!(
                messages(&form(Some("c1"), Some("1"), Some(status)), STATUS_FIELD),
                vec!["Invalid status, expected 'pending' or 'paid'".to_string()],
                "status {status:?}"
            );
        }
        assert_eq!(
            messages(&form(Some("c1"), Some("1"), Some("   ")), STATUS_FIELD),
            vec!["One of statuses must be selected".to_string()]
        );
    }

    #[test]
    fn well_formed_amounts_beyond_decimal_range_are_too_large() {
        for raw in ["1e30", "123456789012345678901234567890"] {
            assert_eq!(
                messages(&form(Some("c1"), Some(raw), Some("paid")), AMOUNT_FIELD),
                vec!["Amount is too large".to_string()],
                "amount {raw:?}"
            );
        }
        assert_eq!(
            messages(&form(Some("c1"), Some("-1e30"), Some("paid")), AMOUNT_FIELD),
            vec!["Amount must be greater than 0".to_string()]
        );
        assert_eq!(
            messages(&form(Some("c1"), Some("1e"), Some("paid")), AMOUNT_FIELD),
            vec!["Amount must be a number".to_string()]
        );
    }

    #[test]
    fn customer_id_is_trimmed() {
        let fields = InvoiceFields::try_from(&form(Some(" c1 "), Some("1"), Some("paid"))).unwrap();
        assert_eq!(fields.customer_id, "c1");
    }

    #[test]
    fn all_failures_are_reported_together() {
        let errors = form(None, Some("abc"), Some("unknown")).validate().unwrap_err();
        let state = State::from_validation(&errors);
        let fields: Vec<&String> = state.errors.as_ref().unwrap().keys().collect();
        assert_eq!(fields, vec!["amount", "customerId", "status"]);
        assert!(state.message.is_none());
    }

    #[test]
    fn state_serializes_without_absent_members() {
        let json = serde_json::to_value(State::with_message("Cannot insert into DB")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Cannot insert into DB" }));

        let errors = form(Some("c1"), Some("0"), Some("paid")).validate().unwrap_err();
        let json = serde_json::to_value(State::from_validation(&errors)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "errors": { "amount": ["Amount must be greater than 0"] } })
        );
    }
}
