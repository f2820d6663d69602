// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checkout and negotiation input validation.
//!
//! Validation runs before any record is created; failures come back as a
//! field-keyed error map and have no side effects.

use std::str::FromStr;

use autopier_core::{normalize_phone, PaymentMethod, ValidationErrors};

use crate::service::{NewNegotiation, NewOrder};

/// Checkout fields after validation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub customer_name: String,
    /// Exactly 6 digits.
    pub customer_rg: String,
    /// Digits only, at least 6 of them.
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    pub installments: i64,
    pub selected_color: String,
}

/// Maximum credit card installments.
const MAX_INSTALLMENTS: i64 = 12;

/// Validate a checkout request.
///
/// Collects every failure instead of stopping at the first, so the form
/// can highlight all offending fields at once.
pub fn validate_order(input: &NewOrder) -> Result<ValidatedOrder, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = input.customer_name.trim();
    if name.is_empty() {
        errors.push("name", "Full name is required");
    }

    let rg = normalize_phone(&input.customer_rg);
    if rg.len() != 6 {
        errors.push("rg", "RG must have exactly 6 digits");
    }

    let phone = normalize_phone(&input.customer_phone);
    if phone.len() < 6 {
        errors.push("phone", "Phone number must have at least 6 digits");
    }

    let payment_method = match PaymentMethod::from_str(input.payment_method.trim()) {
        Ok(method) => Some(method),
        Err(_) => {
            errors.push("payment", "Invalid payment method");
            None
        }
    };

    let installments = input.installments.unwrap_or(1);
    match payment_method {
        Some(PaymentMethod::CreditCard) => {
            if !(1..=MAX_INSTALLMENTS).contains(&installments) {
                errors.push("installments", "Installments must be between 1 and 12");
            }
        }
        Some(_) if installments > 1 => {
            errors.push("installments", "Installments are only available for credit card");
        }
        _ => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let payment_method = payment_method.expect("validated above");
    Ok(ValidatedOrder {
        customer_name: name.to_string(),
        customer_rg: rg,
        customer_phone: phone,
        payment_method,
        installments: if payment_method == PaymentMethod::CreditCard {
            installments
        } else {
            1
        },
        selected_color: input
            .selected_color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Preto")
            .to_string(),
    })
}

/// Negotiation fields after validation and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedNegotiation {
    pub customer_name: String,
    /// Digits only.
    pub customer_phone: String,
}

/// Validate the identity fields of a new negotiation.
pub fn validate_negotiation(input: &NewNegotiation) -> Result<ValidatedNegotiation, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = input.customer_name.trim();
    if name.is_empty() {
        errors.push("name", "Name is required");
    }

    let phone = normalize_phone(&input.customer_phone);
    if phone.len() < 6 {
        errors.push("phone", "Phone number must have at least 6 digits");
    }

    if errors.is_empty() {
        Ok(ValidatedNegotiation {
            customer_name: name.to_string(),
            customer_phone: phone,
        })
    } else {
        Err(errors)
    }
}
