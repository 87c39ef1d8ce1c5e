// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Payment overlay evaluation.
//!
//! Only parent accounts can be blocked on payment grounds. Every other
//! category, including an absent one, is always let through.

use satchel_core::{PaymentStatus, SessionRecord, UserCategory};

use crate::store::RefreshState;

pub const NO_SESSION_MESSAGE: &str = "no active session";
pub const NOT_REQUIRED_MESSAGE: &str = "not required for this user type";
pub const UPDATE_REQUIRED_MESSAGE: &str = "subscription update required";
pub const PAYMENT_FOUND_MESSAGE: &str = "payment data found";

/// Derives the payment status from the current session. Pure.
pub fn evaluate_payment_status(
    state: &RefreshState,
    record: Option<&SessionRecord>,
) -> PaymentStatus {
    let record = match record {
        Some(record) if state.is_signed_in() => record,
        _ => return not_blocked(NO_SESSION_MESSAGE),
    };

    if record.user_category != Some(UserCategory::Parent) {
        return not_blocked(NOT_REQUIRED_MESSAGE);
    }

    if record.has_payments() {
        not_blocked(PAYMENT_FOUND_MESSAGE)
    } else {
        PaymentStatus {
            is_valid: false,
            is_subscription_active: false,
            show_overlay: true,
            message: UPDATE_REQUIRED_MESSAGE.to_string(),
            school_contact: record.school.clone(),
        }
    }
}

fn not_blocked(message: &str) -> PaymentStatus {
    PaymentStatus {
        is_valid: true,
        is_subscription_active: true,
        show_overlay: false,
        message: message.to_string(),
        school_contact: None,
    }
}
