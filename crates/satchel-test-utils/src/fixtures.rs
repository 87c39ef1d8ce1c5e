// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session records shaped like real backend responses.

use satchel_core::{SchoolContact, SessionRecord};
use serde_json::json;

fn decode(value: serde_json::Value) -> SessionRecord {
    serde_json::from_value(value).expect("fixture must decode")
}

/// Parent account with no payments on file.
pub fn parent_without_payment() -> SessionRecord {
    let mut record = decode(json!({
        "id": 61,
        "full_name": "Jane",
        "user_category": 1,
        "user_payments": [],
        "profile_image": "jane.jpg",
    }));
    record.school = Some(school());
    record
}

/// Parent account with one active payment.
pub fn parent_with_payment() -> SessionRecord {
    decode(json!({
        "id": 61,
        "full_name": "Jane",
        "user_category": 1,
        "user_payments": [{
            "id": 9001,
            "ups_is_active": true,
            "paid_at": "2026-01-05T09:00:00Z",
            "expires_at": "2027-01-05T09:00:00Z",
        }],
    }))
}

/// Educator account; never subject to the payment overlay.
pub fn educator() -> SessionRecord {
    decode(json!({"id": 7, "full_name": "Mr. Lee", "user_category": 2}))
}

/// A record missing `full_name`, as returned by a truncated response.
pub fn incomplete_record() -> SessionRecord {
    decode(json!({"id": 61, "user_category": 1}))
}

pub fn school() -> SchoolContact {
    SchoolContact {
        name: Some("Hillside Primary".to_string()),
        phone: Some("+254 700 000 000".to_string()),
        email: Some("office@hillside.example".to_string()),
    }
}
