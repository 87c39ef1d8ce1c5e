// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `login`, `logout`, `status`, and `refresh` command implementations.

use chrono::{DateTime, Utc};
use satchel_api::resolve_media_url;
use satchel_config::model::SatchelConfig;
use satchel_core::{PaymentStatus, RefreshTrigger, SatchelError, SessionRecord, SessionSource};
use satchel_session::{MergeGuard, RefreshOutcome, RejectReason, SessionSnapshot, SkipReason};
use serde::Serialize;
use tracing::info;

use crate::app::App;
use crate::prompt;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub signed_in: bool,
    pub record: Option<SessionRecord>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub profile_image_url: Option<String>,
    pub payment: PaymentStatus,
}

impl StatusResponse {
    fn new(snapshot: &SessionSnapshot, payment: PaymentStatus, base_url: &str) -> Self {
        let record = snapshot.record.as_deref().cloned();
        let profile_image_url = record
            .as_ref()
            .and_then(|r| r.profile_image.as_deref())
            .and_then(|reference| resolve_media_url(base_url, reference))
            .map(String::from);
        Self {
            signed_in: snapshot.refresh.is_signed_in(),
            record,
            last_updated_at: snapshot.refresh.last_updated_at,
            profile_image_url,
            payment,
        }
    }
}

/// Run `satchel login`.
///
/// The token is checked against the backend first; the session is stored
/// only if the backend returns a complete record for it.
pub async fn run_login(config: &SatchelConfig, token: Option<String>) -> Result<(), SatchelError> {
    let token = prompt::get_token(token)?;
    let app = App::open(config).await?;

    let payload = app.api.fetch_session(&token).await?;
    let record = MergeGuard::select_candidate(Ok(payload)).map_err(|reason| match reason {
        RejectReason::Incomplete(missing) => SatchelError::IncompleteRecord { missing },
        _ => SatchelError::EmptyPayload,
    })?;

    let name = record.full_name.clone().unwrap_or_default();
    app.sync.login(token, Some(record)).await?;
    info!("login stored");
    println!("Signed in as {name}");
    print_payment(&app.sync.payment_status());
    Ok(())
}

/// Run `satchel logout`.
pub async fn run_logout(config: &SatchelConfig) -> Result<(), SatchelError> {
    let app = App::open(config).await?;
    if !app.sync.reader().is_signed_in() {
        println!("Not signed in");
        return Ok(());
    }
    app.sync.logout().await;
    println!("Signed out");
    Ok(())
}

/// Run `satchel status`. Reads local state only.
pub async fn run_status(config: &SatchelConfig, json: bool) -> Result<(), SatchelError> {
    let app = App::open(config).await?;
    let snapshot = app.sync.reader().snapshot();
    let status = StatusResponse::new(&snapshot, app.sync.payment_status(), app.api.base_url());

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| SatchelError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    print_status(&status);
    Ok(())
}

/// Run `satchel refresh`: one manual refresh.
pub async fn run_refresh(config: &SatchelConfig) -> Result<(), SatchelError> {
    let app = App::open(config).await?;
    app.log_health().await;

    match app.sync.refresh(RefreshTrigger::Manual).await {
        RefreshOutcome::Updated => println!("Session refreshed"),
        RefreshOutcome::Skipped(reason) => println!("Refresh skipped: {}", describe_skip(reason)),
        RefreshOutcome::Rejected(reason) => {
            println!("Refresh rejected, stored session kept: {}", describe_reject(&reason));
        }
    }
    print_payment(&app.sync.payment_status());
    Ok(())
}

fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NotAuthenticated => "not signed in",
        SkipReason::Fresh => "session is fresh",
    }
}

fn describe_reject(reason: &RejectReason) -> String {
    match reason {
        RejectReason::Fetch(category) => format!("{category} failure"),
        RejectReason::EmptyPayload => "backend returned no session".to_string(),
        RejectReason::Incomplete(missing) => format!("missing {}", missing.join(", ")),
        RejectReason::SessionChanged => "session changed during fetch".to_string(),
    }
}

fn print_status(status: &StatusResponse) {
    if !status.signed_in {
        println!("Not signed in");
        return;
    }

    match &status.record {
        Some(record) => {
            println!(
                "User:         {} (id {})",
                record.full_name.as_deref().unwrap_or("<unknown>"),
                record
                    .id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
            if let Some(category) = record.user_category {
                println!("Category:     {category}");
            }
            println!(
                "Payments:     {}",
                record.user_payments.as_ref().map_or(0, Vec::len)
            );
            if let Some(url) = &status.profile_image_url {
                println!("Photo:        {url}");
            }
        }
        None => println!("User:         <not loaded>"),
    }

    match status.last_updated_at {
        Some(ts) => println!("Last updated: {}", ts.to_rfc3339()),
        None => println!("Last updated: never"),
    }
    print_payment(&status.payment);
}

fn print_payment(payment: &PaymentStatus) {
    println!("Payment:      {}", payment.message);
    if !payment.show_overlay {
        return;
    }
    if let Some(school) = &payment.school_contact {
        let parts: Vec<&str> = [&school.name, &school.phone, &school.email]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect();
        if !parts.is_empty() {
            println!("Contact:      {}", parts.join(" / "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use satchel_core::{AuthToken, FailureCategory, UserCategory};
    use satchel_session::RefreshState;

    #[test]
    fn status_resolves_profile_image() {
        let record = SessionRecord {
            id: Some(61),
            full_name: Some("Jane".into()),
            user_category: Some(UserCategory::Parent),
            profile_image: Some("jane.jpg".into()),
            ..SessionRecord::default()
        };
        let snapshot = SessionSnapshot {
            record: Some(Arc::new(record)),
            refresh: RefreshState {
                last_updated_at: None,
                is_authenticated: true,
                token: Some(AuthToken::new("t")),
            },
        };
        let payment = satchel_session::evaluate_payment_status(
            &snapshot.refresh,
            snapshot.record.as_deref(),
        );

        let status = StatusResponse::new(&snapshot, payment, "https://school.example");
        assert!(status.signed_in);
        assert_eq!(
            status.profile_image_url.as_deref(),
            Some("https://school.example/media/jane.jpg")
        );
        assert!(status.payment.show_overlay);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["record"]["user_category"], 1);
    }

    #[test]
    fn reject_reasons_read_well() {
        assert_eq!(
            describe_reject(&RejectReason::Incomplete(vec!["id", "full_name"])),
            "missing id, full_name"
        );
        assert_eq!(
            describe_reject(&RejectReason::Fetch(FailureCategory::Authentication)),
            "authentication failure"
        );
    }
}
