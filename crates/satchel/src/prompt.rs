// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token acquisition via flag, SATCHEL_TOKEN environment variable, or TTY prompt.

use satchel_core::{AuthToken, SatchelError};

/// The environment variable name for providing the backend token.
pub const TOKEN_ENV_VAR: &str = "SATCHEL_TOKEN";

/// Resolves the login token.
///
/// Priority:
/// 1. `--token` flag
/// 2. `SATCHEL_TOKEN` environment variable
/// 3. Interactive TTY prompt via `rpassword`
pub fn get_token(flag: Option<String>) -> Result<AuthToken, SatchelError> {
    if let Some(token) = flag.filter(|t| !t.trim().is_empty()) {
        return Ok(AuthToken::new(token));
    }

    if let Ok(token) = std::env::var(TOKEN_ENV_VAR)
        && !token.trim().is_empty()
    {
        return Ok(AuthToken::new(token));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("Backend token: ");
        let token = rpassword::read_password()
            .map_err(|e| SatchelError::Internal(format!("failed to read token: {e}")))?;
        if token.trim().is_empty() {
            return Err(SatchelError::Unauthorized {
                message: "empty token not allowed".to_string(),
            });
        }
        return Ok(AuthToken::new(token.trim()));
    }

    Err(SatchelError::Unauthorized {
        message: format!(
            "no token provided. Pass --token, set {TOKEN_ENV_VAR}, or run interactively."
        ),
    })
}
