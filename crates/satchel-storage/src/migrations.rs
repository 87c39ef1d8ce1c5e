// SPDX-FileCopyrightText: 2026 Satchel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled in via `embed_migrations!`
//! and applied on every open.

use satchel_core::SatchelError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), SatchelError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(SatchelError::storage)?;
    tracing::debug!(
        applied = report.applied_migrations().len(),
        "storage migrations complete"
    );
    Ok(())
}
