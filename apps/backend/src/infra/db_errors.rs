//! SeaORM -> DomainError translation helpers.
//!
//! Adapters return `sea_orm::DbErr`; the repos layer converts into
//! `crate::errors::domain::DomainError` here, and higher layers then map
//! `DomainError` to `AppError` via `From`.

use tracing::warn;

use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, NotFoundKind};
use crate::trace_ctx;

/// Detect a unique-constraint violation on `games.join_code` from the raw
/// driver message. Postgres names the constraint; SQLite spells out
/// table.column.
fn is_join_code_conflict(error_msg: &str) -> bool {
    error_msg.contains("games_join_code_key")
        || error_msg.contains("UNIQUE constraint failed: games.join_code")
}

fn is_connection_failure(error_msg: &str) -> bool {
    let msg = error_msg.to_lowercase();
    msg.contains("connection refused")
        || msg.contains("connection reset")
        || msg.contains("pool timed out")
        || msg.contains("connection closed")
}

/// Translate a `DbErr` into a `DomainError`.
pub fn map_db_err(e: sea_orm::DbErr) -> DomainError {
    let error_msg = e.to_string();
    let trace_id = trace_ctx::trace_id();

    match &e {
        sea_orm::DbErr::RecordNotFound(detail) => {
            return DomainError::not_found(NotFoundKind::Other("Record".into()), detail.clone());
        }
        sea_orm::DbErr::Conn(_) => {
            warn!(trace_id = %trace_id, error = %error_msg, "database connection failure");
            return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
        }
        _ => {}
    }

    if is_join_code_conflict(&error_msg) {
        return DomainError::conflict(ConflictKind::JoinCodeConflict, "Join code already exists");
    }

    if is_connection_failure(&error_msg) {
        warn!(trace_id = %trace_id, error = %error_msg, "database connection failure");
        return DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable");
    }

    warn!(trace_id = %trace_id, error = %error_msg, "unmapped database error");
    DomainError::infra(InfraErrorKind::Other("Db".into()), error_msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err = map_db_err(sea_orm::DbErr::RecordNotFound("Game not found".into()));
        assert!(matches!(err, DomainError::NotFound(_, _)));
    }

    #[test]
    fn postgres_join_code_violation_maps_to_conflict() {
        let err = map_db_err(sea_orm::DbErr::Custom(
            "duplicate key value violates unique constraint \"games_join_code_key\"".into(),
        ));
        assert_eq!(
            err,
            DomainError::conflict(ConflictKind::JoinCodeConflict, "Join code already exists")
        );
    }

    #[test]
    fn sqlite_join_code_violation_maps_to_conflict() {
        let err = map_db_err(sea_orm::DbErr::Custom(
            "UNIQUE constraint failed: games.join_code".into(),
        ));
        assert!(matches!(
            err,
            DomainError::Conflict(ConflictKind::JoinCodeConflict, _)
        ));
    }

    #[test]
    fn other_errors_map_to_infra() {
        let err = map_db_err(sea_orm::DbErr::Custom("something odd".into()));
        assert!(matches!(err, DomainError::Infra(_, _)));
    }
}
