use sea_orm::{DbErr, SqlErr};

/// True when `err` is a unique/primary key violation.
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// True for failures that a fresh transaction can be expected to get past:
/// a lost insert race on a unique key, a serialization failure or a deadlock.
pub fn is_transient(err: &DbErr) -> bool {
    if is_unique_violation(err) {
        return true;
    }

    // SQLSTATE 40001 serialization_failure, 40P01 deadlock_detected
    let message = err.to_string();
    message.contains("could not serialize access") || message.contains("deadlock detected")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_plain_errors_are_not_transient() {
        let err = DbErr::RecordNotFound("product".to_string());
        assert!(!is_unique_violation(&err));
        assert!(!is_transient(&err));
    }

    #[test]
    fn test_deadlock_is_transient() {
        let err = DbErr::Exec(RuntimeErr::Internal("deadlock detected".to_string()));
        assert!(is_transient(&err));
        assert!(!is_unique_violation(&err));
    }
}
