use thiserror::Error;

/// Failures surfaced by catalog repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("conflicting {entity}: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    #[error("invalid {entity}: {message}")]
    Invalid {
        entity: &'static str,
        message: String,
    },

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Classify a driver error raised while writing `entity`.
    pub(crate) fn from_write(entity: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() || db.is_foreign_key_violation() || db.is_check_violation()
            {
                return Self::Conflict {
                    entity,
                    message: db.message().to_string(),
                };
            }
            // numeric_value_out_of_range
            if db.code().as_deref() == Some("22003") {
                return Self::Invalid {
                    entity,
                    message: db.message().to_string(),
                };
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_failures_stay_database_errors() {
        let err = StoreError::from_write("book", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn missing_row_message_names_entity_and_id() {
        assert_eq!(StoreError::not_found("author", 9).to_string(), "author 9 not found");
    }
}
