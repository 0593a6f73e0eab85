//! Store error types.

use shop_commerce::CommerceError;
use thiserror::Error;

/// Errors raised by the store itself.
#[derive(Error, Debug)]
pub enum DbError {
    /// The database rejected a statement or the connection failed.
    #[error("Query execution failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Applying the schema migrations failed.
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// A unique constraint would be broken.
    #[error("{entity} with {field} {value:?} already exists")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A row points at a parent that doesn't exist.
    #[error("{entity} references a missing row")]
    MissingReference { entity: &'static str },

    /// A stored row can't be turned back into a domain value.
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl DbError {
    /// Classify a failed write on `entity`.
    ///
    /// `keys` pairs each unique column with the value that was written to it;
    /// the column named in the database message is reported, else the first.
    pub(crate) fn on_write(e: sqlx::Error, entity: &'static str, keys: &[(&'static str, &str)]) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let message = db.message();
                let (field, value) = keys
                    .iter()
                    .find(|(field, _)| message.contains(&format!(".{}", field)))
                    .or_else(|| keys.first())
                    .map(|(field, value)| (*field, value.to_string()))
                    .unwrap_or(("id", String::new()));
                return DbError::UniqueViolation {
                    entity,
                    field,
                    value,
                };
            }
            if db.is_foreign_key_violation() {
                return DbError::MissingReference { entity };
            }
        }
        DbError::Sqlx(e)
    }
}

impl From<DbError> for CommerceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UniqueViolation { .. } | DbError::MissingReference { .. } => {
                CommerceError::Validation(e.to_string())
            }
            DbError::Sqlx(_) | DbError::Migrate(_) | DbError::InvalidRow(_) => {
                CommerceError::Database(e.to_string())
            }
        }
    }
}
