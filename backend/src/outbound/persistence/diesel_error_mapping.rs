//! Shared classification of Diesel and pool failures.
//!
//! Every repository folds database errors into the same three outcomes and
//! then into its own port error through a small `map_diesel_error`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Database failure reduced to what the ports can express.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The server closed the connection or could not be reached.
    Connection(String),
    /// A unique constraint rejected the write; carries the constraint name
    /// when the server reported one.
    Duplicate(String),
    Query(String),
}

pub(crate) fn classify_diesel_error(error: DieselError) -> DbFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DbFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => DbFailure::Query("database query error".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            DbFailure::Connection("database connection error".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            DbFailure::Duplicate(
                info.constraint_name()
                    .unwrap_or("unique constraint")
                    .to_owned(),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            DbFailure::Query(format!(
                "referenced row does not exist ({})",
                info.constraint_name().unwrap_or("foreign key")
            ))
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            DbFailure::Connection("transaction conflict; retry".to_owned())
        }
        _ => DbFailure::Query("database error".to_owned()),
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Collect fallible row conversions, failing on the first corrupt row.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Row counts fit in `u64`; negative values cannot come back from `COUNT`.
pub(crate) fn count_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Convert a pagination or limit value for `LIMIT`/`OFFSET`.
pub(crate) fn limit_for_db(value: impl TryInto<i64>) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}
