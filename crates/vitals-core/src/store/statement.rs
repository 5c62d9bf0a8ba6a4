//! Session-scoped statements and their results.

use std::borrow::Cow;
use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::Connection;

use crate::error::{Result, VitalsError};
use crate::session::UserId;

/// Named parameter every scoped statement must reference.
///
/// The worker binds it to the active user id; callers never supply it.
pub const SESSION_PARAM: &str = ":user_id";

/// A parameterized statement that runs on behalf of the active user.
///
/// Positional parameters (`?` or `?N`) are bound in order from the values
/// added with [`ScopedStatement::bind`]. The `:user_id` parameter is bound
/// from the session; a statement that does not mention it is rejected.
#[derive(Debug, Clone)]
pub struct ScopedStatement {
    sql: Cow<'static, str>,
    params: Vec<Value>,
}

impl ScopedStatement {
    pub fn new(sql: impl Into<Cow<'static, str>>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append the next positional value. `None` binds `NULL`.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// One result row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn by_name(&self, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values.get(index)
    }

    /// Integer at `index`; `None` for `NULL`, non-integers and missing columns.
    pub fn i64(&self, index: usize) -> Option<i64> {
        match self.values.get(index)? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Text at `index`; `None` for `NULL`, non-text and missing columns.
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.values.get(index)? {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Result of one executed statement.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    pub rows: Vec<Row>,
    pub rows_affected: usize,
    pub last_insert_id: i64,
    pub(crate) wrote: bool,
}

impl QueryOutcome {
    /// First column of the first row as an integer.
    pub fn first_i64(&self) -> Option<i64> {
        self.rows.first().and_then(|row| row.i64(0))
    }

    /// First column of every row as text, skipping `NULL`s.
    pub fn texts(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.text(0).map(str::to_string))
            .collect()
    }
}

/// Prepare `statement`, bind its parameters and the session user, and run it.
pub(crate) fn run_scoped(
    conn: &Connection,
    statement: &ScopedStatement,
    user: UserId,
) -> Result<QueryOutcome> {
    let mut prepared = conn.prepare(&statement.sql)?;

    let mut positional = statement.params.iter();
    let mut expected = 0usize;
    let mut scoped = false;
    for index in 1..=prepared.parameter_count() {
        if prepared.parameter_name(index) == Some(SESSION_PARAM) {
            prepared.raw_bind_parameter(index, user.get())?;
            scoped = true;
            continue;
        }
        expected += 1;
        if let Some(value) = positional.next() {
            prepared.raw_bind_parameter(index, value)?;
        }
    }

    if !scoped {
        return Err(VitalsError::UnscopedStatement);
    }
    if expected != statement.params.len() {
        return Err(VitalsError::ParameterMismatch {
            expected,
            supplied: statement.params.len(),
        });
    }

    let wrote = !prepared.readonly();
    let columns: Arc<[String]> = prepared
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        let rows_affected = prepared.raw_execute()?;
        return Ok(QueryOutcome {
            rows: Vec::new(),
            rows_affected,
            last_insert_id: conn.last_insert_rowid(),
            wrote,
        });
    }

    let mut out = Vec::new();
    let mut rows = prepared.raw_query();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(row.get::<_, Value>(index)?);
        }
        out.push(Row {
            columns: Arc::clone(&columns),
            values,
        });
    }
    drop(rows);

    Ok(QueryOutcome {
        rows_affected: if wrote { conn.changes() as usize } else { 0 },
        last_insert_id: conn.last_insert_rowid(),
        rows: out,
        wrote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, owner INTEGER NOT NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_session_parameter_is_bound_from_user() {
        let conn = conn();
        let user = UserId::new(7);

        let insert = ScopedStatement::new("INSERT INTO notes (body, owner) VALUES (?, :user_id)")
            .bind("hello".to_string());
        let outcome = run_scoped(&conn, &insert, user).unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert!(outcome.wrote);

        let owner: i64 = conn
            .query_row("SELECT owner FROM notes WHERE id = ?", [outcome.last_insert_id], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(owner, 7);
    }

    #[test]
    fn test_sentinel_lookalike_values_are_stored_verbatim() {
        let conn = conn();
        let user = UserId::new(3);

        for literal in [":user_id", "$userId"] {
            let insert =
                ScopedStatement::new("INSERT INTO notes (body, owner) VALUES (?1, :user_id)")
                    .bind(literal.to_string());
            run_scoped(&conn, &insert, user).unwrap();
        }

        let select = ScopedStatement::new("SELECT body FROM notes WHERE owner = :user_id ORDER BY id");
        let outcome = run_scoped(&conn, &select, user).unwrap();
        assert_eq!(outcome.texts(), vec![":user_id", "$userId"]);
        assert!(!outcome.wrote);
    }

    #[test]
    fn test_statement_without_session_parameter_is_rejected() {
        let conn = conn();
        let select = ScopedStatement::new("SELECT body FROM notes");
        let err = run_scoped(&conn, &select, UserId::new(1)).unwrap_err();
        assert!(matches!(err, VitalsError::UnscopedStatement));
    }

    #[test]
    fn test_positional_arity_is_checked() {
        let conn = conn();
        let insert = ScopedStatement::new("INSERT INTO notes (body, owner) VALUES (?, :user_id)");
        let err = run_scoped(&conn, &insert, UserId::new(1)).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::ParameterMismatch {
                expected: 1,
                supplied: 0
            }
        ));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_row_accessors() {
        let conn = conn();
        let user = UserId::new(2);
        run_scoped(
            &conn,
            &ScopedStatement::new("INSERT INTO notes (body, owner) VALUES (?, :user_id)")
                .bind(None::<String>),
            user,
        )
        .unwrap();

        let outcome = run_scoped(
            &conn,
            &ScopedStatement::new("SELECT id, body FROM notes WHERE owner = :user_id"),
            user,
        )
        .unwrap();
        let row = &outcome.rows[0];
        assert_eq!(row.i64(0), Some(1));
        assert_eq!(row.text(1), None);
        assert_eq!(row.by_name("body"), Some(&Value::Null));
        assert!(row.by_name("missing").is_none());
    }
}
