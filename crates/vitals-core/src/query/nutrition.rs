use rusqlite::types::Value;

use super::Queries;
use crate::error::{Result, VitalsError};
use crate::store::ScopedStatement;

fn check_calories(field: &str, value: i64) -> Result<i64> {
    if value < 0 {
        return Err(VitalsError::InvalidInput(format!(
            "{} calories cannot be negative: {}",
            field, value
        )));
    }
    Ok(value)
}

impl Queries {
    pub async fn goal_calories(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT goal FROM nutrition_table
             WHERE user_table_user_id = :user_id AND goal IS NOT NULL
             ORDER BY nutrition_id DESC LIMIT 1",
        )
        .await
    }

    pub async fn consumed_calories(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT consumed FROM nutrition_table
             WHERE user_table_user_id = :user_id AND consumed IS NOT NULL
             ORDER BY nutrition_id DESC LIMIT 1",
        )
        .await
    }

    /// Latest goal minus latest consumed, computed when asked.
    ///
    /// `None` without a goal. Missing consumption counts as zero and the
    /// result goes negative once the goal is exceeded. A difference that
    /// does not fit in an `i64` is a `Storage` error.
    pub async fn remaining_calories(&self) -> Result<Option<i64>> {
        let outcome = self
            .execute(ScopedStatement::new(
                "SELECT g.goal - COALESCE(
                     (SELECT consumed FROM nutrition_table
                      WHERE user_table_user_id = :user_id AND consumed IS NOT NULL
                      ORDER BY nutrition_id DESC LIMIT 1),
                     0)
                 FROM (SELECT goal FROM nutrition_table
                       WHERE user_table_user_id = :user_id AND goal IS NOT NULL
                       ORDER BY nutrition_id DESC LIMIT 1) AS g",
            ))
            .await?;
        // SQLite falls back to REAL when the subtraction overflows.
        match outcome.rows.first().and_then(|row| row.get(0)) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(remaining)) => Ok(Some(*remaining)),
            Some(other) => Err(VitalsError::Storage(format!(
                "Remaining calories out of range: {:?}",
                other
            ))),
        }
    }

    /// # Errors
    ///
    /// `InvalidInput` for a negative goal.
    pub async fn insert_goal_calories(&self, goal: i64) -> Result<i64> {
        let goal = check_calories("Goal", goal)?;
        self.insert(
            ScopedStatement::new(
                "INSERT INTO nutrition_table (goal, user_table_user_id) VALUES (?, :user_id)",
            )
            .bind(goal),
        )
        .await
    }

    pub async fn insert_consumed_calories(&self, consumed: i64) -> Result<i64> {
        let consumed = check_calories("Consumed", consumed)?;
        self.insert(
            ScopedStatement::new(
                "INSERT INTO nutrition_table (consumed, user_table_user_id) VALUES (?, :user_id)",
            )
            .bind(consumed),
        )
        .await
    }
}
