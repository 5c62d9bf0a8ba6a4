use serde::Serialize;

use super::Queries;
use crate::error::{Result, VitalsError};
use crate::store::{Row, ScopedStatement};

/// A row of `medication_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub scheduled: bool,
    pub taken: bool,
}

impl Medication {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            id: row.i64(0)?,
            name: row.text(1)?.to_string(),
            description: row.text(2).map(str::to_string),
            scheduled: row.i64(3).unwrap_or(0) != 0,
            taken: row.i64(4).unwrap_or(0) != 0,
        })
    }
}

impl Queries {
    pub async fn medication_names(&self) -> Result<Vec<String>> {
        self.texts(
            "SELECT name FROM medication_table
             WHERE user_table_user_id = :user_id ORDER BY med_id",
        )
        .await
    }

    pub async fn medication_descriptions(&self) -> Result<Vec<String>> {
        self.texts(
            "SELECT description FROM medication_table
             WHERE user_table_user_id = :user_id AND description IS NOT NULL
             ORDER BY med_id",
        )
        .await
    }

    pub async fn medications(&self) -> Result<Vec<Medication>> {
        let outcome = self
            .execute(ScopedStatement::new(
                "SELECT med_id, name, description, scheduled, taken FROM medication_table
                 WHERE user_table_user_id = :user_id ORDER BY med_id",
            ))
            .await?;
        Ok(outcome.rows.iter().filter_map(Medication::from_row).collect())
    }

    pub async fn insert_medication(
        &self,
        name: &str,
        description: Option<&str>,
        scheduled: bool,
    ) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(VitalsError::InvalidInput(
                "Medication name cannot be empty".to_string(),
            ));
        }
        self.insert(
            ScopedStatement::new(
                "INSERT INTO medication_table (name, description, scheduled, user_table_user_id)
                 VALUES (?, ?, ?, :user_id)",
            )
            .bind(name.to_string())
            .bind(description.map(str::to_string))
            .bind(scheduled),
        )
        .await
    }

    /// Set the taken flag on one of the active user's medications.
    ///
    /// # Errors
    ///
    /// `NotFound` when `med_id` does not exist or belongs to someone else.
    pub async fn mark_medication_taken(&self, med_id: i64) -> Result<()> {
        let outcome = self
            .execute(
                ScopedStatement::new(
                    "UPDATE medication_table SET taken = 1
                     WHERE med_id = ? AND user_table_user_id = :user_id",
                )
                .bind(med_id),
            )
            .await?;
        if outcome.rows_affected == 0 {
            return Err(VitalsError::NotFound(format!("medication {}", med_id)));
        }
        Ok(())
    }
}
