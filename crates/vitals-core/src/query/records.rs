use chrono::NaiveDate;
use serde::Serialize;

use super::Queries;
use crate::error::{Result, VitalsError};
use crate::store::ScopedStatement;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One entry of the medical history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicalRecord {
    pub date: NaiveDate,
    pub doctor: Option<String>,
    pub diagnosis: Option<String>,
}

impl Queries {
    /// Distinct records of the active user, newest first.
    pub async fn medical_history(&self) -> Result<Vec<MedicalRecord>> {
        let outcome = self
            .execute(ScopedStatement::new(
                "SELECT DISTINCT date, doctor, diagnosis FROM record_table
                 WHERE user_table_user_id = :user_id
                 ORDER BY date DESC",
            ))
            .await?;

        outcome
            .rows
            .iter()
            .map(|row| {
                let raw = row.text(0).unwrap_or_default();
                let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
                    VitalsError::Storage(format!("Invalid record date {:?}: {}", raw, e))
                })?;
                Ok(MedicalRecord {
                    date,
                    doctor: row.text(1).map(str::to_string),
                    diagnosis: row.text(2).map(str::to_string),
                })
            })
            .collect()
    }

    pub async fn insert_medical_record(
        &self,
        date: NaiveDate,
        doctor: &str,
        diagnosis: &str,
    ) -> Result<i64> {
        self.insert(
            ScopedStatement::new(
                "INSERT INTO record_table (date, doctor, diagnosis, user_table_user_id)
                 VALUES (?, ?, ?, :user_id)",
            )
            .bind(date.format(DATE_FORMAT).to_string())
            .bind(doctor.to_string())
            .bind(diagnosis.to_string()),
        )
        .await
    }
}
