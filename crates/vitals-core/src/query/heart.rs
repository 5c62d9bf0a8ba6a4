use serde::{Deserialize, Serialize};

use super::Queries;
use crate::error::{Result, VitalsError};
use crate::store::ScopedStatement;

/// Heart readings taken together; `None` fields are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartReadings {
    pub rate: Option<i64>,
    pub resting: Option<i64>,
    pub recovery: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
enum HeartColumn {
    Rate,
    Resting,
    Recovery,
}

fn reading_statement(column: HeartColumn, value: i64) -> ScopedStatement {
    let sql = match column {
        HeartColumn::Rate => {
            "INSERT INTO heart_table (rate, user_table_user_id) VALUES (?, :user_id)"
        }
        HeartColumn::Resting => {
            "INSERT INTO heart_table (resting, user_table_user_id) VALUES (?, :user_id)"
        }
        HeartColumn::Recovery => {
            "INSERT INTO heart_table (recovery, user_table_user_id) VALUES (?, :user_id)"
        }
    };
    ScopedStatement::new(sql).bind(value)
}

impl Queries {
    pub async fn current_heart_rate(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT rate FROM heart_table
             WHERE user_table_user_id = :user_id AND rate IS NOT NULL
             ORDER BY heart_id DESC LIMIT 1",
        )
        .await
    }

    /// Highest rate the active user has recorded.
    pub async fn peak_heart_rate(&self) -> Result<Option<i64>> {
        self.latest_i64("SELECT MAX(rate) FROM heart_table WHERE user_table_user_id = :user_id")
            .await
    }

    pub async fn resting_heart_rate(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT resting FROM heart_table
             WHERE user_table_user_id = :user_id AND resting IS NOT NULL
             ORDER BY heart_id DESC LIMIT 1",
        )
        .await
    }

    pub async fn recovery_heart_rate(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT recovery FROM heart_table
             WHERE user_table_user_id = :user_id AND recovery IS NOT NULL
             ORDER BY heart_id DESC LIMIT 1",
        )
        .await
    }

    pub async fn insert_heart_rate(&self, rate: i64) -> Result<i64> {
        self.insert(reading_statement(HeartColumn::Rate, rate)).await
    }

    pub async fn insert_resting_heart_rate(&self, resting: i64) -> Result<i64> {
        self.insert(reading_statement(HeartColumn::Resting, resting))
            .await
    }

    pub async fn insert_recovery_heart_rate(&self, recovery: i64) -> Result<i64> {
        self.insert(reading_statement(HeartColumn::Recovery, recovery))
            .await
    }

    /// Insert every given reading in one batch; either all land or none.
    ///
    /// Each reading gets its own row, as the single-value inserts do.
    /// Returns the number of rows written.
    pub async fn record_heart_readings(&self, readings: HeartReadings) -> Result<usize> {
        let statements: Vec<ScopedStatement> = [
            (HeartColumn::Rate, readings.rate),
            (HeartColumn::Resting, readings.resting),
            (HeartColumn::Recovery, readings.recovery),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| reading_statement(column, v)))
        .collect();
        if statements.is_empty() {
            return Err(VitalsError::InvalidInput(
                "No heart readings given".to_string(),
            ));
        }
        Ok(self.execute_batch(statements).await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::queries;
    use crate::store::TableName;

    #[tokio::test]
    async fn test_heart_readings() {
        let (queries, alice, _) = queries().await;
        queries.session().set_active_user(alice);

        assert_eq!(queries.peak_heart_rate().await.unwrap(), None);

        queries.insert_heart_rate(120).await.unwrap();
        queries.insert_heart_rate(95).await.unwrap();
        queries.insert_resting_heart_rate(60).await.unwrap();
        queries.insert_recovery_heart_rate(80).await.unwrap();
        queries.insert_resting_heart_rate(58).await.unwrap();

        assert_eq!(queries.current_heart_rate().await.unwrap(), Some(95));
        assert_eq!(queries.peak_heart_rate().await.unwrap(), Some(120));
        assert_eq!(queries.resting_heart_rate().await.unwrap(), Some(58));
        assert_eq!(queries.recovery_heart_rate().await.unwrap(), Some(80));
    }

    #[tokio::test]
    async fn test_peak_is_per_user() {
        let (queries, alice, bob) = queries().await;

        queries.session().set_active_user(alice);
        queries.insert_heart_rate(180).await.unwrap();

        queries.session().set_active_user(bob);
        queries.insert_heart_rate(110).await.unwrap();
        assert_eq!(queries.peak_heart_rate().await.unwrap(), Some(110));
        assert_eq!(queries.resting_heart_rate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_readings_are_recorded_together() {
        let (queries, alice, _) = queries().await;
        queries.session().set_active_user(alice);

        let written = queries
            .record_heart_readings(HeartReadings {
                rate: Some(72),
                resting: Some(58),
                recovery: None,
            })
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(queries.current_heart_rate().await.unwrap(), Some(72));
        assert_eq!(queries.resting_heart_rate().await.unwrap(), Some(58));
        assert_eq!(queries.recovery_heart_rate().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_readings_need_a_session_and_a_value() {
        let (queries, alice, _) = queries().await;
        let readings = HeartReadings {
            rate: Some(90),
            resting: Some(60),
            recovery: Some(75),
        };

        let err = queries.record_heart_readings(readings.clone()).await.unwrap_err();
        assert!(matches!(err, VitalsError::NoActiveSession));
        let handle = queries.store().get().unwrap();
        assert_eq!(handle.row_count(TableName::Heart).await.unwrap(), 0);

        queries.session().set_active_user(alice);
        let err = queries
            .record_heart_readings(HeartReadings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, VitalsError::InvalidInput(_)));
        assert_eq!(handle.row_count(TableName::Heart).await.unwrap(), 0);
    }
}
