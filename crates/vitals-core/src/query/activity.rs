use serde::{Deserialize, Serialize};

use super::Queries;
use crate::error::Result;
use crate::store::ScopedStatement;

/// One activity entry. Every field is optional; unset columns stay `NULL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub steps: Option<i64>,
    pub distance: Option<i64>,
    /// Active minutes.
    pub time: Option<i64>,
    pub activity: Option<String>,
    pub log: Option<String>,
}

impl Queries {
    pub async fn current_steps(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT steps FROM activity_table
             WHERE user_table_user_id = :user_id AND steps IS NOT NULL
             ORDER BY activity_id DESC LIMIT 1",
        )
        .await
    }

    pub async fn current_distance(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT distance FROM activity_table
             WHERE user_table_user_id = :user_id AND distance IS NOT NULL
             ORDER BY activity_id DESC LIMIT 1",
        )
        .await
    }

    pub async fn current_time(&self) -> Result<Option<i64>> {
        self.latest_i64(
            "SELECT time FROM activity_table
             WHERE user_table_user_id = :user_id AND time IS NOT NULL
             ORDER BY activity_id DESC LIMIT 1",
        )
        .await
    }

    /// Activity labels, oldest first.
    pub async fn activity_labels(&self) -> Result<Vec<String>> {
        self.texts(
            "SELECT activity FROM activity_table
             WHERE user_table_user_id = :user_id AND activity IS NOT NULL
             ORDER BY activity_id",
        )
        .await
    }

    /// Free-text log entries, oldest first.
    pub async fn activity_log(&self) -> Result<Vec<String>> {
        self.texts(
            "SELECT log FROM activity_table
             WHERE user_table_user_id = :user_id AND log IS NOT NULL
             ORDER BY activity_id",
        )
        .await
    }

    pub async fn insert_activity(&self, label: &str) -> Result<i64> {
        self.insert(
            ScopedStatement::new(
                "INSERT INTO activity_table (activity, user_table_user_id) VALUES (?, :user_id)",
            )
            .bind(label.to_string()),
        )
        .await
    }

    pub async fn log_activity(&self, entry: &str) -> Result<i64> {
        self.insert(
            ScopedStatement::new(
                "INSERT INTO activity_table (log, user_table_user_id) VALUES (?, :user_id)",
            )
            .bind(entry.to_string()),
        )
        .await
    }

    /// Append a full activity row.
    pub async fn record_activity(&self, activity: NewActivity) -> Result<i64> {
        self.insert(
            ScopedStatement::new(
                "INSERT INTO activity_table (steps, distance, time, activity, log, user_table_user_id)
                 VALUES (?, ?, ?, ?, ?, :user_id)",
            )
            .bind(activity.steps)
            .bind(activity.distance)
            .bind(activity.time)
            .bind(activity.activity)
            .bind(activity.log),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::testing::queries;

    #[tokio::test]
    async fn test_current_values_use_latest_non_null_row() {
        let (queries, alice, _) = queries().await;
        queries.session().set_active_user(alice);

        queries
            .record_activity(NewActivity {
                steps: Some(5000),
                distance: Some(3),
                time: Some(35),
                activity: Some("walking".to_string()),
                log: None,
            })
            .await
            .unwrap();
        queries
            .record_activity(NewActivity {
                steps: Some(7200),
                ..NewActivity::default()
            })
            .await
            .unwrap();
        queries.log_activity("felt good").await.unwrap();

        assert_eq!(queries.current_steps().await.unwrap(), Some(7200));
        assert_eq!(queries.current_distance().await.unwrap(), Some(3));
        assert_eq!(queries.current_time().await.unwrap(), Some(35));
        assert_eq!(queries.activity_log().await.unwrap(), vec!["felt good"]);
    }

    #[tokio::test]
    async fn test_users_never_see_each_others_rows() {
        let (queries, alice, bob) = queries().await;

        queries.session().set_active_user(alice);
        queries.insert_activity("running").await.unwrap();
        queries
            .record_activity(NewActivity {
                steps: Some(9000),
                ..NewActivity::default()
            })
            .await
            .unwrap();

        queries.session().set_active_user(bob);
        assert_eq!(queries.current_steps().await.unwrap(), None);
        assert!(queries.activity_labels().await.unwrap().is_empty());
        queries.insert_activity("cycling").await.unwrap();

        queries.session().set_active_user(alice);
        assert_eq!(queries.current_steps().await.unwrap(), Some(9000));
        assert_eq!(queries.activity_labels().await.unwrap(), vec!["running"]);
    }

    #[tokio::test]
    async fn test_each_insert_appends_a_row() {
        let (queries, alice, _) = queries().await;
        queries.session().set_active_user(alice);

        let first = queries.insert_activity("swimming").await.unwrap();
        let second = queries.insert_activity("swimming").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(
            queries.activity_labels().await.unwrap(),
            vec!["swimming", "swimming"]
        );
    }
}
