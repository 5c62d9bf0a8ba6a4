//! Development sample data.

use rusqlite::Connection;
use tracing::info;

use crate::credentials::hash_password;
use crate::error::{Result, VitalsError};

/// Whether seeding may run against a store that already has users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedMode {
    /// Refuse with `SeedRefused` unless `user_table` is empty.
    RequireEmpty,
    /// Explicit opt-in to add sample rows next to existing data.
    AllowExisting,
}

struct SampleUser {
    username: &'static str,
    password: &'static str,
    activity: (i64, i64, i64, &'static str),
    heart: (i64, i64, i64),
    medication: (&'static str, &'static str, bool, bool),
    nutrition: (i64, i64),
    records: &'static [(&'static str, &'static str, &'static str)],
}

const SAMPLE_USERS: [SampleUser; 5] = [
    SampleUser {
        username: "user1",
        password: "pass1",
        activity: (5000, 3, 35, "walking"),
        heart: (120, 60, 80),
        medication: ("Medication A", "Take 2 times a day", true, true),
        nutrition: (2000, 1800),
        records: &[
            ("2024-01-01", "Dr. Smith", "Flu"),
            ("2024-02-15", "Dr. Brown", "Cold"),
            ("2024-03-10", "Dr. Lee", "Allergy"),
        ],
    },
    SampleUser {
        username: "user2",
        password: "pass2",
        activity: (7000, 5, 50, "running"),
        heart: (130, 65, 85),
        medication: ("Medication B", "Take 2 times a day", true, false),
        nutrition: (2500, 2200),
        records: &[],
    },
    SampleUser {
        username: "user3",
        password: "pass3",
        activity: (10000, 7, 75, "cycling"),
        heart: (110, 58, 78),
        medication: ("Medication C", "Take 2 times a day", false, true),
        nutrition: (1800, 1700),
        records: &[],
    },
    SampleUser {
        username: "user4",
        password: "pass4",
        activity: (8000, 6, 60, "swimming"),
        heart: (125, 62, 83),
        medication: ("Medication D", "Take 2 times a day", true, true),
        nutrition: (2100, 1900),
        records: &[("2024-04-20", "Dr. White", "Injury")],
    },
    SampleUser {
        username: "user5",
        password: "pass5",
        activity: (6000, 4, 45, "running"),
        heart: (115, 64, 82),
        medication: ("Medication E", "Take 2 times a day", false, false),
        nutrition: (2300, 2000),
        records: &[("2024-05-05", "Dr. Green", "Routine Checkup")],
    },
];

/// Insert the sample users and one row per domain table for each, atomically.
///
/// Returns the number of rows inserted.
pub(crate) fn seed_sample_data(conn: &mut Connection, mode: SeedMode) -> Result<usize> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM user_table", [], |row| row.get(0))?;
    if existing > 0 && mode == SeedMode::RequireEmpty {
        return Err(VitalsError::SeedRefused);
    }

    let tx = conn.transaction()?;
    let mut inserted = 0usize;
    for sample in &SAMPLE_USERS {
        tx.execute(
            "INSERT INTO user_table (username, password) VALUES (?1, ?2)",
            (sample.username, hash_password(sample.password)?),
        )?;
        let user_id = tx.last_insert_rowid();

        let (steps, distance, time, activity) = sample.activity;
        tx.execute(
            "INSERT INTO activity_table (steps, distance, time, activity, user_table_user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            (steps, distance, time, activity, user_id),
        )?;

        let (rate, resting, recovery) = sample.heart;
        tx.execute(
            "INSERT INTO heart_table (rate, resting, recovery, user_table_user_id) VALUES (?1, ?2, ?3, ?4)",
            (rate, resting, recovery, user_id),
        )?;

        let (name, description, scheduled, taken) = sample.medication;
        tx.execute(
            "INSERT INTO medication_table (name, description, scheduled, taken, user_table_user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            (name, description, scheduled, taken, user_id),
        )?;

        let (goal, consumed) = sample.nutrition;
        tx.execute(
            "INSERT INTO nutrition_table (goal, consumed, user_table_user_id) VALUES (?1, ?2, ?3)",
            (goal, consumed, user_id),
        )?;

        for (date, doctor, diagnosis) in sample.records {
            tx.execute(
                "INSERT INTO record_table (date, doctor, diagnosis, user_table_user_id) VALUES (?1, ?2, ?3, ?4)",
                (date, doctor, diagnosis, user_id),
            )?;
        }

        inserted += 5 + sample.records.len();
    }
    tx.commit()?;

    info!(rows = inserted, "inserted sample data");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::ensure_schema;

    fn fresh() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        ensure_schema(&mut conn).unwrap();
        conn
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_seed_populates_every_table() {
        let mut conn = fresh();
        let inserted = seed_sample_data(&mut conn, SeedMode::RequireEmpty).unwrap();

        assert_eq!(inserted, 30);
        assert_eq!(count(&conn, "user_table"), 5);
        assert_eq!(count(&conn, "activity_table"), 5);
        assert_eq!(count(&conn, "heart_table"), 5);
        assert_eq!(count(&conn, "medication_table"), 5);
        assert_eq!(count(&conn, "nutrition_table"), 5);
        assert_eq!(count(&conn, "record_table"), 5);
    }

    #[test]
    fn test_seed_refuses_existing_users_without_opt_in() {
        let mut conn = fresh();
        conn.execute(
            "INSERT INTO user_table (username, password) VALUES ('real', 'x')",
            [],
        )
        .unwrap();

        let err = seed_sample_data(&mut conn, SeedMode::RequireEmpty).unwrap_err();
        assert!(matches!(err, VitalsError::SeedRefused));
        assert_eq!(count(&conn, "user_table"), 1);
        assert_eq!(count(&conn, "activity_table"), 0);

        seed_sample_data(&mut conn, SeedMode::AllowExisting).unwrap();
        assert_eq!(count(&conn, "user_table"), 6);
    }

    #[test]
    fn test_failed_seed_leaves_nothing_behind() {
        let mut conn = fresh();
        conn.execute(
            "INSERT INTO user_table (username, password) VALUES ('USER3', 'x')",
            [],
        )
        .unwrap();

        // user3 collides case-insensitively after user1 and user2 went in.
        assert!(seed_sample_data(&mut conn, SeedMode::AllowExisting).is_err());
        assert_eq!(count(&conn, "user_table"), 1);
        assert_eq!(count(&conn, "activity_table"), 0);
        assert_eq!(count(&conn, "record_table"), 0);
    }
}
