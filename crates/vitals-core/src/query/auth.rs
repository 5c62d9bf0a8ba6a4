use tracing::{debug, info};

use super::Queries;
use crate::credentials::{hash_password, verify_password};
use crate::error::{Result, VitalsError};
use crate::session::UserId;

impl Queries {
    /// Create a user. Does not log them in.
    pub async fn register_user(&self, username: &str, password: &str) -> Result<UserId> {
        let username = username.trim();
        if username.is_empty() {
            return Err(VitalsError::InvalidInput(
                "Username cannot be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(VitalsError::InvalidInput(
                "Password cannot be empty".to_string(),
            ));
        }

        let handle = self.store.get()?;
        let hash = hash_password(password)?;
        handle.insert_user(username.to_string(), hash).await
    }

    /// Check credentials and make the user active.
    ///
    /// Unknown users and wrong passwords fail the same way.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserId> {
        let handle = self.store.get()?;
        let Some((id, stored)) = handle.find_user(username.trim().to_string()).await? else {
            debug!("login rejected: unknown user");
            return Err(VitalsError::InvalidCredentials);
        };
        if !verify_password(password, &stored)? {
            debug!(user = %id, "login rejected: wrong password");
            return Err(VitalsError::InvalidCredentials);
        }

        self.session.set_active_user(id);
        info!(user = %id, "logged in");
        Ok(id)
    }

    pub fn logout(&self) {
        self.session.clear_active_user();
    }
}

#[cfg(test)]
mod tests {
    use crate::error::VitalsError;
    use crate::query::testing::queries;

    #[tokio::test]
    async fn test_login_sets_session() {
        let (queries, alice, bob) = queries().await;

        assert_eq!(queries.login("alice", "alice-pw").await.unwrap(), alice);
        assert_eq!(queries.session().active_user().unwrap(), alice);

        assert_eq!(queries.login("BOB", "bob-pw").await.unwrap(), bob);
        assert_eq!(queries.session().active_user().unwrap(), bob);

        queries.logout();
        assert!(!queries.session().is_active());
    }

    #[tokio::test]
    async fn test_bad_credentials_look_alike() {
        let (queries, _, _) = queries().await;

        let wrong_password = queries.login("alice", "nope").await.unwrap_err();
        let unknown_user = queries.login("mallory", "alice-pw").await.unwrap_err();
        assert!(matches!(wrong_password, VitalsError::InvalidCredentials));
        assert!(matches!(unknown_user, VitalsError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(!queries.session().is_active());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (queries, _, _) = queries().await;
        assert!(matches!(
            queries.register_user("Alice", "other").await,
            Err(VitalsError::InvalidInput(_))
        ));
        assert!(matches!(
            queries.register_user("  ", "pw").await,
            Err(VitalsError::InvalidInput(_))
        ));
    }
}
