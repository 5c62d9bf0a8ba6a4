//! The active-user session.
//!
//! One value for the whole process: set at login, read by every scoped
//! query. Concurrent logins are not arbitrated; the last write wins.

use std::fmt;
use std::sync::RwLock;

use crate::error::{Result, VitalsError};

/// Primary key of a row in `user_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Holds zero or one active user id.
#[derive(Debug, Default)]
pub struct SessionContext {
    active: RwLock<Option<UserId>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active user, replacing any previous one.
    pub fn set_active_user(&self, id: UserId) {
        // The guarded value is a plain `Copy` option, so a poisoned lock
        // still holds a whole value.
        let mut guard = self.active.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(id);
    }

    /// The active user, or `NoActiveSession` when nobody is logged in.
    pub fn active_user(&self) -> Result<UserId> {
        let active = *self.active.read().unwrap_or_else(|p| p.into_inner());
        active.ok_or(VitalsError::NoActiveSession)
    }

    pub fn clear_active_user(&self) {
        let mut guard = self.active.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    pub fn is_active(&self) -> bool {
        self.active_user().is_ok()
    }
}
