//! Session-scoped access to the store.
//!
//! [`Queries`] is the only way domain code reaches the data: every
//! statement it runs is bound to the active user before it is queued on
//! the store worker. The typed helpers live in one module per domain.

mod activity;
mod auth;
mod heart;
mod medication;
mod nutrition;
mod records;

use std::sync::Arc;

use crate::error::Result;
use crate::session::{SessionContext, UserId};
use crate::store::{Pending, QueryOutcome, ScopedStatement, StoreCell, StoreHandle};

pub use activity::NewActivity;
pub use heart::HeartReadings;
pub use medication::Medication;
pub use records::MedicalRecord;

/// Runs statements on behalf of whoever is logged in.
#[derive(Debug, Clone)]
pub struct Queries {
    store: Arc<StoreCell>,
    session: Arc<SessionContext>,
}

impl Queries {
    pub fn new(store: Arc<StoreCell>, session: Arc<SessionContext>) -> Self {
        Self { store, session }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn store(&self) -> &StoreCell {
        &self.store
    }

    /// Store first, then session; nothing is queued if either is missing.
    fn scope(&self) -> Result<(StoreHandle, UserId)> {
        let handle = self.store.get()?;
        let user = self.session.active_user()?;
        Ok((handle, user))
    }

    /// Queue one statement for the active user.
    ///
    /// Fails immediately with `StoreNotInitialized` or `NoActiveSession`.
    /// The statement runs even if the returned future is dropped.
    pub fn submit(&self, statement: ScopedStatement) -> Result<Pending<QueryOutcome>> {
        let (handle, user) = self.scope()?;
        Ok(handle.run(statement, user))
    }

    pub async fn execute(&self, statement: ScopedStatement) -> Result<QueryOutcome> {
        self.submit(statement)?.await
    }

    /// Queue statements to run in order inside one transaction.
    pub fn submit_batch(
        &self,
        statements: Vec<ScopedStatement>,
    ) -> Result<Pending<Vec<QueryOutcome>>> {
        let (handle, user) = self.scope()?;
        Ok(handle.run_batch(statements, user))
    }

    /// All-or-nothing: on failure nothing from the batch is kept and the
    /// error is `BatchAborted` with the failing index.
    pub async fn execute_batch(&self, statements: Vec<ScopedStatement>) -> Result<Vec<QueryOutcome>> {
        self.submit_batch(statements)?.await
    }

    async fn latest_i64(&self, sql: &'static str) -> Result<Option<i64>> {
        Ok(self.execute(ScopedStatement::new(sql)).await?.first_i64())
    }

    async fn texts(&self, sql: &'static str) -> Result<Vec<String>> {
        Ok(self.execute(ScopedStatement::new(sql)).await?.texts())
    }

    async fn insert(&self, statement: ScopedStatement) -> Result<i64> {
        Ok(self.execute(statement).await?.last_insert_id)
    }
}
