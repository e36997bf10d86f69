//! Migration units.
//!
//! A [`Migration`] is a named step with one of two actions: literal SQL
//! executed verbatim, or a [`Procedure`] that issues its own statements.
//! Either way it runs against the command half of a transaction handle.

use crate::error::StepError;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use tm_db::Commands;

/// Boxed future returned by closure-based procedures.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Arbitrary code run as a migration step.
#[async_trait]
pub trait Procedure: Send + Sync {
    async fn run(&self, tx: &dyn Commands) -> Result<(), StepError>;
}

/// Adapter so plain closures can be used as a [`Procedure`].
struct FnProcedure<F>(F);

#[async_trait]
impl<F> Procedure for FnProcedure<F>
where
    F: for<'a> Fn(&'a dyn Commands) -> BoxFuture<'a, Result<(), StepError>> + Send + Sync,
{
    async fn run(&self, tx: &dyn Commands) -> Result<(), StepError> {
        (self.0)(tx).await
    }
}

/// What a migration does when applied.
pub enum MigrationAction {
    /// SQL text, possibly several `;`-separated statements, run as one batch
    Sql(String),
    /// Caller-supplied code
    Procedure(Box<dyn Procedure>),
}

impl fmt::Debug for MigrationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationAction::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            MigrationAction::Procedure(_) => f.write_str("Procedure(..)"),
        }
    }
}

/// A named, immutable migration step.
///
/// The name is what the ledger stores, so it must stay the same once the
/// migration has been applied.
#[derive(Debug)]
pub struct Migration {
    name: String,
    action: MigrationAction,
}

impl Migration {
    /// Migration that executes `sql` verbatim.
    pub fn sql(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: MigrationAction::Sql(sql.into()),
        }
    }

    /// Migration backed by a [`Procedure`] implementation.
    pub fn procedure(name: impl Into<String>, procedure: impl Procedure + 'static) -> Self {
        Self {
            name: name.into(),
            action: MigrationAction::Procedure(Box::new(procedure)),
        }
    }

    /// Migration backed by a closure returning a boxed future.
    ///
    /// ```ignore
    /// Migration::from_fn("seed admin", |tx| Box::pin(async move {
    ///     tx.execute("INSERT INTO users (id) VALUES (1)", &[]).await?;
    ///     Ok::<_, StepError>(())
    /// }));
    /// ```
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn Commands) -> BoxFuture<'a, Result<(), StepError>>
            + Send
            + Sync
            + 'static,
    {
        Self::procedure(name, FnProcedure(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &MigrationAction {
        &self.action
    }

    /// Run the action against `tx`. No retries; errors pass through as-is.
    pub async fn run(&self, tx: &dyn Commands) -> Result<(), StepError> {
        match &self.action {
            MigrationAction::Sql(sql) => tx.execute_batch(sql).await.map_err(StepError::from),
            MigrationAction::Procedure(procedure) => procedure.run(tx).await,
        }
    }
}

impl fmt::Display for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
