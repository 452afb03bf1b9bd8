//! Menu-driven personnel actions: the operator picks an action, the action
//! prompts for what it needs, runs one statement against the store, reports,
//! and control returns to the menu.

use std::sync::Arc;

use shared::error::ActionError;
use storage::{PersonnelStore, Storage};
use tracing::error;

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod resolver;
pub mod table;
pub mod terminal;

pub use dispatch::{run, MenuAction};
pub use resolver::Resolver;
pub use table::Table;
pub use terminal::{ScriptedTerminal, Terminal, Validation};

/// Everything a handler needs besides the terminal.
#[derive(Clone)]
pub struct ActionContext {
    pub store: Arc<dyn PersonnelStore>,
}

impl ActionContext {
    pub fn new(store: Arc<dyn PersonnelStore>) -> Self {
        Self { store }
    }

    pub fn resolver(&self) -> Resolver<'_, dyn PersonnelStore> {
        Resolver::new(self.store.as_ref())
    }
}

/// Opens the database and pings it. Any failure is a `Connection` error.
pub async fn open_storage(database_url: &str) -> Result<Storage, ActionError> {
    let connected = match Storage::new(database_url).await {
        Ok(storage) => storage.health_check().await.map(|()| storage),
        Err(err) => Err(err),
    };
    connected.map_err(|err| {
        let err = ActionError::connection(format!("{err:#}"));
        error!(%database_url, error = %err.message, "could not connect to the database");
        err
    })
}

pub(crate) fn query_failed(err: anyhow::Error) -> ActionError {
    ActionError::query(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use shared::error::ErrorCode;

    use super::*;

    #[tokio::test]
    async fn opens_and_pings_a_reachable_database() {
        let storage = open_storage("sqlite::memory:").await.expect("db");
        assert!(storage.list_departments().await.expect("departments").is_empty());
        storage.close().await;
    }

    #[tokio::test]
    async fn unopenable_database_is_a_connection_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!("sqlite://{}", dir.path().display());
        let err = open_storage(&url).await.expect_err("a directory is not a database");
        assert_eq!(err.code, ErrorCode::Connection);
    }
}
