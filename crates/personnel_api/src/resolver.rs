use shared::{
    domain::{DepartmentId, EmployeeId, EntityKind, RoleId, NO_MANAGER},
    error::ActionError,
};
use storage::LookupStore;
use tracing::debug;

use crate::query_failed;

/// Translates display names picked by the operator into primary keys.
pub struct Resolver<'a, S: LookupStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LookupStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `Ok(None)` only for the manager sentinel, which never reaches the
    /// store. A name with no row is `NotFound`; duplicates resolve to the
    /// lowest id.
    pub async fn resolve(
        &self,
        kind: EntityKind,
        display_name: &str,
    ) -> Result<Option<i64>, ActionError> {
        if kind == EntityKind::Manager && display_name == NO_MANAGER {
            return Ok(None);
        }

        let id = self
            .store
            .lookup_id(kind, display_name)
            .await
            .map_err(query_failed)?
            .ok_or_else(|| ActionError::not_found(kind, display_name))?;
        debug!(%kind, display_name, id, "resolved display name");
        Ok(Some(id))
    }

    pub async fn department(&self, name: &str) -> Result<DepartmentId, ActionError> {
        self.required(EntityKind::Department, name)
            .await
            .map(DepartmentId)
    }

    pub async fn role(&self, title: &str) -> Result<RoleId, ActionError> {
        self.required(EntityKind::Role, title).await.map(RoleId)
    }

    pub async fn manager(&self, full_name: &str) -> Result<Option<EmployeeId>, ActionError> {
        Ok(self
            .resolve(EntityKind::Manager, full_name)
            .await?
            .map(EmployeeId))
    }

    async fn required(&self, kind: EntityKind, display_name: &str) -> Result<i64, ActionError> {
        self.resolve(kind, display_name)
            .await?
            .ok_or_else(|| ActionError::not_found(kind, display_name))
    }
}
