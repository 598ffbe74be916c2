//! # Account Engine
//!
//! Admin-managed sub-admin accounts. Deleting or deactivating an account
//! never touches the exports it already made.

use tracing::info;

use tilestock_core::validation::{validate_new_sub_admin, validate_required};
use tilestock_core::{Actor, CoreError, CoreResult, NewSubAdmin, SubAdmin, SubAdminPatch};

use crate::repository::sub_admin::SubAdminRepository;

#[derive(Debug, Clone)]
pub struct AccountEngine {
    repo: SubAdminRepository,
}

impl AccountEngine {
    pub fn new(repo: SubAdminRepository) -> Self {
        AccountEngine { repo }
    }

    /// ## When This Fails
    /// - `Unauthorized`: actor is not an admin
    /// - `Validation`: bad username, blank key or name, or username taken
    pub async fn create_sub_admin(&self, actor: &Actor, input: NewSubAdmin) -> CoreResult<SubAdmin> {
        actor.require_admin("create sub admins")?;
        validate_new_sub_admin(&input)?;

        let account = self.repo.insert(&input, &actor.username).await?;
        info!(username = %account.username, by = %actor.username, "Sub admin created");
        Ok(account)
    }

    pub async fn list_sub_admins(&self, actor: &Actor) -> CoreResult<Vec<SubAdmin>> {
        actor.require_admin("list sub admins")?;
        Ok(self.repo.list().await?)
    }

    pub async fn update_sub_admin(
        &self,
        actor: &Actor,
        id: &str,
        patch: SubAdminPatch,
    ) -> CoreResult<SubAdmin> {
        actor.require_admin("update sub admins")?;
        if let Some(name) = &patch.display_name {
            validate_required("display_name", name)?;
        }
        if let Some(key) = &patch.pass_key {
            validate_required("pass_key", key)?;
        }

        let account = self
            .repo
            .update(id, &patch)
            .await?
            .ok_or_else(|| CoreError::not_found("SubAdmin", id))?;

        info!(username = %account.username, active = account.is_active, "Sub admin updated");
        Ok(account)
    }

    pub async fn delete_sub_admin(&self, actor: &Actor, id: &str) -> CoreResult<()> {
        actor.require_admin("delete sub admins")?;
        if !self.repo.delete(id).await? {
            return Err(CoreError::not_found("SubAdmin", id));
        }
        info!(id = %id, by = %actor.username, "Sub admin deleted");
        Ok(())
    }

    /// Looks an account up for login. The caller checks the key.
    pub async fn find_by_username(&self, username: &str) -> CoreResult<Option<SubAdmin>> {
        Ok(self.repo.get_by_username(username).await?)
    }
}
