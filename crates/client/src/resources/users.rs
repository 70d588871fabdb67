//! User accounts, roles, and the permission catalogue.

use std::sync::{PoisonError, RwLock};

use freightdesk_auth::{NewUser, Permission, Role, UpdatePassword, User};
use freightdesk_core::{sort_by_id, EntityId};

use crate::api::{ApiClient, RequestOptions};
use crate::error::ApiError;
use crate::session::SessionStore;
use crate::transport::Method;

const ROLES_PATH: &str = "/role";
const PERMISSIONS_PATH: &str = "/permission";
const USERS_PATH: &str = "/auth";
const PASSWORD_PATH: &str = "/auth/password";
const BLOCK_PATH: &str = "/auth/block";

#[derive(Debug, Default)]
struct Lists {
    users: Vec<User>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
}

/// Administration of who may do what.
///
/// Creating a role reloads the current user, since the new role may change
/// the caller's own effective permissions.
#[derive(Debug)]
pub struct AccessStore {
    session: SessionStore,
    lists: RwLock<Lists>,
}

impl AccessStore {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            lists: RwLock::new(Lists::default()),
        }
    }

    fn api(&self) -> &ApiClient {
        self.session.api()
    }

    fn with_lists<T>(&self, f: impl FnOnce(&mut Lists) -> T) -> T {
        f(&mut self.lists.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn users(&self) -> Vec<User> {
        self.with_lists(|l| l.users.clone())
    }

    pub fn roles(&self) -> Vec<Role> {
        self.with_lists(|l| l.roles.clone())
    }

    pub fn permissions(&self) -> Vec<Permission> {
        self.with_lists(|l| l.permissions.clone())
    }

    // ── roles ────────────────────────────────────────────────────────────────

    /// All roles, by id, with access masks already decoded.
    pub async fn fetch_roles(&self) -> Result<Vec<Role>, ApiError> {
        let mut roles: Vec<Role> = self
            .api()
            .get(ROLES_PATH)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load roles"))?;
        sort_by_id(&mut roles);
        self.with_lists(|l| l.roles = roles.clone());
        Ok(roles)
    }

    pub async fn create_role(&self, role: &Role) -> Result<Role, ApiError> {
        let options = RequestOptions::json(&role.to_payload())?;
        let created: Role = self
            .api()
            .send(Method::Post, ROLES_PATH, options)
            .await
            .inspect_err(|e| tracing::error!(role = %role.name, error = %e, "failed to create role"))?;

        tracing::info!(role = %created.name, id = ?created.id, "role created");
        if let Err(e) = self.session.init().await {
            tracing::warn!(error = %e, "role created, but reloading the current user failed");
        }

        self.with_lists(|l| l.roles.push(created.clone()));
        Ok(created)
    }

    pub async fn delete_role(&self, role_id: EntityId) -> Result<(), ApiError> {
        let options = RequestOptions::new().param("roleId", role_id);
        self.api()
            .delete(ROLES_PATH, options)
            .await
            .inspect_err(|e| tracing::error!(%role_id, error = %e, "failed to delete role"))?;
        self.with_lists(|l| l.roles.retain(|r| r.id != Some(role_id)));
        Ok(())
    }

    /// The catalogue of grantable permissions (one per view).
    pub async fn fetch_permissions(&self) -> Result<Vec<Permission>, ApiError> {
        let permissions: Vec<Permission> = self
            .api()
            .get(PERMISSIONS_PATH)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load permissions"))?;
        self.with_lists(|l| l.permissions = permissions.clone());
        Ok(permissions)
    }

    // ── users ────────────────────────────────────────────────────────────────

    pub async fn fetch_users(&self) -> Result<Vec<User>, ApiError> {
        let mut users: Vec<User> = self
            .api()
            .get(USERS_PATH)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to load users"))?;
        sort_by_id(&mut users);
        self.with_lists(|l| l.users = users.clone());
        Ok(users)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let created: User = self
            .api()
            .send(Method::Post, USERS_PATH, RequestOptions::json(user)?)
            .await
            .inspect_err(|e| tracing::error!(username = %user.username, error = %e, "failed to create user"))?;
        tracing::info!(username = %user.username, id = ?created.id, "user created");
        self.with_lists(|l| l.users.push(created.clone()));
        Ok(created)
    }

    pub async fn delete_user(&self, auth_id: EntityId) -> Result<(), ApiError> {
        let options = RequestOptions::new().param("authId", auth_id);
        self.api()
            .delete(USERS_PATH, options)
            .await
            .inspect_err(|e| tracing::error!(%auth_id, error = %e, "failed to delete user"))?;
        self.with_lists(|l| l.users.retain(|u| u.id != Some(auth_id)));
        Ok(())
    }

    /// Change the signed-in user's password.
    pub async fn update_password(&self, body: &UpdatePassword) -> Result<(), ApiError> {
        self.api()
            .send_raw(Method::Post, PASSWORD_PATH, RequestOptions::json(body)?)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "password update failed"))?;
        tracing::info!("password updated");
        Ok(())
    }

    /// Block or unblock an account. The block timestamp is assigned by the
    /// backend; reload with [`AccessStore::fetch_users`] to see it.
    pub async fn block_user(&self, auth_id: EntityId, block: bool) -> Result<(), ApiError> {
        let options = RequestOptions::new()
            .param("authId", auth_id)
            .param("block", block);
        self.api()
            .send_raw(Method::Post, BLOCK_PATH, options)
            .await
            .inspect_err(|e| tracing::error!(%auth_id, block, error = %e, "failed to change block state"))?;
        tracing::info!(%auth_id, block, "block state changed");
        Ok(())
    }
}
