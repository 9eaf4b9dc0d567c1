//! In-memory record store for users and items.
//!
//! Both collections live behind one `tokio::sync::RwLock`. Reads share it, writes take it
//! exclusively, and password hashing always happens on the blocking pool with the lock
//! released.

use chrono::Utc;
use itemvault_shared::{CredentialHasher, HashError, Item, Role, User};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};
use uuid::Uuid;

/// Checked against when a login names an account that does not exist.
const DECOY_PASSWORD: &str = "itemvault-decoy-password";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("user already exists")]
    UserExists,
    #[error("invalid role")]
    InvalidRole,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("item not found")]
    ItemNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("failed to hash password: {0}")]
    HashingFailure(String),
}

impl From<HashError> for StoreError {
    fn from(e: HashError) -> Self {
        StoreError::HashingFailure(e.to_string())
    }
}

#[derive(Default)]
struct Tables {
    /// Keyed by lowercase username.
    users: HashMap<String, User>,
    items: HashMap<Uuid, Item>,
}

pub struct RecordStore {
    tables: RwLock<Tables>,
    hasher: Arc<dyn CredentialHasher>,
    decoy_hash: OnceCell<String>,
}

fn username_key(username: &str) -> String {
    username.trim().to_lowercase()
}

impl RecordStore {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            hasher,
            decoy_hash: OnceCell::new(),
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, StoreError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| StoreError::HashingFailure(e.to_string()))?
            .map_err(StoreError::from)
    }

    async fn verify_password(&self, password: &str, hashed: &str) -> Result<bool, StoreError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hashed = hashed.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hashed))
            .await
            .map_err(|e| StoreError::HashingFailure(e.to_string()))
    }

    /// Hash of a fixed password at the configured cost, made on first use.
    async fn decoy_hash(&self) -> Result<&str, StoreError> {
        self.decoy_hash
            .get_or_try_init(|| self.hash_password(DECOY_PASSWORD))
            .await
            .map(String::as_str)
    }

    /// Create the bootstrap admin, or make sure an existing account with that name is an
    /// admin. The flag is true only when a new account was created.
    pub async fn ensure_admin_user(&self, username: &str, password: &str) -> Result<(User, bool), StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::InvalidInput("admin username cannot be empty"));
        }
        if password.is_empty() {
            return Err(StoreError::InvalidInput("admin password cannot be empty"));
        }
        let key = username_key(username);

        let exists = self.tables.read().await.users.contains_key(&key);
        if exists {
            if let Some(user) = self.promote_existing(&key).await {
                return Ok((user, false));
            }
        }

        let password_hash = self.hash_password(password).await?;

        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.get_mut(&key) {
            // Registered while we were hashing.
            existing.role = Role::Admin;
            return Ok((existing.clone(), false));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            role: Role::Admin,
            created_at: Utc::now(),
        };
        tables.users.insert(key, user.clone());
        tracing::debug!(user_id = %user.id, "created admin user");
        Ok((user, true))
    }

    async fn promote_existing(&self, key: &str) -> Option<User> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(key)?;
        if user.role != Role::Admin {
            tracing::warn!("Restoring admin role for bootstrap user '{}'", user.username);
            user.role = Role::Admin;
        }
        Some(user.clone())
    }

    /// Register a new account. An empty role means `user`.
    pub async fn create_user(&self, username: &str, password: &str, role: &str) -> Result<User, StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::InvalidInput("username cannot be empty"));
        }
        if password.is_empty() {
            return Err(StoreError::InvalidInput("password cannot be empty"));
        }
        let role = match role.trim() {
            "" => Role::User,
            other => other.parse::<Role>().map_err(|_| StoreError::InvalidRole)?,
        };
        let key = username_key(username);

        let taken = self.tables.read().await.users.contains_key(&key);
        if taken {
            return Err(StoreError::UserExists);
        }

        let password_hash = self.hash_password(password).await?;

        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&key) {
            return Err(StoreError::UserExists);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };
        tables.users.insert(key, user.clone());
        tracing::debug!(user_id = %user.id, role = %user.role, "created user");
        Ok(user)
    }

    /// Check a username/password pair. Unknown users and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let key = username_key(username);
        let user = self.tables.read().await.users.get(&key).cloned();
        let Some(user) = user else {
            // Same amount of hashing work as a wrong password.
            let decoy = self.decoy_hash().await?;
            self.verify_password(password, decoy).await?;
            return Err(StoreError::InvalidCredentials);
        };
        if !self.verify_password(password, &user.password_hash).await? {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user)
    }

    /// All items, oldest first.
    pub async fn list_items(&self) -> Vec<Item> {
        let tables = self.tables.read().await;
        let mut items: Vec<Item> = tables.items.values().cloned().collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        items
    }

    pub async fn get_item(&self, id: Uuid) -> Result<Item, StoreError> {
        self.tables
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .ok_or(StoreError::ItemNotFound)
    }

    pub async fn create_item(&self, owner: &str, title: &str, description: &str) -> Result<Item, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title cannot be empty"));
        }
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.trim().to_string(),
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.items.insert(item.id, item.clone());
        tracing::debug!(item_id = %item.id, owner = %item.owner, "created item");
        Ok(item)
    }

    /// Overwrite title and description. Only the owner or an admin may do this.
    pub async fn update_item(
        &self,
        id: Uuid,
        requester: &str,
        is_admin: bool,
        title: &str,
        description: &str,
    ) -> Result<Item, StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title cannot be empty"));
        }

        let mut tables = self.tables.write().await;
        let item = tables.items.get_mut(&id).ok_or(StoreError::ItemNotFound)?;
        if item.owner != requester.trim() && !is_admin {
            return Err(StoreError::Forbidden);
        }
        item.title = title.to_string();
        item.description = description.trim().to_string();
        item.updated_at = Utc::now();
        tracing::debug!(item_id = %id, requester, "updated item");
        Ok(item.clone())
    }

    /// Remove an item. Callers are responsible for gating this on role.
    pub async fn delete_item(&self, id: Uuid) -> Result<(), StoreError> {
        match self.tables.write().await.items.remove(&id) {
            Some(_) => {
                tracing::debug!(item_id = %id, "deleted item");
                Ok(())
            }
            None => Err(StoreError::ItemNotFound),
        }
    }

    /// All users, oldest first.
    pub async fn list_users(&self) -> Vec<User> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        users
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.tables
            .read()
            .await
            .users
            .values()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }

    /// Remove a user by id. Items they own are left in place.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let key = tables
            .users
            .iter()
            .find(|(_, user)| user.id == id)
            .map(|(key, _)| key.clone())
            .ok_or(StoreError::UserNotFound)?;
        tables.users.remove(&key);
        tracing::debug!(user_id = %id, "deleted user");
        Ok(())
    }
}
