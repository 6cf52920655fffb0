//! In-memory user and admin registry
//!
//! Tracks every user the bot has seen, their role, and their ban state.
//! Nothing is persisted; a restart starts from a clean slate with only the
//! owner present. All mutations go through authorization checks: granting or
//! revoking roles is owner-only, banning is admin-or-owner, and the owner can
//! never be banned or demoted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// Privilege level of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Regular,
    Admin,
    Owner,
}

/// Per-user registry record
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub role: Role,
    pub banned: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl UserRecord {
    fn new(role: Role) -> Self {
        let now = Utc::now();
        Self {
            role,
            banned: false,
            first_seen: now,
            last_seen: now,
        }
    }
}

/// Registry operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("actor is not authorized for this operation")]
    Unauthorized,

    #[error("the owner cannot be banned or demoted")]
    ProtectedUser,
}

/// Aggregate user counts for /stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub banned: usize,
    pub active: usize,
}

/// In-memory registry of users, roles, and bans
pub struct UserRegistry {
    owner_id: i64,
    users: Mutex<HashMap<i64, UserRecord>>,
}

impl UserRegistry {
    /// Create a registry with the given owner, who starts as Owner role.
    /// An owner_id of 0 means no owner is configured.
    pub fn new(owner_id: i64) -> Self {
        let mut users = HashMap::new();
        if owner_id != 0 {
            users.insert(owner_id, UserRecord::new(Role::Owner));
        }
        Self {
            owner_id,
            users: Mutex::new(users),
        }
    }

    pub fn owner_id(&self) -> i64 {
        self.owner_id
    }

    /// Record that a user interacted with the bot. Idempotent: an existing
    /// record only gets its last_seen refreshed.
    pub async fn record_user(&self, user_id: i64) {
        let mut users = self.users.lock().await;
        users
            .entry(user_id)
            .and_modify(|rec| rec.last_seen = Utc::now())
            .or_insert_with(|| UserRecord::new(Role::Regular));
    }

    pub async fn is_banned(&self, user_id: i64) -> bool {
        self.users.lock().await.get(&user_id).map(|r| r.banned).unwrap_or(false)
    }

    /// Admins and the owner pass this check
    pub async fn is_admin(&self, user_id: i64) -> bool {
        self.users
            .lock()
            .await
            .get(&user_id)
            .map(|r| matches!(r.role, Role::Admin | Role::Owner))
            .unwrap_or(false)
    }

    pub async fn is_owner(&self, user_id: i64) -> bool {
        self.owner_id != 0 && user_id == self.owner_id
    }

    /// Change a user's role. Owner-only; the owner's own role is immutable.
    /// The target is registered first if the bot has never seen them.
    pub async fn set_role(&self, actor_id: i64, target_id: i64, role: Role) -> Result<(), RegistryError> {
        if !self.is_owner(actor_id).await {
            return Err(RegistryError::Unauthorized);
        }
        if target_id == self.owner_id {
            return Err(RegistryError::ProtectedUser);
        }

        let mut users = self.users.lock().await;
        users
            .entry(target_id)
            .or_insert_with(|| UserRecord::new(Role::Regular))
            .role = role;
        Ok(())
    }

    /// Ban or unban a user. Requires admin or owner; the owner is unbannable.
    /// The target is registered first if the bot has never seen them.
    pub async fn set_banned(&self, actor_id: i64, target_id: i64, banned: bool) -> Result<(), RegistryError> {
        if !self.is_admin(actor_id).await {
            return Err(RegistryError::Unauthorized);
        }
        if banned && target_id == self.owner_id {
            return Err(RegistryError::ProtectedUser);
        }

        let mut users = self.users.lock().await;
        users
            .entry(target_id)
            .or_insert_with(|| UserRecord::new(Role::Regular))
            .banned = banned;
        Ok(())
    }

    /// User counts for the /stats report
    pub async fn stats(&self) -> RegistryStats {
        let users = self.users.lock().await;
        let total = users.len();
        let banned = users.values().filter(|r| r.banned).count();
        RegistryStats {
            total,
            banned,
            active: total - banned,
        }
    }

    /// Every known, non-banned user id; the audience of /broadcast
    pub async fn broadcast_targets(&self) -> Vec<i64> {
        let users = self.users.lock().await;
        let mut targets: Vec<i64> = users
            .iter()
            .filter(|(_, rec)| !rec.banned)
            .map(|(id, _)| *id)
            .collect();
        targets.sort_unstable();
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: i64 = 1000;
    const ADMIN: i64 = 2000;
    const USER: i64 = 3000;

    async fn registry_with_admin() -> UserRegistry {
        let registry = UserRegistry::new(OWNER);
        registry.set_role(OWNER, ADMIN, Role::Admin).await.unwrap();
        registry
    }

    // ==================== Role Tests ====================

    #[tokio::test]
    async fn test_owner_is_admin_from_the_start() {
        let registry = UserRegistry::new(OWNER);
        assert!(registry.is_admin(OWNER).await);
        assert!(registry.is_owner(OWNER).await);
    }

    #[tokio::test]
    async fn test_set_role_requires_owner() {
        let registry = registry_with_admin().await;
        // An admin cannot promote
        assert_eq!(
            registry.set_role(ADMIN, USER, Role::Admin).await,
            Err(RegistryError::Unauthorized)
        );
        assert!(!registry.is_admin(USER).await);
    }

    #[tokio::test]
    async fn test_owner_can_promote_and_demote() {
        let registry = UserRegistry::new(OWNER);
        registry.set_role(OWNER, USER, Role::Admin).await.unwrap();
        assert!(registry.is_admin(USER).await);

        registry.set_role(OWNER, USER, Role::Regular).await.unwrap();
        assert!(!registry.is_admin(USER).await);
    }

    #[tokio::test]
    async fn test_owner_role_is_immutable() {
        let registry = UserRegistry::new(OWNER);
        assert_eq!(
            registry.set_role(OWNER, OWNER, Role::Regular).await,
            Err(RegistryError::ProtectedUser)
        );
        assert!(registry.is_owner(OWNER).await);
    }

    #[tokio::test]
    async fn test_no_owner_configured_means_no_admins() {
        let registry = UserRegistry::new(0);
        registry.record_user(USER).await;
        assert!(!registry.is_admin(USER).await);
        assert_eq!(registry.set_role(USER, USER, Role::Admin).await, Err(RegistryError::Unauthorized));
    }

    // ==================== Ban Tests ====================

    #[tokio::test]
    async fn test_admin_can_ban_and_unban() {
        let registry = registry_with_admin().await;
        registry.set_banned(ADMIN, USER, true).await.unwrap();
        assert!(registry.is_banned(USER).await);

        registry.set_banned(ADMIN, USER, false).await.unwrap();
        assert!(!registry.is_banned(USER).await);
    }

    #[tokio::test]
    async fn test_regular_user_cannot_ban() {
        let registry = UserRegistry::new(OWNER);
        registry.record_user(USER).await;
        assert_eq!(
            registry.set_banned(USER, OWNER + 1, true).await,
            Err(RegistryError::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_owner_cannot_be_banned() {
        let registry = registry_with_admin().await;
        assert_eq!(
            registry.set_banned(ADMIN, OWNER, true).await,
            Err(RegistryError::ProtectedUser)
        );
        assert!(!registry.is_banned(OWNER).await);
    }

    #[tokio::test]
    async fn test_ban_unknown_user_registers_them() {
        let registry = registry_with_admin().await;
        registry.set_banned(OWNER, USER, true).await.unwrap();
        assert!(registry.is_banned(USER).await);
        // Visible in stats once banned
        assert_eq!(registry.stats().await.banned, 1);
    }

    // ==================== Record / Stats Tests ====================

    #[tokio::test]
    async fn test_record_user_is_idempotent() {
        let registry = UserRegistry::new(OWNER);
        registry.record_user(USER).await;
        registry.record_user(USER).await;
        registry.record_user(USER).await;
        assert_eq!(registry.stats().await.total, 2); // owner + USER
    }

    #[tokio::test]
    async fn test_record_user_does_not_clear_ban() {
        let registry = registry_with_admin().await;
        registry.set_banned(OWNER, USER, true).await.unwrap();
        registry.record_user(USER).await;
        assert!(registry.is_banned(USER).await);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let registry = registry_with_admin().await;
        registry.record_user(USER).await;
        registry.record_user(USER + 1).await;
        registry.set_banned(OWNER, USER, true).await.unwrap();

        let stats = registry.stats().await;
        assert_eq!(stats.total, 4); // owner, admin, USER, USER+1
        assert_eq!(stats.banned, 1);
        assert_eq!(stats.active, 3);
    }

    #[tokio::test]
    async fn test_broadcast_targets_exclude_banned() {
        let registry = registry_with_admin().await;
        registry.record_user(USER).await;
        registry.set_banned(OWNER, USER, true).await.unwrap();

        let targets = registry.broadcast_targets().await;
        assert_eq!(targets, vec![OWNER, ADMIN]);
    }
}
