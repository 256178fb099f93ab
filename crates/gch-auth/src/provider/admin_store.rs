//! Admin-profile store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gch_core::result::AppResult;
use gch_entity::admin::{AdminProfile, NewAdminProfile, UpdateAdminProfile};

/// Access to the `admin_users` table.
#[async_trait]
pub trait AdminProfileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find the profile attached to an external identity.
    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<AdminProfile>>;

    /// Find a profile by contact email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<AdminProfile>>;

    /// List every profile, newest first.
    async fn list(&self) -> AppResult<Vec<AdminProfile>>;

    /// Create a profile.
    async fn insert(&self, profile: NewAdminProfile) -> AppResult<AdminProfile>;

    /// Apply a partial update to the profile with the given ID.
    async fn update(&self, id: Uuid, changes: UpdateAdminProfile) -> AppResult<AdminProfile>;

    /// Delete a profile. Returns whether it existed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Stamp the last-login instant on the profile of an external identity.
    ///
    /// A missing profile is not an error.
    async fn touch_last_login(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(profile) = self.find_by_user_id(user_id).await? {
            self.update(profile.id, UpdateAdminProfile::last_login(at))
                .await?;
        }
        Ok(())
    }
}
