//! Storage seams used by the HTTP layer.
//!
//! Each trait has a Postgres implementation (the `*_repo` modules) and an
//! in-memory one ([`crate::memory_store::MemoryStore`]) used by `serve --ephemeral`
//! and the tests.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::devices::{Device, DeviceChanges, NewDevice};
use crate::memory_store::MemoryStore;
use crate::readings::{NewReading, Reading};
use crate::roles::Role;
use crate::users::{NewUser, User};
use crate::web::PgPool;

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>>;

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self, limit: i64) -> Result<Vec<User>>;

    async fn count_users(&self) -> Result<i64>;

    async fn get_user_by_id(&self, id: i32) -> Result<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Returns the updated user, or `None` if it does not exist
    async fn set_user_role(&self, id: i32, role_id: i32) -> Result<Option<User>>;

    /// Deletes the user with their devices and readings. Returns false if it did not exist.
    async fn delete_user(&self, id: i32) -> Result<bool>;
}

/// Maps MAC addresses and ids to registered devices
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>>;

    async fn get_device_by_id(&self, id: i32) -> Result<Option<Device>>;

    /// `mac` must be in canonical form (see [`crate::devices::MacAddress`])
    async fn get_device_by_mac(&self, mac: &str) -> Result<Option<Device>>;

    async fn list_devices_for_user(&self, user_id: i32) -> Result<Vec<Device>>;

    async fn create_device(&self, new_device: NewDevice) -> Result<Device>;

    async fn update_device(&self, id: i32, changes: DeviceChanges) -> Result<Option<Device>>;

    async fn delete_device(&self, id: i32) -> Result<bool>;
}

/// Persists decoded readings
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Newest first
    async fn list_readings(&self, limit: i64) -> Result<Vec<Reading>>;

    /// Newest first
    async fn list_readings_for_device(&self, device_id: i32, limit: i64) -> Result<Vec<Reading>>;

    async fn create_reading(&self, new_reading: NewReading) -> Result<Reading>;
}

/// A write collided with an existing unique key.
///
/// Stores return it inside their `anyhow::Error`, also when the database
/// constraint rather than a prior lookup caught the duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error("Username already registered")]
    Username,
    #[error("Email already registered")]
    Email,
    #[error("Device with this MAC already exists")]
    Mac,
}

impl Conflict {
    pub fn of(error: &anyhow::Error) -> Option<Self> {
        error.downcast_ref::<Self>().copied()
    }
}

/// The full set of stores shared by request handlers
#[derive(Clone)]
pub struct Stores {
    pub roles: Arc<dyn RoleStore>,
    pub users: Arc<dyn UserStore>,
    pub devices: Arc<dyn DeviceRegistry>,
    pub readings: Arc<dyn ReadingStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        use crate::devices_repo::DeviceRepository;
        use crate::readings_repo::ReadingsRepository;
        use crate::roles_repo::RolesRepository;
        use crate::users_repo::UsersRepository;

        Self {
            roles: Arc::new(RolesRepository::new(pool.clone())),
            users: Arc::new(UsersRepository::new(pool.clone())),
            devices: Arc::new(DeviceRepository::new(pool.clone())),
            readings: Arc::new(ReadingsRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            roles: store.clone(),
            users: store.clone(),
            devices: store.clone(),
            readings: store,
        }
    }
}
