//! In-memory implementation of every store trait.
//!
//! Mirrors the Postgres schema closely enough for development (`serve --ephemeral`)
//! and tests: serial ids, seeded roles, unique usernames/emails/MACs and
//! cascading deletes. Nothing survives a restart.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::devices::{Device, DeviceChanges, NewDevice};
use crate::readings::{NewReading, Reading};
use crate::roles::{Role, SEEDED_ROLES};
use crate::store::{Conflict, DeviceRegistry, ReadingStore, RoleStore, UserStore};
use crate::users::{NewUser, User};

struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

// Manual impl: deriving would require `T: Default`
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct MemoryState {
    roles: Vec<Role>,
    users: Table<User>,
    devices: Table<Device>,
    readings: Table<Reading>,
}

impl MemoryState {
    fn role_name(&self, role_id: i32) -> Option<&str> {
        self.roles
            .iter()
            .find(|role| role.id == role_id)
            .map(|role| role.name.as_str())
    }
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store with the same seeded roles as the initial migration
    pub fn new() -> Self {
        let roles = SEEDED_ROLES
            .iter()
            .zip(1..)
            .map(|(name, id)| Role {
                id,
                name: name.to_string(),
            })
            .collect();

        Self {
            state: RwLock::new(MemoryState {
                roles,
                ..Default::default()
            }),
        }
    }
}

fn newest_first(readings: impl Iterator<Item = Reading>, limit: i64) -> Vec<Reading> {
    let mut readings: Vec<Reading> = readings.collect();
    readings.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));
    readings.truncate(usize::try_from(limit).unwrap_or(0));
    readings
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.state.read().await.roles.clone())
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|role| role.name == name).cloned())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self, limit: i64) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .rows
            .values()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count_users(&self) -> Result<i64> {
        Ok(self.state.read().await.users.rows.len() as i64)
    }

    async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        Ok(self.state.read().await.users.rows.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .rows
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .rows
            .values()
            .find(|user| user.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        let Some(role) = state.role_name(new_user.role_id).map(str::to_string) else {
            bail!("role {} does not exist", new_user.role_id);
        };
        for user in state.users.rows.values() {
            if user.username == new_user.username {
                return Err(Conflict::Username.into());
            }
            if new_user.email.is_some() && user.email == new_user.email {
                return Err(Conflict::Email.into());
            }
        }

        let id = state.users.allocate_id();
        let user = User {
            id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            email: new_user.email,
            role_id: new_user.role_id,
            role,
            created_at: Utc::now(),
        };
        state.users.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn set_user_role(&self, id: i32, role_id: i32) -> Result<Option<User>> {
        let mut state = self.state.write().await;

        let Some(role) = state.role_name(role_id).map(str::to_string) else {
            bail!("role {} does not exist", role_id);
        };
        Ok(state.users.rows.get_mut(&id).map(|user| {
            user.role_id = role_id;
            user.role = role;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.users.rows.remove(&id).is_none() {
            return Ok(false);
        }
        let device_ids: Vec<i32> = state
            .devices
            .rows
            .values()
            .filter(|device| device.user_id == id)
            .map(|device| device.id)
            .collect();
        state
            .devices
            .rows
            .retain(|device_id, _| !device_ids.contains(device_id));
        state
            .readings
            .rows
            .retain(|_, reading| !device_ids.contains(&reading.device_id));
        Ok(true)
    }
}

#[async_trait]
impl DeviceRegistry for MemoryStore {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        Ok(self.state.read().await.devices.rows.values().cloned().collect())
    }

    async fn get_device_by_id(&self, id: i32) -> Result<Option<Device>> {
        Ok(self.state.read().await.devices.rows.get(&id).cloned())
    }

    async fn get_device_by_mac(&self, mac: &str) -> Result<Option<Device>> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .rows
            .values()
            .find(|device| device.mac == mac)
            .cloned())
    }

    async fn list_devices_for_user(&self, user_id: i32) -> Result<Vec<Device>> {
        let state = self.state.read().await;
        Ok(state
            .devices
            .rows
            .values()
            .filter(|device| device.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_device(&self, new_device: NewDevice) -> Result<Device> {
        let mut state = self.state.write().await;

        if !state.users.rows.contains_key(&new_device.user_id) {
            bail!("user {} does not exist", new_device.user_id);
        }
        if state
            .devices
            .rows
            .values()
            .any(|device| device.mac == new_device.mac)
        {
            return Err(Conflict::Mac.into());
        }

        let id = state.devices.allocate_id();
        let device = Device {
            id,
            mac: new_device.mac,
            name: new_device.name,
            active: new_device.active,
            user_id: new_device.user_id,
            created_at: Utc::now(),
        };
        state.devices.rows.insert(id, device.clone());
        Ok(device)
    }

    async fn update_device(&self, id: i32, changes: DeviceChanges) -> Result<Option<Device>> {
        let mut state = self.state.write().await;

        if let Some(mac) = &changes.mac
            && state
                .devices
                .rows
                .values()
                .any(|device| device.id != id && &device.mac == mac)
        {
            return Err(Conflict::Mac.into());
        }

        Ok(state.devices.rows.get_mut(&id).map(|device| {
            changes.apply_to(device);
            device.clone()
        }))
    }

    async fn delete_device(&self, id: i32) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.devices.rows.remove(&id).is_none() {
            return Ok(false);
        }
        state
            .readings
            .rows
            .retain(|_, reading| reading.device_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn list_readings(&self, limit: i64) -> Result<Vec<Reading>> {
        let state = self.state.read().await;
        Ok(newest_first(state.readings.rows.values().cloned(), limit))
    }

    async fn list_readings_for_device(&self, device_id: i32, limit: i64) -> Result<Vec<Reading>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .readings
                .rows
                .values()
                .filter(|reading| reading.device_id == device_id)
                .cloned(),
            limit,
        ))
    }

    async fn create_reading(&self, new_reading: NewReading) -> Result<Reading> {
        let mut state = self.state.write().await;

        if !state.devices.rows.contains_key(&new_reading.device_id()) {
            bail!("device {} does not exist", new_reading.device_id());
        }

        let id = state.readings.allocate_id();
        let reading = Reading {
            id,
            recorded_at: Utc::now(),
            coordinates: new_reading.coordinates().to_string(),
            device_id: new_reading.device_id(),
        };
        state.readings.rows.insert(id, reading.clone());
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gnss::decode;

    fn new_user(username: &str, email: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
            email: email.map(str::to_string),
            role_id: 3,
        }
    }

    #[tokio::test]
    async fn test_roles_are_seeded() {
        let store = MemoryStore::new();
        let roles = store.list_roles().await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["root", "admin", "user", "premium"]);
        assert_eq!(store.get_role_by_name("user").await.unwrap().unwrap().id, 3);
    }

    #[tokio::test]
    async fn test_unique_users() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("alice", Some("a@example.com")))
            .await
            .unwrap();
        assert_eq!(user.role, "user");

        let err = store.create_user(new_user("alice", None)).await.unwrap_err();
        assert_eq!(Conflict::of(&err), Some(Conflict::Username));
        let err = store
            .create_user(new_user("bob", Some("a@example.com")))
            .await
            .unwrap_err();
        assert_eq!(Conflict::of(&err), Some(Conflict::Email));
        // users without email never collide on it
        store.create_user(new_user("carol", None)).await.unwrap();
        store.create_user(new_user("dave", None)).await.unwrap();
        assert_eq!(store.count_users().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_mac_is_a_conflict() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice", None)).await.unwrap();
        let device = |mac: &str| NewDevice {
            mac: mac.to_string(),
            name: None,
            active: false,
            user_id: user.id,
        };
        store.create_device(device("00:11:22:33:44:55")).await.unwrap();
        let other = store.create_device(device("66:77:88:99:AA:BB")).await.unwrap();

        let err = store
            .create_device(device("00:11:22:33:44:55"))
            .await
            .unwrap_err();
        assert_eq!(Conflict::of(&err), Some(Conflict::Mac));

        let err = store
            .update_device(
                other.id,
                DeviceChanges {
                    mac: Some("00:11:22:33:44:55".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(Conflict::of(&err), Some(Conflict::Mac));

        // unknown owner is not a conflict
        let err = store
            .create_device(NewDevice {
                user_id: 999,
                ..device("CC:DD:EE:FF:00:11")
            })
            .await
            .unwrap_err();
        assert_eq!(Conflict::of(&err), None);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice", None)).await.unwrap();
        let device = store
            .create_device(NewDevice {
                mac: "00:11:22:33:44:55".to_string(),
                name: None,
                active: true,
                user_id: user.id,
            })
            .await
            .unwrap();
        let coordinate = decode("4024.0000,N,00342.0000,W").unwrap();
        store
            .create_reading(NewReading::new(device.id, coordinate))
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.get_device_by_id(device.id).await.unwrap().is_none());
        assert!(store.list_readings(10).await.unwrap().is_empty());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_readings_newest_first_with_limit() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice", None)).await.unwrap();
        let device = store
            .create_device(NewDevice {
                mac: "00:11:22:33:44:55".to_string(),
                name: None,
                active: true,
                user_id: user.id,
            })
            .await
            .unwrap();

        for raw in [
            "4024.0000,N,00342.0000,W",
            "4124.0000,N,00342.0000,W",
            "4224.0000,N,00342.0000,W",
        ] {
            store
                .create_reading(NewReading::new(device.id, decode(raw).unwrap()))
                .await
                .unwrap();
        }

        let readings = store.list_readings_for_device(device.id, 2).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert!(readings[0].id > readings[1].id);
        assert!(store.list_readings_for_device(99, 10).await.unwrap().is_empty());
    }
}
