use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::db::unique_violation;
use crate::devices::{Device, DeviceChanges, NewDevice};
use crate::store::DeviceRegistry;
use crate::web::PgPool;

#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for DeviceRepository {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let devices = dsl::devices
                .order(dsl::id.asc())
                .select(Device::as_select())
                .load(&mut conn)?;
            Ok::<Vec<Device>, anyhow::Error>(devices)
        })
        .await?
    }

    async fn get_device_by_id(&self, id: i32) -> Result<Option<Device>> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let device = dsl::devices
                .find(id)
                .select(Device::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<Device>, anyhow::Error>(device)
        })
        .await?
    }

    async fn get_device_by_mac(&self, mac: &str) -> Result<Option<Device>> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        let mac = mac.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let device = dsl::devices
                .filter(dsl::mac.eq(mac))
                .select(Device::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<Device>, anyhow::Error>(device)
        })
        .await?
    }

    async fn list_devices_for_user(&self, user_id: i32) -> Result<Vec<Device>> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let devices = dsl::devices
                .filter(dsl::user_id.eq(user_id))
                .order(dsl::id.asc())
                .select(Device::as_select())
                .load(&mut conn)?;
            Ok::<Vec<Device>, anyhow::Error>(devices)
        })
        .await?
    }

    async fn create_device(&self, new_device: NewDevice) -> Result<Device> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let device = diesel::insert_into(dsl::devices)
                .values(&new_device)
                .returning(Device::as_returning())
                .get_result(&mut conn)
                .map_err(unique_violation)?;
            Ok::<Device, anyhow::Error>(device)
        })
        .await?
    }

    async fn update_device(&self, id: i32, changes: DeviceChanges) -> Result<Option<Device>> {
        use crate::schema::devices::dsl;

        // An empty changeset is rejected by diesel, so just read the row back
        if changes.is_empty() {
            return self.get_device_by_id(id).await;
        }

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let device = diesel::update(dsl::devices.find(id))
                .set(&changes)
                .returning(Device::as_returning())
                .get_result(&mut conn)
                .optional()
                .map_err(unique_violation)?;
            Ok::<Option<Device>, anyhow::Error>(device)
        })
        .await?
    }

    async fn delete_device(&self, id: i32) -> Result<bool> {
        use crate::schema::devices::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let deleted = diesel::delete(dsl::devices.find(id)).execute(&mut conn)?;
            Ok::<bool, anyhow::Error>(deleted > 0)
        })
        .await?
    }
}
