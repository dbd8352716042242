use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::readings::{NewReading, Reading};
use crate::schema::readings;
use crate::store::ReadingStore;
use crate::web::PgPool;

#[derive(Clone)]
pub struct ReadingsRepository {
    pool: PgPool,
}

impl ReadingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for ReadingsRepository {
    async fn list_readings(&self, limit: i64) -> Result<Vec<Reading>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Reading>> {
            let mut conn = pool.get()?;
            let rows = readings::table
                .order((readings::recorded_at.desc(), readings::id.desc()))
                .limit(limit)
                .select(Reading::as_select())
                .load(&mut conn)?;
            Ok(rows)
        })
        .await?
    }

    async fn list_readings_for_device(&self, device_id: i32, limit: i64) -> Result<Vec<Reading>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Reading>> {
            let mut conn = pool.get()?;
            let rows = readings::table
                .filter(readings::device_id.eq(device_id))
                .order((readings::recorded_at.desc(), readings::id.desc()))
                .limit(limit)
                .select(Reading::as_select())
                .load(&mut conn)?;
            Ok(rows)
        })
        .await?
    }

    async fn create_reading(&self, new_reading: NewReading) -> Result<Reading> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Reading> {
            let mut conn = pool.get()?;
            let reading = diesel::insert_into(readings::table)
                .values(&new_reading)
                .returning(Reading::as_returning())
                .get_result(&mut conn)?;
            Ok(reading)
        })
        .await?
    }
}
