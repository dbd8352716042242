use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::roles::Role;
use crate::store::RoleStore;
use crate::web::PgPool;

#[derive(Clone)]
pub struct RolesRepository {
    pool: PgPool,
}

impl RolesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for RolesRepository {
    async fn list_roles(&self) -> Result<Vec<Role>> {
        use crate::schema::roles::dsl;

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let roles = dsl::roles
                .order(dsl::id.asc())
                .select(Role::as_select())
                .load(&mut conn)?;
            Ok::<Vec<Role>, anyhow::Error>(roles)
        })
        .await?
    }

    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        use crate::schema::roles::dsl;

        let pool = self.pool.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let role = dsl::roles
                .filter(dsl::name.eq(name))
                .select(Role::as_select())
                .first(&mut conn)
                .optional()?;
            Ok::<Option<Role>, anyhow::Error>(role)
        })
        .await?
    }
}
