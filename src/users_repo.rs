use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;

use crate::db::unique_violation;
use crate::schema::{roles, users};
use crate::store::UserStore;
use crate::users::{NewUser, User, UserRecord};
use crate::web::PgPool;

#[derive(Clone)]
pub struct UsersRepository {
    pool: PgPool,
}

impl UsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a lookup returning at most one user on the blocking pool
    async fn find_one<F>(&self, query: F) -> Result<Option<User>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<Option<(UserRecord, String)>>
            + Send
            + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<User>> {
            let mut conn = pool.get()?;
            let row = query(&mut *conn)?;
            Ok(row.map(|(record, role)| record.with_role(role)))
        })
        .await?
    }
}

fn role_name(conn: &mut PgConnection, role_id: i32) -> QueryResult<String> {
    roles::table
        .find(role_id)
        .select(roles::name)
        .first::<String>(conn)
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn list_users(&self, limit: i64) -> Result<Vec<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<User>> {
            let mut conn = pool.get()?;
            let rows = users::table
                .inner_join(roles::table)
                .order(users::id.asc())
                .limit(limit)
                .select((UserRecord::as_select(), roles::name))
                .load::<(UserRecord, String)>(&mut conn)?;
            Ok(rows
                .into_iter()
                .map(|(record, role)| record.with_role(role))
                .collect())
        })
        .await?
    }

    async fn count_users(&self) -> Result<i64> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<i64> {
            let mut conn = pool.get()?;
            Ok(users::table.count().get_result::<i64>(&mut conn)?)
        })
        .await?
    }

    async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.find_one(move |conn| {
            users::table
                .inner_join(roles::table)
                .filter(users::id.eq(id))
                .select((UserRecord::as_select(), roles::name))
                .first::<(UserRecord, String)>(conn)
                .optional()
        })
        .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.find_one(move |conn| {
            users::table
                .inner_join(roles::table)
                .filter(users::username.eq(username))
                .select((UserRecord::as_select(), roles::name))
                .first::<(UserRecord, String)>(conn)
                .optional()
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.find_one(move |conn| {
            users::table
                .inner_join(roles::table)
                .filter(users::email.eq(email))
                .select((UserRecord::as_select(), roles::name))
                .first::<(UserRecord, String)>(conn)
                .optional()
        })
        .await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<User> {
            let mut conn = pool.get()?;
            let user = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let record: UserRecord = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(UserRecord::as_returning())
                    .get_result(conn)?;
                let role = role_name(conn, record.role_id)?;
                Ok(record.with_role(role))
            })
            .map_err(unique_violation)?;
            Ok(user)
        })
        .await?
    }

    async fn set_user_role(&self, id: i32, role_id: i32) -> Result<Option<User>> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<User>> {
            let mut conn = pool.get()?;
            let user = conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let record: Option<UserRecord> = diesel::update(users::table.find(id))
                    .set(users::role_id.eq(role_id))
                    .returning(UserRecord::as_returning())
                    .get_result(conn)
                    .optional()?;
                match record {
                    Some(record) => {
                        let role = role_name(conn, record.role_id)?;
                        Ok(Some(record.with_role(role)))
                    }
                    None => Ok(None),
                }
            })?;
            Ok(user)
        })
        .await?
    }

    async fn delete_user(&self, id: i32) -> Result<bool> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let mut conn = pool.get()?;
            // devices and readings go with it via ON DELETE CASCADE
            let deleted = diesel::delete(users::table.find(id)).execute(&mut conn)?;
            Ok(deleted > 0)
        })
        .await?
    }
}
