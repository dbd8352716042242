use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::roles::is_admin_role;

/// A user together with the name of their role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub role_id: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        is_admin_role(&self.role)
    }
}

/// Diesel model for the users table
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn with_role(self, role: String) -> User {
        User {
            id: self.id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            role_id: self.role_id,
            role,
            created_at: self.created_at,
        }
    }
}

/// Insert model for new users. The password must already be hashed.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub role_id: i32,
}
