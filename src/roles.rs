use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Seeded role names. Ids are assigned by the database, so roles are looked up by name.
pub const ROOT: &str = "root";
pub const ADMIN: &str = "admin";
pub const USER: &str = "user";
pub const PREMIUM: &str = "premium";

/// Every role created by the initial migration, in id order
pub const SEEDED_ROLES: [&str; 4] = [ROOT, ADMIN, USER, PREMIUM];

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Role {
    pub id: i32,
    pub name: String,
}

/// Roles allowed to manage other users
pub fn is_admin_role(name: &str) -> bool {
    matches!(name, ROOT | ADMIN)
}
