use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::auth::hash_password;
use crate::roles;
use crate::store::Stores;
use crate::users::{NewUser, User};

pub const ROOT_USERNAME: &str = "root";
pub const ROOT_EMAIL: &str = "root@root.root";

/// Create the `root` account on an empty user table.
///
/// Returns the new user, or `None` when no password is configured or users
/// already exist.
pub async fn ensure_root_user(
    stores: &Stores,
    root_password: Option<&str>,
    bcrypt_cost: u32,
) -> Result<Option<User>> {
    let Some(password) = root_password else {
        return Ok(None);
    };

    if stores.users.count_users().await? > 0 {
        return Ok(None);
    }

    let Some(role) = stores.roles.get_role_by_name(roles::ROOT).await? else {
        warn!("Role {} is missing, not creating the root user", roles::ROOT);
        return Ok(None);
    };

    let password_hash = hash_password(password, bcrypt_cost).await?;
    let user = stores
        .users
        .create_user(NewUser {
            username: ROOT_USERNAME.to_string(),
            password_hash,
            email: Some(ROOT_EMAIL.to_string()),
            role_id: role.id,
        })
        .await
        .context("Failed to create root user")?;

    info!(user_id = user.id, "Created root user");
    Ok(Some(user))
}
