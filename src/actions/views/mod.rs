pub mod auth;
pub mod device;
pub mod reading;
pub mod user;

pub use auth::*;
pub use device::*;
pub use reading::*;
pub use user::*;
