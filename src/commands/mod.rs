pub mod decode;
pub mod migrate;
pub mod serve;

pub use decode::handle_decode;
pub use migrate::handle_migrate;
pub use serve::handle_serve;
