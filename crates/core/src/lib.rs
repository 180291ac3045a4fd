pub mod config;
pub mod error;
pub mod status;
pub mod tray;

pub use config::Config;
pub use error::ValidationError;
pub use status::*;
pub use tray::*;
