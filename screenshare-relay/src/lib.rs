mod config;
mod error;
pub mod room;
pub mod signaling;

pub use config::RelayConfig;
pub use error::RelayError;
pub use room::*;
pub use signaling::*;
