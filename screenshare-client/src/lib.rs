mod config;
mod error;
pub mod media;
pub mod orchestrator;
pub mod session;
pub mod signaling;
pub mod transport;

pub use config::{BackoffConfig, ClientConfig, ShareOptions};
pub use error::{MediaError, NegotiationError, SessionError, SignalingError};
pub use media::*;
pub use orchestrator::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
