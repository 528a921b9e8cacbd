pub use screenshare_core::{ParticipantId, RoomId};

pub mod model {
    pub use screenshare_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use screenshare_relay::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use screenshare_client::*;
}
