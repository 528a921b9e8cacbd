mod participant;
mod room;
mod signaling;
mod track;

pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{IceCandidate, IceServerConfig, SignalMessage};
pub use track::TrackKind;
