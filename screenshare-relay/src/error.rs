use screenshare_core::ParticipantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay target {0} is not registered in the room")]
    TargetUnknown(ParticipantId),

    #[error("access token rejected")]
    Unauthorized,

    #[error("participant {participant} sent {kind} before joining a room")]
    NotJoined {
        participant: ParticipantId,
        kind: &'static str,
    },
}
