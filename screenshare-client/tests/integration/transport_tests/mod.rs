mod test_rtc_track_attachment;

use screenshare_client::{LinkId, TransportEvent, TransportSpec, transport_channel};
use screenshare_core::ParticipantId;
use tokio::sync::mpsc;

pub fn test_spec(initiator: bool) -> (TransportSpec, mpsc::Receiver<TransportEvent>) {
    let (events, events_rx) = transport_channel();
    let spec = TransportSpec {
        link: LinkId(1),
        remote: ParticipantId::from("remote"),
        initiator,
        ice_servers: Vec::new(),
        events,
    };
    (spec, events_rx)
}
