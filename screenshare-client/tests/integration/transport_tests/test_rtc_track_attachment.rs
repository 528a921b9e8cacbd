use screenshare_client::{
    Attachment, LocalTrack, PeerTransport, RtcTransportFactory, SdpKind, TransportFactory,
};
use screenshare_core::TrackKind;

use crate::integration::init_tracing;
use crate::integration::transport_tests::test_spec;

fn media_sections(sdp: &str) -> usize {
    sdp.lines().filter(|line| line.starts_with("m=")).count()
}

async fn exchange(offerer: &dyn PeerTransport, answerer: &dyn PeerTransport) -> usize {
    let offer = offerer.create_offer().await.expect("Offer failed");
    let sections = media_sections(&offer);
    answerer
        .set_remote_description(SdpKind::Offer, offer)
        .await
        .expect("Answerer rejected offer");
    let answer = answerer.create_answer().await.expect("Answer failed");
    offerer
        .set_remote_description(SdpKind::Answer, answer)
        .await
        .expect("Offerer rejected answer");
    sections
}

#[tokio::test]
async fn test_rtc_track_attachment() {
    init_tracing();

    let (spec, _events) = test_spec(false);
    let transport = RtcTransportFactory.create(spec).await.unwrap();

    let video = LocalTrack::new(TrackKind::Video);
    assert_eq!(
        transport.attach_track(&video).await.unwrap(),
        Attachment::Reused
    );

    // Same kind again swaps the source on the same sender.
    let replacement = LocalTrack::new(TrackKind::Video);
    assert_eq!(
        transport.attach_track(&replacement).await.unwrap(),
        Attachment::Reused
    );

    assert_eq!(
        transport.detach_track(TrackKind::Video).await.unwrap(),
        Attachment::Reused
    );
    assert_eq!(
        transport.detach_track(TrackKind::Video).await.unwrap(),
        Attachment::Reused
    );
    assert_eq!(
        transport.detach_track(TrackKind::Audio).await.unwrap(),
        Attachment::Reused
    );

    transport.close().await.unwrap();
}

#[tokio::test]
async fn test_share_toggles_keep_media_sections() {
    init_tracing();

    let (offerer_spec, _offerer_events) = test_spec(true);
    let (answerer_spec, _answerer_events) = test_spec(false);
    let offerer = RtcTransportFactory.create(offerer_spec).await.unwrap();
    let answerer = RtcTransportFactory.create(answerer_spec).await.unwrap();

    let mut sections = vec![exchange(offerer.as_ref(), answerer.as_ref()).await];

    for _ in 0..4 {
        let video = LocalTrack::new(TrackKind::Video);
        let audio = LocalTrack::new(TrackKind::Audio);
        offerer.attach_track(&video).await.unwrap();
        answerer.attach_track(&audio).await.unwrap();
        sections.push(exchange(offerer.as_ref(), answerer.as_ref()).await);

        offerer.detach_track(TrackKind::Video).await.unwrap();
        answerer.detach_track(TrackKind::Audio).await.unwrap();
        sections.push(exchange(offerer.as_ref(), answerer.as_ref()).await);
    }

    assert_eq!(sections, vec![2; 9]);

    offerer.close().await.unwrap();
    answerer.close().await.unwrap();
}
