//! Reception worker integration tests: buffer-release accounting across
//! randomized frame mixes, malformed-frame handling, the first-frame
//! deadline, and deterministic stop.

mod common;

use common::{audio_frame, malformed_video_frame, metadata_frame, video_frame, ScriptedTransport};
use ptz_control_core::video::delivery::FrameSlot;
use ptz_control_core::video::receiver::{VideoConfig, VideoWorker};
use ptz_control_core::video::transport::{TransportFrame, VideoTransport};
use ptz_control_core::{CameraError, ScopeMode, SourceDescriptor};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Random mix of video, audio, metadata and malformed video units
fn random_sequence(len: usize) -> Vec<TransportFrame> {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|i| match rng.gen_range(0..10) {
            0..=5 => video_frame(i as i64),
            6 => malformed_video_frame(i as i64),
            7..=8 => audio_frame(i as i64),
            _ => metadata_frame(i as i64),
        })
        .collect()
}

async fn wait_for_drain(transport: &ScriptedTransport, total: usize) {
    for _ in 0..500 {
        if transport.stats.polled() == total {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "transport never drained: {} of {total} polled",
        transport.stats.polled()
    );
}

#[tokio::test]
async fn test_every_polled_unit_released_exactly_once() {
    common::init_tracing();
    let total = 300;
    let transport = Arc::new(ScriptedTransport::new(random_sequence(total)));
    let (slot, _rx) = FrameSlot::new();
    let config = VideoConfig::new(SourceDescriptor::literal("CAM"));

    let (worker, _fatal) = VideoWorker::spawn("cam", Arc::clone(&transport) as Arc<dyn VideoTransport>, config, slot);
    wait_for_drain(&transport, total).await;
    worker.stop().await;

    assert_eq!(transport.stats.polled(), total);
    assert_eq!(transport.stats.released(), total);
    assert_eq!(transport.stats.closed(), 1);
}

#[tokio::test]
async fn test_release_holds_with_scope_and_decimation() {
    let total = 200;
    let transport = Arc::new(ScriptedTransport::new(random_sequence(total)));
    let (slot, _rx) = FrameSlot::new();
    let mut config = VideoConfig::new(SourceDescriptor::literal("CAM"));
    config.scope = Some(ScopeMode::Histogram);
    config.frame_skip = 2;

    let (worker, _fatal) = VideoWorker::spawn("cam", Arc::clone(&transport) as Arc<dyn VideoTransport>, config, slot);
    wait_for_drain(&transport, total).await;
    worker.stop().await;

    // Decimated and analyzed or not, every unit goes back exactly once
    assert_eq!(transport.stats.released(), total);
}

#[tokio::test]
async fn test_malformed_frame_is_released_and_not_fatal() {
    let transport = Arc::new(ScriptedTransport::new(vec![
        malformed_video_frame(1),
        video_frame(2),
    ]));
    let (slot, mut rx) = FrameSlot::new();
    let config = VideoConfig::new(SourceDescriptor::literal("CAM"));

    let (worker, _fatal) = VideoWorker::spawn("cam", Arc::clone(&transport) as Arc<dyn VideoTransport>, config, slot);
    wait_for_drain(&transport, 2).await;

    // The valid frame still got through
    rx.changed().await.unwrap();
    let delivered = rx.borrow_and_update().clone().unwrap();
    assert_eq!(delivered.timestamp_us, 2);

    worker.stop().await;
    assert_eq!(transport.stats.released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_first_frame_deadline_fatal_and_sibling_isolated() {
    // Camera A's source never produces anything
    let barren = Arc::new(ScriptedTransport::new(Vec::new()));
    let (slot_a, rx_a) = FrameSlot::new();
    let (worker_a, fatal_a) = VideoWorker::spawn(
        "cam-a",
        Arc::clone(&barren) as Arc<dyn VideoTransport>,
        VideoConfig::new(SourceDescriptor::literal("NO-SUCH-SOURCE")),
        slot_a,
    );

    // Camera B streams normally over its own transport
    let flowing = Arc::new(ScriptedTransport::new(vec![video_frame(1), video_frame(2)]));
    let (slot_b, mut rx_b) = FrameSlot::new();
    let (worker_b, _fatal_b) = VideoWorker::spawn(
        "cam-b",
        Arc::clone(&flowing) as Arc<dyn VideoTransport>,
        VideoConfig::new(SourceDescriptor::literal("CAM-B")),
        slot_b,
    );

    // A dies at the 5 second deadline without ever delivering
    let err = fatal_a.await.unwrap();
    assert!(matches!(err, CameraError::StreamUnavailable(_)));
    assert!(rx_a.borrow().is_none());
    assert_eq!(barren.stats.closed(), 1);

    // B is untouched: frames flowed and every unit was released
    rx_b.changed().await.unwrap();
    assert!(rx_b.borrow_and_update().is_some());
    worker_b.stop().await;
    assert_eq!(flowing.stats.released(), 2);

    worker_a.stop().await;
}

#[tokio::test]
async fn test_stop_completes_before_restart() {
    let transport = Arc::new(ScriptedTransport::new(random_sequence(50)));
    let config = VideoConfig::new(SourceDescriptor::literal("CAM"));

    let (slot, _rx) = FrameSlot::new();
    let (first, _fatal) = VideoWorker::spawn("cam", Arc::clone(&transport) as Arc<dyn VideoTransport>, config.clone(), slot);
    first.stop().await;
    assert_eq!(transport.stats.closed(), 1);
    // Whatever was polled before the stop flag landed was also released
    assert_eq!(transport.stats.polled(), transport.stats.released());

    // A replacement worker starts immediately against the same transport
    let (slot, _rx) = FrameSlot::new();
    let (second, _fatal) = VideoWorker::spawn("cam", Arc::clone(&transport) as Arc<dyn VideoTransport>, config, slot);
    second.stop().await;
    assert_eq!(transport.stats.closed(), 2);
}
