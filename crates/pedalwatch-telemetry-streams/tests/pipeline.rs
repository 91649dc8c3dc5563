//! Publisher, queue and envelope working together.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use pedalwatch_calibration::{AXIS_MAX_STANDARD, CalibrationConfig, CalibrationParams};
use pedalwatch_detector::{DetectorEvents, PedalSample, RawPedals, RuntimeState};
use pedalwatch_device::RawAxes;
use pedalwatch_telemetry_streams::{
    BridgeEnvelope, BridgeMetrics, ConnectionEvents, FrameContext, FramePublisher, TelemetryFrame,
    TelemetryQueue,
};
use proptest::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

struct Fixture {
    queue: Arc<TelemetryQueue<TelemetryFrame>>,
    metrics: Arc<BridgeMetrics>,
    publisher: FramePublisher,
    config: CalibrationConfig,
    state: RuntimeState,
    sample: PedalSample,
}

impl Fixture {
    fn new(capacity: usize) -> Result<Self, Box<dyn std::error::Error>> {
        let queue = Arc::new(TelemetryQueue::new(capacity));
        let metrics = Arc::new(BridgeMetrics::new());
        let config = CalibrationConfig::new(&CalibrationParams::default(), AXIS_MAX_STANDARD)?;
        let sample = PedalSample::from_raw(RawPedals::default(), &config);
        Ok(Self {
            publisher: FramePublisher::new(Arc::clone(&queue), Arc::clone(&metrics)),
            queue,
            metrics,
            config,
            state: RuntimeState::new(0),
            sample,
        })
    }

    fn publish(&mut self, now_ms: u64, connection_events: ConnectionEvents) -> u64 {
        self.publisher.publish(FrameContext {
            device_id: 0,
            now_ms,
            loop_duration: Duration::from_micros(250),
            raw_axes: RawAxes::default(),
            sample: &self.sample,
            events: DetectorEvents::default(),
            connection_events,
            config: &self.config,
            state: &self.state,
        })
    }
}

fn sequences(frames: &[TelemetryFrame]) -> Vec<u64> {
    frames.iter().map(|f| f.telemetry_sequence).collect()
}

#[test]
fn test_sequence_increases_across_event_frames() -> TestResult {
    let mut fx = Fixture::new(0)?;
    fx.publish(1, ConnectionEvents::NONE);
    fx.publish(2, ConnectionEvents::DISCONNECTED);
    fx.publish(3, ConnectionEvents::RECONNECTED);
    fx.publish(4, ConnectionEvents::NONE);

    let envelope = BridgeEnvelope::collect(&fx.queue, &fx.metrics);
    assert_eq!(sequences(&envelope.frames), vec![1, 2, 3, 4]);
    assert_eq!(envelope.bridge_info.pending_frame_count, 4);
    Ok(())
}

#[test]
fn test_empty_queue_yields_empty_batch() -> TestResult {
    let fx = Fixture::new(0)?;
    let first = BridgeEnvelope::collect(&fx.queue, &fx.metrics);
    let second = BridgeEnvelope::collect(&fx.queue, &fx.metrics);

    assert!(first.frames.is_empty());
    assert_eq!(first.bridge_info.batch_id, 1);
    assert_eq!(second.bridge_info.batch_id, 2);
    Ok(())
}

#[test]
fn test_frames_carry_drop_count_and_metrics() -> TestResult {
    let mut fx = Fixture::new(2)?;
    fx.metrics.record_speak(Duration::from_millis(40));
    for t in 0..4 {
        fx.publish(t, ConnectionEvents::NONE);
    }
    let envelope = BridgeEnvelope::collect(&fx.queue, &fx.metrics);

    assert_eq!(sequences(&envelope.frames), vec![3, 4]);
    let last = envelope.frames.last().ok_or("missing frame")?;
    assert_eq!(last.frames_dropped, 2);
    assert!((last.last_speak_duration_ms - 40.0).abs() < 1e-9);
    assert!((last.loop_duration_ms - 0.25).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_envelope_wire_names() -> TestResult {
    let mut fx = Fixture::new(0)?;
    fx.publish(10, ConnectionEvents::DISCONNECTED);
    let envelope = BridgeEnvelope::collect(&fx.queue, &fx.metrics);
    let json = serde_json::to_value(&envelope)?;

    assert_eq!(json["schemaVersion"], 1);
    assert_eq!(json["bridgeInfo"]["batchId"], 1);
    assert_eq!(json["bridgeInfo"]["pendingFrameCount"], 1);
    assert!(json["bridgeInfo"]["servedAtUnixMs"].is_i64());

    let frame = &json["frames"][0];
    for key in [
        "telemetrySequence",
        "loopDurationMs",
        "publishedAtUnixMs",
        "lastHttpServeDurationMs",
        "lastSpeakDurationMs",
        "framesDropped",
        "rawAxes",
        "gasAlertTriggered",
        "clutchAlertTriggered",
        "gasEstimateDecreased",
        "gasAutoAdjustApplied",
        "controllerDisconnected",
        "controllerReconnected",
        "gasValue",
        "gasLogicalPct",
        "clutchPhysicalPct",
        "isRacing",
        "bestEstimatePercent",
        "lastGasAlertTime",
        "lastDisconnectTime",
        "axisMax",
        "gasIdleMax",
        "gasFullMin",
        "axisMargin",
        "gasWindowMs",
    ] {
        assert!(frame.get(key).is_some(), "frame is missing {key}");
    }
    assert_eq!(frame["controllerDisconnected"], 1);
    assert_eq!(frame["controllerReconnected"], 0);
    assert_eq!(frame["isRacing"], 0);
    assert!(frame["lastGasAlertTime"].is_null());
    assert_eq!(frame["monotonicMs"], 10);
    Ok(())
}

#[test]
fn test_concurrent_drains_split_frames_without_duplicates() -> TestResult {
    let mut fx = Fixture::new(0)?;
    for t in 0..5 {
        fx.publish(t, ConnectionEvents::NONE);
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let queue = Arc::clone(&fx.queue);
            let metrics = Arc::clone(&fx.metrics);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                BridgeEnvelope::collect(&queue, &metrics)
            })
        })
        .collect();

    let mut batch_ids = BTreeSet::new();
    let mut seen = Vec::new();
    for handle in handles {
        let envelope = handle.join().map_err(|_join| "drain thread panicked")?;
        batch_ids.insert(envelope.bridge_info.batch_id);
        seen.extend(sequences(&envelope.frames));
    }

    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    assert_eq!(batch_ids.len(), 2);
    Ok(())
}

proptest! {
    #[test]
    fn prop_interleaved_drains_preserve_order(ops in prop::collection::vec(any::<bool>(), 1..200)) {
        let queue = TelemetryQueue::unbounded();
        let mut next = 0u32;
        let mut drained = Vec::new();
        for push in ops {
            if push {
                queue.push(next);
                next += 1;
            } else {
                drained.extend(queue.drain_all());
            }
        }
        drained.extend(queue.drain_all());
        prop_assert_eq!(drained, (0..next).collect::<Vec<_>>());
    }
}
