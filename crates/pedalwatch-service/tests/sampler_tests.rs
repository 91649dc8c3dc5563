//! Sampling loop and connection handling against a scripted device.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pedalwatch_calibration::{AXIS_MAX_STANDARD, CalibrationConfig, CalibrationParams};
use pedalwatch_device::mock::ScriptedAxisSource;
use pedalwatch_device::{
    AxisSelector, DeviceIdentity, POLL_UNPLUGGED, PedalAxisMap, RawAxes,
};
use pedalwatch_service::speech::mock::RecordingSpeaker;
use pedalwatch_service::{ConnectionManager, Sampler, SamplerSettings, Shutdown, Step};
use pedalwatch_telemetry_streams::{BridgeMetrics, FramePublisher, TelemetryFrame, TelemetryQueue};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const IDENTITY: DeviceIdentity = DeviceIdentity {
    vendor_id: 0x0EB7,
    product_id: 0x1839,
};

const RELEASED: RawAxes = RawAxes::splat(AXIS_MAX_STANDARD);

struct Rig {
    source: ScriptedAxisSource,
    speaker: RecordingSpeaker,
    queue: Arc<TelemetryQueue<TelemetryFrame>>,
    sampler: Sampler<ScriptedAxisSource>,
}

struct RigOptions {
    params: CalibrationParams,
    joystick: Option<u32>,
    identity: Option<DeviceIdentity>,
    startup_lookup: Option<u32>,
    settings: SamplerSettings,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            params: CalibrationParams::default(),
            joystick: Some(0),
            identity: None,
            startup_lookup: None,
            settings: SamplerSettings {
                iterations: 0,
                sleep: Duration::from_millis(1),
                rescan_interval: Duration::from_secs(60),
                debug_raw: true,
            },
        }
    }
}

impl Rig {
    fn new(options: RigOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let source = ScriptedAxisSource::new(RELEASED);
        source.queue_lookup(options.startup_lookup);
        let manager = ConnectionManager::startup_detect(
            source.clone(),
            options.joystick,
            options.identity,
            0,
        )?;
        let config = CalibrationConfig::new(&options.params, AXIS_MAX_STANDARD)?;
        let queue = Arc::new(TelemetryQueue::new(0));
        let metrics = Arc::new(BridgeMetrics::new());
        let speaker = RecordingSpeaker::new();
        let sampler = Sampler::new(
            manager,
            config,
            FramePublisher::new(Arc::clone(&queue), metrics),
            Box::new(speaker.clone()),
            PedalAxisMap::default(),
            options.settings,
        );
        Ok(Self {
            source,
            speaker,
            queue,
            sampler,
        })
    }

    fn with_identity() -> Result<Self, Box<dyn std::error::Error>> {
        Self::new(RigOptions {
            identity: Some(IDENTITY),
            startup_lookup: Some(0),
            ..RigOptions::default()
        })
    }
}

/// Raw reading that normalizes to `value` on an inverted axis.
fn pressed(axis: AxisSelector, value: u32) -> RawAxes {
    RELEASED.with(axis, AXIS_MAX_STANDARD - value)
}

#[test]
fn test_repeated_failures_publish_one_disconnect_frame() -> TestResult {
    let mut rig = Rig::with_identity()?;
    rig.source.queue_failure(POLL_UNPLUGGED);

    assert_eq!(
        rig.sampler.step_at(1_000),
        Step::Disconnected {
            code: POLL_UNPLUGGED
        }
    );
    assert!(rig.sampler.awaiting_rescan());
    assert_eq!(rig.sampler.step_at(61_000), Step::NotFound);
    assert_eq!(rig.sampler.step_at(121_000), Step::NotFound);

    let frames = rig.queue.drain_all();
    assert_eq!(frames.len(), 1);
    let frame = frames.first().ok_or("missing disconnect frame")?;
    assert!(frame.connection_events.controller_disconnected);
    assert!(!frame.connection_events.controller_reconnected);
    assert_eq!(frame.state.connection.last_disconnect_time, Some(1_000));

    assert_eq!(
        rig.speaker.spoken(),
        vec![
            "Controller disconnected. Waiting 60 seconds.",
            "Controller not found. Retrying.",
            "Controller not found. Retrying.",
        ]
    );
    // Only the first step polled; the rest searched.
    assert_eq!(rig.source.poll_count(), 1);
    Ok(())
}

#[test]
fn test_reconnect_publishes_reset_state() -> TestResult {
    let mut rig = Rig::new(RigOptions {
        params: CalibrationParams {
            monitor_gas: true,
            ..CalibrationParams::default()
        },
        identity: Some(IDENTITY),
        startup_lookup: Some(0),
        ..RigOptions::default()
    })?;
    rig.source.queue_axes(pressed(AxisSelector::Y, 40_000));
    rig.source.queue_failure(POLL_UNPLUGGED);
    rig.source.queue_lookup(Some(3));

    assert!(matches!(rig.sampler.step_at(1_000), Step::Sampled(_)));
    assert!(rig.sampler.state().is_racing);

    rig.sampler.step_at(2_000);
    assert_eq!(
        rig.sampler.step_at(62_000),
        Step::Reconnected { device_id: 3 }
    );
    assert_eq!(rig.sampler.device_id(), 3);
    assert!(matches!(rig.sampler.step_at(63_000), Step::Sampled(_)));

    let frames = rig.queue.drain_all();
    let sequences: Vec<u64> = frames.iter().map(|f| f.telemetry_sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);

    let reconnect = frames.get(2).ok_or("missing reconnect frame")?;
    assert!(reconnect.connection_events.controller_reconnected);
    assert!(!reconnect.connection_events.controller_disconnected);
    assert_eq!(reconnect.device_id, 3);
    assert!(!reconnect.state.is_racing);
    assert_eq!(reconnect.state.best_estimate_percent, 100);
    assert_eq!(reconnect.state.last_full_throttle_time, 62_000);
    assert_eq!(reconnect.state.last_gas_activity_time, 62_000);
    assert_eq!(reconnect.state.connection.last_reconnect_time, Some(62_000));

    assert_eq!(rig.source.polled_ids(), vec![0, 0, 3]);
    assert_eq!(
        rig.speaker.spoken().last().map(String::as_str),
        Some("Controller found. Resuming monitoring.")
    );
    Ok(())
}

#[test]
fn test_failure_without_identity_retries_silently() -> TestResult {
    let mut rig = Rig::new(RigOptions::default())?;
    rig.source.queue_failure(POLL_UNPLUGGED);
    rig.source.queue_failure(POLL_UNPLUGGED);

    assert_eq!(
        rig.sampler.step_at(1_000),
        Step::ReadFailed {
            code: POLL_UNPLUGGED
        }
    );
    assert!(!rig.sampler.awaiting_rescan());
    assert_eq!(
        rig.sampler.step_at(2_000),
        Step::ReadFailed {
            code: POLL_UNPLUGGED
        }
    );
    assert!(matches!(rig.sampler.step_at(3_000), Step::Sampled(_)));

    assert_eq!(rig.queue.len(), 1);
    assert!(rig.speaker.spoken().is_empty());
    assert_eq!(rig.source.lookup_count(), 0);
    Ok(())
}

#[test]
fn test_clutch_noise_is_spoken_once() -> TestResult {
    let mut rig = Rig::new(RigOptions {
        params: CalibrationParams {
            monitor_clutch: true,
            ..CalibrationParams::default()
        },
        ..RigOptions::default()
    })?;
    for _ in 0..5 {
        rig.source.queue_axes(pressed(AxisSelector::R, 10));
    }

    let alerts: Vec<bool> = (1..=5)
        .map(|i| match rig.sampler.step_at(i * 1_000) {
            Step::Sampled(events) => events.clutch_alert,
            _ => false,
        })
        .collect();

    assert_eq!(alerts, vec![false, false, false, true, false]);
    assert_eq!(rig.speaker.spoken(), vec!["Clutch noise detected."]);

    let frames = rig.queue.drain_all();
    let flagged: Vec<u64> = frames
        .iter()
        .filter(|f| f.events.clutch_alert)
        .map(|f| f.telemetry_sequence)
        .collect();
    assert_eq!(flagged, vec![4]);
    Ok(())
}

#[test]
fn test_gas_drift_is_spoken_with_peak_percent() -> TestResult {
    let mut rig = Rig::new(RigOptions {
        params: CalibrationParams {
            monitor_gas: true,
            ..CalibrationParams::default()
        },
        ..RigOptions::default()
    })?;
    // floor(100 * 32768 / 65535) == 50
    rig.source.set_resting(pressed(AxisSelector::Y, 32_768));

    let mut drift = Vec::new();
    for t in 1..=40 {
        if let Step::Sampled(events) = rig.sampler.step_at(t * 1_000) {
            if let Some(pct) = events.gas_alert {
                drift.push((t, pct));
            }
        }
    }

    assert_eq!(drift, vec![(32, 50)]);
    assert_eq!(rig.speaker.spoken(), vec!["Gas drift. Reached 50 percent."]);
    Ok(())
}

#[test]
fn test_iteration_limit_counts_polls() -> TestResult {
    let mut rig = Rig::new(RigOptions {
        settings: SamplerSettings {
            iterations: 3,
            ..RigOptions::default().settings
        },
        ..RigOptions::default()
    })?;
    let shutdown = Shutdown::new();

    assert_eq!(rig.sampler.run(&shutdown.signal()), 3);
    assert_eq!(rig.source.poll_count(), 3);
    assert_eq!(rig.queue.len(), 3);
    Ok(())
}

#[test]
fn test_shutdown_interrupts_rescan_wait() -> TestResult {
    let mut rig = Rig::with_identity()?;
    rig.source.queue_failure(POLL_UNPLUGGED);
    let speaker = rig.speaker.clone();
    let shutdown = Shutdown::new();
    let signal = shutdown.signal();

    let started = Instant::now();
    let worker = thread::spawn(move || rig.sampler.run(&signal));
    thread::sleep(Duration::from_millis(50));
    shutdown.trigger();

    let polls = worker.join().map_err(|_join| "sampler thread panicked")?;
    assert_eq!(polls, 1);
    assert!(started.elapsed() < Duration::from_secs(30));
    assert_eq!(
        speaker.spoken(),
        vec!["Controller disconnected. Waiting 60 seconds."]
    );
    Ok(())
}

#[test]
fn test_startup_without_joystick_or_match_is_fatal() {
    let source = ScriptedAxisSource::new(RELEASED);
    let result = ConnectionManager::startup_detect(source, None, Some(IDENTITY), 0);
    assert!(result.is_err());
}
