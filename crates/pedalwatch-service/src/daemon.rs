//! Process wiring: device, sampling thread, speech worker and HTTP bridge.

use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use pedalwatch_calibration::CalibrationConfig;
use pedalwatch_device::mock::ScriptedAxisSource;
use pedalwatch_device::{AxisSource, RawAxes};
use pedalwatch_errors::{DeviceError, PedalWatchError};
use pedalwatch_telemetry_streams::{BridgeMetrics, FramePublisher, TelemetryQueue};
use tracing::{error, info};

use crate::cli::{Backend, DaemonConfig};
use crate::connection::ConnectionManager;
use crate::responder::{self, BridgeState};
use crate::sampler::{Sampler, SamplerSettings};
use crate::shutdown::{Shutdown, wait_for_signal};
use crate::speech::{CommandSpeaker, LogSpeaker, Speaker};

/// Process exit code for a startup or runtime failure.
///
/// Fatal paths wrap their typed error in [`PedalWatchError`]; anything else
/// exits with 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PedalWatchError>()
        .map_or(1, PedalWatchError::exit_code)
}

/// Run the daemon until shutdown or the iteration limit.
pub async fn run(config: DaemonConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.backend,
        "Starting pedalwatchd"
    );

    let source = open_source(&config)
        .map_err(PedalWatchError::from)
        .context("failed to open axis source")?;
    let manager =
        ConnectionManager::startup_detect(source, config.joystick, config.identity, config.flags)
            .map_err(PedalWatchError::from)
            .context("controller detection failed")?;
    let calibration = CalibrationConfig::new(&config.params, config.axis_max)
        .map_err(PedalWatchError::from)
        .context("invalid calibration settings")?;

    let queue = Arc::new(TelemetryQueue::new(config.queue_capacity));
    let metrics = Arc::new(BridgeMetrics::new());

    let speaker: Box<dyn Speaker> = match &config.speech_command {
        Some(program) => Box::new(
            CommandSpeaker::spawn(program.clone(), Arc::clone(&metrics))
                .context("failed to start speech worker")?,
        ),
        None => Box::new(LogSpeaker),
    };

    let listener = responder::bind(config.http_bind)
        .await
        .map_err(PedalWatchError::from)?;

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let sampler = Sampler::new(
        manager,
        calibration,
        FramePublisher::new(Arc::clone(&queue), Arc::clone(&metrics)),
        speaker,
        config.axis_map,
        SamplerSettings {
            iterations: config.iterations,
            sleep: config.sleep,
            rescan_interval: config.rescan_interval,
            debug_raw: config.debug_raw,
        },
    );
    let sampler_thread =
        spawn_sampler(sampler, shutdown.clone()).context("failed to start sampling thread")?;

    let served = responder::serve(listener, BridgeState { queue, metrics }, shutdown.wait()).await;
    shutdown.trigger();

    match tokio::task::spawn_blocking(move || sampler_thread.join()).await {
        Ok(Ok(polls)) => info!(polls, "Sampling thread finished"),
        Ok(Err(_panic)) => error!("sampling thread panicked"),
        Err(e) => error!(error = %e, "failed to join sampling thread"),
    }

    served.map_err(PedalWatchError::from)?;
    info!("pedalwatchd stopped");
    Ok(())
}

fn spawn_sampler<S: AxisSource + 'static>(
    mut sampler: Sampler<S>,
    shutdown: Shutdown,
) -> std::io::Result<JoinHandle<u64>> {
    std::thread::Builder::new()
        .name("pedalwatch-sampler".to_string())
        .spawn(move || {
            let polls = sampler.run(&shutdown.signal());
            // The iteration limit ends the whole process.
            shutdown.trigger();
            sampler.close_speaker();
            polls
        })
}

fn open_source(config: &DaemonConfig) -> Result<Box<dyn AxisSource>, DeviceError> {
    match config.backend {
        Backend::Scripted => {
            // Released pedals read as the axis maximum when normalization inverts them.
            let resting = if config.params.axis_normalization {
                RawAxes::splat(config.axis_max)
            } else {
                RawAxes::default()
            };
            info!("Using scripted axis source");
            Ok(Box::new(ScriptedAxisSource::new(resting)))
        }
        Backend::Hid => open_hid(),
    }
}

#[cfg(feature = "hid")]
fn open_hid() -> Result<Box<dyn AxisSource>, DeviceError> {
    use pedalwatch_device::{AxisReportLayout, HidAxisSource};

    Ok(Box::new(HidAxisSource::new(AxisReportLayout::default())?))
}

#[cfg(not(feature = "hid"))]
fn open_hid() -> Result<Box<dyn AxisSource>, DeviceError> {
    Err(DeviceError::BackendUnavailable(
        "built without the `hid` feature".to_string(),
    ))
}
