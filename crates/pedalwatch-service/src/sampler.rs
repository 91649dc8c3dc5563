//! The sampling loop.
//!
//! One thread owns the device, the calibration and the runtime state. Each
//! step either polls and evaluates a sample or, while latched disconnected
//! with an identity configured, looks for the controller again. Every step
//! that changes what a client should see publishes exactly one frame.

use std::time::{Duration, Instant};

use pedalwatch_calibration::CalibrationConfig;
use pedalwatch_detector::{DetectorEvents, PedalSample, RawPedals, RuntimeState, evaluate};
use pedalwatch_device::{AxisSource, PedalAxisMap, RawAxes};
use pedalwatch_telemetry_streams::{ConnectionEvents, FrameContext, FramePublisher};
use tracing::{debug, info, warn};

use crate::clock::MonotonicClock;
use crate::connection::{ConnectionManager, PollOutcome, RescanOutcome};
use crate::shutdown::ShutdownSignal;
use crate::speech::{Speaker, phrases};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Polls before the loop ends on its own; 0 runs until shutdown.
    pub iterations: u64,
    pub sleep: Duration,
    pub rescan_interval: Duration,
    pub debug_raw: bool,
}

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sampled(DetectorEvents),
    ReadFailed { code: u32 },
    Disconnected { code: u32 },
    StillDisconnected { code: u32 },
    Reconnected { device_id: u32 },
    NotFound,
}

impl Step {
    /// Whether this step polled the device rather than searching for it.
    pub fn is_poll(&self) -> bool {
        !matches!(self, Step::Reconnected { .. } | Step::NotFound)
    }
}

pub struct Sampler<S> {
    manager: ConnectionManager<S>,
    config: CalibrationConfig,
    state: RuntimeState,
    publisher: FramePublisher,
    speaker: Box<dyn Speaker>,
    axis_map: PedalAxisMap,
    clock: MonotonicClock,
    settings: SamplerSettings,
    last_axes: RawAxes,
    last_sample: PedalSample,
}

impl<S: AxisSource> Sampler<S> {
    pub fn new(
        manager: ConnectionManager<S>,
        config: CalibrationConfig,
        publisher: FramePublisher,
        speaker: Box<dyn Speaker>,
        axis_map: PedalAxisMap,
        settings: SamplerSettings,
    ) -> Self {
        let clock = MonotonicClock::new();
        Self {
            manager,
            config,
            state: RuntimeState::new(clock.now_ms()),
            publisher,
            speaker,
            axis_map,
            clock,
            settings,
            last_axes: RawAxes::default(),
            last_sample: PedalSample::default(),
        }
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn device_id(&self) -> u32 {
        self.manager.device_id()
    }

    pub fn awaiting_rescan(&self) -> bool {
        self.manager.needs_rescan(&self.state)
    }

    /// Flush and release the speech backend. Later alerts are dropped.
    pub fn close_speaker(&mut self) {
        self.speaker.close();
    }

    /// Run one step as of `now_ms`.
    pub fn step_at(&mut self, now_ms: u64) -> Step {
        let started = Instant::now();

        if self.manager.needs_rescan(&self.state) {
            return match self.manager.rescan(&mut self.state, now_ms) {
                RescanOutcome::Reconnected { device_id } => {
                    self.publish(
                        now_ms,
                        started,
                        DetectorEvents::default(),
                        ConnectionEvents::RECONNECTED,
                    );
                    self.speaker.speak(phrases::RECONNECTED);
                    Step::Reconnected { device_id }
                }
                RescanOutcome::NotFound => {
                    self.speaker.speak(phrases::NOT_FOUND);
                    Step::NotFound
                }
            };
        }

        match self.manager.poll(&mut self.state, now_ms) {
            PollOutcome::Sample(axes) => {
                let (gas, clutch, brake) = self.axis_map.pick(&axes);
                let sample = PedalSample::from_raw(RawPedals { gas, clutch, brake }, &self.config);
                let events = evaluate(&sample, &mut self.config, &mut self.state, now_ms);
                self.last_axes = axes;
                self.last_sample = sample;
                self.log_sample();

                self.publish(now_ms, started, events, ConnectionEvents::NONE);
                self.announce(events);
                Step::Sampled(events)
            }
            PollOutcome::Disconnected { code } => {
                self.publish(
                    now_ms,
                    started,
                    DetectorEvents::default(),
                    ConnectionEvents::DISCONNECTED,
                );
                self.speaker
                    .speak(&phrases::disconnected(self.settings.rescan_interval.as_secs()));
                Step::Disconnected { code }
            }
            PollOutcome::StillDisconnected { code } => Step::StillDisconnected { code },
            PollOutcome::ReadFailed { code } => {
                warn!(
                    device_id = self.manager.device_id(),
                    code, "Failed to read controller, retrying"
                );
                Step::ReadFailed { code }
            }
        }
    }

    /// Step until the iteration limit or shutdown. Returns the number of polls.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> u64 {
        let mut polls: u64 = 0;
        info!(
            device_id = self.manager.device_id(),
            iterations = self.settings.iterations,
            sleep_ms = self.settings.sleep.as_millis(),
            "Sampling started"
        );

        while !shutdown.is_triggered() {
            if self.awaiting_rescan() {
                if shutdown.sleep(self.settings.rescan_interval) {
                    break;
                }
                self.step_at(self.clock.now_ms());
                continue;
            }

            self.step_at(self.clock.now_ms());
            polls = polls.saturating_add(1);
            if self.settings.iterations != 0 && polls >= self.settings.iterations {
                info!(polls, "Iteration limit reached");
                break;
            }
            if shutdown.sleep(self.settings.sleep) {
                break;
            }
        }

        info!(polls, "Sampling stopped");
        polls
    }

    fn publish(
        &mut self,
        now_ms: u64,
        started: Instant,
        events: DetectorEvents,
        connection_events: ConnectionEvents,
    ) -> u64 {
        self.publisher.publish(FrameContext {
            device_id: self.manager.device_id(),
            now_ms,
            loop_duration: started.elapsed(),
            raw_axes: self.last_axes,
            sample: &self.last_sample,
            events,
            connection_events,
            config: &self.config,
            state: &self.state,
        })
    }

    fn announce(&self, events: DetectorEvents) {
        if events.clutch_alert {
            self.speaker.speak(phrases::CLUTCH_NOISE);
        }
        if let Some(pct) = events.gas_alert {
            self.speaker.speak(&phrases::gas_drift(pct));
        }
        if let Some(pct) = events.estimate_decreased {
            self.speaker.speak(&phrases::new_estimate(pct));
        }
    }

    fn log_sample(&self) {
        let sample = &self.last_sample;
        debug!(
            gas = sample.gas.value,
            clutch = sample.clutch.value,
            brake = sample.brake.value,
            gas_logical_pct = sample.gas.logical_pct,
            "sample"
        );
        if self.settings.debug_raw {
            debug!(
                raw_gas = sample.gas.raw,
                raw_clutch = sample.clutch.raw,
                raw_brake = sample.brake.raw,
                gas = sample.gas.value,
                clutch = sample.clutch.value,
                brake = sample.brake.value,
                "raw sample"
            );
        }
    }
}
