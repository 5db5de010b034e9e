/// Polling loop that drives the whole pipeline
///
/// One background thread owns the area lock, the game tracker and both
/// debouncers. Each tick it captures, locates, reads, confirms and commits,
/// then publishes what happened on the `EventBus`. Other threads talk to it
/// only through `MonitorHandle` commands and bus events.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use image::RgbImage;
use tracing::{debug, error, info, warn};

use crate::agent::DecisionEngine;
use crate::capture::FrameSource;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::detection::{ActionSample, AreaLocator, AssetBundle, StartSignature, TableReader};
use crate::error::{AppResult, MonitorError};
use crate::game::{CommitOutcome, GamePhase, GameStateTracker, GameView};
use crate::messaging::{Event, EventBus, MonitorCommand};
use crate::state::{ProcessState, ProcessStateMachine};
use crate::utils::{LatencyStats, TickTiming, Timer};

/// Capture one frame and resolve it against the area lock.
///
/// `None` when stopping, when no window is available, or when the area is not located.
fn next_frame(
    locator: &mut AreaLocator,
    source: &mut dyn FrameSource,
    running: &AtomicBool,
) -> Option<RgbImage> {
    if !running.load(Ordering::Relaxed) {
        return None;
    }
    match source.capture() {
        Ok(Some(raw)) => locator.locate(&raw).map(|located| located.frame),
        Ok(None) => None,
        Err(err) => {
            debug!("Capture failed during confirmation: {err}");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct MonitorLoop {
    locator: AreaLocator,
    reader: TableReader,
    tracker: GameStateTracker,
    start_debounce: Debouncer<Option<StartSignature>>,
    action_debounce: Debouncer<ActionSample>,
    engine: Option<Box<dyn DecisionEngine>>,
    hinted: bool,
    bus: EventBus,
    running: Arc<AtomicBool>,
    tick_delay: Duration,
    confirm_delay: Duration,
    stats: LatencyStats,
}

impl MonitorLoop {
    pub fn new(config: &Config, assets: Arc<AssetBundle>, bus: EventBus) -> Self {
        let locator = AreaLocator::new(
            Arc::clone(&assets),
            config.layout.clone(),
            config.thresholds.show,
            config.thresholds.locate_luminance,
        );
        let reader = TableReader::new(assets, config.layout.clone(), config.thresholds.clone());

        Self {
            locator,
            reader,
            tracker: GameStateTracker::new(),
            start_debounce: Debouncer::new(config.confirm_count),
            action_debounce: Debouncer::new(config.confirm_count),
            engine: None,
            hinted: false,
            bus,
            running: Arc::new(AtomicBool::new(true)),
            tick_delay: Duration::from_millis(config.tick_delay_ms),
            confirm_delay: Duration::from_millis(config.confirm_delay_ms),
            stats: LatencyStats::new(config.stats_interval),
        }
    }

    /// Attach a decision engine; it is asked for a hint once per turn
    pub fn with_engine(mut self, engine: Box<dyn DecisionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.tracker.phase()
    }

    pub fn view(&self) -> GameView {
        self.tracker.view()
    }

    pub fn locked_area(&self) -> Option<crate::capture::Region> {
        self.locator.locked()
    }

    /// Apply one command; returns false when the loop should exit
    pub fn handle_command(&mut self, command: MonitorCommand) -> bool {
        match command {
            MonitorCommand::ResetArea => {
                self.locator.reset();
                self.bus.publish(Event::AreaReset);
                true
            }
            MonitorCommand::ResetGame => {
                self.tracker.reset();
                self.start_debounce.reset();
                self.action_debounce.reset();
                self.hinted = false;
                info!("Game reset");
                self.bus.publish(Event::GameReset);
                true
            }
            MonitorCommand::Stop => false,
        }
    }

    /// Run one capture-to-commit cycle
    pub fn tick(&mut self, source: &mut dyn FrameSource) -> AppResult<TickTiming> {
        let total = Timer::start();
        let mut stage = Timer::start();
        let mut timing = TickTiming::default();

        let raw = source.capture().context("Failed to capture game window")?;
        timing.capture_us = stage.lap_us();
        let Some(raw) = raw else {
            debug!("Game window not available");
            return Ok(timing);
        };

        let located = self.locator.locate(&raw);
        timing.locate_us = stage.lap_us();
        let Some(located) = located else {
            return Ok(timing);
        };
        if located.newly_locked {
            self.bus.publish(Event::AreaLocked {
                region: located.region,
            });
        }

        match self.tracker.phase() {
            GamePhase::NotStarted | GamePhase::Finished => self.try_start(located.frame, source),
            GamePhase::InProgress => self.advance(located.frame, source),
        }
        timing.read_us = stage.lap_us();
        timing.total_us = total.elapsed_us();
        Ok(timing)
    }

    fn try_start(&mut self, frame: RgbImage, source: &mut dyn FrameSource) {
        // Cheap reject before committing to a confirmation wait
        let Some(first) = self.reader.read_start(&frame) else {
            return;
        };

        let reader = &self.reader;
        let locator = &mut self.locator;
        let running = &self.running;
        let mut first = Some(Some(first));
        let confirmed = self.start_debounce.confirm_with(
            || match first.take() {
                Some(sample) => Some(sample),
                None => next_frame(locator, source, running).map(|f| reader.read_start(&f)),
            },
            self.confirm_delay,
        );
        let Some(Some(signature)) = confirmed else {
            return;
        };

        if self.tracker.phase() == GamePhase::Finished {
            self.tracker.reset();
        }
        if let Err(err) = self.tracker.start(&signature) {
            warn!("Ignoring start signature: {err}");
            return;
        }

        self.action_debounce.reset();
        self.hinted = false;
        self.bus.publish(Event::GameStarted {
            landlord: signature.landlord,
            own_hand: signature.own_hand,
            bonus: signature.bonus,
        });
        self.request_hint();
    }

    fn advance(&mut self, frame: RgbImage, source: &mut dyn FrameSource) {
        let seat = self.tracker.turn().acting;
        self.request_hint();

        let reader = &self.reader;
        let locator = &mut self.locator;
        let running = &self.running;
        let mut first = Some(frame);
        let confirmed = self.action_debounce.confirm_with(
            || {
                let frame = match first.take() {
                    Some(frame) => frame,
                    None => next_frame(locator, source, running)?,
                };
                Some(reader.read_action(&frame, seat))
            },
            self.confirm_delay,
        );
        let Some(sample) = confirmed else {
            debug!(%seat, "Action read not confirmed");
            return;
        };

        match self.tracker.commit(&sample) {
            Ok(CommitOutcome::Idle) => {}
            Ok(CommitOutcome::Committed { action, finished }) => {
                info!(%seat, cards = %action.cards, passed = action.passed, "Action committed");
                self.hinted = false;
                self.bus.publish(Event::ActionCommitted {
                    action,
                    view: self.tracker.view(),
                });
                if let Some(winner) = finished {
                    self.bus.publish(Event::GameFinished { seat, winner });
                } else {
                    self.request_hint();
                }
            }
            Err(reason) => {
                warn!(%seat, cards = %sample.cards, "Discarding anomalous read: {reason}");
                self.bus.publish(Event::AnomalyDetected {
                    seat,
                    sample,
                    reason,
                });
            }
        }
    }

    fn request_hint(&mut self) {
        if self.hinted || self.tracker.phase() != GamePhase::InProgress {
            return;
        }
        self.hinted = true;

        let Some(engine) = &self.engine else {
            return;
        };
        let view = self.tracker.view();
        let seat = self.tracker.turn().acting;
        if let Some(hint) = engine.hint(&view) {
            info!(%seat, action = %hint.action, confidence = hint.confidence, "Hint");
            self.bus.publish(Event::HintReady { seat, hint });
        }
    }

    /// Drain pending commands; returns false when the loop should exit
    fn drain_commands(&mut self, commands: &Receiver<MonitorCommand>) -> bool {
        loop {
            match commands.try_recv() {
                Ok(command) => {
                    if !self.handle_command(command) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn publish_transition(&self, (old_state, new_state): (ProcessState, ProcessState)) {
        self.bus.publish(Event::ProcessStateChanged {
            old_state,
            new_state,
        });
    }

    fn run(
        mut self,
        mut source: Box<dyn FrameSource>,
        commands: Receiver<MonitorCommand>,
        lifecycle: ProcessStateMachine,
    ) {
        if let Ok(change) = lifecycle.mark_running() {
            self.publish_transition(change);
        }
        info!("Monitor running");

        while self.running.load(Ordering::Relaxed) {
            if !self.drain_commands(&commands) {
                break;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.tick(source.as_mut())));
            match outcome {
                Ok(Ok(timing)) => self.stats.add(timing),
                Ok(Err(err)) => {
                    error!("Tick failed: {err:#}");
                    self.bus.publish(Event::TickFailed {
                        message: format!("{err:#}"),
                    });
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Tick panicked: {message}");
                    self.bus.publish(Event::TickFailed { message });
                }
            }

            thread::sleep(self.tick_delay);
        }

        self.running.store(false, Ordering::Relaxed);
        if let Ok(change) = lifecycle.stop() {
            self.publish_transition(change);
        }
        let change = lifecycle
            .mark_stopped()
            .unwrap_or_else(|_| lifecycle.force_stop());
        self.publish_transition(change);
        info!("Monitor stopped");
        self.bus.publish(Event::Shutdown);
    }

    /// Move the loop onto its own thread
    pub fn spawn<S: FrameSource + 'static>(self, source: S) -> Result<MonitorHandle, MonitorError> {
        let lifecycle = ProcessStateMachine::new();
        let change = lifecycle.start().map_err(|_| MonitorError::AlreadyRunning)?;
        self.publish_transition(change);

        let (tx, rx) = unbounded();
        let running = Arc::clone(&self.running);
        let bus = self.bus.clone();
        let thread_lifecycle = lifecycle.clone();

        let thread = thread::Builder::new()
            .name("doudizhu-monitor".into())
            .spawn(move || self.run(Box::new(source), rx, thread_lifecycle))
            .map_err(|err| {
                let (old_state, new_state) = lifecycle.force_stop();
                bus.publish(Event::ProcessStateChanged {
                    old_state,
                    new_state,
                });
                MonitorError::ThreadSpawnFailed(err)
            })?;

        Ok(MonitorHandle {
            commands: tx,
            running,
            lifecycle,
            bus,
            thread: Some(thread),
        })
    }
}

/// Control surface of a running monitor thread
pub struct MonitorHandle {
    commands: Sender<MonitorCommand>,
    running: Arc<AtomicBool>,
    lifecycle: ProcessStateMachine,
    bus: EventBus,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn reset_area(&self) {
        let _ = self.commands.send(MonitorCommand::ResetArea);
    }

    pub fn reset_game(&self) {
        let _ = self.commands.send(MonitorCommand::ResetGame);
    }

    pub fn state(&self) -> ProcessState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop after the current tick and wait for the thread
    pub fn stop(mut self) -> Result<(), MonitorError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), MonitorError> {
        let thread = self.thread.take().ok_or(MonitorError::NotRunning)?;

        self.running.store(false, Ordering::Relaxed);
        let _ = self.commands.send(MonitorCommand::Stop);
        if let Ok((old_state, new_state)) = self.lifecycle.stop() {
            self.bus.publish(Event::ProcessStateChanged {
                old_state,
                new_state,
            });
        }

        thread.join().map_err(|_| MonitorError::ThreadPanicked)
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
