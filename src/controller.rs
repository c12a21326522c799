//! Lifecycle control and the background gesture loop.
//!
//! ```text
//! Stopped -> Calibrating -> Running <-> Paused -> Stopped
//!                 ^______________|  (recalibrate)
//! ```
//!
//! [`Controller`] is the caller-facing handle. `start()` opens the capture device
//! on the calling thread so an unavailable camera is reported synchronously, then
//! moves the device, provider and sink into a dedicated worker thread. The worker
//! owns the device exclusively and releases it exactly once when it exits.
//!
//! Pause state is a shared atomic flag. Parameter updates and recalibration
//! requests travel over a command channel drained at the top of every iteration,
//! so they never take effect mid-frame.

use crate::{
    calibration::{calibrate, CalibrationProfile},
    capture::CaptureDevice,
    config::{Config, EngineConfig},
    events::{EngineEvent, EventBus, LifecycleState},
    gestures::GestureEngine,
    input_sink::InputSink,
    landmarks::LandmarkProvider,
    params::{ParameterName, Parameters},
    Error, Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{debug, error, info, warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

/// Opens the capture device; called once per `start()`
pub type DeviceOpener<C> = Box<dyn FnMut() -> Result<C> + Send>;

/// Cooperative stop signal checked at every loop boundary
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Point-in-time view for status displays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub state: LifecycleState,
    pub paused: bool,
    /// Profile from the most recent successful calibration
    pub profile: Option<CalibrationProfile>,
}

enum Command {
    UpdateParameter(ParameterName, f64),
    Recalibrate,
}

const fn encode(state: LifecycleState) -> u8 {
    match state {
        LifecycleState::Stopped => 0,
        LifecycleState::Calibrating => 1,
        LifecycleState::Running => 2,
        LifecycleState::Paused => 3,
    }
}

const fn decode(raw: u8) -> LifecycleState {
    match raw {
        1 => LifecycleState::Calibrating,
        2 => LifecycleState::Running,
        3 => LifecycleState::Paused,
        _ => LifecycleState::Stopped,
    }
}

/// State readable from both the caller and the worker
#[derive(Debug, Default)]
struct Shared {
    lifecycle: AtomicU8,
    paused: AtomicBool,
    profile: Mutex<Option<CalibrationProfile>>,
    /// Held while a state change is stored and published, so events arrive in
    /// the order the changes were made
    transition: Mutex<()>,
}

impl Shared {
    fn lifecycle(&self) -> LifecycleState {
        decode(self.lifecycle.load(Ordering::SeqCst))
    }

    /// Store `state` and publish the state callers observe, which is `Paused`
    /// when the pause flag is set on a running engine
    fn set_lifecycle(&self, state: LifecycleState, events: &EventBus) {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        self.lifecycle.store(encode(state), Ordering::SeqCst);
        let effective = self.effective_state();
        info!("Engine {effective}");
        events.publish(&EngineEvent::StateChanged(effective));
    }

    /// Set the pause flag and publish if it changed. Returns whether it changed.
    fn set_paused(&self, paused: bool, events: &EventBus) -> bool {
        let _guard = self.transition.lock().unwrap_or_else(PoisonError::into_inner);
        if self.paused.swap(paused, Ordering::SeqCst) == paused {
            return false;
        }
        let state = if paused {
            LifecycleState::Paused
        } else {
            self.lifecycle()
        };
        events.publish(&EngineEvent::StateChanged(state));
        true
    }

    fn effective_state(&self) -> LifecycleState {
        let state = self.lifecycle();
        if state == LifecycleState::Running && self.paused.load(Ordering::SeqCst) {
            LifecycleState::Paused
        } else {
            state
        }
    }

    fn set_profile(&self, profile: CalibrationProfile) {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }

    fn profile(&self) -> Option<CalibrationProfile> {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct WorkerHandle<P, S> {
    handle: JoinHandle<Option<(P, S)>>,
    commands: Sender<Command>,
    cancel: CancellationToken,
}

/// Hands the worker to its thread. If the thread never starts, the worker
/// stays here and can be reclaimed.
struct WorkerSlot<C, P, S>(Arc<Mutex<Option<Worker<C, P, S>>>>);

impl<C, P, S> Clone for WorkerSlot<C, P, S> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C, P, S> WorkerSlot<C, P, S>
where
    C: CaptureDevice,
    P: LandmarkProvider<C::Frame>,
    S: InputSink,
{
    fn new(worker: Worker<C, P, S>) -> Self {
        Self(Arc::new(Mutex::new(Some(worker))))
    }

    fn take(&self) -> Option<Worker<C, P, S>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Run the worker on the current thread; `None` if it was already taken
    fn run(&self) -> Option<(P, S)> {
        self.take().map(Worker::run)
    }

    /// Release the device of a worker that never ran and return its collaborators
    fn reclaim(&self) -> Option<(P, S)> {
        self.take().map(|mut worker| {
            worker.device.release();
            (worker.provider, worker.sink)
        })
    }
}

/// Everything the background loop owns
struct Worker<C, P, S> {
    device: C,
    provider: P,
    sink: S,
    params: Parameters,
    engine_config: EngineConfig,
    commands: Receiver<Command>,
    shared: Arc<Shared>,
    events: EventBus,
    cancel: CancellationToken,
}

pub struct Controller<C, P, S>
where
    C: CaptureDevice + 'static,
    P: LandmarkProvider<C::Frame> + 'static,
    S: InputSink + 'static,
{
    opener: DeviceOpener<C>,
    /// Held here while stopped; moved into the worker while running
    collaborators: Option<(P, S)>,
    params: Parameters,
    engine_config: EngineConfig,
    shared: Arc<Shared>,
    events: EventBus,
    worker: Option<WorkerHandle<P, S>>,
}

impl<C, P, S> Controller<C, P, S>
where
    C: CaptureDevice + 'static,
    P: LandmarkProvider<C::Frame> + 'static,
    S: InputSink + 'static,
{
    pub fn new(opener: DeviceOpener<C>, provider: P, sink: S, config: &Config) -> Self {
        Self {
            opener,
            collaborators: Some((provider, sink)),
            params: config.parameters.clone(),
            engine_config: config.engine.clone(),
            shared: Arc::new(Shared::default()),
            events: EventBus::new(),
            worker: None,
        }
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Open the device and launch calibration followed by the gesture loop.
    ///
    /// # Errors
    ///
    /// - `AlreadyRunning` if the loop is active
    /// - `DeviceUnavailable` (or the opener's error) if the device cannot be opened
    pub fn start(&mut self) -> Result<()> {
        self.reap_finished()?;
        if self.worker.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let (provider, sink) = self.collaborators.take().ok_or(Error::ChannelClosed)?;
        let device = match (self.opener)() {
            Ok(device) => device,
            Err(e) => {
                error!("Failed to open capture device: {e}");
                self.collaborators = Some((provider, sink));
                self.events.publish(&EngineEvent::Error(e.to_string()));
                return Err(e);
            }
        };

        let (tx, rx) = unbounded();
        let cancel = CancellationToken::new();
        self.shared.paused.store(false, Ordering::SeqCst);
        self.shared.set_lifecycle(LifecycleState::Calibrating, &self.events);

        let worker = Worker {
            device,
            provider,
            sink,
            params: self.params.clone(),
            engine_config: self.engine_config.clone(),
            commands: rx,
            shared: Arc::clone(&self.shared),
            events: self.events.clone(),
            cancel: cancel.clone(),
        };

        let slot = WorkerSlot::new(worker);
        let thread_slot = slot.clone();
        let handle = match thread::Builder::new()
            .name("gesture-engine".into())
            .spawn(move || thread_slot.run())
        {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to spawn gesture engine thread: {e}");
                self.collaborators = slot.reclaim();
                self.shared.set_lifecycle(LifecycleState::Stopped, &self.events);
                return Err(e.into());
            }
        };

        self.worker = Some(WorkerHandle {
            handle,
            commands: tx,
            cancel,
        });
        Ok(())
    }

    /// Cancel the loop and wait for it to release the device.
    ///
    /// No events are published once this returns. A no-op when already stopped.
    ///
    /// # Errors
    ///
    /// Returns `ChannelClosed` if the worker thread panicked
    pub fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        info!("Stopping gesture engine");
        worker.cancel.cancel();
        self.join(worker)
    }

    /// Suspend gesture processing; frames are still drained. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` when stopped
    pub fn pause(&self) -> Result<()> {
        self.ensure_running()?;
        if self.shared.set_paused(true, &self.events) {
            info!("Gesture engine paused");
        }
        Ok(())
    }

    /// Resume gesture processing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` when stopped
    pub fn resume(&self) -> Result<()> {
        self.ensure_running()?;
        if self.shared.set_paused(false, &self.events) {
            info!("Gesture engine resumed");
        }
        Ok(())
    }

    /// Recalibrate on the open device, then resume active processing
    ///
    /// # Errors
    ///
    /// Returns `NotRunning` when stopped
    pub fn recalibrate(&self) -> Result<()> {
        self.ensure_running()?;
        self.send(Command::Recalibrate)
    }

    /// Validate and apply a parameter by name.
    ///
    /// The running loop sees the new value from its next iteration. On error the
    /// previous value is kept.
    ///
    /// # Errors
    ///
    /// `UnknownParameter` or `InvalidParameterValue`
    pub fn update_parameter(&mut self, name: &str, value: f64) -> Result<ParameterName> {
        let parameter = self.params.update(name, value)?;
        if self.is_active() {
            // The worker may have just exited; its copy dies with it
            if let Err(e) = self.send(Command::UpdateParameter(parameter, value)) {
                debug!("Parameter {parameter} not forwarded: {e}");
            }
        }
        Ok(parameter)
    }

    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.shared.effective_state()
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state(),
            paused: self.is_paused(),
            profile: self.shared.profile(),
        }
    }

    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.params
    }

    fn is_active(&self) -> bool {
        self.worker.is_some() && self.shared.lifecycle() != LifecycleState::Stopped
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::NotRunning)
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        let worker = self.worker.as_ref().ok_or(Error::NotRunning)?;
        worker.commands.send(command).map_err(|_| Error::NotRunning)
    }

    /// Join a worker that exited on its own (e.g. failed calibration).
    ///
    /// `Stopped` is the worker's last act before returning, so a worker in that
    /// state is joined even if its thread has not quite finished.
    fn reap_finished(&mut self) -> Result<()> {
        let finished = self.worker.as_ref().is_some_and(|worker| {
            worker.handle.is_finished() || self.shared.lifecycle() == LifecycleState::Stopped
        });
        if finished {
            if let Some(worker) = self.worker.take() {
                return self.join(worker);
            }
        }
        Ok(())
    }

    fn join(&mut self, worker: WorkerHandle<P, S>) -> Result<()> {
        match worker.handle.join() {
            Ok(Some(collaborators)) => {
                self.collaborators = Some(collaborators);
                Ok(())
            }
            Ok(None) | Err(_) => {
                error!("Gesture engine thread failed");
                self.shared
                    .lifecycle
                    .store(encode(LifecycleState::Stopped), Ordering::SeqCst);
                Err(Error::ChannelClosed)
            }
        }
    }
}

impl<C, P, S> Drop for Controller<C, P, S>
where
    C: CaptureDevice + 'static,
    P: LandmarkProvider<C::Frame> + 'static,
    S: InputSink + 'static,
{
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Error while stopping gesture engine: {e}");
        }
    }
}

impl<C, P, S> Worker<C, P, S>
where
    C: CaptureDevice,
    P: LandmarkProvider<C::Frame>,
    S: InputSink,
{
    fn run(mut self) -> (P, S) {
        let clock = Instant::now();
        info!("Gesture engine thread started");

        if let Some(profile) = self.calibrate() {
            let mut engine = GestureEngine::new(profile, self.engine_config.gesture_options());
            self.shared.set_lifecycle(LifecycleState::Running, &self.events);
            self.gesture_loop(&mut engine, clock);
        }

        self.device.release();
        self.shared.set_lifecycle(LifecycleState::Stopped, &self.events);
        info!("Gesture engine thread exiting");
        (self.provider, self.sink)
    }

    /// `None` means the loop must stop
    fn calibrate(&mut self) -> Option<CalibrationProfile> {
        self.events.publish(&EngineEvent::Status(format!(
            "Calibrating: keep a neutral face for {} frames",
            self.params.calibration_frames
        )));

        match calibrate(
            &mut self.device,
            &mut self.provider,
            &self.params,
            self.engine_config.calibration_attempt_factor,
            &self.cancel,
        ) {
            Ok(profile) => {
                self.shared.set_profile(profile);
                self.events.publish(&EngineEvent::Calibrated(profile));
                self.events
                    .publish(&EngineEvent::Status("Calibration complete".to_string()));
                Some(profile)
            }
            Err(Error::Cancelled) => None,
            Err(e) => {
                error!("Calibration failed: {e}");
                self.events.publish(&EngineEvent::Error(e.to_string()));
                self.events.publish(&EngineEvent::Status(
                    "Calibration failed; make sure your face is visible and try again".to_string(),
                ));
                None
            }
        }
    }

    fn gesture_loop(&mut self, engine: &mut GestureEngine, clock: Instant) {
        let interval = self.engine_config.loop_interval();

        while !self.cancel.is_cancelled() {
            if !self.drain_commands(engine) {
                return;
            }

            let frame = self.device.read_frame();

            // Frames are still read while paused so the device buffer stays fresh
            if self.shared.paused.load(Ordering::SeqCst) {
                thread::sleep(interval);
                continue;
            }

            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    thread::sleep(interval);
                    continue;
                }
                Err(e) => {
                    debug!("Skipping frame: {e}");
                    thread::sleep(interval);
                    continue;
                }
            };

            let landmarks = match self.provider.detect(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    warn!("Landmark detection failed: {e}");
                    thread::sleep(interval);
                    continue;
                }
            };

            let now = clock.elapsed().as_secs_f64();
            let outcome = engine.process(landmarks.as_ref(), now, &self.params, &mut self.sink);
            for event in outcome.events {
                self.events.publish(&EngineEvent::Gesture(event));
            }

            thread::sleep(interval);
        }
    }

    /// Apply queued commands. Returns false when the loop must stop.
    fn drain_commands(&mut self, engine: &mut GestureEngine) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(Command::UpdateParameter(name, value)) => {
                    if let Err(e) = self.params.set(name, value) {
                        warn!("Rejected parameter update {name}={value}: {e}");
                    } else {
                        debug!("{name} = {value}");
                    }
                }
                Ok(Command::Recalibrate) => {
                    self.shared.paused.store(false, Ordering::SeqCst);
                    self.shared
                        .set_lifecycle(LifecycleState::Calibrating, &self.events);
                    let Some(profile) = self.calibrate() else {
                        return false;
                    };
                    engine.recalibrate(profile);
                    self.shared.set_lifecycle(LifecycleState::Running, &self.events);
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capture::ReplayDevice,
        input_sink::RecordingSink,
        landmarks::{LandmarkSet, PassThroughProvider},
        synthetic::SyntheticFace,
    };
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_lifecycle_encoding() {
        for state in [
            LifecycleState::Stopped,
            LifecycleState::Calibrating,
            LifecycleState::Running,
            LifecycleState::Paused,
        ] {
            assert_eq!(decode(encode(state)), state);
        }
        assert_eq!(decode(42), LifecycleState::Stopped);
    }

    fn replay_worker(
        cancel: CancellationToken,
    ) -> (
        Worker<ReplayDevice<Option<LandmarkSet>>, PassThroughProvider, RecordingSink>,
        Arc<AtomicUsize>,
    ) {
        let device = ReplayDevice::looping(vec![Some(SyntheticFace::default().landmarks())]);
        let releases = device.release_counter();
        let (_tx, rx) = unbounded();
        let config = Config::default();
        let worker = Worker {
            device,
            provider: PassThroughProvider,
            sink: RecordingSink::default(),
            params: config.parameters,
            engine_config: config.engine,
            commands: rx,
            shared: Arc::new(Shared::default()),
            events: EventBus::new(),
            cancel,
        };
        (worker, releases)
    }

    #[test]
    fn test_unstarted_worker_is_reclaimed() {
        let (worker, releases) = replay_worker(CancellationToken::new());
        let slot = WorkerSlot::new(worker);
        // The thread's copy goes away without ever running
        drop(slot.clone());

        assert!(slot.reclaim().is_some());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert!(slot.reclaim().is_none());
    }

    #[test]
    fn test_finished_worker_leaves_nothing_to_reclaim() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (worker, releases) = replay_worker(cancel);
        let slot = WorkerSlot::new(worker);
        let thread_slot = slot.clone();

        let returned = thread::spawn(move || thread_slot.run()).join().unwrap();
        assert!(returned.is_some());
        assert!(slot.reclaim().is_none());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_running_while_paused_publishes_paused() {
        let shared = Shared::default();
        let events = EventBus::new();
        let rx = events.subscribe();

        shared.paused.store(true, Ordering::SeqCst);
        shared.set_lifecycle(LifecycleState::Calibrating, &events);
        shared.set_lifecycle(LifecycleState::Running, &events);

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                EngineEvent::StateChanged(LifecycleState::Calibrating),
                EngineEvent::StateChanged(LifecycleState::Paused),
            ]
        );
        assert_eq!(shared.lifecycle(), LifecycleState::Running);
    }
}
