//! The drum machine engine: transport, session edits and the tick loop.
//!
//! [`Engine`] is the control-side owner of a session. It holds the
//! [`Session`] snapshot, the [`Scheduler`], the [`VoiceRouter`] and a
//! clock. Everything it does happens on one task; the only thing that
//! crosses to the audio thread is the router's queue.
//!
//! ```text
//!   EngineHandle ──commands──→ Engine::run ──tick()──→ Scheduler
//!        ▲                        │                       │ triggers
//!        └── watch (step, session)┘                       ▼
//!                                                    VoiceRouter ──rtrb──→ MasterBus
//! ```

pub mod clock;
pub mod handle;
pub mod router;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

pub use clock::{ClockControl, SharedClock};
pub use handle::{Command, EngineHandle};
pub use router::{channel, MasterBus, VoiceRouter};

use crate::{
    config::EngineConfig,
    effects::EffectParam,
    error::{EngineError, Result},
    sequencing::{InstrumentSettings, Scheduler, SettingField, Session, StepSink},
    voices::Instrument,
};

/// What one call to [`Engine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Transport is stopped; nothing scheduled.
    Stopped,
    /// The clock is suspended and would not resume. Retried next tick.
    ClockUnavailable,
    Scheduled {
        steps: usize,
        voices: usize,
        dropped: usize,
    },
}

/// Forwards scheduler decisions to the router and the playhead observable.
struct TickSink<'a> {
    router: &'a mut VoiceRouter,
    step_tx: &'a watch::Sender<Option<usize>>,
    voices: usize,
    dropped: usize,
}

impl StepSink for TickSink<'_> {
    fn trigger(&mut self, instrument: Instrument, settings: &InstrumentSettings, when: f64) {
        match self.router.route(instrument, settings, when) {
            Ok(()) => self.voices += 1,
            Err(_) => self.dropped += 1,
        }
    }

    fn step(&mut self, index: usize, _when: f64) {
        self.step_tx.send_replace(Some(index));
    }
}

pub struct Engine<C: ClockControl> {
    config: EngineConfig,
    clock: C,
    scheduler: Scheduler,
    router: VoiceRouter,
    session: Arc<Session>,
    step_tx: watch::Sender<Option<usize>>,
    session_tx: watch::Sender<Arc<Session>>,
}

impl<C: ClockControl> Engine<C> {
    /// A stopped engine with empty patterns and default settings.
    pub fn new(config: EngineConfig, clock: C, router: VoiceRouter) -> Result<Self> {
        let scheduler = Scheduler::new(config.bpm, config.lookahead, config.max_lateness);
        let session = Arc::new(Session::new(config.pattern_length, scheduler.bpm())?);
        let (step_tx, _) = watch::channel(None);
        let (session_tx, _) = watch::channel(session.clone());

        Ok(Self {
            config,
            clock,
            scheduler,
            router,
            session,
            step_tx,
            session_tx,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Resume a suspended clock. A no-op when it is already running.
    async fn resume_clock(&mut self) -> Result<()> {
        if self.clock.is_suspended() {
            self.clock.resume().await?;
        }
        Ok(())
    }

    /// Apply `edit` to a private copy of the session and publish it whole.
    fn edit<T>(&mut self, edit: impl FnOnce(&mut Session) -> T) -> T {
        let result = edit(Arc::make_mut(&mut self.session));
        self.session_tx.send_replace(self.session.clone());
        result
    }

    /// Start the transport at the clock's current time.
    ///
    /// A suspended clock is resumed first; if that fails the transport stays
    /// stopped. Starting while running does nothing.
    pub async fn start(&mut self) -> Result<()> {
        if self.scheduler.is_running() {
            return Ok(());
        }

        if let Err(err) = self.resume_clock().await {
            tracing::warn!(%err, "could not start transport");
            return Err(err);
        }

        let now = self.clock.now();
        self.scheduler.start(now);
        tracing::info!(bpm = self.scheduler.bpm(), now, "transport started");
        Ok(())
    }

    /// Stop scheduling. Voices already queued play out.
    pub fn stop(&mut self) {
        if !self.scheduler.is_running() {
            return;
        }
        self.scheduler.stop();
        self.step_tx.send_replace(None);
        tracing::info!("transport stopped");
    }

    pub fn set_tempo(&mut self, bpm: f32) {
        self.scheduler.set_tempo(bpm);
        let bpm = self.scheduler.bpm();
        self.edit(|session| session.bpm = bpm);
        tracing::debug!(bpm, "tempo changed");
    }

    /// Switch between the main and fill pattern. The playhead keeps going.
    pub fn set_fill_mode(&mut self, fill: bool) {
        self.edit(|session| session.fill_mode = fill);
        tracing::debug!(fill, "fill mode");
    }

    /// Flip one step of the main (or fill) pattern; returns its new state.
    pub fn toggle_step(&mut self, instrument: Instrument, index: usize, fill: bool) -> Result<bool> {
        let length = self.session.patterns.len();
        if index >= length {
            return Err(EngineError::StepOutOfRange { index, length });
        }
        let active =
            self.edit(|session| session.patterns.pattern_mut(fill).toggle(instrument, index))?;
        tracing::debug!(%instrument, index, fill, active, "step toggled");
        Ok(active)
    }

    /// Set one of `instrument`'s settings. Returns the value actually
    /// stored, after clamping.
    pub fn set_instrument_setting(
        &mut self,
        instrument: Instrument,
        field: SettingField,
        value: f32,
    ) -> f32 {
        let stored = self.edit(|session| {
            let settings = &mut session.settings[instrument];
            settings.set(field, value);
            settings.get(field)
        });
        tracing::debug!(%instrument, %field, value = stored, "instrument setting");
        stored
    }

    /// Set an effect parameter and push the new set to the master bus.
    ///
    /// Delay feedback of 1.0 or more is refused and leaves everything as it
    /// was.
    pub fn set_effect_param(&mut self, param: EffectParam, value: f32) -> Result<()> {
        let mut effects = self.session.effects;
        effects.set(param, value)?;

        self.router.update_effects(&effects)?;
        self.edit(|session| session.effects = effects);
        tracing::debug!(%param, value = effects.get(param), "effect parameter");
        Ok(())
    }

    /// Resize both patterns to 16 or 32 steps.
    pub fn set_pattern_length(&mut self, length: usize) -> Result<()> {
        crate::sequencing::pattern::check_length(length)?;
        self.edit(|session| session.patterns.set_length(length))?;
        tracing::debug!(length, "pattern length");
        Ok(())
    }

    /// Play `instrument` right now, whatever the transport or mute state.
    ///
    /// A suspended clock is resumed first. If it won't resume, nothing is
    /// queued.
    pub async fn audition(&mut self, instrument: Instrument) -> Result<()> {
        if let Err(err) = self.resume_clock().await {
            tracing::warn!(%instrument, %err, "clock suspended, audition skipped");
            return Err(err);
        }
        let settings = self.session.settings[instrument];
        let now = self.clock.now();
        self.router.route(instrument, &settings, now)
    }

    /// One scheduling pass. Call every `tick_interval`.
    pub async fn tick(&mut self) -> TickOutcome {
        self.router.reclaim();
        if !self.scheduler.is_running() {
            return TickOutcome::Stopped;
        }

        if let Err(err) = self.resume_clock().await {
            tracing::warn!(%err, "clock suspended, skipping tick");
            return TickOutcome::ClockUnavailable;
        }

        let now = self.clock.now();
        let mut sink = TickSink {
            router: &mut self.router,
            step_tx: &self.step_tx,
            voices: 0,
            dropped: 0,
        };
        let steps = self.scheduler.tick(now, &self.session, &mut sink);

        TickOutcome::Scheduled {
            steps,
            voices: sink.voices,
            dropped: sink.dropped,
        }
    }

    /// Playhead observable: the step just scheduled, `None` while stopped.
    pub fn subscribe_step(&self) -> watch::Receiver<Option<usize>> {
        self.step_tx.subscribe()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Arc<Session>> {
        self.session_tx.subscribe()
    }

    /// A handle for driving this engine from another task, plus the command
    /// stream to pass to [`Engine::run`].
    pub fn control(&self) -> (EngineHandle, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = EngineHandle::new(tx, self.subscribe_step(), self.subscribe_session());
        (handle, rx)
    }

    /// Apply one command. Errors are logged; the loop keeps going.
    pub async fn apply(&mut self, command: Command) {
        let result = match command {
            Command::Start => self.start().await,
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::SetTempo(bpm) => {
                self.set_tempo(bpm);
                Ok(())
            }
            Command::ToggleStep {
                instrument,
                index,
                fill,
            } => self.toggle_step(instrument, index, fill).map(|_| ()),
            Command::SetInstrumentSetting {
                instrument,
                field,
                value,
            } => {
                self.set_instrument_setting(instrument, field, value);
                Ok(())
            }
            Command::SetEffectParam { param, value } => self.set_effect_param(param, value),
            Command::SetFillMode(fill) => {
                self.set_fill_mode(fill);
                Ok(())
            }
            Command::SetPatternLength(length) => self.set_pattern_length(length),
            Command::Audition(instrument) => self.audition(instrument).await,
            Command::Shutdown => Ok(()),
        };

        if let Err(err) = result {
            tracing::warn!(%err, "command rejected");
        }
    }

    /// Tick on the configured interval and apply commands in between until
    /// `Shutdown` arrives or every handle is dropped. Returns the engine,
    /// stopped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> Self {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval = ?self.config.tick_interval, "engine loop running");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command).await,
                },
            }
        }

        self.stop();
        tracing::info!("engine loop finished");
        self
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn engine() -> (Engine<SharedClock>, MasterBus) {
        let config = EngineConfig::default()
            .with_sample_rate(8_000.0)
            .with_reverb(0.25, 3.0)
            .with_seed(3);
        let clock = SharedClock::new(config.sample_rate);
        let (router, bus) = channel(&config, clock.clone());
        (Engine::new(config, clock, router).unwrap(), bus)
    }

    #[tokio::test]
    async fn test_start_and_stop_publish_playhead() {
        let (mut engine, _bus) = engine();
        let steps = engine.subscribe_step();
        engine.toggle_step(Instrument::Kick, 0, false).unwrap();

        engine.start().await.unwrap();
        let outcome = engine.tick().await;
        assert_eq!(
            outcome,
            TickOutcome::Scheduled {
                steps: 1,
                voices: 1,
                dropped: 0
            }
        );
        assert_eq!(*steps.borrow(), Some(0));

        engine.stop();
        assert_eq!(*steps.borrow(), None);
        assert_eq!(engine.tick().await, TickOutcome::Stopped);
    }

    #[tokio::test]
    async fn test_edits_publish_whole_snapshots() {
        let (mut engine, _bus) = engine();
        let mut sessions = engine.subscribe_session();
        let before = sessions.borrow_and_update().clone();

        assert!(engine.toggle_step(Instrument::Snare, 4, false).unwrap());
        engine.set_fill_mode(true);
        engine.set_tempo(90.0);

        let after = sessions.borrow_and_update().clone();
        assert!(after.patterns.main.is_active(Instrument::Snare, 4));
        assert!(after.fill_mode);
        assert_eq!(after.bpm, 90.0);
        // The old snapshot is untouched
        assert!(!before.patterns.main.is_active(Instrument::Snare, 4));
    }

    #[tokio::test]
    async fn test_out_of_range_step_rejected() {
        let (mut engine, _bus) = engine();
        assert_eq!(
            engine.toggle_step(Instrument::Kick, 16, false),
            Err(EngineError::StepOutOfRange {
                index: 16,
                length: 16
            })
        );

        engine.set_pattern_length(32).unwrap();
        assert_eq!(engine.toggle_step(Instrument::Kick, 31, true), Ok(true));
        assert_eq!(
            engine.set_pattern_length(24),
            Err(EngineError::InvalidPatternLength(24))
        );
        assert_eq!(engine.session().patterns.len(), 32);
    }

    #[tokio::test]
    async fn test_unstable_feedback_leaves_session_alone() {
        let (mut engine, _bus) = engine();
        engine
            .set_effect_param(EffectParam::DelayFeedback, 0.95)
            .unwrap();
        assert_eq!(
            engine.set_effect_param(EffectParam::DelayFeedback, 1.2),
            Err(EngineError::UnstableFeedback(1.2))
        );
        assert_eq!(engine.session().effects.delay_feedback, 0.95);
    }

    #[tokio::test]
    async fn test_setting_returns_clamped_value() {
        let (mut engine, _bus) = engine();
        let stored = engine.set_instrument_setting(Instrument::Clap, SettingField::Volume, 9.0);
        assert_eq!(stored, 4.0);
        assert_eq!(engine.session().settings[Instrument::Clap].volume, 4.0);
    }

    #[tokio::test]
    async fn test_audition_ignores_mute_and_transport() {
        let (mut engine, mut bus) = engine();
        engine.set_instrument_setting(Instrument::Cowbell, SettingField::Muted, 1.0);
        engine.audition(Instrument::Cowbell).await.unwrap();

        bus.render(&mut [0.0; 64], &mut [0.0; 64]);
        assert_eq!(bus.active_voices(), 1);
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_suspended_clock_resumes_on_tick() {
        let (mut engine, _bus) = engine();
        engine.start().await.unwrap();
        engine.clock().set_suspended(true);

        assert!(matches!(
            engine.tick().await,
            TickOutcome::Scheduled { .. }
        ));
        assert!(!engine.clock().is_suspended());
    }

    #[tokio::test]
    async fn test_handle_commands_reach_loop() {
        let (engine, _bus) = engine();
        let (handle, commands) = engine.control();

        handle.toggle_step(Instrument::Rimshot, 2, false);
        handle.set_effect_param(EffectParam::ReverbMix, 0.5);
        handle.shutdown();

        let engine = engine.run(commands).await;
        assert!(engine.session().patterns.main.is_active(Instrument::Rimshot, 2));
        assert_eq!(handle.session().effects.reverb_mix, 0.5);
    }

    /// Tokio time, with a suspension that refuses to lift `failures` times.
    #[derive(Clone)]
    struct FlakyClock {
        origin: tokio::time::Instant,
        suspended: Arc<AtomicBool>,
        failures: Arc<AtomicUsize>,
    }

    impl FlakyClock {
        fn new() -> Self {
            Self {
                origin: tokio::time::Instant::now(),
                suspended: Arc::new(AtomicBool::new(false)),
                failures: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn suspend(&self, failures: usize) {
            self.failures.store(failures, Ordering::SeqCst);
            self.suspended.store(true, Ordering::SeqCst);
        }
    }

    impl ClockControl for FlakyClock {
        fn now(&self) -> f64 {
            self.origin.elapsed().as_secs_f64()
        }

        fn is_suspended(&self) -> bool {
            self.suspended.load(Ordering::SeqCst)
        }

        async fn resume(&mut self) -> Result<()> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(EngineError::ClockResume("device busy".into()));
            }
            self.suspended.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    fn flaky_engine() -> (Engine<FlakyClock>, MasterBus, FlakyClock) {
        let config = EngineConfig::default()
            .with_sample_rate(8_000.0)
            .with_reverb(0.25, 3.0)
            .with_seed(3);
        let (router, bus) = channel(&config, SharedClock::new(config.sample_rate));
        let clock = FlakyClock::new();
        let engine = Engine::new(config, clock.clone(), router).unwrap();
        (engine, bus, clock)
    }

    #[tokio::test]
    async fn test_audition_resumes_suspended_clock() {
        let (mut engine, mut bus) = engine();
        engine.clock().set_suspended(true);

        engine.audition(Instrument::Rimshot).await.unwrap();
        assert!(!engine.clock().is_suspended());

        let mut left = [0.0; 64];
        bus.render(&mut left, &mut [0.0; 64]);
        assert!(left.iter().any(|&s| s != 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_audition_on_dead_clock_queues_nothing() {
        let (mut engine, mut bus, clock) = flaky_engine();
        clock.suspend(1);

        assert_eq!(
            engine.audition(Instrument::Rimshot).await,
            Err(EngineError::ClockResume("device busy".into()))
        );
        assert!(clock.is_suspended());

        // Time moving again later must not bring the refused hit back
        clock.suspended.store(false, Ordering::SeqCst);
        bus.render(&mut [0.0; 64], &mut [0.0; 64]);
        assert_eq!(bus.active_voices(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_resume_skips_ticks_until_clock_returns() {
        let (mut engine, mut bus, clock) = flaky_engine();
        engine.toggle_step(Instrument::Kick, 0, false).unwrap();
        engine.start().await.unwrap();
        clock.suspend(2);

        assert_eq!(engine.tick().await, TickOutcome::ClockUnavailable);
        assert_eq!(engine.tick().await, TickOutcome::ClockUnavailable);
        assert!(engine.is_running());
        assert_eq!(*engine.subscribe_step().borrow(), None);
        bus.render(&mut [0.0; 64], &mut [0.0; 64]);
        assert_eq!(bus.active_voices(), 0);

        assert_eq!(
            engine.tick().await,
            TickOutcome::Scheduled {
                steps: 1,
                voices: 1,
                dropped: 0
            }
        );
        assert!(!clock.is_suspended());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_loop_survives_clock_failures() {
        let (engine, _bus, clock) = flaky_engine();
        let (handle, commands) = engine.control();

        let driver = async {
            handle.toggle_step(Instrument::Kick, 0, false);
            handle.start();
            tokio::time::sleep(Duration::from_millis(300)).await;
            assert!(handle.current_step().is_some());

            clock.suspend(4);
            tokio::time::sleep(Duration::from_millis(40)).await;
            let stalled = clock.is_suspended();

            tokio::time::sleep(Duration::from_millis(200)).await;
            let recovered = !clock.is_suspended();
            let playhead = handle.current_step();

            handle.shutdown();
            (stalled, recovered, playhead)
        };

        let (engine, (stalled, recovered, playhead)) =
            tokio::join!(engine.run(commands), driver);

        assert!(stalled);
        assert!(recovered);
        assert!(playhead.is_some());
        assert_eq!(clock.failures.load(Ordering::SeqCst), 0);
        assert!(!engine.is_running());
    }
}
