//! DrumKit - application builder, audio device and engine thread

use std::sync::mpsc::sync_channel;
use std::thread;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc::UnboundedReceiver;

use drumbus::{
    engine::{self, Command},
    ClockControl, Engine, EngineConfig, EngineError, EngineHandle, Instrument, SharedClock,
};

use super::ui::UiApp;

/// Main application builder
pub struct DrumKit {
    bpm: f32,
    pattern_length: usize,
    steps: Vec<(Instrument, usize)>,
}

impl DrumKit {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            pattern_length: 16,
            steps: Vec::new(),
        }
    }

    pub fn bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn pattern_length(mut self, length: usize) -> Self {
        self.pattern_length = length;
        self
    }

    /// Pre-set steps of the main pattern for `instrument`.
    pub fn steps(mut self, instrument: Instrument, steps: impl IntoIterator<Item = usize>) -> Self {
        self.steps
            .extend(steps.into_iter().map(|index| (instrument, index)));
        self
    }

    /// Open the audio device, start the engine thread and hand the terminal
    /// to the UI until it quits.
    pub fn run(self) -> EyreResult<()> {
        let (ready_tx, ready_rx) = sync_channel::<EyreResult<(EngineHandle, f32)>>(1);

        // The cpal stream is not Send on every platform, so it is created,
        // driven and dropped on the engine thread.
        let engine_thread = thread::Builder::new()
            .name("drumkit-engine".into())
            .spawn(move || -> EyreResult<()> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .wrap_err("failed to build engine runtime")?;

                match self.build_engine() {
                    Ok((engine, commands, handle)) => {
                        let sample_rate = engine.config().sample_rate;
                        let _ = ready_tx.send(Ok((handle, sample_rate)));
                        runtime.block_on(engine.run(commands));
                        Ok(())
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        Ok(())
                    }
                }
            })
            .wrap_err("failed to spawn engine thread")?;

        let (handle, sample_rate) = ready_rx
            .recv()
            .wrap_err("engine thread exited during setup")??;

        let mut terminal = ratatui::init();
        let result = UiApp::new(handle.clone(), sample_rate).run(&mut terminal);
        ratatui::restore();

        handle.shutdown();
        engine_thread
            .join()
            .map_err(|_| eyre!("engine thread panicked"))??;
        result
    }

    fn build_engine(
        self,
    ) -> EyreResult<(
        Engine<DeviceClock>,
        UnboundedReceiver<Command>,
        EngineHandle,
    )> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let device_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = device_config.sample_rate().0 as f32;
        let channels = device_config.channels() as usize;

        let config = EngineConfig::default()
            .with_sample_rate(sample_rate)
            .with_bpm(self.bpm)
            .with_pattern_length(self.pattern_length);

        // Time stands still until the transport first starts
        let clock = SharedClock::new(sample_rate);
        clock.set_suspended(true);
        let (router, mut bus) = engine::channel(&config, clock.clone());

        let stream = device
            .build_output_stream(
                &device_config.into(),
                move |data: &mut [f32], _| bus.render_interleaved(data, channels),
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        tracing::info!(sample_rate, channels, "audio device ready");

        let mut engine = Engine::new(config, DeviceClock { clock, stream }, router)?;
        for (instrument, index) in self.steps {
            engine.toggle_step(instrument, index, false)?;
        }

        let (handle, commands) = engine.control();
        Ok((engine, commands, handle))
    }
}

impl Default for DrumKit {
    fn default() -> Self {
        Self::new()
    }
}

/// The master bus's frame clock, plus the stream that drives it.
///
/// Resuming plays the stream; the bus then advances the clock.
struct DeviceClock {
    clock: SharedClock,
    stream: cpal::Stream,
}

impl ClockControl for DeviceClock {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn is_suspended(&self) -> bool {
        self.clock.is_suspended()
    }

    async fn resume(&mut self) -> drumbus::Result<()> {
        self.stream
            .play()
            .map_err(|err| EngineError::ClockResume(err.to_string()))?;
        self.clock.set_suspended(false);
        Ok(())
    }
}
