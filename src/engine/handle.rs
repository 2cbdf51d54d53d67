use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    effects::EffectParam,
    sequencing::{SettingField, Session},
    voices::Instrument,
};

/// Requests the UI sends to a running engine loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    SetTempo(f32),
    ToggleStep {
        instrument: Instrument,
        index: usize,
        fill: bool,
    },
    SetInstrumentSetting {
        instrument: Instrument,
        field: SettingField,
        value: f32,
    },
    SetEffectParam {
        param: EffectParam,
        value: f32,
    },
    SetFillMode(bool),
    SetPatternLength(usize),
    Audition(Instrument),
    Shutdown,
}

/// Cloneable remote for an engine running its own loop: send commands,
/// watch the playhead and the session.
///
/// Sends never block. Once the loop has exited they are silently dropped.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Command>,
    step_rx: watch::Receiver<Option<usize>>,
    session_rx: watch::Receiver<Arc<Session>>,
}

impl EngineHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        step_rx: watch::Receiver<Option<usize>>,
        session_rx: watch::Receiver<Arc<Session>>,
    ) -> Self {
        Self {
            tx,
            step_rx,
            session_rx,
        }
    }

    pub fn send(&self, command: Command) {
        let _ = self.tx.send(command);
    }

    pub fn start(&self) {
        self.send(Command::Start);
    }

    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    pub fn set_tempo(&self, bpm: f32) {
        self.send(Command::SetTempo(bpm));
    }

    pub fn toggle_step(&self, instrument: Instrument, index: usize, fill: bool) {
        self.send(Command::ToggleStep {
            instrument,
            index,
            fill,
        });
    }

    pub fn set_instrument_setting(&self, instrument: Instrument, field: SettingField, value: f32) {
        self.send(Command::SetInstrumentSetting {
            instrument,
            field,
            value,
        });
    }

    pub fn set_effect_param(&self, param: EffectParam, value: f32) {
        self.send(Command::SetEffectParam { param, value });
    }

    pub fn set_fill_mode(&self, fill: bool) {
        self.send(Command::SetFillMode(fill));
    }

    pub fn set_pattern_length(&self, length: usize) {
        self.send(Command::SetPatternLength(length));
    }

    pub fn audition(&self, instrument: Instrument) {
        self.send(Command::Audition(instrument));
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    /// Step under the playhead, `None` while stopped.
    pub fn current_step(&self) -> Option<usize> {
        *self.step_rx.borrow()
    }

    /// Latest published session.
    pub fn session(&self) -> Arc<Session> {
        self.session_rx.borrow().clone()
    }

    pub fn subscribe_step(&self) -> watch::Receiver<Option<usize>> {
        self.step_rx.clone()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<Arc<Session>> {
        self.session_rx.clone()
    }
}
