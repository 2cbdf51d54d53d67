//! TUI module for drumkit
//!
//! Step grid, transport bar and effect levels. All edits go through the
//! engine handle; the screen only draws what the engine publishes.

mod grid;
mod transport;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};

use drumbus::{
    effects::EffectParam, sequencing::pattern::SUPPORTED_LENGTHS, EngineHandle, Instrument,
    SettingField,
};

use grid::render_grid;
use transport::render_transport;

const TEMPO_STEP: f32 = 5.0;

/// Levels the effect keys step through.
const REVERB_LEVELS: [f32; 5] = [0.0, 0.2, 0.4, 0.6, 0.8];
const DELAY_LEVELS: [f32; 3] = [0.0, 0.25, 0.5];
const PHASER_LEVELS: [f32; 3] = [0.0, 0.5, 1.0];

/// Grid cursor: row is the instrument, column the step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursor {
    pub row: usize,
    pub column: usize,
}

pub struct UiApp {
    handle: EngineHandle,
    sample_rate: f32,
    cursor: Cursor,
    playing: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(handle: EngineHandle, sample_rate: f32) -> Self {
        Self {
            handle,
            sample_rate,
            cursor: Cursor::default(),
            playing: false,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn selected(&self) -> Instrument {
        Instrument::ALL[self.cursor.row]
    }

    fn handle_key(&mut self, key: KeyCode) {
        let session = self.handle.session();
        let length = session.patterns.len();

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.cursor.row = self.cursor.row.saturating_sub(1),
            KeyCode::Down => self.cursor.row = (self.cursor.row + 1).min(Instrument::COUNT - 1),
            KeyCode::Left => self.cursor.column = self.cursor.column.saturating_sub(1),
            KeyCode::Right => self.cursor.column = (self.cursor.column + 1).min(length - 1),
            KeyCode::Char(' ') => {
                self.handle
                    .toggle_step(self.selected(), self.cursor.column, session.fill_mode);
            }
            KeyCode::Char('p') => {
                if self.playing {
                    self.handle.stop();
                } else {
                    self.handle.start();
                }
                self.playing = !self.playing;
            }
            KeyCode::Char('f') => self.handle.set_fill_mode(!session.fill_mode),
            KeyCode::Char('m') => {
                let muted = session.settings[self.selected()].muted;
                let value = if muted { 0.0 } else { 1.0 };
                self.handle
                    .set_instrument_setting(self.selected(), SettingField::Muted, value);
            }
            KeyCode::Char('a') => self.handle.audition(self.selected()),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.handle.set_tempo(session.bpm + TEMPO_STEP)
            }
            KeyCode::Char('-') => self.handle.set_tempo(session.bpm - TEMPO_STEP),
            KeyCode::Char('l') => {
                let next = if length == SUPPORTED_LENGTHS[0] {
                    SUPPORTED_LENGTHS[1]
                } else {
                    SUPPORTED_LENGTHS[0]
                };
                self.cursor.column = self.cursor.column.min(next - 1);
                self.handle.set_pattern_length(next);
            }
            KeyCode::Char('r') => self.cycle(EffectParam::ReverbMix, &REVERB_LEVELS),
            KeyCode::Char('d') => self.cycle(EffectParam::DelayMix, &DELAY_LEVELS),
            KeyCode::Char('h') => self.cycle(EffectParam::PhaserMix, &PHASER_LEVELS),
            _ => {}
        }
    }

    /// Step `param` to the next level above its current value, wrapping.
    fn cycle(&self, param: EffectParam, levels: &[f32]) {
        let current = self.handle.session().effects.get(param);
        let next = levels
            .iter()
            .copied()
            .find(|&level| level > current + 1e-3)
            .unwrap_or(levels[0]);
        self.handle.set_effect_param(param, next);
    }

    fn render(&self, frame: &mut Frame) {
        let session = self.handle.session();
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                             // Transport bar
                Constraint::Length(Instrument::COUNT as u16 + 3), // Grid
                Constraint::Min(0),
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_transport(
            frame,
            chunks[0],
            &session,
            self.handle.current_step(),
            self.sample_rate,
        );

        let title = if session.fill_mode { " Fill " } else { " Main " };
        let grid_block = Block::default().title(title).borders(Borders::ALL);
        let grid_inner = grid_block.inner(chunks[1]);
        frame.render_widget(grid_block, chunks[1]);
        render_grid(
            frame,
            grid_inner,
            &session,
            self.handle.current_step(),
            self.cursor,
        );

        let help = Paragraph::new(
            " [Q] Quit  [P] Play/Stop  [Space] Step  [A] Audition  [M] Mute  [F] Fill  \
             [+/-] Tempo  [L] Length  [R/D/H] Reverb/Delay/Phaser",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
