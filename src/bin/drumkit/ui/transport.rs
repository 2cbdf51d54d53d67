//! Transport bar widget - tempo, play state, step and effect levels

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use drumbus::Session;

pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    playhead: Option<usize>,
    sample_rate: f32,
) {
    let block = Block::default().title(" drumkit ").borders(Borders::ALL);

    let (symbol, state, color) = match playhead {
        Some(_) => ("▶", "Playing", Color::Green),
        None => ("■", "Stopped", Color::Yellow),
    };
    let step = playhead.map_or_else(|| "-".to_string(), |index| (index + 1).to_string());
    let effects = &session.effects;

    let line = Line::from(vec![
        Span::styled(
            format!(" BPM: {:.0}  ", session.bpm),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{} {}  ", symbol, state), Style::default().fg(color)),
        Span::styled(
            format!("Step {}/{}  ", step, session.patterns.len()),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "Rev {:.0}%  Dly {:.0}%  Phs {:.0}%  ",
                effects.reverb_mix * 100.0,
                effects.delay_mix * 100.0,
                effects.phaser_mix * 100.0
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("{:.1}kHz", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
