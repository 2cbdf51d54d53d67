//! Step grid widget - one row per instrument, playhead and cursor

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use drumbus::{Instrument, Session};

use super::Cursor;

const LABEL_WIDTH: usize = 9;

pub fn render_grid(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    playhead: Option<usize>,
    cursor: Cursor,
) {
    let pattern = session.patterns.active(session.fill_mode);
    let length = pattern.len();
    let mut lines = Vec::with_capacity(Instrument::COUNT + 1);

    // Beat numbers over every fourth step
    let mut header = " ".repeat(LABEL_WIDTH);
    for index in 0..length {
        if index % 4 == 0 {
            header.push_str(&format!("{:<2}", index / 4 + 1));
        } else {
            header.push_str("  ");
        }
    }
    lines.push(Line::from(Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )));

    for (row, instrument) in Instrument::ALL.into_iter().enumerate() {
        let muted = session.settings[instrument].muted;
        let mut spans = Vec::with_capacity(length + 1);

        let label_style = if muted {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(
            format!("{:<width$}", instrument.name(), width = LABEL_WIDTH),
            label_style,
        ));

        for (index, &active) in pattern.row(instrument).iter().enumerate() {
            let symbol = if active { "■ " } else { "· " };

            let mut style = Style::default().fg(match (active, index % 4 == 0) {
                (true, _) if muted => Color::DarkGray,
                (true, _) => Color::Green,
                (false, true) => Color::Gray,
                (false, false) => Color::DarkGray,
            });
            if playhead == Some(index) {
                style = style.bg(Color::Blue);
            }
            if cursor.row == row && cursor.column == index {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(symbol, style));
        }

        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);
}
