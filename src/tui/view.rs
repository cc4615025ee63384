use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::shared::{DisplayState, Theme};

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // digit screen
            Constraint::Length(3), // settings row
            Constraint::Min(3),    // scale + help
        ])
        .split(area);

    draw_screen(frame, sections[0], state, blink_on);
    draw_settings(frame, sections[1], state);
    draw_scale(frame, sections[2], state);
}

fn accent(state: &DisplayState) -> Color {
    let name = match state.theme {
        Theme::Dark => state.dark_color.as_str(),
        Theme::Light => state.light_color.as_str(),
    };
    color_from_name(name)
}

fn color_from_name(name: &str) -> Color {
    match name {
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" => Color::Gray,
        _ => Color::Magenta,
    }
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let accent = accent(state);
    let mut digits: Vec<Span> = Vec::new();
    let recent = &state.recent_digits;
    if !recent.is_empty() {
        // everything before the current char dimmed, current char lit
        let (head, last) = recent.split_at(recent.len() - 1);
        digits.push(Span::styled(head.to_string(), Style::default().fg(Color::DarkGray)));
        let current_style = if blink_on || !state.playing {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        digits.push(Span::styled(last.to_string(), current_style));
    }

    let mode_tag = match (state.playing, state.audio_ready) {
        (true, true) => "▶",
        (true, false) => "▶ (muted)",
        (false, _) => "⏸",
    };

    let now = state
        .current_digit
        .map(|c| c.to_string())
        .unwrap_or_else(|| String::from("-"));

    let lines = vec![
        Line::from(Span::styled(
            format!("π sonifier  {}  digit {}  now {}", mode_tag, state.digit_index, now),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(digits),
        Line::from(Span::styled(
            state.status.clone(),
            Style::default().fg(Color::Gray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(match state.theme {
            Theme::Dark => " dark ",
            Theme::Light => " light ",
        });
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_settings(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let line = Line::from(vec![
        Span::raw(format!(" key {}  ", state.key)),
        Span::raw(format!("mode {}  ", state.mode)),
        Span::raw(format!("chord {}  ", state.chord_density)),
        Span::raw(format!("oct {}  ", state.octave)),
        Span::raw(format!("{} bpm  ", state.tempo_bpm)),
        Span::raw(format!("{:+.1} dB", state.volume_db)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" settings ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_scale(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let accent = accent(state);
    let scale_line = Line::from(
        state
            .scale
            .iter()
            .map(|n| Span::styled(format!("{n:<3}"), Style::default().fg(accent)))
            .collect::<Vec<_>>(),
    );
    let help = Line::from(Span::styled(
        "space play/pause  r rewind  k/K key  m/M mode  c/C chord  o/O octave  [ ] tempo  - = vol  esc quit",
        Style::default().fg(Color::DarkGray),
    ));
    let block = Block::default().borders(Borders::ALL).title(" scale ");
    frame.render_widget(Paragraph::new(vec![scale_line, help]).block(block), area);
}
