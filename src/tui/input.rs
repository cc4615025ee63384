use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use crate::shared::InputEvent;

// poll for input, resolve key presses into semantic input events for
// the middle layer to handle
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],
        KeyCode::Char('r') => vec![InputEvent::Restart],

        // settings, lowercase = forward and shifted = backward
        KeyCode::Char('k') => vec![InputEvent::CycleKey(1)],
        KeyCode::Char('K') => vec![InputEvent::CycleKey(-1)],
        KeyCode::Char('m') => vec![InputEvent::CycleMode(1)],
        KeyCode::Char('M') => vec![InputEvent::CycleMode(-1)],
        KeyCode::Char('c') => vec![InputEvent::CycleDensity(1)],
        KeyCode::Char('C') => vec![InputEvent::CycleDensity(-1)],
        KeyCode::Char('o') => vec![InputEvent::AdjustOctave(1)],
        KeyCode::Char('O') => vec![InputEvent::AdjustOctave(-1)],

        // knobs for continuous control
        KeyCode::Char('[') => vec![InputEvent::AdjustTempo(-5.0)],
        KeyCode::Char(']') => vec![InputEvent::AdjustTempo(5.0)],
        KeyCode::Char('-') => vec![InputEvent::AdjustVolume(-1.0)],
        KeyCode::Char('=') => vec![InputEvent::AdjustVolume(1.0)],

        _ => vec![],
    }
}
