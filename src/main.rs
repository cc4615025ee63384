mod audio;
mod audio_api;
mod digits;
mod middle;
mod pipeline;
mod shared;
mod theory;
mod tui;

use std::path::PathBuf;
use std::time::Instant;

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio::AudioHandle;
use middle::{Middle, ThemeState};
use pipeline::persistence;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    init_tracing(&project_dir);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let cfg = persistence::load_config(&project_dir).unwrap_or_default();
    let mut middle = Middle::with_config(cfg, ThemeState::new());
    middle.observe(Box::new(|ev| tracing::info!(event = ?ev, "engine event")));

    // The stream is gated on an explicit play press, so this stays empty
    // until then. If audio never comes up we keep running muted.
    let mut audio: Option<AudioHandle> = None;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let mut last_tick = Instant::now();
    let blink_start = Instant::now();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate)?;
        for event in events {
            if event == InputEvent::Quit {
                // save before quitting
                let _ = persistence::save_config(&project_dir, &middle.cfg);
                drop(term);
                return Ok(());
            }
            if event == InputEvent::PlayPress && audio.is_none() {
                start_audio_now(&mut audio, &mut middle);
            }
            let cmds = middle.handle_input(event);
            dispatch(&audio, &mut middle, cmds);
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        let cmds = middle.tick(elapsed);
        dispatch(&audio, &mut middle, cmds);
    }
}

// First play press doubles as the gesture that brings the device up.
fn start_audio_now(audio: &mut Option<AudioHandle>, middle: &mut Middle) {
    match audio::start_audio() {
        Ok(handle) => {
            middle.set_audio_ready(true);
            for cmd in middle.startup_commands() {
                if !handle.send(cmd) {
                    middle.note_trigger_failed("audio command channel rejected");
                }
            }
            *audio = Some(handle);
        }
        Err(e) => {
            tracing::warn!(error = %e, "audio unavailable, continuing muted");
        }
    }
}

fn dispatch(audio: &Option<AudioHandle>, middle: &mut Middle, cmds: Vec<audio_api::AudioCommand>) {
    let Some(handle) = audio else { return };
    for cmd in cmds {
        if !handle.send(cmd) {
            middle.note_trigger_failed("audio command channel rejected");
        }
    }
}

fn init_tracing(project_dir: &std::path::Path) {
    // stderr belongs to the TUI, so diagnostics go to a file
    let path = persistence::log_file_path(project_dir);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = std::fs::File::create(&path) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .try_init();
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
