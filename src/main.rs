mod shared;
mod tui;
mod audio_api;
mod audio;
mod clock;
mod config;
mod error;
mod middle;
mod pipeline;
mod synth;

use std::path::Path;
use std::time::Instant;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio_api::AudioCommand;
use clock::SystemClock;
use config::Args;
use middle::Middle;
use pipeline::{persistence, recorder};
use shared::InputEvent;
use synth::Synth;

fn main() {
    if let Err(e) = run() {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// the terminal is in raw mode while we run, so logs go to a file
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let dir = persistence::state_dir(project_dir);
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(persistence::LOG_FILE))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let config = Args::parse().into_config();
    init_logging(&config.project_dir)?;
    log::info!("project {}, takes in {}", config.project_dir.display(), config.takes_dir.display());

    let mut state = persistence::load_project(&config.project_dir).unwrap_or_default();
    if config.force_loop_off {
        state.loop_enabled = false;
    }
    let synth = Synth::new(config.binding, config.takes_dir.clone());
    state.next_take = recorder::resume_numbering(state.next_take, synth.highest_take_number());

    let audio = audio::start_audio()?;
    let mut middle = Middle::new(SystemClock::new(), synth, config.binding, state);

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    'frame: loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state();

        term.draw(|frame| {
            tui_state.canvas = tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                break 'frame;
            }
            middle.handle_input(event);
        }

        middle.tick();
        for cmd in middle.synth_mut().drain_commands() {
            audio.send(cmd);
        }
    }

    // finish any take in flight and let held notes go before the stream closes
    middle.shutdown();
    for cmd in middle.synth_mut().drain_commands() {
        audio.send(cmd);
    }
    audio.send(AudioCommand::AllOff);
    if let Err(e) = persistence::save_project(&config.project_dir, &middle.project_state()) {
        log::warn!("could not save project: {:#}", e);
    }
    log::info!("bye");
    drop(term);
    drop(audio);
    Ok(())
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
        let _ = terminal::disable_raw_mode();
    }
}
