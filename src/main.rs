mod shared;
mod tui;
mod audio_api;
mod audio;
mod config;
mod editor;
mod instrument;
mod loader;
mod midi;
mod pipeline;

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use config::Config;
use instrument::Instrument;
use instrument::midi_router::Route;
use instrument::state::InstrumentState;
use midi::MidiInputDevice;
use pipeline::persistence;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let log_path = config::app_dir().join("samplety.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("samplety.log")));
    match log_file {
        // the terminal belongs to the tui, so logs only ever go to the file
        Ok(file) => {
            let _ = WriteLogger::init(log_level, simplelog::Config::default(), file);
        }
        Err(e) => eprintln!("logging disabled, cannot create log file: {e}"),
    }
    log::info!("samplety starting (log level: {:?})", log_level);
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let project_dir: PathBuf = args
        .iter()
        .find(|a| !a.starts_with('-'))
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config = Config::load(&project_dir);

    let mut audio = audio::start_audio(config.output_gain)?;
    let mut instrument = Instrument::new(audio.sender(), audio.sample_rate(), project_dir.clone());

    // remember the last session, or start from the configured sample
    match persistence::load_state(&project_dir) {
        Some(state) => instrument.set_state(&state),
        None => {
            if let Some(sample) = &config.default_sample {
                instrument.set_state(&InstrumentState::with_url(sample.as_str()));
            }
        }
    }

    let (midi_tx, midi_rx) = crossbeam_channel::bounded::<Vec<u8>>(256);
    match MidiInputDevice::list_ports() {
        Ok(ports) => log::debug!("MIDI inputs: {ports:?}"),
        Err(e) => log::warn!("cannot list MIDI inputs: {e}"),
    }
    let midi_in = match MidiInputDevice::connect(config.midi_port.as_deref(), midi_tx) {
        Ok(device) => device,
        Err(e) => {
            log::warn!("MIDI input unavailable: {e}");
            None
        }
    };

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    crossterm::execute!(std::io::stdout(), crossterm::event::EnableMouseCapture)?;
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(config.tick_ms);
    let mut tui_state = tui::mode::TuiState::new(config.pad_base_note);
    let pad_velocity = config.pad_velocity.min(127);

    loop {
        instrument.tick();
        audio.drain_ended();

        while let Ok(bytes) = midi_rx.try_recv() {
            if let Route::Trigger { note, .. } = instrument.handle_midi(&bytes) {
                log::trace!("midi note {note}");
            }
        }

        let ds = instrument.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &mut tui_state, midi_in.as_ref().map(|m| m.name()));
        })?;
        tui_state.decay();

        // the editor follows the canvas size
        if let Some(area) = tui_state.editor_area {
            let (w, h) = tui::view::editor_extent(area);
            if instrument.view().map(|v| v.envelope.size()) != Some((w, h)) {
                instrument.fit_view(w, h);
            }
        }

        let events = tui::input::poll_input(tick_rate, &tui_state)?;
        for event in events {
            match event {
                InputEvent::Quit => {
                    instrument.shutdown();
                    // save before quitting
                    if let Err(e) = persistence::save_state(&project_dir, &instrument.get_state()) {
                        log::error!("could not save state: {e}");
                    }
                    drop(term);
                    drop(audio);
                    return Ok(());
                }
                // pads go through the same path as a MIDI keyboard
                InputEvent::PadDown(pad) => {
                    tui_state.flash(pad);
                    instrument.handle_midi(&[0x90, tui_state.pad_note(pad), pad_velocity]);
                }
                InputEvent::PadUp(pad) => {
                    instrument.handle_midi(&[0x80, tui_state.pad_note(pad), 0]);
                }
                InputEvent::OctaveDown => tui_state.shift_octave(false),
                InputEvent::OctaveUp => tui_state.shift_octave(true),
                InputEvent::SampleNoteDown => instrument.nudge_sample_note(-1),
                InputEvent::SampleNoteUp => instrument.nudge_sample_note(1),
                InputEvent::ToggleAlgorithm => {
                    let algorithm = instrument.toggle_algorithm();
                    log::info!("pitch algorithm now {}", algorithm.label());
                }
                InputEvent::Pointer(pointer) => {
                    instrument.pointer(pointer);
                }
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableMouseCapture,
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
