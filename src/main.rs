use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use globe_speed::animation::{AnimationLoop, RealtimeScheduler};
use globe_speed::app::App;
use globe_speed::config::GlobeConfig;
use globe_speed::state::GlobeState;
use globe_speed::{data, ui};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// File that receives log output; the terminal belongs to the UI
const LOG_ENV: &str = "GLOBE_LOG";

fn main() -> Result<()> {
    init_logging()?;

    let config = GlobeConfig::load().context("loading configuration")?;
    let world = data::load_world(&config);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, &config, world);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to the file named by `GLOBE_LOG`, filtered by `RUST_LOG`. No-op when unset.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os(LOG_ENV) else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("creating log file {}", path.to_string_lossy()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut DefaultTerminal, config: &GlobeConfig, world: data::WorldData) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        size.width as usize,
        size.height as usize,
        world.land,
        world.cities,
        config,
    );
    let mut state = GlobeState::new(app.viewport());
    let animation = AnimationLoop::from_config(config);
    let mut scheduler = RealtimeScheduler::new(config.frame_period());

    info!(presets = app.presets.len(), "starting");

    let frames = animation.run(&mut state, &mut scheduler, |state, frame, handle| {
        terminal.draw(|f| ui::render(f, &app, state, frame))?;

        // Drain input without blocking; commands apply on the next tick
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code, state);
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse, state),
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize, state);
                }
                _ => {}
            }
        }

        if app.should_quit {
            handle.cancel();
        }
        Ok(())
    })?;

    info!(frames, "stopped");
    Ok(())
}
