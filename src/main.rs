use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;

use nodewatch::data::duration::parse_duration;
use nodewatch::ui::{self, Theme};
use nodewatch::{
    events, logging, App, LayoutVersion, Monitor, Overrides, Settings, SystemClock, UdpSource,
};

/// How long the event loop waits for input before processing datagrams.
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "nodewatch", version)]
#[command(about = "Terminal dashboard for ledger node UDP telemetry")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP address to listen on (default 0.0.0.0:6767)
    #[arg(short, long)]
    listen: Option<String>,

    /// Wire layout of the incoming datagrams: current, compact or legacy
    #[arg(long)]
    layout: Option<LayoutVersion>,

    /// Liveness tick interval (e.g., "1s", "500ms")
    #[arg(short, long)]
    tick: Option<String>,

    /// File to write logs to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g., "info", "nodewatch=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Collect without the dashboard, write the registry to this JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// How long to collect before exporting (used with --export)
    #[arg(long, default_value = "5s", requires = "export")]
    collect: String,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            listen: self.listen.clone(),
            layout: self.layout,
            tick: self.tick.clone(),
            log_file: self.log_file.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    logging::init(&settings.log_file, &settings.log_level)?;

    let listen = settings.listen_addr()?;
    let layout = settings.layout;
    let tick = settings.tick_interval()?;
    info!(%listen, %layout, ?tick, "starting nodewatch");

    // The receive task runs on this runtime while the UI loop owns the main thread.
    let rt = tokio::runtime::Runtime::new()?;
    let source = rt
        .block_on(UdpSource::bind(listen))
        .with_context(|| format!("failed to bind UDP socket on {}", listen))?;

    let app = App::new(Box::new(source), Monitor::new(layout), Box::new(SystemClock), tick);

    if let Some(ref export_path) = args.export {
        let collect = parse_duration(&args.collect)?;
        return export_after(app, collect, export_path);
    }

    run_tui(app.with_theme(Theme::auto_detect()))
}

/// Run headless for `collect`, then export the registry.
fn export_after(mut app: App, collect: Duration, export_path: &Path) -> Result<()> {
    println!("Listening on {} for {:?}...", app.source_description(), collect);

    let deadline = Instant::now() + collect;
    while Instant::now() < deadline {
        app.update();
        std::thread::sleep(INPUT_POLL);
    }
    app.update();

    app.export_state(export_path)?;
    println!("Exported node state to: {}", export_path.display());
    Ok(())
}

/// Run the TUI until the user quits.
fn run_tui(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the terminal before the panic message is printed
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("nodewatch stopped");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if let Some(event) = events::poll_event(INPUT_POLL)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => {
                    events::handle_mouse_event(app, mouse, ui::CONTENT_START_ROW);
                }
                _ => {}
            }
        }

        app.update();
    }

    Ok(())
}
