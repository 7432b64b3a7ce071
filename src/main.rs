use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::{io, time::Duration};
use tracing::{debug, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod app_event;
mod bridge;
mod config;
mod error;
mod session;
mod status;
mod transfer;
mod ui;

use app::App;
use bridge::{check_devices, AdbBridge, CommandRunner};
use config::{AppConfig, ConfigManager};
use session::{DeviceSession, Side};

#[derive(Debug, Parser)]
#[command(name = "adbfm", version, about = "Browse and copy files between this machine and an Android device")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path of the adb executable
    #[arg(long, global = true)]
    adb: Option<PathBuf>,

    /// Local folder to start in
    #[arg(long, global = true)]
    local: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show which device adb sees
    Devices,
    /// List a device folder
    Ls { path: Option<String> },
    /// Start the two-panel browser (default)
    Tui,
}

fn init_logging() -> Result<()> {
    let log_dir = dirs::cache_dir()
        .map(|dir| dir.join("adbfm").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)?;
    }

    let log_file = log_dir.join(format!("adbfm_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
    let file = File::create(&log_file)?;

    fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(EnvFilter::from_default_env().add_directive("adbfm=debug".parse()?))
        .with_ansi(false)
        .with_writer(file)
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Result<(AppConfig, PathBuf)> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_file(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config()?;
    if let Some(adb) = &cli.adb {
        config.adb_path = adb.clone();
    }
    if let Some(local) = &cli.local {
        config.local_start_path = local.clone();
    }
    Ok((config.normalized(), manager.get_config_path().to_path_buf()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let (config, config_path) = load_config(&cli)?;
    debug!("Using config {}", config_path.display());
    let runner: Arc<dyn CommandRunner> = Arc::new(AdbBridge::new(&config.adb_path));

    match cli.command.unwrap_or(Command::Tui) {
        Command::Devices => {
            let status = check_devices(runner.as_ref())?;
            println!("{}", status);
            Ok(())
        }
        Command::Ls { path } => list_remote(&config, runner, path),
        Command::Tui => run_tui(config, config_path, runner).await,
    }
}

fn list_remote(config: &AppConfig, runner: Arc<dyn CommandRunner>, path: Option<String>) -> Result<()> {
    let mut session = DeviceSession::new(config.into());
    session.set_device_status(check_devices(runner.as_ref())?);
    session.ensure_device_ready()?;

    let path = path.unwrap_or_else(|| config.remote_root.clone());
    let request = session.open_remote(&path)?;
    session
        .load_blocking(request, runner.as_ref())
        .with_context(|| format!("Failed to list {}", path))?;

    println!("{}", session.remote_path());
    for entry in session.panel(Side::Remote).entries() {
        if entry.is_special_action {
            continue;
        }
        let marker = if entry.is_folder { "/" } else { "" };
        println!("  {}{}", entry.name, marker);
    }
    Ok(())
}

async fn run_tui(config: AppConfig, config_path: PathBuf, runner: Arc<dyn CommandRunner>) -> Result<()> {
    info!("Starting adbfm with adb at {}", config.adb_path.display());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, config_path, runner);
    app.start();
    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.process_events();
        terminal.draw(|f| ui::draw::<B>(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // let spawned listing and copy tasks make progress between frames
        tokio::task::yield_now().await;
    }
}
