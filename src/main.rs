// ABOUTME: Entry point for the Loan Desk admin console
// Sets up terminal, event loop, and coordinates all components

use anyhow::{Context, Result};
use clap::{Arg, Command};
use crossbeam_channel::{bounded, Receiver, Sender};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use loan_desk::{
    app::{
        config::AppConfig,
        state::{AppEvent, AppState},
    },
    data::{
        backend::Backend, collector::DataCollector, operations::ScreenOps, rest::RestBackend,
    },
    status::{StatusNotifier, StatusStore},
    ui::console::Console,
    utils::format::format_amount,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct CliArgs {
    api_url: Option<String>,
    config: Option<PathBuf>,
    debug: bool,
    init_config: bool,
    summary: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = parse_args();
    let config = build_config(&args)?;

    // Initialize logging if debug mode
    if config.debug {
        init_logging()?;
    }

    if args.init_config {
        let path = config.save().context("Failed to write configuration")?;
        println!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    info!("Using API at {}", config.api_base_url);

    let store = StatusStore::new();
    let backend: Arc<dyn Backend> =
        Arc::new(RestBackend::new(&config.api_base_url, config.request_timeout)?);
    let ops = ScreenOps::new(backend, store.clone());

    // Check if we're in a TTY
    if args.summary || !atty::is(atty::Stream::Stdout) {
        // Non-interactive mode - just print the dashboard and exit
        return run_summary(&ops, &config).await;
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone()));

    // Setup terminal
    let mut terminal = setup_terminal()?;

    // Create event channels
    let (event_tx, event_rx) = bounded::<AppEvent>(100);

    let collector = DataCollector::new(ops, state.clone(), event_tx.clone());
    let notifier = StatusNotifier::spawn(store, config.status_display);

    // Spawn input handler
    spawn_input_handler(event_tx);

    let mut console = Console::new(state, collector, notifier);
    console.start();

    // Run main event loop
    let result = run_event_loop(&mut terminal, &mut console, event_rx).await;

    // Cleanup
    restore_terminal(&mut terminal)?;

    result
}

fn parse_args() -> CliArgs {
    let matches = Command::new("loan-desk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Terminal admin console for a home loan management API")
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .value_name("URL")
                .help("Base URL of the loan management API"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Write the effective configuration to disk and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("summary")
                .short('s')
                .long("summary")
                .help("Print dashboard statistics and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    CliArgs {
        api_url: matches.get_one::<String>("api-url").cloned(),
        config: matches.get_one::<String>("config").map(PathBuf::from),
        debug: matches.get_flag("debug"),
        init_config: matches.get_flag("init-config"),
        summary: matches.get_flag("summary"),
    }
}

/// Defaults, then the config file, then environment, then flags.
fn build_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        // A file that does not exist yet is what --init-config creates
        Some(path) if args.init_config && !path.exists() => {
            let mut config = AppConfig {
                config_path: Some(path.clone()),
                ..AppConfig::default()
            };
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        path => AppConfig::load(path.as_deref()).context("Failed to load configuration")?,
    };

    if let Some(url) = &args.api_url {
        config.api_base_url = url.clone();
    }
    config.debug |= args.debug;

    config.validate()?;
    Ok(config)
}

fn init_logging() -> Result<()> {
    let dir = AppConfig::project_dirs()
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&dir)?;

    // The terminal belongs to the UI, so logs go to a file
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("loan-desk.log"))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loan_desk=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_handler(tx: Sender<AppEvent>) {
    std::thread::spawn(move || loop {
        let event = match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        AppEvent::Quit
                    } else {
                        AppEvent::Input(key)
                    }
                }
                Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
                _ => continue,
            },
            Ok(false) => AppEvent::Tick,
            Err(_) => break,
        };
        if tx.send(event).is_err() {
            break;
        }
    });
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    console: &mut Console,
    event_rx: Receiver<AppEvent>,
) -> Result<()> {
    loop {
        // Render console
        terminal.draw(|f| console.render(f))?;

        // Handle events with timeout
        if let Ok(event) = event_rx.recv_timeout(Duration::from_millis(50)) {
            match event {
                AppEvent::Input(key) => {
                    if !console.handle_key(key) {
                        break; // Quit requested
                    }
                }
                AppEvent::DataUpdated(_) | AppEvent::DashboardUpdated => {
                    // State already updated by collector
                }
                AppEvent::Resize(_, _) => {
                    // Terminal will handle resize automatically
                }
                AppEvent::Tick => {}
                AppEvent::Quit => break,
            }
        }
    }

    Ok(())
}

async fn run_summary(ops: &ScreenOps, config: &AppConfig) -> Result<()> {
    println!("Home Loan Management System - Overview");
    println!("======================================");
    println!("API: {}", config.api_base_url);
    println!();

    match ops.dashboard().await {
        Some(stats) => {
            println!("Statistics:");
            println!("  - Customers: {}", stats.customers);
            println!("  - Loans: {}", stats.loans);
            println!("  - Loan Types: {}", stats.loan_types);
            println!("  - Guarantors: {}", stats.guarantors);
            println!("  - Payments: {}", stats.payments);
            println!("  - Total Loan Amount: {}", format_amount(stats.total_loan_amount));
            println!("  - Total Payments: {}", format_amount(stats.total_payments));
        }
        None => {
            // The failure was reported to the store like in the console
            if let Some(status) = ops.status().current() {
                println!("{} {}", status.kind.icon(), status.message);
                if let Some(code) = status.code_label() {
                    println!("  ({})", code);
                }
            }
        }
    }

    println!();
    println!("Note: Run loan-desk in a terminal for the full interactive console.");

    Ok(())
}
