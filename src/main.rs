//! FocusChain CLI
//!
//! Entry point for the `focuschain` command-line tool.

use clap::{Parser, Subcommand};
use focuschain::config::{default_config_path, EffectiveConfig, Settings};
use focuschain::notify::{load_permission, notifier_for, save_permission, sound_player};
use focuschain::sequence::{Sequence, MIN_DURATION_MINUTES, SINGLE_MAX_MINUTES};
use focuschain::session::{run_session, spawn_input_thread, EndReason, OutputFormat, SessionEvent, SessionOptions, HELP};
use focuschain::signal::{SignalHandler, EXIT_CODE_INTERRUPTED};
use focuschain::{
    Capabilities, FileStore, FocusController, Permission, PresetStore, StepSpec,
    ThreadTickSource, TimerMode,
};
use serde_json::{json, Map, Value};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "focuschain")]
#[command(about = "Single and chained focus timers", version)]
struct Cli {
    /// Path to config file (default: ~/.config/focuschain/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory for presets and saved answers (default: ~/.config/focuschain)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive timer session
    Run {
        /// Mode shown at startup (single or chain)
        #[arg(long, short = 'm', default_value = "single")]
        mode: TimerMode,

        /// Single session length in minutes
        #[arg(long)]
        minutes: Option<u32>,

        /// Chain step as LABEL:MINUTES (repeatable)
        #[arg(long = "step", short = 's')]
        steps: Vec<StepSpec>,

        /// Load a saved preset (id or name) into the chain
        #[arg(long, short = 'p')]
        preset: Option<String>,

        /// Read JSON control commands and write JSON events
        #[arg(long)]
        json: bool,

        /// Start the timer immediately
        #[arg(long)]
        autostart: bool,

        /// Exit once the run finishes
        #[arg(long)]
        exit_on_finish: bool,

        /// Tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,
    },

    /// Preset management commands
    Presets {
        #[command(subcommand)]
        action: PresetsCommands,
    },

    /// Notification permission commands
    Notifications {
        #[command(subcommand)]
        action: NotificationsCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum PresetsCommands {
    /// List saved presets
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one preset's steps
    Show {
        /// Preset id or name
        preset: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Save a chain as a new preset
    Save {
        /// Preset name
        name: String,

        /// Chain step as LABEL:MINUTES (default: the configured chain)
        #[arg(long = "step", short = 's')]
        steps: Vec<StepSpec>,
    },

    /// Rename a preset
    Rename {
        /// Preset id
        id: String,

        /// New name
        name: String,
    },

    /// Delete a preset
    Delete {
        /// Preset id
        id: String,
    },
}

#[derive(Subcommand)]
enum NotificationsCommands {
    /// Show the saved permission
    Status,
    /// Allow system notifications
    Allow,
    /// Deny system notifications
    Deny,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration with its sources
    Show,
}

struct RunArgs {
    mode: TimerMode,
    preset: Option<String>,
    json: bool,
    autostart: bool,
    exit_on_finish: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            mode,
            minutes,
            steps,
            preset,
            json,
            autostart,
            exit_on_finish,
            tick_ms,
        } => {
            let mut overrides = Map::new();
            if let Some(minutes) = minutes {
                let minutes = minutes.clamp(MIN_DURATION_MINUTES, SINGLE_MAX_MINUTES);
                overrides.insert("single_duration_minutes".to_string(), json!(minutes));
            }
            if !steps.is_empty() {
                overrides.insert("chain".to_string(), chain_value(&steps));
            }
            if let Some(ms) = tick_ms {
                overrides.insert("tick_interval_ms".to_string(), json!(ms));
            }
            let settings = load_settings(cli.config, cli.data_dir, overrides);
            let args = RunArgs {
                mode,
                preset,
                json,
                autostart,
                exit_on_finish,
            };
            run_timer(settings, args);
        }
        Commands::Presets { action } => {
            let settings = load_settings(cli.config, cli.data_dir, Map::new());
            match action {
                PresetsCommands::List { json } => run_presets_list(&settings, json),
                PresetsCommands::Show { preset, json } => run_presets_show(&settings, &preset, json),
                PresetsCommands::Save { name, steps } => run_presets_save(&settings, &name, steps),
                PresetsCommands::Rename { id, name } => run_presets_rename(&settings, &id, &name),
                PresetsCommands::Delete { id } => run_presets_delete(&settings, &id),
            }
        }
        Commands::Notifications { action } => {
            let settings = load_settings(cli.config, cli.data_dir, Map::new());
            match action {
                NotificationsCommands::Status => run_notifications_status(&settings),
                NotificationsCommands::Allow => run_notifications_set(&settings, Permission::Granted),
                NotificationsCommands::Deny => run_notifications_set(&settings, Permission::Denied),
            }
        }
        Commands::Config { action } => match action {
            ConfigCommands::Show => run_config_show(cli.config, cli.data_dir),
        },
    }
}

/// Logs go to stderr; stdout carries the status line and JSON events.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("FOCUSCHAIN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn chain_value(steps: &[StepSpec]) -> Value {
    Value::Array(
        steps
            .iter()
            .map(|s| json!({ "label": s.label, "duration": s.minutes }))
            .collect(),
    )
}

fn build_config(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    mut overrides: Map<String, Value>,
) -> EffectiveConfig {
    let config_path = match config_path {
        Some(path) => Some(path),
        None => default_config_path().ok(),
    };
    if let Some(dir) = data_dir {
        overrides.insert("data_dir".to_string(), json!(dir.to_string_lossy()));
    }
    let overrides = if overrides.is_empty() {
        None
    } else {
        Some(Value::Object(overrides))
    };

    match EffectiveConfig::build(config_path.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn load_settings(
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    overrides: Map<String, Value>,
) -> Settings {
    match build_config(config_path, data_dir, overrides).settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    }
}

fn open_store(settings: &Settings) -> FileStore {
    match settings.data_dir() {
        Ok(dir) => FileStore::new(dir),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_timer(settings: Settings, args: RunArgs) {
    let builder = match settings.builder() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let store = open_store(&settings);
    let permission = load_permission(&store);
    info!(dir = %store.dir().display(), %permission, "data directory");

    let (events_tx, events_rx) = mpsc::channel::<SessionEvent>();
    let interval = Duration::from_millis(settings.tick_interval_ms);
    let ticks = match ThreadTickSource::spawn(interval, events_tx.clone()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error starting tick thread: {}", e);
            process::exit(1);
        }
    };

    let caps = Capabilities {
        ticks: Box::new(ticks),
        notifier: notifier_for(
            settings.notifier,
            settings.notification_command.clone(),
            permission,
        ),
        sound: sound_player(settings.sound),
        store: Box::new(store),
    };
    let mut controller = FocusController::new(builder, args.mode, caps);

    if let Some(preset) = &args.preset {
        if let Err(e) = controller.load_preset(preset) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if let Err(e) = SignalHandler::new().install(events_tx.clone()) {
        eprintln!("Warning: could not install signal handler: {}", e);
    }

    if let Err(e) = spawn_input_thread(BufReader::new(io::stdin()), args.json, events_tx.clone()) {
        eprintln!("Error starting input thread: {}", e);
        process::exit(1);
    }
    drop(events_tx);

    if !args.json {
        eprintln!("{}", HELP);
        if permission == Permission::Default {
            eprintln!("Type 'allow' to enable system notifications when a step finishes.");
        }
    }

    if args.autostart {
        controller.start(controller.view_mode());
    }

    let options = SessionOptions {
        format: if args.json { OutputFormat::Json } else { OutputFormat::Human },
        exit_on_finish: args.exit_on_finish,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_session(&mut controller, &events_rx, &mut out, &options) {
        Ok(outcome) if outcome.reason == EndReason::Shutdown => process::exit(EXIT_CODE_INTERRUPTED),
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn load_presets(settings: &Settings) -> PresetStore {
    PresetStore::load(Box::new(open_store(settings)))
}

fn run_presets_list(settings: &Settings, json: bool) {
    let presets = load_presets(settings);

    if json {
        match serde_json::to_string_pretty(presets.list()) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error serializing presets: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if presets.list().is_empty() {
        println!("No saved presets.");
        return;
    }
    println!("{:<38} {:<24} {:>6} {:>8}", "ID", "NAME", "STEPS", "MINUTES");
    for preset in presets.list() {
        println!(
            "{:<38} {:<24} {:>6} {:>8}",
            preset.id,
            preset.name,
            preset.steps.len(),
            preset.steps.total_minutes()
        );
    }
}

fn run_presets_show(settings: &Settings, id_or_name: &str, json: bool) {
    let presets = load_presets(settings);
    let Some(preset) = presets.find(id_or_name) else {
        eprintln!("Error: preset not found: {}", id_or_name);
        process::exit(1);
    };

    if json {
        match serde_json::to_string_pretty(preset) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("Error serializing preset: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("{} ({})", preset.name, preset.id);
    for (i, step) in preset.steps.steps().iter().enumerate() {
        println!("  {}. {:<24} {:>3} min", i + 1, step.label, step.duration);
    }
}

fn run_presets_save(settings: &Settings, name: &str, steps: Vec<StepSpec>) {
    let sequence = if steps.is_empty() {
        match settings.builder() {
            Ok(builder) => builder.chain().clone(),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    } else {
        match Sequence::new(steps.into_iter().map(StepSpec::into_step).collect()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    };

    let mut presets = load_presets(settings);
    match presets.save(name, &sequence) {
        Ok(preset) => println!("Saved preset '{}' ({})", preset.name, preset.id),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_presets_rename(settings: &Settings, id: &str, name: &str) {
    let mut presets = load_presets(settings);
    match presets.rename(id, name) {
        Ok(true) => println!("Renamed preset {} to '{}'", id, name.trim()),
        Ok(false) => println!("Preset {} unchanged", id),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_presets_delete(settings: &Settings, id: &str) {
    let mut presets = load_presets(settings);
    match presets.delete(id) {
        Ok(true) => println!("Deleted preset {}", id),
        Ok(false) => {
            eprintln!("Error: preset not found: {}", id);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_notifications_status(settings: &Settings) {
    let store = open_store(settings);
    println!("{}", load_permission(&store));
}

fn run_notifications_set(settings: &Settings, permission: Permission) {
    let mut store = open_store(settings);
    match save_permission(&mut store, permission) {
        Ok(()) => println!("Notifications {}", permission),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_config_show(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) {
    let config = build_config(config_path, data_dir, Map::new());
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(1);
        }
    }
}
