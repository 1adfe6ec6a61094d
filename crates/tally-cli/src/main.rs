use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tally_core::{
    ledger, CheckKind, FrameSource, Ledger, ReferenceStore, Session, SessionState, Sessions,
    VerifyOutcome,
};
use tally_hw::Webcam;
use tally_oracle::ArcFaceOracle;

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "tally", about = "Webcam attendance with face verification")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a person: capture a reference photo for the given name
    Register {
        /// Name to register (whitespace is trimmed; must be non-empty)
        name: String,
    },
    /// Capture and verify once, logging a check-in on success
    CheckIn,
    /// Capture and verify once, logging a check-out on success
    CheckOut,
    /// Interactive mode: drive check-in/check-out sessions by command
    Kiosk,
    /// Show the attendance log with summary counts
    Log,
    /// Export the attendance log to a file
    Export {
        /// Destination path for the JSON dump
        path: PathBuf,
    },
    /// List registered identities
    Identities,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Register { name } => register(&config, &name),
        Commands::CheckIn => check_once(&config, CheckKind::CheckIn),
        Commands::CheckOut => check_once(&config, CheckKind::CheckOut),
        Commands::Kiosk => kiosk(&config),
        Commands::Log => show_log(&config),
        Commands::Export { path } => export(&config, &path),
        Commands::Identities => identities(&config),
    }
}

fn register(config: &Config, name: &str) -> Result<()> {
    // Validate before any camera access: a bad name must not cost a capture.
    let name = ReferenceStore::validate_name(name)?;
    let store = ReferenceStore::open(&config.faces_dir)?;

    let mut camera = Webcam::new(&config.camera_device);
    let frame = camera.capture()?;

    let path = store.register(name, &frame)?;
    println!("Registered {name} ({})", path.display());
    Ok(())
}

fn check_once(config: &Config, kind: CheckKind) -> Result<()> {
    let store = ReferenceStore::open(&config.faces_dir)?;
    if store.is_empty() {
        println!("No registered faces found. Register someone first.");
        return Ok(());
    }

    let ledger = Ledger::new(&config.ledger_path);
    let mut oracle = ArcFaceOracle::load(&config.model_path, config.similarity_threshold)?;
    let mut camera = Webcam::new(&config.camera_device);
    let mut session = Session::new(kind);

    session.capture(&mut camera)?;
    match session.verify(&store, &mut oracle, &ledger)? {
        VerifyOutcome::Logged(record) => {
            println!("{} recorded for {} at {}", record.kind, record.name, record.time);
        }
        VerifyOutcome::NoMatch => {
            println!("Face not recognized.");
            println!("Check lighting, face the camera directly, and make sure you are registered.");
        }
    }
    Ok(())
}

fn kiosk(config: &Config) -> Result<()> {
    let store = ReferenceStore::open(&config.faces_dir)?;
    if store.is_empty() {
        println!("No registered faces found. Register someone first.");
        return Ok(());
    }

    let ledger = Ledger::new(&config.ledger_path);
    let mut oracle = ArcFaceOracle::load(&config.model_path, config.similarity_threshold)?;
    let mut camera = Webcam::new(&config.camera_device);
    let mut sessions = Sessions::new();
    let mut active = CheckKind::CheckIn;

    println!("Kiosk mode. Commands:");
    println!("  i = switch to check-in   o = switch to check-out");
    println!("  c = capture   v = verify   r = recapture   n = reset session");
    println!("  s = show state   x = clear all sessions   q = quit");

    let stdin = std::io::stdin();
    loop {
        print!("[{active}] > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        // Every failure is reported and the loop continues; nothing here
        // is allowed to abort the kiosk.
        match line.trim() {
            "i" => active = CheckKind::CheckIn,
            "o" => active = CheckKind::CheckOut,
            "c" => match sessions.get_mut(active).capture(&mut camera) {
                Ok(frame) => println!(
                    "Frame captured at {}",
                    frame.captured_at.format(tally_core::record::TIME_FORMAT)
                ),
                Err(err) => println!("Capture failed: {err}"),
            },
            "v" => match sessions.get_mut(active).verify(&store, &mut oracle, &ledger) {
                Ok(VerifyOutcome::Logged(record)) => {
                    println!("{} recorded for {} at {}", record.kind, record.name, record.time);
                }
                Ok(VerifyOutcome::NoMatch) => {
                    println!("Face not recognized; verify again or recapture.");
                }
                Err(err) => println!("Verification failed: {err}"),
            },
            "r" => match sessions.get_mut(active).recapture(&mut camera) {
                Ok(_) => println!("Frame replaced."),
                Err(err) => println!("Recapture failed: {err}"),
            },
            "n" => {
                sessions.get_mut(active).reset();
                println!("{active} session reset.");
            }
            "s" => print_state(sessions.get(active)),
            "x" => {
                sessions.clear();
                println!("All sessions cleared.");
            }
            "q" => break,
            "" => {}
            other => println!("Unknown command: {other:?}"),
        }
    }
    Ok(())
}

fn print_state(session: &Session) {
    match session.state() {
        SessionState::Idle => println!("State: idle (no frame)."),
        SessionState::FrameCaptured { frame } => println!(
            "State: frame captured at {}.",
            frame.captured_at.format(tally_core::record::TIME_FORMAT)
        ),
        SessionState::Logged { record } => {
            println!("State: {} logged for {}.", record.kind, record.name)
        }
    }
}

fn show_log(config: &Config) -> Result<()> {
    let records = Ledger::new(&config.ledger_path).load();
    if records.is_empty() {
        println!("No attendance records found.");
        return Ok(());
    }

    let summary = ledger::summarize(&records, chrono::Local::now().date_naive());
    println!(
        "{} records, {} people, {} today",
        summary.total, summary.people, summary.today
    );
    for record in &records {
        println!("{}  {:<9}  {}", record.time, record.kind.to_string(), record.name);
    }
    Ok(())
}

fn export(config: &Config, path: &std::path::Path) -> Result<()> {
    let count = Ledger::new(&config.ledger_path).export(path)?;
    println!("Exported {count} records to {}", path.display());
    Ok(())
}

fn identities(config: &Config) -> Result<()> {
    let store = ReferenceStore::open(&config.faces_dir)?;
    let names = store.identities();
    if names.is_empty() {
        println!("No identities registered.");
        return Ok(());
    }
    println!("{} registered:", names.len());
    for name in names {
        println!("  {name}");
    }
    Ok(())
}
