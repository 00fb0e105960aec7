//! `stylelab` command line: inspect and maintain a file-backed store.

mod logging;

use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use serde_json::Value;
use stylelab::app::{Action, Platform};
use stylelab::core::SystemClock;
use stylelab::kernel::services::adapters::{
    ensure_settings_file, load_settings, read_settings, resolve_store_dir, SettingsError,
};
use stylelab::kernel::services::ports::{BackendKind, Settings};
use stylelab::kernel::storage::{ClearOptions, ImportOptions, KeyValueStore, SetOptions, StoreSnapshot};
use stylelab::kernel::tabs::TabRegistry;
use stylelab::kernel::{ChangeOrigin, PlatformEvent, StorageEvent};

const USAGE: &str = "\
usage: stylelab [--dir <path>] [--settings <file>] [--backend <local|session|memory>] [--verbose] <command>

commands:
  keys                         list live keys
  get <key>                    print a value as JSON
  set <key> <json> [--ttl <ms>] [--compress] [--obfuscate]
  rm <key>                     remove a key
  clear [--yes]                remove every key of the namespace
  stats                        entry count and size
  export [<file>]              write a snapshot (stdout without a file)
  import <file> [--overwrite]  load a snapshot
  sessions                     list saved tab sessions
  sessions rm <name>           delete a saved tab session
  watch [--interval <ms>]      follow changes until ctrl-c
  settings                     print the effective settings";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Keys,
    Get {
        key: String,
    },
    Set {
        key: String,
        value: Value,
        ttl_ms: Option<u64>,
        compress: bool,
        obfuscate: bool,
    },
    Remove {
        key: String,
    },
    Clear {
        yes: bool,
    },
    Stats,
    Export {
        path: Option<PathBuf>,
    },
    Import {
        path: PathBuf,
        overwrite: bool,
    },
    Sessions,
    DeleteSession {
        name: String,
    },
    Watch {
        interval_ms: u64,
    },
    Settings,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    dir: Option<PathBuf>,
    settings: Option<PathBuf>,
    backend: Option<BackendKind>,
    verbose: bool,
    command: Command,
}

#[derive(Debug)]
enum CliError {
    Settings(SettingsError),
    Io(io::Error),
    Json(serde_json::Error),
    Failed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Settings(e) => write!(f, "{}", e),
            CliError::Io(e) => write!(f, "{}", e),
            CliError::Json(e) => write!(f, "invalid JSON: {}", e),
            CliError::Failed(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Settings(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("{}\n\n{}", msg, USAGE);
            return ExitCode::from(2);
        }
    };
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let _logging = logging::init(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "command failed");
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn parse_args<I>(args: I) -> Result<Cli, String>
where
    I: IntoIterator<Item = String>,
{
    let mut dir = None;
    let mut settings = None;
    let mut backend = None;
    let mut verbose = false;
    let mut positional = Vec::new();
    let mut ttl_ms = None;
    let mut interval_ms = 1000;
    let mut compress = false;
    let mut obfuscate = false;
    let mut overwrite = false;
    let mut yes = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value_of = |flag: &str| args.next().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "-h" | "--help" => positional.insert(0, "help".to_string()),
            "-v" | "--verbose" => verbose = true,
            "--dir" => dir = Some(PathBuf::from(value_of("--dir")?)),
            "--settings" => settings = Some(PathBuf::from(value_of("--settings")?)),
            "--backend" => {
                let value = value_of("--backend")?;
                backend = Some(
                    BackendKind::parse(&value).ok_or_else(|| format!("unknown backend: {}", value))?,
                );
            }
            "--ttl" => {
                let value = value_of("--ttl")?;
                ttl_ms = Some(value.parse().map_err(|_| format!("invalid --ttl: {}", value))?);
            }
            "--interval" => {
                let value = value_of("--interval")?;
                interval_ms = value
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| format!("invalid --interval: {}", value))?;
            }
            "--compress" => compress = true,
            "--obfuscate" => obfuscate = true,
            "--overwrite" => overwrite = true,
            "-y" | "--yes" => yes = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option: {}", flag)),
            _ => positional.push(arg),
        }
    }

    let mut rest = positional.into_iter();
    let name = rest.next().ok_or_else(|| "missing command".to_string())?;
    let required = |rest: &mut std::vec::IntoIter<String>, what: &str| {
        rest.next()
            .ok_or_else(|| format!("{} needs {}", name, what))
    };
    let command = match name.as_str() {
        "help" => Command::Help,
        "keys" => Command::Keys,
        "get" => Command::Get {
            key: required(&mut rest, "a key")?,
        },
        "set" => {
            let key = required(&mut rest, "a key")?;
            let raw = required(&mut rest, "a value")?;
            Command::Set {
                key,
                value: parse_value(&raw),
                ttl_ms,
                compress,
                obfuscate,
            }
        }
        "rm" | "remove" => Command::Remove {
            key: required(&mut rest, "a key")?,
        },
        "clear" => Command::Clear { yes },
        "stats" => Command::Stats,
        "export" => Command::Export {
            path: rest.next().map(PathBuf::from),
        },
        "import" => Command::Import {
            path: PathBuf::from(required(&mut rest, "a file")?),
            overwrite,
        },
        "sessions" => match rest.next().as_deref() {
            None | Some("list") => Command::Sessions,
            Some("rm") | Some("delete") => Command::DeleteSession {
                name: required(&mut rest, "a session name")?,
            },
            Some(other) => return Err(format!("unknown sessions action: {}", other)),
        },
        "watch" => Command::Watch { interval_ms },
        "settings" => Command::Settings,
        other => return Err(format!("unknown command: {}", other)),
    };

    Ok(Cli {
        dir,
        settings,
        backend,
        verbose,
        command,
    })
}

/// JSON when it parses, a plain string otherwise (`set theme dark`).
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn load_cli_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = match &cli.settings {
        Some(path) => read_settings(path)?,
        None => {
            if let Err(error) = ensure_settings_file() {
                tracing::warn!(%error, "settings file unavailable, using defaults");
            }
            load_settings()
        }
    };
    let dir = cli.dir.as_deref().or(settings.storage.storage_dir.as_deref());
    let dir = resolve_store_dir(dir)
        .ok_or_else(|| CliError::Failed("cannot determine store directory; pass --dir".into()))?;
    settings.storage.storage_dir = Some(dir);
    Ok(settings)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_cli_settings(&cli)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Command::Settings => {
            writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
            Ok(())
        }
        Command::Watch { interval_ms } => watch(settings, *interval_ms, &mut out),
        Command::Sessions | Command::DeleteSession { .. } => {
            let mut store = open_store(&settings)?;
            let tabs = TabRegistry::new(settings.tabs.clone(), SystemClock::shared());
            run_session_command(&mut store, &tabs, &cli.command, &mut out)
        }
        command => {
            let mut store = open_store(&settings)?;
            if matches!(command, Command::Clear { yes: false }) {
                store.set_confirm(Box::new(prompt_stdin));
            }
            run_store_command(&mut store, cli.backend, command, &mut out)
        }
    }
}

fn open_store(settings: &Settings) -> Result<KeyValueStore, CliError> {
    let store = KeyValueStore::new(settings.storage.clone(), SystemClock::shared());
    if !store.is_available(None) {
        return Err(CliError::Failed("storage directory is unavailable".into()));
    }
    Ok(store)
}

fn prompt_stdin(prompt: &str) -> bool {
    eprint!("{} [y/N] ", prompt);
    let _ = io::stderr().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn run_store_command(
    store: &mut KeyValueStore,
    backend: Option<BackendKind>,
    command: &Command,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Keys => {
            let mut keys = store.keys(backend);
            keys.sort();
            for key in keys {
                writeln!(out, "{}", key)?;
            }
        }
        Command::Get { key } => {
            let value = store
                .get(key, backend)
                .ok_or_else(|| CliError::Failed(format!("no such key: {}", key)))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        Command::Set {
            key,
            value,
            ttl_ms,
            compress,
            obfuscate,
        } => {
            let mut options = SetOptions::new();
            options.backend = backend;
            options.expires_after_ms = *ttl_ms;
            options.compress = *compress;
            options.obfuscate = *obfuscate;
            if !store.set(key, value.clone(), options) {
                return Err(CliError::Failed(format!("could not store {}", key)));
            }
        }
        Command::Remove { key } => {
            if !store.remove(key, backend) {
                return Err(CliError::Failed(format!("no such key: {}", key)));
            }
        }
        Command::Clear { yes } => {
            let options = ClearOptions {
                backend,
                confirm: !yes,
            };
            if !store.clear(options) {
                return Err(CliError::Failed("clear cancelled or failed".into()));
            }
        }
        Command::Stats => {
            let stats = store.stats(backend);
            writeln!(out, "entries: {}", stats.entries)?;
            writeln!(out, "bytes:   {}", stats.bytes)?;
        }
        Command::Export { path } => {
            let snapshot = store.export(backend);
            let text = serde_json::to_string_pretty(&snapshot)?;
            match path {
                Some(path) => std::fs::write(path, text)?,
                None => writeln!(out, "{}", text)?,
            }
        }
        Command::Import { path, overwrite } => {
            let text = std::fs::read_to_string(path)?;
            let snapshot: StoreSnapshot = serde_json::from_str(&text)?;
            let report = store.import(
                &snapshot,
                ImportOptions {
                    backend,
                    overwrite: *overwrite,
                },
            );
            writeln!(
                out,
                "imported {} of {} ({} skipped)",
                report.imported, report.total, report.skipped
            )?;
        }
        other => {
            return Err(CliError::Failed(format!("not a store command: {:?}", other)));
        }
    }
    Ok(())
}

fn run_session_command(
    store: &mut KeyValueStore,
    tabs: &TabRegistry,
    command: &Command,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Sessions => {
            for session in tabs.list_sessions(store) {
                writeln!(
                    out,
                    "{}\t{} tabs\t{}",
                    session.name,
                    session.tabs.len(),
                    session.timestamp
                )?;
            }
            Ok(())
        }
        Command::DeleteSession { name } => {
            if tabs.delete_session(store, name) {
                Ok(())
            } else {
                Err(CliError::Failed(format!("no session named {}", name)))
            }
        }
        other => Err(CliError::Failed(format!("not a session command: {:?}", other))),
    }
}

fn watch(settings: Settings, interval_ms: u64, out: &mut dyn Write) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut platform = Platform::init(settings, SystemClock::shared());
    platform.drain_events();
    tracing::info!(interval_ms, "watching store");

    let result = runtime.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    platform.dispatch(Action::Tick);
                    for event in platform.drain_events() {
                        if let Some(line) = describe_event(&event) {
                            writeln!(out, "{}", line)?;
                        }
                    }
                }
                _ = &mut ctrl_c => break,
            }
        }
        Ok::<(), CliError>(())
    });

    platform.teardown();
    result
}

fn describe_event(event: &PlatformEvent) -> Option<String> {
    match event {
        PlatformEvent::Storage(StorageEvent::Changed {
            backend,
            key,
            origin,
        }) => {
            let what = match origin {
                ChangeOrigin::External => "changed externally",
                ChangeOrigin::Expired => "expired",
                _ => return None,
            };
            Some(format!("[{}] {} {}", backend, key, what))
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli.rs"]
mod tests;
