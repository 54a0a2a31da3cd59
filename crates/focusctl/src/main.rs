//! focusctl: command-line control surface for the focus-helper allow-list.
//!
//! Every invocation is short-lived and may run concurrently with other
//! invocations and with the KWin-side engine; all mutation goes through
//! the store's locked read-modify-write path.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*};

use allowlist::{Store, normalize, parse_list};

/// Best-effort KWin reconfigure signaling.
mod reconfigure;
/// Scoped wrap: temporary admission around a child process.
mod wrap;

#[derive(Parser, Debug)]
#[command(
    name = "focusctl",
    about = "Manage which window classes may bypass KWin focus-stealing prevention",
    version
)]
/// Command-line interface for the `focusctl` binary.
struct Cli {
    /// Base directory of the persisted store (default: $FORCEFOCUS_CONFIG_DIR,
    /// else the platform config directory)
    #[arg(long, value_name = "DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Print stored classes, one per line, in stored order
    ListClasses {
        /// Also show the normalized match key for each entry
        #[arg(long, short = 'k')]
        keys: bool,
    },
    /// Add a window class (idempotent)
    AddClass {
        /// Class to add, e.g. "ProcletChrome"
        name: String,
    },
    /// Remove a window class (succeeds whether or not it was present)
    RemoveClass {
        /// Class to remove; matching is case- and .desktop-insensitive
        name: String,
    },
    /// Replace the whole list, e.g. 'a;b;c'
    SetClasses {
        /// Delimiter-separated class list (whitespace/comma/semicolon)
        list: String,
    },
    /// Empty the list
    Clear,
    /// Enable the helper script in KWin's plugin registry
    Enable,
    /// Disable the helper script
    Disable,
    /// Print the current enable flag
    Enabled,
    /// Ask KWin to reload its configuration (best-effort)
    Reconfigure,
    /// Temporarily admit a class while a command runs
    Wrap(wrap::WrapArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = logging::env_filter_from_spec(&cli.log.spec());
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = match Store::open(cli.config_dir.as_deref()) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("focusctl: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::ListClasses { keys } => list_classes(&store, keys),
        Command::AddClass { name } => add_class(&store, &name),
        Command::RemoveClass { name } => remove_class(&store, &name),
        Command::SetClasses { list } => set_classes(&store, &list),
        Command::Clear => set_classes(&store, ""),
        Command::Enable => set_enabled(&store, true),
        Command::Disable => set_enabled(&store, false),
        Command::Enabled => enabled(&store),
        Command::Reconfigure => {
            reconfigure::request();
            ExitCode::SUCCESS
        }
        Command::Wrap(args) => ExitCode::from(wrap::run(&store, &args)),
    }
}

/// `list-classes`: stored order, optionally with normalized keys.
fn list_classes(store: &Store, keys: bool) -> ExitCode {
    let classes = match store.load() {
        Ok(classes) => classes,
        Err(e) => {
            eprintln!("focusctl: failed to read allow-list: {e}");
            return ExitCode::FAILURE;
        }
    };
    if classes.is_empty() {
        eprintln!("focusctl: no forced classes configured");
        return ExitCode::SUCCESS;
    }
    for class in classes {
        if keys {
            println!("{:<24} -> {}", class, normalize(&class));
        } else {
            println!("{class}");
        }
    }
    ExitCode::SUCCESS
}

/// `add-class`: idempotent insert; exit 0 whether or not it was present.
fn add_class(store: &Store, name: &str) -> ExitCode {
    match store.add(name) {
        Ok(true) => {
            eprintln!("focusctl: added class");
            reconfigure::request();
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("focusctl: class already present");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("focusctl: failed to add class: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `remove-class`: exit 0 whether or not it was present.
fn remove_class(store: &Store, name: &str) -> ExitCode {
    match store.remove(name) {
        Ok(true) => {
            eprintln!("focusctl: removed class");
            reconfigure::request();
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("focusctl: class was not present");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("focusctl: failed to remove class: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `set-classes` / `clear`: replace the stored list wholesale.
fn set_classes(store: &Store, list: &str) -> ExitCode {
    let classes = parse_list(list);
    match store.save(&classes) {
        Ok(()) => {
            eprintln!("focusctl: stored {} classes", classes.len());
            reconfigure::request();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("focusctl: failed to write allow-list: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `enable` / `disable`: flip the script flag in KWin's plugin registry.
fn set_enabled(store: &Store, on: bool) -> ExitCode {
    match store.set_enabled(on) {
        Ok(()) => {
            eprintln!(
                "focusctl: {} focus helper script",
                if on { "enabled" } else { "disabled" }
            );
            reconfigure::request();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("focusctl: failed to update plugin flag: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `enabled`: print the current flag state.
fn enabled(store: &Store) -> ExitCode {
    match store.enabled() {
        Ok(Some(true)) => {
            println!("true");
            ExitCode::SUCCESS
        }
        Ok(Some(false)) => {
            println!("false");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            println!("(unset)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("focusctl: failed to read plugin flag: {e}");
            ExitCode::FAILURE
        }
    }
}
