//! Scoped wrap: admit a class, run a command, guarantee removal.
//!
//! The admission is scoped to the child's lifetime on every exit path:
//! normal exit, non-zero exit, spawn failure, and the wrapper itself
//! receiving SIGINT/SIGTERM. A class that was already present before the
//! wrap is left untouched afterward, so wraps nest safely over a manual
//! configuration.

use std::path::Path;

use clap::Args;
use tracing::{debug, warn};

use allowlist::Store;

use crate::reconfigure;

/// Exit code when the child could not be spawned.
const SPAWN_FAILURE: u8 = 127;
/// Exit code for wrapper-internal failures before the child ran.
const WRAPPER_FAILURE: u8 = 125;

/// Arguments for the `wrap` subcommand.
#[derive(Debug, Args)]
pub struct WrapArgs {
    /// Window class to admit for the duration of the command.
    #[arg(value_name = "CLASS")]
    pub class: Option<String>,

    /// Derive the class from the command's basename instead.
    #[arg(long, conflicts_with = "class")]
    pub auto: bool,

    /// Print the resolved class and command without mutating anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the best-effort KWin reconfigure signals.
    #[arg(long)]
    pub no_reconfigure: bool,

    /// Command to run, after `--`.
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Run the wrap; the returned code becomes the wrapper's own exit code.
pub fn run(store: &Store, args: &WrapArgs) -> u8 {
    let Some(class) = resolve_class(args) else {
        eprintln!("focusctl: wrap requires <CLASS> or --auto");
        return WRAPPER_FAILURE;
    };

    if args.dry_run {
        eprintln!("focusctl: [dry-run] class: {class}");
        eprintln!("focusctl: [dry-run] store: {}", store.path().display());
        eprintln!("focusctl: [dry-run] exec: {:?}", args.command);
        return 0;
    }

    let was_present = match store.contains(&class) {
        Ok(present) => present,
        Err(e) => {
            eprintln!("focusctl: failed to read allow-list: {e}");
            return WRAPPER_FAILURE;
        }
    };
    if !was_present {
        if let Err(e) = store.add(&class) {
            eprintln!("focusctl: failed to admit {class}: {e}");
            return WRAPPER_FAILURE;
        }
        debug!(class, "temporarily admitted");
    } else {
        debug!(class, "already admitted; leaving configuration untouched");
    }
    if !args.no_reconfigure {
        reconfigure::request();
    }

    let code = run_child(&args.command);

    // Scoped release: runs on every path once the child is done, including
    // spawn failure and wrapper signals.
    if !was_present {
        match store.remove(&class) {
            Ok(_) => {
                debug!(class, "scoped admission removed");
                if !args.no_reconfigure {
                    reconfigure::request();
                }
            }
            Err(e) => eprintln!("focusctl: failed to restore allow-list: {e}"),
        }
    }

    code
}

/// Explicit class, or the auto-derived one in `--auto` mode.
fn resolve_class(args: &WrapArgs) -> Option<String> {
    if args.auto {
        args.command.first().map(|argv0| auto_class(argv0))
    } else {
        args.class.clone()
    }
}

/// Derive a class name from a command path: basename, ASCII alphanumerics
/// only, capitalized, with an `App` suffix (`/usr/bin/my-browser` ->
/// `MybrowserApp`).
fn auto_class(argv0: &str) -> String {
    let base = Path::new(argv0)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(argv0);
    let filtered: String = base.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if filtered.is_empty() {
        return "FocusApp".to_string();
    }
    let mut out = String::with_capacity(filtered.len() + 3);
    let mut chars = filtered.chars();
    if let Some(first) = chars.next() {
        out.push(first.to_ascii_uppercase());
        out.push_str(chars.as_str());
    }
    out.push_str("App");
    out
}

/// Spawn the child and wait it out on a local runtime.
fn run_child(argv: &[String]) -> u8 {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("focusctl: failed to start runtime: {e}");
            return WRAPPER_FAILURE;
        }
    };
    runtime.block_on(wait_child(argv))
}

/// Wait for the child, absorbing wrapper-directed termination signals so
/// the cleanup in [`run`] still executes before the wrapper exits.
async fn wait_child(argv: &[String]) -> u8 {
    let mut command = tokio::process::Command::new(&argv[0]);
    command.args(&argv[1..]);
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            eprintln!("focusctl: failed to spawn {}: {e}", argv[0]);
            return SPAWN_FAILURE;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let sigint = signal(SignalKind::interrupt());
        let sigterm = signal(SignalKind::terminate());
        if let (Ok(mut sigint), Ok(mut sigterm)) = (sigint, sigterm) {
            loop {
                tokio::select! {
                    status = child.wait() => return exit_code(status),
                    _ = sigint.recv() => {
                        debug!("SIGINT received; waiting for child before cleanup");
                    }
                    _ = sigterm.recv() => {
                        debug!("SIGTERM received; waiting for child before cleanup");
                    }
                }
            }
        }
        warn!("signal handlers unavailable; waiting without interception");
    }

    exit_code(child.wait().await)
}

/// Map the child's exit status to the wrapper's exit code. Signal deaths
/// map to the conventional 128+signo.
fn exit_code(status: std::io::Result<std::process::ExitStatus>) -> u8 {
    let st = match status {
        Ok(st) => st,
        Err(e) => {
            eprintln!("focusctl: failed to wait for child: {e}");
            return WRAPPER_FAILURE;
        }
    };
    if let Some(code) = st.code() {
        return u8::try_from(code.clamp(0, 255)).unwrap_or(1);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = st.signal() {
            return 128u8.saturating_add(u8::try_from(sig).unwrap_or(0));
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use allowlist::Store;

    use super::{WrapArgs, auto_class, run};

    /// Minimal wrap invocation for `command`.
    fn wrap_args(class: Option<&str>, command: &[&str]) -> WrapArgs {
        WrapArgs {
            class: class.map(str::to_string),
            auto: class.is_none(),
            dry_run: false,
            no_reconfigure: true,
            command: command.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Fresh store in a private temp directory.
    fn store() -> (TempDir, Store) {
        let dir = TempDir::new().expect("tempdir");
        let store = Store::at_dir(dir.path());
        (dir, store)
    }

    #[test]
    fn absent_class_is_removed_after_success() {
        let (_dir, store) = store();
        let code = run(&store, &wrap_args(Some("WrapTest"), &["true"]));
        assert_eq!(code, 0);
        assert!(!store.contains("WrapTest").expect("contains"));
    }

    #[test]
    fn absent_class_is_removed_after_child_failure() {
        let (_dir, store) = store();
        let code = run(&store, &wrap_args(Some("WrapTest"), &["false"]));
        assert_eq!(code, 1);
        assert!(!store.contains("WrapTest").expect("contains"));
    }

    #[test]
    fn absent_class_is_removed_after_spawn_failure() {
        let (_dir, store) = store();
        let code = run(
            &store,
            &wrap_args(Some("WrapTest"), &["/nonexistent/binary-for-wrap-test"]),
        );
        assert_eq!(code, 127);
        assert!(!store.contains("WrapTest").expect("contains"));
    }

    #[test]
    fn preexisting_class_survives_the_wrap() {
        let (_dir, store) = store();
        store.add("Sticky").expect("seed");
        let code = run(&store, &wrap_args(Some("sticky.desktop"), &["true"]));
        assert_eq!(code, 0);
        assert!(store.contains("Sticky").expect("contains"));
    }

    #[test]
    fn child_exit_code_propagates() {
        let (_dir, store) = store();
        let code = run(&store, &wrap_args(Some("WrapTest"), &["sh", "-c", "exit 42"]));
        assert_eq!(code, 42);
    }

    #[test]
    fn auto_mode_derives_class_from_basename() {
        assert_eq!(auto_class("/usr/bin/my-browser"), "MybrowserApp");
        assert_eq!(auto_class("true"), "TrueApp");
        assert_eq!(auto_class("///"), "FocusApp");

        let (_dir, store) = store();
        let code = run(&store, &wrap_args(None, &["true"]));
        assert_eq!(code, 0);
        assert!(!store.contains("TrueApp").expect("contains"));
    }

    #[test]
    fn dry_run_mutates_nothing() {
        let (_dir, store) = store();
        let mut args = wrap_args(Some("DryRun"), &["true"]);
        args.dry_run = true;
        assert_eq!(run(&store, &args), 0);
        assert!(store.list().is_empty());
    }
}
