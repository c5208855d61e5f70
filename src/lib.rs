//! Hookguard: commit integrity enforcement for git repositories.
//!
//! Hookguard installs enforcement scripts at fixed git lifecycle points
//! and makes sure a commit cannot silently skip them. The pre-commit
//! hook runs the configured validation pipeline and, only once every
//! check passed, issues a single-use cryptographic token; the
//! post-commit hook consumes it. A commit created with `--no-verify`
//! leaves no token behind, so the post-commit hook detects the bypass
//! and soft-reverts the commit, keeping the changes staged.
//!
//! Settings live in `.hookguard.toml` at the repository root. An
//! optional `[integrity]` seal (SHA-256 over the document) locks
//! `protected` validators against programmatic edits: changing them
//! requires a manual edit plus `hookguard reseal`.
//!
//! # Commands
//!
//! ```bash
//! hookguard install            # install the enforcement hooks
//! hookguard status             # what is installed, seal state
//! hookguard configure          # write a default .hookguard.toml
//! hookguard reseal             # accept a manual settings edit
//! hookguard run pre-commit     # internal: invoked by the hook scripts
//! ```
//!
//! # Crate structure
//!
//! - [`core`]: validators, installer, token store, settings seal
//! - [`stages`]: per-lifecycle-point enforcement logic

pub mod core;
pub mod stages;

use crate::core::{
    config, error, git,
    installer::{self, InstallOptions},
    paths::HookName,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[clap(
    name = "hookguard",
    version = env!("CARGO_PKG_VERSION"),
    about = "Commit integrity enforcement: mandatory validation hooks that cannot be silently bypassed"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct InstallCli {
    /// Hook(s) to install (defaults to all enforcement hooks).
    #[clap(long = "hook")]
    hooks: Vec<String>,
    /// Replace existing hooks (a timestamped backup is taken first).
    #[clap(long)]
    force: bool,
    /// Skip interactive confirmation when replacing foreign hooks.
    #[clap(long, short = 'y')]
    yes: bool,
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct UninstallCli {
    /// Hook(s) to remove (defaults to every hookguard-owned hook).
    #[clap(long = "hook")]
    hooks: Vec<String>,
    /// Skip interactive confirmation.
    #[clap(long, short = 'y')]
    yes: bool,
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct StatusCli {
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ConfigureCli {
    /// Overwrite an existing settings file.
    #[clap(long)]
    force: bool,
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct ResealCli {
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct RunCli {
    /// Lifecycle stage to execute (pre-commit, post-commit, pre-push).
    stage: String,
    /// Repository root (defaults to current working directory).
    #[clap(short, long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install enforcement hooks into .git/hooks
    Install(InstallCli),
    /// Remove hookguard-owned hooks
    Uninstall(UninstallCli),
    /// Show installed hooks and settings seal state
    Status(StatusCli),
    /// Write a default .hookguard.toml
    Configure(ConfigureCli),
    /// Recompute the settings integrity digest after a manual edit
    Reseal(ResealCli),
    /// Execute a lifecycle stage (invoked by the installed hook scripts)
    Run(RunCli),
    /// Print version
    Version,
}

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf, error::GuardianError> {
    match dir {
        Some(d) => Ok(d),
        None => Ok(std::env::current_dir()?),
    }
}

fn parse_hooks(raw: &[String], default: &[HookName]) -> Result<Vec<HookName>, error::GuardianError> {
    if raw.is_empty() {
        return Ok(default.to_vec());
    }
    raw.iter().map(|name| HookName::from_str(name)).collect()
}

fn confirm(prompt: &str) -> Result<bool, error::GuardianError> {
    use std::io::BufRead;
    eprint!("{} [y/N] ", prompt);
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn run_install(cli: InstallCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    let hooks = parse_hooks(&cli.hooks, &HookName::ENFORCED)?;
    let opts = InstallOptions {
        force: cli.force,
        assume_yes: cli.yes,
    };

    for hook in hooks {
        installer::install(&repo_root, hook, &installer::hook_script(hook), &opts)?;
        println!("{} installed {} hook", "✓".bright_green(), hook.as_str().bright_white());
    }
    println!(
        "Hooks re-invoke `hookguard run <stage>`; configure validators in {}",
        config::SETTINGS_FILE
    );
    Ok(0)
}

fn run_uninstall(cli: UninstallCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    let hooks = if cli.hooks.is_empty() {
        installer::installed_hooks(&repo_root)
    } else {
        parse_hooks(&cli.hooks, &[])?
    };

    if hooks.is_empty() {
        println!("No hookguard hooks installed");
        return Ok(0);
    }

    if !cli.yes && !confirm("Remove hookguard hooks? Commits will no longer be validated.")? {
        println!("Aborted");
        return Ok(1);
    }

    for hook in hooks {
        if installer::uninstall(&repo_root, hook)? {
            println!("{} removed {} hook", "✓".bright_green(), hook.as_str().bright_white());
        } else {
            println!("{} {} not installed", "-".bright_black(), hook.as_str());
        }
    }
    Ok(0)
}

fn run_status(cli: StatusCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    if !git::is_git_repository(&repo_root) {
        return Err(error::GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }

    println!("hookguard v{}", env!("CARGO_PKG_VERSION"));
    for hook in HookName::ENFORCED {
        if installer::is_installed(&repo_root, hook) {
            println!("  {} {}", "✓".bright_green(), hook.as_str().bright_white());
        } else {
            println!("  {} {} (missing)", "✗".bright_red(), hook.as_str());
        }
    }

    let settings = config::settings_path(&repo_root);
    if !settings.exists() {
        println!("  settings: defaults (no {})", config::SETTINGS_FILE);
        return Ok(0);
    }
    match config::Config::load(&settings) {
        Ok(cfg) if cfg.sealed() => println!("  settings: {} (sealed)", config::SETTINGS_FILE),
        Ok(_) => println!("  settings: {} (unsealed)", config::SETTINGS_FILE),
        Err(err) => println!("  settings: {} {}", "✗".bright_red(), err),
    }
    Ok(0)
}

fn run_configure(cli: ConfigureCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    let path = config::settings_path(&repo_root);
    config::write_default(&path, cli.force)?;
    println!("{} wrote {}", "✓".bright_green(), path.display());
    println!("Run `hookguard reseal` after editing to seal protected validators.");
    Ok(0)
}

fn run_reseal(cli: ResealCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    let path = config::settings_path(&repo_root);
    let digest = config::reseal(&path)?;
    println!("{} resealed {} ({})", "✓".bright_green(), path.display(), digest);
    println!("The settings file is now safe to commit.");
    Ok(0)
}

fn run_stage_command(cli: RunCli) -> Result<i32, error::GuardianError> {
    let repo_root = resolve_dir(cli.dir)?;
    let stage = HookName::from_str(&cli.stage)?;
    stages::run_stage(&repo_root, stage)
}

/// Parse arguments and dispatch. Returns the process exit code.
pub fn run() -> Result<i32, error::GuardianError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Install(args) => run_install(args),
        Command::Uninstall(args) => run_uninstall(args),
        Command::Status(args) => run_status(args),
        Command::Configure(args) => run_configure(args),
        Command::Reseal(args) => run_reseal(args),
        Command::Run(args) => run_stage_command(args),
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}
