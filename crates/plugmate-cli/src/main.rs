use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use plugmate_core::config::{default_base_dir, Config};
use plugmate_core::lifecycle::{ArtifactSource, PluginManager, UpdateReport};
use plugmate_core::runtime::PluginRuntime;
use plugmate_core::tools::ToolCatalog;
use plugmate_core::Result;

mod args;
use args::{Cli, Commands, Shell, ToolsFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let base_dir = match resolve_base_dir(cli.base_dir) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Commands::Install { name, version }) => {
            handle_install(&base_dir, &name, version.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::Update { name, version }) => {
            handle_update(&base_dir, &name, version.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::Uninstall { name }) => {
            handle_uninstall(&base_dir, &name).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::List) => handle_list(&base_dir).map(|_| ExitCode::SUCCESS),
        Some(Commands::RemoteList) => handle_remote_list(&base_dir).map(|_| ExitCode::SUCCESS),
        Some(Commands::Publish { name, version }) => {
            handle_publish(&base_dir, &name, version.as_deref()).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::Lock) => handle_lock(&base_dir).map(|_| ExitCode::SUCCESS),
        Some(Commands::Run { name, args }) => handle_run(&base_dir, &name, &args),
        Some(Commands::Tools { format }) => {
            handle_tools(&base_dir, format).map(|_| ExitCode::SUCCESS)
        }
        Some(Commands::Init) => handle_init(&base_dir).map(|_| ExitCode::SUCCESS),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Cli::command().print_help().ok();
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "plugmate=debug,plugmate_core=debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(base) = cli_base {
        return Ok(base);
    }

    if let Ok(base) = std::env::var("PLUGMATE_BASE") {
        return Ok(PathBuf::from(base));
    }

    default_base_dir()
}

fn build_manager(base_dir: &Path) -> Result<PluginManager> {
    let config = Config::load(base_dir)?;
    PluginManager::from_config(&config, base_dir)
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "plugmate", &mut io::stdout());
}

fn handle_install(base_dir: &Path, name: &str, version: Option<&str>) -> Result<()> {
    let manager = build_manager(base_dir)?;

    println!();
    println!("Installing {}...", name.cyan());

    let report = manager.install(name, version)?;

    println!();
    match report.source {
        ArtifactSource::Remote => {
            println!(
                "{} {} {} -> {}",
                "Installed:".green(),
                report.name.cyan(),
                report.version,
                report.install_path.display()
            );
        }
        ArtifactSource::Stub => {
            println!(
                "{} remote registry unavailable, installed a placeholder",
                "[WARN]".yellow().bold()
            );
            println!(
                "{} {} {} -> {}",
                "Installed (stub):".yellow(),
                report.name.cyan(),
                report.version,
                report.install_path.display()
            );
        }
    }

    Ok(())
}

fn handle_update(base_dir: &Path, name: &str, version: Option<&str>) -> Result<()> {
    let manager = build_manager(base_dir)?;

    println!();
    println!("Checking {} for updates...", name.cyan());

    match manager.update(name, version)? {
        UpdateReport::AlreadyCurrent { version } => {
            println!();
            println!("{} {} {}", "Already current:".green(), name.cyan(), version);
        }
        UpdateReport::Updated {
            previous, version, ..
        } => {
            println!();
            println!(
                "{} {} {} -> {}",
                "Updated:".green(),
                name.cyan(),
                previous,
                version
            );
        }
    }

    Ok(())
}

fn handle_uninstall(base_dir: &Path, name: &str) -> Result<()> {
    let manager = build_manager(base_dir)?;
    let report = manager.uninstall(name)?;

    println!();
    if report.removed_files || report.removed_entry {
        println!("{} {}", "Uninstalled:".green(), name.cyan());
    } else {
        println!("{} {} was not installed", "[SKIP]".yellow(), name.cyan());
    }

    Ok(())
}

fn handle_list(base_dir: &Path) -> Result<()> {
    let manager = build_manager(base_dir)?;
    let status = manager.status()?;

    println!();
    if status.is_empty() {
        println!("No plugins installed");
        return Ok(());
    }

    println!("{}", "Installed plugins:".cyan().bold());
    println!();
    for plugin in status {
        let lock_note = match plugin.locked.as_deref() {
            Some(locked) if locked == plugin.version => String::new(),
            Some(locked) => format!(" {}", format!("(lock: {})", locked).yellow()),
            None => format!(" {}", "(unlocked)".yellow()),
        };
        println!("  {} {}{}", plugin.name.cyan(), plugin.version, lock_note);
    }

    Ok(())
}

fn handle_remote_list(base_dir: &Path) -> Result<()> {
    let manager = build_manager(base_dir)?;
    let index = manager.remote_index()?;

    println!();
    if index.is_empty() {
        println!("No plugins available");
        return Ok(());
    }

    println!("{}", "Available plugins:".cyan().bold());
    println!();
    for (name, entry) in index {
        println!(
            "  {} {} ({} versions)",
            name.cyan(),
            entry.latest,
            entry.versions.len()
        );
    }

    Ok(())
}

fn handle_publish(base_dir: &Path, name: &str, version: Option<&str>) -> Result<()> {
    let manager = build_manager(base_dir)?;

    println!();
    println!("Publishing {}...", name.cyan());

    let report = manager.publish(name, version)?;

    println!();
    println!(
        "{} {} {}",
        "Published:".green(),
        report.name.cyan(),
        report.version
    );

    Ok(())
}

fn handle_lock(base_dir: &Path) -> Result<()> {
    let manager = build_manager(base_dir)?;
    manager.lock()?;

    println!();
    println!(
        "{} {}",
        "Lockfile regenerated:".green(),
        manager.store().lockfile_path().display()
    );

    Ok(())
}

fn handle_run(base_dir: &Path, name: &str, args: &[String]) -> Result<ExitCode> {
    let manager = build_manager(base_dir)?;
    let runtime = PluginRuntime::new(manager.install_root().to_path_buf());

    let code = runtime.run(name, args)?;
    Ok(ExitCode::from(code.clamp(0, 255) as u8))
}

fn handle_tools(base_dir: &Path, format: ToolsFormat) -> Result<()> {
    let manager = build_manager(base_dir)?;
    let catalog = ToolCatalog::scan(manager.install_root())?;

    match format {
        ToolsFormat::Simple => {
            println!();
            println!("{}", catalog.summary());
        }
        ToolsFormat::Openai => {
            let json = serde_json::to_string_pretty(&catalog.to_openai_format())
                .unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }

    Ok(())
}

fn handle_init(base_dir: &Path) -> Result<()> {
    let path = Config::init(base_dir)?;

    println!();
    println!("{} {}", "Config written:".green(), path.display());

    Ok(())
}
