use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "plugmate")]
#[command(about = "Plugin lifecycle manager for AI agent toolchains")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.plugmate)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ToolsFormat {
    Simple,
    Openai,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a plugin from the remote registry
    Install {
        /// Plugin name
        name: String,

        /// Version to install (default: latest available)
        #[arg(short = 'V', long)]
        version: Option<String>,
    },

    /// Update an installed plugin
    Update {
        /// Plugin name
        name: String,

        /// Target version (default: latest available)
        #[arg(short = 'V', long)]
        version: Option<String>,
    },

    /// Remove an installed plugin
    Uninstall {
        /// Plugin name
        name: String,
    },

    /// List installed plugins
    List,

    /// List plugins available on the remote registry
    RemoteList,

    /// Publish a locally installed plugin to the registry
    Publish {
        /// Plugin name
        name: String,

        /// Version to publish (default: manifest version)
        #[arg(short = 'V', long)]
        version: Option<String>,
    },

    /// Regenerate the lockfile from the registry
    Lock,

    /// Run an installed plugin
    Run {
        /// Plugin name
        name: String,

        /// Arguments passed to the plugin entry file
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show tools declared by installed plugins
    Tools {
        /// Output format
        #[arg(long, value_enum, default_value = "simple")]
        format: ToolsFormat,
    },

    /// Write the default config file
    Init,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
