use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use panewarden::ToolVariant;

mod cli;

#[derive(Parser)]
#[command(name = "panewarden")]
#[command(about = "Supervise coding-agent CLIs running in tmux")]
#[command(version)]
struct Cli {
    /// Project directory used for config lookup (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Path to the config file (defaults to .panewarden/config.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify captured terminal text (file or stdin) and print the status as JSON
    Status {
        /// Tool that produced the text
        #[arg(short, long, default_value = "claude")]
        tool: ToolVariant,

        /// Read from this file instead of stdin
        file: Option<PathBuf>,
    },

    /// Run prompt detection on captured terminal text and print the result as JSON
    Detect {
        #[arg(short, long, default_value = "claude")]
        tool: ToolVariant,

        file: Option<PathBuf>,
    },

    /// Watch a live session and print poll events until Ctrl-C
    Watch {
        session_id: String,

        #[arg(short, long, default_value = "claude")]
        tool: ToolVariant,

        /// Answer prompts automatically for this long (1h, 3h or 8h)
        #[arg(long)]
        auto_yes: Option<String>,

        /// Stop auto-yes when the output matches this regex
        #[arg(long, requires = "auto_yes")]
        stop_pattern: Option<String>,
    },

    /// Send a message to a live session
    Send {
        session_id: String,

        #[arg(short, long, default_value = "claude")]
        tool: ToolVariant,

        /// Message text
        message: String,
    },

    /// Answer the prompt a live session is waiting on
    Answer {
        session_id: String,

        #[arg(short, long, default_value = "claude")]
        tool: ToolVariant,

        /// y/yes/n/no for yes/no prompts, an option number or free text otherwise
        answer: String,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,

        /// Write the user-level config instead of the project one
        #[arg(long)]
        global: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let work_dir = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let config_path = cli.config;

    match cli.command {
        Commands::Status { tool, file } => {
            cli::status::status_command(tool, file.as_deref())?;
        }
        Commands::Detect { tool, file } => {
            cli::status::detect_command(tool, file.as_deref())?;
        }
        Commands::Watch {
            session_id,
            tool,
            auto_yes,
            stop_pattern,
        } => {
            let config = cli::load_config(&work_dir, config_path.as_deref())?;
            cli::watch::watch_command(config, &session_id, tool, auto_yes, stop_pattern).await?;
        }
        Commands::Send {
            session_id,
            tool,
            message,
        } => {
            let config = cli::load_config(&work_dir, config_path.as_deref())?;
            cli::send::send_command(config, &session_id, tool, &message).await?;
        }
        Commands::Answer {
            session_id,
            tool,
            answer,
        } => {
            let config = cli::load_config(&work_dir, config_path.as_deref())?;
            cli::send::answer_command(config, &session_id, tool, &answer).await?;
        }
        Commands::Init { force, global } => {
            cli::init::init_command(&work_dir, config_path, force, global)?;
        }
    }

    Ok(())
}
