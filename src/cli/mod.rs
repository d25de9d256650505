//! CLI command implementations

pub mod init;
pub mod send;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use panewarden::Supervisor;
use panewarden::config::Config;
use panewarden::poller::PollEvent;
use panewarden::store::MemoryStateStore;
use panewarden::terminal::TmuxMultiplexer;
use tokio::sync::mpsc;

/// Load the explicit config file, or look it up from `work_dir`.
pub fn load_config(work_dir: &Path, config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => Config::from_file(path),
        None => Config::from_dir(work_dir),
    }
}

/// Read captured text from a file, or stdin when no file is given.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Build a supervisor backed by tmux and an in-memory state store.
pub fn tmux_supervisor(config: Config) -> Result<(Supervisor, mpsc::Receiver<PollEvent>)> {
    let (tx, rx) = mpsc::channel(64);
    let mux = Arc::new(TmuxMultiplexer::new(config.tmux.binary.clone()));
    let store = Arc::new(MemoryStateStore::new());
    let supervisor = Supervisor::new(config, mux, store, tx)?;
    Ok((supervisor, rx))
}
