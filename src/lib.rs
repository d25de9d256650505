//! panewarden - supervise coding-agent CLIs running in tmux
//!
//! Each agent runs in its own tmux session. panewarden reads the session's
//! scrollback and works out what the agent is doing:
//!
//! - **Status**: idle, running, thinking, or waiting on a prompt
//! - **Prompts**: yes/no and numbered-choice questions, with answer validation
//! - **Responses**: new output is streamed as progress and completed responses
//! - **Auto-yes**: prompts can be answered automatically for a bounded window
//!
//! The detection functions in [`detect`] are pure and work on captured text.
//! [`Supervisor`] ties them to a live [`terminal::Multiplexer`].

pub mod answered;
pub mod auto_yes;
pub mod config;
pub mod detect;
pub mod domain;
pub mod error;
pub mod patterns;
pub mod poller;
pub mod store;
pub mod supervisor;
pub mod terminal;
pub mod worktree;

pub use domain::*;
pub use supervisor::Supervisor;
