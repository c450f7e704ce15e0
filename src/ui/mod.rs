//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard and mouse input
//! - `events` - Background task event processing
//! - `helpers` - Spawning page loads, selection sync and the dataset watcher
//! - `render` - View rendering dispatch
//! - `grid` - Card grid
//! - `focus` - Single-sample view with annotation boxes
//! - `status` - Status bar
//! - `help` - Help overlay

mod events;
mod focus;
mod grid;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;

pub use helpers::spawn_dataset_watch;
pub use loop_runner::{run, Action};
