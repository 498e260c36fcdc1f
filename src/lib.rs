//! Orchestration of the DoesTheDogWatchPlex pipeline in docker containers:
//! building the image with a staged config, moving the generated JSON out of
//! a producer container through a transient volume, and feeding it to the
//! Plex writer.

mod command;
mod command_runner;
mod config;
mod config_stage;
/// Container engine command construction, using the "docker" OS command as a
/// backend
mod docker;
mod error;
mod misc;
mod paths;
mod routines;
mod volume;

pub use command::*;
pub use command_runner::*;
pub use config::*;
pub use config_stage::*;
pub use docker::*;
pub use error::*;
pub use misc::*;
pub use paths::*;
pub use routines::*;
pub use volume::*;
/// This reexport helps with dependency wrangling
pub use stacked_errors;
