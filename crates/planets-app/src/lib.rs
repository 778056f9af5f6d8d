//! Application root for the planets renderer: scene assembly, the
//! fixed-timestep loop and frame output.

pub mod app;
pub mod error;
pub mod game_loop;
pub mod platform;
pub mod screenshot;

pub use app::{RunSummary, run};
pub use error::AppError;
