pub mod availability;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod data;
pub mod demand;
pub mod error;
pub mod marker;
pub mod merge;
pub mod report;
pub mod server;
pub mod solver;
pub mod state;
pub mod supply;

pub use data::{SchedulingInput, SchedulingOutput};
pub use error::{Result, ScheduleError};
pub use solver::solve;
