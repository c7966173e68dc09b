pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod progress;
pub mod report;
pub mod runner;
pub mod sheet;
pub mod state;
pub mod stats;
pub mod util;
