pub mod catalog;
pub mod factory;
pub mod runner;
pub mod services;
pub mod sheet;
