//! chartcat core library exports

pub mod catalog;
pub mod chart;
pub mod config;
