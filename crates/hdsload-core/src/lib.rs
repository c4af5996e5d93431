pub mod config;
pub mod logging;

pub mod control;
pub mod error;
pub mod fetch;
pub mod inspector;
pub mod loadtest;
pub mod manifest;
pub mod pipeline;
pub mod reconcile;
pub mod run_table;
pub mod services;
pub mod storage;
pub mod stream;
