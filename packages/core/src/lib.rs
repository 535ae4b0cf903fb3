// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod db;
pub mod error;
pub mod metrics;
pub mod pubsub;
pub mod repository;
pub mod server;
pub mod services;
pub mod subscriber;
pub mod ticker;
pub mod worker;

// Startup plumbing used by the binary.
pub mod cli;
pub mod config;
pub mod logging;
