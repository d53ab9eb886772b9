//! The shopbot runtime: composition root, assistant pipeline, retention
//! cleanup and the `shopbot` CLI.

pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
