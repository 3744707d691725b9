#![deny(warnings)]

pub mod chunker;
pub mod config;
pub mod orchestrator;
pub mod sink;
pub mod tts;
