//! lsfgctl - lsfg-vk configuration library
//!
//! Layered configuration engine for the lsfg-vk frame generation layer:
//! schema registry, config file and launch script codecs, merge rules and
//! best-effort detection of the running game's profile.

pub mod cli;
pub mod codec;
pub mod constants;
pub mod detect;
pub mod dll;
pub mod logging;
pub mod merge;
pub mod models;
pub mod output;
pub mod schema;
pub mod service;
pub mod storage;
