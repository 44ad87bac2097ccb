//! Text codecs for the two durable surfaces
//!
//! - config_file: the structured `conf.toml` subset read by lsfg-vk
//! - launch_script: the shell bootstrap that exports script-only settings

pub mod config_file;
pub mod launch_script;
