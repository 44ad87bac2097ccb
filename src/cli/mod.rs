//! CLI argument parsing module
//!
//! Handles command-line interface using clap, including:
//! - Subcommands for every configuration operation
//! - Per-field setting flags shared by `set` and `profile set`
//! - Output format selection (human/JSON)
//! - File location overrides and verbosity

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{Map, Value};

use crate::schema;

/// What the user asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Show,
    /// Fields given on the command line; the rest keep their current value
    Set(Map<String, Value>),
    SetDll(String),
    ProfileList,
    ProfileShow(String),
    ProfileSet(String, Map<String, Value>),
    ProfileEnsure(String),
    Detect,
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub action: Action,
    pub json_output: bool,
    pub verbosity: u8,
    pub config_file: Option<PathBuf>,
    pub script_file: Option<PathBuf>,
}

/// Flag name, schema field, kind
const PROFILE_FLAGS: &[(&str, &str, FlagKind)] = &[
    ("multiplier", schema::MULTIPLIER, FlagKind::Int),
    ("flow-scale", schema::FLOW_SCALE, FlagKind::Float),
    ("performance-mode", schema::PERFORMANCE_MODE, FlagKind::Bool),
    ("hdr-mode", schema::HDR_MODE, FlagKind::Bool),
    ("present-mode", schema::EXPERIMENTAL_PRESENT_MODE, FlagKind::Str),
];

const GLOBAL_FLAGS: &[(&str, &str, FlagKind)] = &[
    ("dll", schema::DLL, FlagKind::Str),
    ("dxvk-frame-rate", schema::DXVK_FRAME_RATE, FlagKind::Int),
    ("enable-wow64", schema::ENABLE_WOW64, FlagKind::Bool),
    ("disable-steamdeck-mode", schema::DISABLE_STEAMDECK_MODE, FlagKind::Bool),
    ("per-game-profiles", schema::PER_GAME_PROFILES, FlagKind::Bool),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum FlagKind {
    Bool,
    Int,
    Float,
    Str,
}

fn field_arg(flag: &'static str, field: &'static str, kind: FlagKind) -> Arg {
    let help = schema::spec(field).map(|f| f.description).unwrap_or(field);
    let arg = Arg::new(flag).long(flag).help(help);
    match kind {
        FlagKind::Bool => arg.value_name("BOOL").value_parser(BoolishValueParser::new()),
        FlagKind::Int => arg.value_name("N").value_parser(value_parser!(i64)),
        FlagKind::Float => arg.value_name("F").value_parser(value_parser!(f64)),
        FlagKind::Str => arg.value_name("VALUE"),
    }
}

fn field_args(flags: &'static [(&'static str, &'static str, FlagKind)]) -> Vec<Arg> {
    flags
        .iter()
        .map(|(flag, field, kind)| field_arg(*flag, *field, *kind))
        .collect()
}

/// Build the command tree
pub fn build_cli() -> Command {
    Command::new("lsfgctl")
        .version(concat!(env!("LSFGCTL_VERSION"), " (", env!("GIT_HASH"), ")"))
        .about("Configure lsfg-vk frame generation globally and per game")
        .long_about(
            "Reads and writes the lsfg-vk config file (~/.config/lsfg-vk/conf.toml) and the \
             ~/lsfg launch script, keeping global settings, per-game profiles and launch \
             environment variables in sync.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v info, -vv debug)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("config-file")
                .long("config-file")
                .value_name("PATH")
                .help("Path to the lsfg-vk config file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("script-file")
                .long("script-file")
                .value_name("PATH")
                .help("Path to the launch script")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(Command::new("show").about("Show the effective configuration"))
        .subcommand(
            Command::new("set")
                .about("Update global settings; omitted flags keep their current value")
                .args(field_args(PROFILE_FLAGS))
                .args(field_args(GLOBAL_FLAGS)),
        )
        .subcommand(
            Command::new("set-dll")
                .about("Set the Lossless.dll location")
                .arg(Arg::new("path").value_name("PATH").required(true).help("Path to Lossless.dll")),
        )
        .subcommand(
            Command::new("profile")
                .about("Manage per-game profiles")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List all game profiles"))
                .subcommand(
                    Command::new("show")
                        .about("Show the effective configuration of one game")
                        .arg(name_arg()),
                )
                .subcommand(
                    Command::new("set")
                        .about("Create or update one game profile")
                        .arg(name_arg())
                        .args(field_args(PROFILE_FLAGS)),
                )
                .subcommand(
                    Command::new("ensure")
                        .about("Create a profile from the current settings if it does not exist")
                        .arg(name_arg()),
                ),
        )
        .subcommand(Command::new("detect").about("Show which game profile is active and why"))
}

fn name_arg() -> Arg {
    Arg::new("name")
        .value_name("NAME")
        .required(true)
        .help("Profile identifier (sanitized executable name)")
}

/// Collect the field flags that were given into a loosely typed request
fn collect_fields(
    matches: &ArgMatches,
    flags: &'static [(&'static str, &'static str, FlagKind)],
    into: &mut Map<String, Value>,
) {
    for (flag, field, kind) in flags {
        let value = match kind {
            FlagKind::Bool => matches.get_one::<bool>(flag).map(|b| Value::Bool(*b)),
            FlagKind::Int => matches.get_one::<i64>(flag).map(|i| Value::from(*i)),
            FlagKind::Float => matches.get_one::<f64>(flag).map(|f| Value::from(*f)),
            FlagKind::Str => matches.get_one::<String>(flag).map(|s| Value::String(s.clone())),
        };
        if let Some(value) = value {
            into.insert(field.to_string(), value);
        }
    }
}

fn required_name(matches: &ArgMatches) -> String {
    matches.get_one::<String>("name").cloned().unwrap_or_default()
}

fn action_from(matches: &ArgMatches) -> Action {
    match matches.subcommand() {
        Some(("set", sub)) => {
            let mut fields = Map::new();
            collect_fields(sub, PROFILE_FLAGS, &mut fields);
            collect_fields(sub, GLOBAL_FLAGS, &mut fields);
            Action::Set(fields)
        }
        Some(("set-dll", sub)) => Action::SetDll(sub.get_one::<String>("path").cloned().unwrap_or_default()),
        Some(("profile", sub)) => match sub.subcommand() {
            Some(("show", args)) => Action::ProfileShow(required_name(args)),
            Some(("set", args)) => {
                let mut fields = Map::new();
                collect_fields(args, PROFILE_FLAGS, &mut fields);
                Action::ProfileSet(required_name(args), fields)
            }
            Some(("ensure", args)) => Action::ProfileEnsure(required_name(args)),
            _ => Action::ProfileList,
        },
        Some(("detect", _)) => Action::Detect,
        _ => Action::Show,
    }
}

fn options_from(matches: &ArgMatches) -> CliOptions {
    CliOptions {
        action: action_from(matches),
        json_output: matches.get_flag("json"),
        verbosity: matches.get_count("verbose"),
        config_file: matches.get_one::<PathBuf>("config-file").cloned(),
        script_file: matches.get_one::<PathBuf>("script-file").cloned(),
    }
}

/// Parse an explicit argument list
pub fn parse_from<I, T>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_cli().try_get_matches_from(args)?;
    Ok(options_from(&matches))
}

/// Parse the process arguments, exiting with usage on error
pub fn parse_args() -> CliOptions {
    options_from(&build_cli().get_matches())
}
