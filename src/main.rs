#![forbid(unsafe_code)]

use anyhow::Result;
use serde_json::{Map, Value};

use lsfgctl::cli::{self, Action, CliOptions};
use lsfgctl::logging;
use lsfgctl::models::ConfigurationData;
use lsfgctl::output;
use lsfgctl::service::{ConfigurationResponse, ConfigurationService, EnginePaths};

fn main() {
    let options = cli::parse_args();
    logging::init_backend(options.verbosity);

    match run(&options) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Print a configuration response; returns its success flag
fn emit(response: &ConfigurationResponse, json: bool) -> Result<bool> {
    if json {
        println!("{}", output::format_json(response)?);
    } else if response.success {
        print!("{}", output::format_response(response));
    } else {
        eprint!("{}", output::format_response(response));
    }
    Ok(response.success)
}

/// Current settings with the given flags laid on top
fn set_request(current: &ConfigurationData, fields: &Map<String, Value>) -> Map<String, Value> {
    let mut request = current.to_map();
    for (name, value) in fields {
        request.insert(name.clone(), value.clone());
    }
    request
}

fn run(options: &CliOptions) -> Result<bool> {
    let paths = EnginePaths::resolve(options.config_file.clone(), options.script_file.clone())?;
    let service = ConfigurationService::new(paths);
    let json = options.json_output;

    match &options.action {
        Action::Show => emit(&service.get_config(), json),
        Action::Set(fields) => {
            // Always send a complete request: start from what is in effect now
            let current = service.get_config();
            let Some(config) = current.config.as_ref() else {
                return emit(&current, json);
            };
            emit(&service.update_config(&set_request(config, fields)), json)
        }
        Action::SetDll(path) => emit(&service.update_dll_path(path), json),
        Action::ProfileShow(name) => emit(&service.get_game_profile(name), json),
        Action::ProfileSet(name, fields) => emit(&service.update_game_profile(name, fields), json),
        Action::ProfileEnsure(name) => emit(&service.ensure_game_profile(name), json),
        Action::ProfileList => {
            let response = service.list_game_profiles();
            if json {
                println!("{}", output::format_json(&response)?);
            } else {
                print!("{}", output::format_profile_list(&response));
            }
            Ok(response.success)
        }
        Action::Detect => {
            let report = service.detection_report()?;
            if json {
                println!("{}", output::format_json(&report)?);
            } else {
                print!("{}", output::format_detection_report(&report));
            }
            Ok(true)
        }
    }
}
