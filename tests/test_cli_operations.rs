//! End-to-end runs of the binary against files in a temporary directory

use std::path::{Path, PathBuf};

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

struct Files {
    _dir: TempDir,
    config: PathBuf,
    script: PathBuf,
}

fn files() -> Files {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join(".config/lsfg-vk/conf.toml");
    let script = dir.path().join("lsfg");
    Files { _dir: dir, config, script }
}

fn lsfgctl(files: &Files) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");
    cmd.arg("--config-file")
        .arg(&files.config)
        .arg("--script-file")
        .arg(&files.script)
        .env_remove("RUST_LOG");
    cmd
}

fn json_stdout(cmd: &mut assert_cmd::Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("JSON output should be valid JSON")
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_default()
}

#[test]
fn test_show_without_files_uses_defaults() {
    let files = files();
    let value = json_stdout(lsfgctl(&files).args(["show", "--json"]));

    assert_eq!(value["success"], true);
    assert_eq!(value["config"]["multiplier"], 1);
    assert_eq!(value["config"]["experimental_present_mode"], "fifo");
    assert!(value["message"].as_str().unwrap().contains("config file not found"));
    assert!(!files.config.exists());
}

#[test]
fn test_set_keeps_unspecified_fields() {
    let files = files();
    lsfgctl(&files)
        .args(["set", "--multiplier", "3", "--dll", "/opt/Lossless.dll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated successfully"));

    lsfgctl(&files)
        .args(["set", "--flow-scale", "0.5", "--enable-wow64", "true"])
        .assert()
        .success();

    let value = json_stdout(lsfgctl(&files).args(["--json", "show"]));
    assert_eq!(value["config"]["multiplier"], 3);
    assert_eq!(value["config"]["flow_scale"], 0.5);
    assert_eq!(value["config"]["dll"], "/opt/Lossless.dll");
    assert_eq!(value["config"]["enable_wow64"], true);

    assert!(read(&files.script).contains("export PROTON_USE_WOW64=1"));
}

#[test]
fn test_profile_commands() {
    let files = files();
    lsfgctl(&files)
        .args(["set", "--per-game-profiles", "true", "--multiplier", "2"])
        .assert()
        .success();

    lsfgctl(&files)
        .args(["profile", "set", "hades", "--multiplier", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Game profile 'hades' updated successfully"));

    lsfgctl(&files)
        .args(["profile", "ensure", "celeste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'celeste' created"));

    let listed = json_stdout(lsfgctl(&files).args(["profile", "list", "--json"]));
    let profiles = listed["game_profiles"].as_object().unwrap();
    assert_eq!(profiles.len(), 3);
    assert!(profiles.contains_key("decky-lsfg-vk"));
    assert_eq!(profiles["hades"]["multiplier"], 4);
    assert_eq!(profiles["celeste"]["multiplier"], 2);

    let shown = json_stdout(lsfgctl(&files).args(["profile", "show", "hades", "--json"]));
    assert_eq!(shown["config"]["multiplier"], 4);
    assert_eq!(shown["config"]["per_game_profiles"], true);
}

#[test]
fn test_set_dll_reports_path() {
    let files = files();
    lsfgctl(&files)
        .args(["set-dll", "/mnt/sd/Lossless.dll"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DLL path updated to: /mnt/sd/Lossless.dll"));

    assert!(read(&files.config).contains("dll = \"/mnt/sd/Lossless.dll\""));
}

#[test]
fn test_write_failure_exits_nonzero() {
    let files = files();
    // A directory in place of the config file cannot be written
    std::fs::create_dir_all(&files.config).unwrap();

    let value = {
        let output = lsfgctl(&files)
            .args(["--json", "set-dll", "/x/Lossless.dll"])
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice::<Value>(&output).unwrap()
    };
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().is_some());
}

#[test]
fn test_detect_json_shape() {
    let files = files();
    let value = json_stdout(lsfgctl(&files).args(["detect", "--json"]));

    assert!(value.get("active_profile").is_some());
    assert!(value["vulkan_processes"].is_array());
    assert!(value["game_processes"].is_array());
    assert!(value["total_game_processes"].is_u64());
    assert!(value["recent_basenames"].is_array(), "Journal problems leave the launch list empty");
}
