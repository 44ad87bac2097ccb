use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set-dll"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("detect"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--config-file"))
        .stdout(predicate::str::contains("--script-file"));
}

#[test]
fn test_set_help_describes_fields() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");
    cmd.args(["set", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--multiplier"))
        .stdout(predicate::str::contains("--flow-scale"))
        .stdout(predicate::str::contains("--dxvk-frame-rate"))
        .stdout(predicate::str::contains("--per-game-profiles"));
}

#[test]
fn test_profile_set_help_has_no_global_flags() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");
    cmd.args(["profile", "set", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--multiplier"))
        .stdout(predicate::str::contains("--dxvk-frame-rate").not());
}

#[test]
fn test_no_arguments_prints_usage() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_version_prints_semantic_version() {
    let mut cmd = assert_cmd::cargo_bin_cmd!("lsfgctl");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"lsfgctl \d+\.\d+\.\d+").unwrap());
}
