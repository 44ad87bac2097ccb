//! Launch script codec
//!
//! Generates the bash bootstrap used as a Steam launch option (`~/lsfg %command%`)
//! and recovers the script-only settings from an existing script.

use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_PROFILE, DXVK_FRAME_RATE_VAR, PROFILE_SELECTOR_VAR, PROTON_WOW64_VAR,
    SCRIPT_LOG_TAG, STEAMDECK_VAR,
};
use crate::models::{ConfigurationData, ScriptValues};

/// Locations baked into the generated script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptContext {
    /// Structured config file checked before creating a profile
    pub config_file: PathBuf,
    /// Where the script itself lives
    pub script_file: PathBuf,
    /// Command invoked to create a missing profile
    pub helper_command: String,
}

/// Single-quote a string for bash
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r#"'\''"#))
}

fn quote_path(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}

fn per_game_block(ctx: &ScriptContext) -> Vec<String> {
    let tag = SCRIPT_LOG_TAG;
    let ensure = format!(
        "{} --config-file \"$config_file\" --script-file {} profile ensure \"$profile_name\"",
        shell_quote(&ctx.helper_command),
        quote_path(&ctx.script_file),
    );

    vec![
        String::new(),
        "# Per-game profile selection".to_string(),
        "game_exe=\"$(basename \"$launch_command\")\"".to_string(),
        "if [[ \"$game_exe\" == *.exe ]]; then".to_string(),
        "    profile_name=\"$(echo \"${game_exe%.exe}\" | sed 's/[^a-zA-Z0-9_-]/-/g' | tr '[:upper:]' '[:lower:]')\"".to_string(),
        format!("    export {}=\"$profile_name\"", PROFILE_SELECTOR_VAR),
        format!("    logger \"{}: using per-game profile: $profile_name\"", tag),
        String::new(),
        "    # Create the profile before the game starts so lsfg-vk can pick it up".to_string(),
        format!("    config_file={}", quote_path(&ctx.config_file)),
        "    if [[ -f \"$config_file\" ]] && ! grep -q \"exe = \\\"$profile_name\\\"\" \"$config_file\" 2>/dev/null; then".to_string(),
        format!("        logger \"{}: creating profile for $profile_name\"", tag),
        format!("        if {} >/dev/null 2>&1; then", ensure),
        format!("            logger \"{}: profile $profile_name created\"", tag),
        "        else".to_string(),
        format!("            logger \"{}: failed to create profile $profile_name\"", tag),
        "        fi".to_string(),
        "    fi".to_string(),
        "else".to_string(),
        format!("    export {}={}", PROFILE_SELECTOR_VAR, DEFAULT_PROFILE),
        format!("    logger \"{}: using default profile (non-.exe executable)\"", tag),
        "fi".to_string(),
        String::new(),
    ]
}

/// Render the complete launch script for a configuration
pub fn generate(config: &ConfigurationData, ctx: &ScriptContext) -> String {
    let tag = SCRIPT_LOG_TAG;
    let mut lines = vec![
        "#!/bin/bash".to_string(),
        "# lsfg-vk launch script generated by lsfgctl".to_string(),
        "# Exports frame generation settings, then runs the original command".to_string(),
        "launch_command=\"$@\"".to_string(),
        format!("logger \"{}: game launch command is: $launch_command\"", tag),
        format!("logger \"{}: executable is: $(basename \"$launch_command\")\"", tag),
    ];

    if config.per_game_profiles {
        lines.extend(per_game_block(ctx));
    } else {
        lines.push(format!("export {}={}", PROFILE_SELECTOR_VAR, DEFAULT_PROFILE));
    }

    if config.enable_wow64 {
        lines.push(format!("export {}=1", PROTON_WOW64_VAR));
    }
    if config.disable_steamdeck_mode {
        lines.push(format!("export {}=0", STEAMDECK_VAR));
    }
    if config.dxvk_frame_rate > 0 {
        lines.push(format!("export {}={}", DXVK_FRAME_RATE_VAR, config.dxvk_frame_rate));
    }

    lines.push("exec \"$@\"".to_string());

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Recover script-only values from `export` statements.
///
/// Lines that are not exports, unrecognized variables and values that do not
/// parse are skipped.
pub fn parse(content: &str) -> ScriptValues {
    let mut values = ScriptValues::default();

    for line in content.lines() {
        let Some(export) = line.trim().strip_prefix("export ") else {
            continue;
        };
        let Some((key, value)) = export.split_once('=') else {
            continue;
        };
        let value = unquote(value);

        match key.trim() {
            DXVK_FRAME_RATE_VAR => {
                if let Ok(rate) = value.parse::<i64>() {
                    values.dxvk_frame_rate = Some(rate);
                }
            }
            PROTON_WOW64_VAR => values.enable_wow64 = Some(value == "1"),
            STEAMDECK_VAR => values.disable_steamdeck_mode = Some(value == "0"),
            _ => {}
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn context() -> ScriptContext {
        ScriptContext {
            config_file: PathBuf::from("/home/deck/.config/lsfg-vk/conf.toml"),
            script_file: PathBuf::from("/home/deck/lsfg"),
            helper_command: "/usr/local/bin/lsfgctl".to_string(),
        }
    }

    // ==================== Generation tests ====================

    #[test]
    fn test_default_script_shape() {
        let script = generate(&schema::defaults(), &context());
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(lines[0], "#!/bin/bash");
        assert!(lines[4].starts_with("logger \"lsfg-vk-launch: game launch command is:"));
        assert!(lines[5].starts_with("logger \"lsfg-vk-launch: executable is:"));
        assert!(lines.contains(&"export LSFG_PROCESS=decky-lsfg-vk"));
        assert_eq!(lines.last(), Some(&"exec \"$@\""));
        assert!(!script.contains("DXVK_FRAME_RATE"), "Zero frame rate is not exported");
        assert!(!script.contains("PROTON_USE_WOW64"));
        assert!(!script.contains("SteamDeck"));
    }

    #[test]
    fn test_optional_exports() {
        let mut config = schema::defaults();
        config.enable_wow64 = true;
        config.disable_steamdeck_mode = true;
        config.dxvk_frame_rate = 40;
        let script = generate(&config, &context());
        assert!(script.contains("\nexport PROTON_USE_WOW64=1\n"));
        assert!(script.contains("\nexport SteamDeck=0\n"));
        assert!(script.contains("\nexport DXVK_FRAME_RATE=40\n"));
    }

    #[test]
    fn test_per_game_script_creates_missing_profile() {
        let mut config = schema::defaults();
        config.per_game_profiles = true;
        let script = generate(&config, &context());
        assert!(script.contains("export LSFG_PROCESS=\"$profile_name\""));
        assert!(script.contains("sed 's/[^a-zA-Z0-9_-]/-/g' | tr '[:upper:]' '[:lower:]'"));
        assert!(script.contains("config_file='/home/deck/.config/lsfg-vk/conf.toml'"));
        assert!(script.contains(
            "'/usr/local/bin/lsfgctl' --config-file \"$config_file\" --script-file '/home/deck/lsfg' profile ensure \"$profile_name\""
        ));
        let ensure = script.find("profile ensure").expect("ensure call present");
        let exec = script.find("exec \"$@\"").expect("exec present");
        assert!(ensure < exec, "Profile creation must run before the game");
    }

    #[test]
    fn test_shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/home/o'neil/lsfgctl"), r#"'/home/o'\''neil/lsfgctl'"#);
    }

    // ==================== Parsing tests ====================

    #[test]
    fn test_parse_recognized_exports() {
        let script = "#!/bin/bash\nexport DXVK_FRAME_RATE=90\nexport PROTON_USE_WOW64=1\nexport SteamDeck=0\nexec \"$@\"\n";
        let values = parse(script);
        assert_eq!(values.dxvk_frame_rate, Some(90));
        assert_eq!(values.enable_wow64, Some(true));
        assert_eq!(values.disable_steamdeck_mode, Some(true));
    }

    #[test]
    fn test_parse_skips_bad_and_unknown_exports() {
        let script = "export DXVK_FRAME_RATE=fast\nexport MANGOHUD=1\n# export PROTON_USE_WOW64=1\nPROTON_USE_WOW64=1\n";
        assert_eq!(parse(script), ScriptValues::default());
    }

    #[test]
    fn test_parse_strips_quotes() {
        let values = parse("export DXVK_FRAME_RATE=\"30\"\nexport SteamDeck='1'\n");
        assert_eq!(values.dxvk_frame_rate, Some(30));
        assert_eq!(values.disable_steamdeck_mode, Some(false));
    }

    #[test]
    fn test_generated_script_parses_back() {
        let mut config = schema::defaults();
        config.per_game_profiles = true;
        config.enable_wow64 = true;
        config.dxvk_frame_rate = 60;
        let values = parse(&generate(&config, &context()));
        assert_eq!(values.dxvk_frame_rate, Some(60));
        assert_eq!(values.enable_wow64, Some(true));
        assert_eq!(values.disable_steamdeck_mode, None);
    }
}
