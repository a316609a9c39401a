use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::RelayConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["mjwrap.toml", "mjwrap.yaml", "mjwrap.yml", "mjwrap.json"];

/// Environment variables that override file values after loading.
pub const ENV_DISCORD_TOKEN: &str = "MJWRAP_DISCORD_TOKEN";
pub const ENV_DISCORD_CHANNEL_ID: &str = "MJWRAP_DISCORD_CHANNEL_ID";
pub const ENV_CALLBACK_URL: &str = "MJWRAP_CALLBACK_URL";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<RelayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./mjwrap.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/mjwrap/mjwrap.{toml,yaml,yml,json}` (user-global)
///
/// Returns `RelayConfig::default()` if no config file is found, so a
/// deployment driven purely by environment overrides still starts.
pub fn discover_and_load() -> RelayConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    RelayConfig::default()
}

/// Apply `MJWRAP_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut RelayConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup(ENV_DISCORD_TOKEN).filter(|v| !v.is_empty()) {
        debug!(var = ENV_DISCORD_TOKEN, "discord token overridden from environment");
        config.discord.token = Secret::new(token);
    }
    if let Some(channel_id) = lookup(ENV_DISCORD_CHANNEL_ID).filter(|v| !v.is_empty()) {
        debug!(var = ENV_DISCORD_CHANNEL_ID, %channel_id, "channel id overridden from environment");
        config.discord.channel_id = channel_id;
    }
    if let Some(url) = lookup(ENV_CALLBACK_URL).filter(|v| !v.is_empty()) {
        debug!(var = ENV_CALLBACK_URL, %url, "callback url overridden from environment");
        config.callback.url = Some(url);
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/mjwrap/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mjwrap").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<RelayConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::io::Write};

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "mjwrap.toml",
            "[discord]\ntoken = \"t\"\nchannel_id = \"77\"\n\n[requests]\nchannel_capacity = 2\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.discord.channel_id, "77");
        assert_eq!(cfg.requests.channel_capacity, 2);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write_file(
            &dir,
            "mjwrap.yaml",
            "discord:\n  channel_id: \"5\"\ncallback:\n  url: http://cb.local/hook\n",
        );
        let cfg = load_config(&yaml).unwrap();
        assert_eq!(cfg.discord.channel_id, "5");
        assert_eq!(cfg.callback.url.as_deref(), Some("http://cb.local/hook"));

        let json = write_file(
            &dir,
            "mjwrap.json",
            r#"{"discord": {"channel_id": "6"}, "callback": {"timeout_secs": 3}}"#,
        );
        let cfg = load_config(&json).unwrap();
        assert_eq!(cfg.discord.channel_id, "6");
        assert_eq!(cfg.callback.timeout_secs, 3);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "mjwrap.ini", "channel_id=1");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/definitely/not/here/mjwrap.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut cfg = RelayConfig::default();
        cfg.discord.channel_id = "from-file".into();
        apply_env_overrides_with(&mut cfg, |name| match name {
            ENV_DISCORD_TOKEN => Some("env-token".into()),
            ENV_DISCORD_CHANNEL_ID => Some("from-env".into()),
            ENV_CALLBACK_URL => Some("http://env/cb".into()),
            _ => None,
        });
        assert_eq!(cfg.discord.token.expose_secret(), "env-token");
        assert_eq!(cfg.discord.channel_id, "from-env");
        assert_eq!(cfg.callback.url.as_deref(), Some("http://env/cb"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = RelayConfig::default();
        cfg.discord.channel_id = "keep".into();
        apply_env_overrides_with(&mut cfg, |_| Some(String::new()));
        assert_eq!(cfg.discord.channel_id, "keep");
        assert!(cfg.callback.url.is_none());
    }
}
