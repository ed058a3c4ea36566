// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::default::DEFAULT_CONFIG;
use crate::config::model::{Config, RawConfigFile};
use crate::errors::Result;

const LOCAL_CONFIG: &str = ".gazer.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; regexes are compiled by
/// [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and compile its matchers.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config> {
    let raw_config = load_from_path(&path)?;
    let config = Config::try_from(raw_config)?;
    Ok(config)
}

/// The built-in command table.
pub fn default_config() -> Result<Config> {
    let raw: RawConfigFile = toml::from_str(DEFAULT_CONFIG)?;
    Config::try_from(raw)
}

/// Config files tried when no `-f` is given, highest priority first.
pub fn config_search_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".").join(LOCAL_CONFIG)];
    if let Some(home) = home {
        paths.push(home.join(".config").join("gazer").join("gazer.toml"));
        paths.push(home.join(LOCAL_CONFIG));
    }
    paths
}

/// First existing config file in the search order.
pub fn search_config_path(home: Option<&Path>) -> Option<PathBuf> {
    config_search_paths(home).into_iter().find(|p| p.is_file())
}

/// Build the command table the way the CLI asks for it.
///
/// Priority: a fixed `command` beats an explicit `file`, which beats the
/// search paths, which beat the built-in table.
pub fn resolve_config(command: Option<&str>, file: Option<&Path>) -> Result<Config> {
    if let Some(command) = command {
        debug!(command, "using fixed command");
        return Ok(Config::fixed_command(command));
    }

    if let Some(file) = file {
        debug!("config: {}", file.display());
        return load_and_validate(file);
    }

    let home = dirs::home_dir();
    match search_config_path(home.as_deref()) {
        Some(path) => {
            debug!("config: {}", path.display());
            load_and_validate(path)
        }
        None => {
            debug!("config: (default)");
            default_config()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[commands]]\next = \".txt\"\ncmd = \"cat {{{{file}}}}\"").unwrap();

        let cfg = resolve_config(None, Some(file.path())).unwrap();
        assert_eq!(cfg.commands.len(), 1);
        assert_eq!(cfg.commands[0].cmd, "cat {{file}}");
    }

    #[test]
    fn fixed_command_wins_over_file() {
        let cfg = resolve_config(Some("make"), Some(Path::new("/does/not/exist.toml"))).unwrap();
        assert_eq!(cfg.commands[0].cmd, "make");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(resolve_config(None, Some(Path::new("/does/not/exist.toml"))).is_err());
    }

    #[test]
    fn search_order_prefers_xdg_style_over_home_dotfile() {
        let home = tempfile::tempdir().unwrap();
        let paths = config_search_paths(Some(home.path()));
        assert_eq!(paths[0], PathBuf::from("./.gazer.toml"));
        assert_eq!(paths[1], home.path().join(".config/gazer/gazer.toml"));
        assert_eq!(paths[2], home.path().join(".gazer.toml"));

        std::fs::write(home.path().join(".gazer.toml"), "").unwrap();
        let found = config_search_paths(Some(home.path()))
            .into_iter()
            .skip(1)
            .find(|p| p.is_file());
        assert_eq!(found, Some(home.path().join(".gazer.toml")));
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = default_config().unwrap();
        assert!(cfg.commands.len() >= 10);
    }
}
