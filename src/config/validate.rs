// src/config/validate.rs

use regex::Regex;

use crate::config::model::{
    CommandEntry, Config, DEFAULT_LOG_END, DEFAULT_LOG_START, LogTemplates, RawCommandEntry,
    RawConfigFile,
};
use crate::errors::{GazerError, Result};

impl TryFrom<RawConfigFile> for Config {
    type Error = crate::errors::GazerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let commands = raw
            .commands
            .iter()
            .enumerate()
            .map(|(idx, entry)| compile_entry(idx, entry))
            .collect::<Result<Vec<_>>>()?;

        let log = match raw.log {
            Some(section) => LogTemplates {
                start: section.start.unwrap_or_else(|| DEFAULT_LOG_START.to_string()),
                end: section.end.unwrap_or_else(|| DEFAULT_LOG_END.to_string()),
            },
            None => LogTemplates::default(),
        };

        Ok(Config::new_unchecked(commands, log))
    }
}

fn compile_entry(idx: usize, entry: &RawCommandEntry) -> Result<CommandEntry> {
    if entry.cmd.trim().is_empty() {
        return Err(GazerError::ConfigError(format!(
            "commands[{idx}]: `cmd` must not be empty"
        )));
    }

    let ext = entry.ext.clone().filter(|e| !e.is_empty());

    let re = match entry.re.as_deref() {
        None | Some("") => None,
        Some(pattern) => Some(Regex::new(pattern).map_err(|err| {
            GazerError::ConfigError(format!(
                "commands[{idx}]: invalid regex `{pattern}`: {err}"
            ))
        })?),
    };

    Ok(CommandEntry {
        ext,
        re,
        cmd: entry.cmd.clone(),
    })
}
