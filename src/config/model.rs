// src/config/model.rs

use regex::Regex;
use serde::Deserialize;

use crate::watch::path_utils::extension_with_dot;

pub const DEFAULT_LOG_START: &str = "[{{command}}]{{step}}";
pub const DEFAULT_LOG_END: &str = "({{elapsed_ms}}ms)";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [log]
/// start = "[{{command}}]{{step}}"
/// end = "({{elapsed_ms}}ms)"
///
/// [[commands]]
/// ext = ".py"
/// cmd = 'python "{{file}}"'
/// ```
///
/// Both sections are optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub log: Option<RawLogSection>,

    /// Tried in order; the first matching entry wins.
    #[serde(default)]
    pub commands: Vec<RawCommandEntry>,
}

/// `[log]` section. An empty string disables that line.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawLogSection {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// One `[[commands]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCommandEntry {
    /// Extension including the dot, e.g. `".py"`.
    #[serde(default)]
    pub ext: Option<String>,

    /// Regular expression evaluated against the file path.
    #[serde(default)]
    pub re: Option<String>,

    /// Command template; may hold several newline-separated sub-commands.
    pub cmd: String,
}

/// Validated configuration, produced via `Config::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct Config {
    pub commands: Vec<CommandEntry>,
    pub log: LogTemplates,
}

impl Config {
    pub(crate) fn new_unchecked(commands: Vec<CommandEntry>, log: LogTemplates) -> Self {
        Self { commands, log }
    }

    /// A config with a single entry that matches every file.
    pub fn fixed_command(cmd: impl Into<String>) -> Self {
        let entry = CommandEntry {
            ext: None,
            re: Regex::new(".").ok(),
            cmd: cmd.into(),
        };
        Self::new_unchecked(vec![entry], LogTemplates::default())
    }

    /// First entry that matches `path`, in configured order.
    pub fn find_command(&self, path: &str) -> Option<&CommandEntry> {
        self.commands.iter().find(|c| c.matches(path))
    }
}

#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub ext: Option<String>,
    pub re: Option<Regex>,
    pub cmd: String,
}

impl CommandEntry {
    /// Both matchers must agree when both are set; with neither set the
    /// entry never matches.
    pub fn matches(&self, path: &str) -> bool {
        match (&self.ext, &self.re) {
            (None, None) => false,
            (Some(ext), None) => ext == extension_with_dot(path),
            (None, Some(re)) => re.is_match(path),
            (Some(ext), Some(re)) => ext == extension_with_dot(path) && re.is_match(path),
        }
    }
}

/// Start/end progress line templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTemplates {
    pub start: String,
    pub end: String,
}

impl Default for LogTemplates {
    fn default() -> Self {
        Self {
            start: DEFAULT_LOG_START.to_string(),
            end: DEFAULT_LOG_END.to_string(),
        }
    }
}
