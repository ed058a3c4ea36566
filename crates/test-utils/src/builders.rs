#![allow(dead_code)]

use gazer::config::{Config, RawCommandEntry, RawConfigFile, RawLogSection};

/// Builder for `Config` to simplify test setup.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_command(mut self, entry: RawCommandEntry) -> Self {
        self.config.commands.push(entry);
        self
    }

    /// Empty strings silence the progress lines.
    pub fn with_log(mut self, start: &str, end: &str) -> Self {
        self.config.log = Some(RawLogSection {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
        });
        self
    }

    pub fn quiet(self) -> Self {
        self.with_log("", "")
    }

    pub fn build(self) -> Config {
        Config::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `[[commands]]` entry.
pub struct CommandEntryBuilder {
    entry: RawCommandEntry,
}

impl CommandEntryBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            entry: RawCommandEntry {
                ext: None,
                re: None,
                cmd: cmd.to_string(),
            },
        }
    }

    pub fn ext(mut self, ext: &str) -> Self {
        self.entry.ext = Some(ext.to_string());
        self
    }

    pub fn re(mut self, re: &str) -> Self {
        self.entry.re = Some(re.to_string());
        self
    }

    pub fn build(self) -> RawCommandEntry {
        self.entry
    }
}
