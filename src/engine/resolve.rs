// src/engine/resolve.rs

//! From a file path to the list of sub-commands it should run.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::template::{FileParams, TemplateCache};
use crate::watch::path_utils::{relative_str, to_slash};
use crate::watch::patterns::WatchPatterns;

static NEWLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r\n|\n\r|\n|\r").expect("newline regex should compile")
});

/// Split a rendered command on `\r\n`, `\n\r`, `\n` or `\r`, trimming
/// each line and dropping blank ones.
pub fn split_commands(rendered: &str) -> Vec<String> {
    NEWLINE
        .split(rendered)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Identity of "this resolved command line" for locking and queueing.
pub fn invocation_key(commands: &[String]) -> String {
    commands.join("\n")
}

/// Slash form of `path` used for pattern and config matching.
///
/// If an absolute path fails to match, its form relative to the working
/// directory is tried, so `*.py` still matches `/work/a.py`.
pub fn matching_path(patterns: &WatchPatterns, path: &Path) -> Option<String> {
    let slashed = to_slash(path);
    if patterns.matches(&slashed) {
        return Some(slashed);
    }
    if path.is_absolute() {
        let cwd = std::env::current_dir().ok()?;
        let rel = relative_str(&cwd, path)?;
        if patterns.matches(&rel) {
            return Some(rel);
        }
    }
    None
}

/// Sub-commands for `path`, or `None` if the event should be dropped.
///
/// Failures are reported and absorbed here; nothing is fatal.
pub fn resolve_commands(
    patterns: &WatchPatterns,
    config: &Config,
    templates: &TemplateCache,
    path: &Path,
) -> Option<Vec<String>> {
    let Some(file) = matching_path(patterns, path) else {
        debug!(path = %to_slash(path), "no watch pattern matches");
        return None;
    };

    let entry = config.find_command(&file)?;
    let params = FileParams::from_path(Path::new(&file)).to_map();
    let rendered = match templates.render(&entry.cmd, &params) {
        Ok(rendered) => rendered,
        Err(err) => {
            info!("{err}");
            return None;
        }
    };

    let commands = split_commands(&rendered);
    if commands.is_empty() {
        debug!(file = %file, "Command not found");
        return None;
    }
    Some(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandEntry, LogTemplates};

    fn config_with(entries: Vec<CommandEntry>) -> Config {
        Config {
            commands: entries,
            log: LogTemplates::default(),
        }
    }

    fn py_entry(cmd: &str) -> CommandEntry {
        CommandEntry {
            ext: Some(".py".to_string()),
            re: None,
            cmd: cmd.to_string(),
        }
    }

    #[test]
    fn splits_on_every_newline_flavour() {
        assert_eq!(
            split_commands("a\r\nb\n\rc\nd\re\n\n   \n  f  "),
            vec!["a", "b", "c", "d", "e", "f"]
        );
        assert!(split_commands(" \n ").is_empty());
    }

    #[test]
    fn renders_first_matching_entry() {
        let patterns = WatchPatterns::new(&["*.py".to_string()]);
        let config = config_with(vec![py_entry(r#"python "{{file}}""#), py_entry("never")]);
        let cache = TemplateCache::new();

        let commands = resolve_commands(&patterns, &config, &cache, Path::new("a.py")).unwrap();
        assert_eq!(commands, vec![r#"python "a.py""#]);
        assert_eq!(invocation_key(&commands), r#"python "a.py""#);
    }

    #[test]
    fn multi_line_commands_share_one_key() {
        let patterns = WatchPatterns::new(&["*.py".to_string()]);
        let config = config_with(vec![py_entry("echo {{base0}}\necho {{ext}}\n")]);
        let cache = TemplateCache::new();

        let commands = resolve_commands(&patterns, &config, &cache, Path::new("a.py")).unwrap();
        assert_eq!(commands, vec!["echo a", "echo .py"]);
        assert_eq!(invocation_key(&commands), "echo a\necho .py");
    }

    #[test]
    fn unmatched_paths_and_bad_templates_are_dropped() {
        let patterns = WatchPatterns::new(&["*.py".to_string()]);
        let cache = TemplateCache::new();

        let config = config_with(vec![py_entry("python {{file}}")]);
        assert!(resolve_commands(&patterns, &config, &cache, Path::new("a.rb")).is_none());
        assert!(resolve_commands(&patterns, &config, &cache, Path::new("lib/a.py")).is_none());

        let broken = config_with(vec![py_entry("python {{file}")]);
        assert!(resolve_commands(&patterns, &broken, &cache, Path::new("a.py")).is_none());
    }

    #[test]
    fn absolute_paths_fall_back_to_cwd_relative() {
        let patterns = WatchPatterns::new(&["*.py".to_string()]);
        let abs = std::env::current_dir().unwrap().join("a.py");
        assert_eq!(matching_path(&patterns, &abs).as_deref(), Some("a.py"));
    }
}
