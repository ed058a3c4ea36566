// src/engine/progress.rs

//! Start/end lines printed around each sub-command.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::config::LogTemplates;
use crate::engine::template::TemplateCache;

fn common_params(command: &str, now: DateTime<Local>) -> HashMap<&'static str, String> {
    HashMap::from([
        ("command", command.to_string()),
        ("YYYY", now.format("%Y").to_string()),
        ("MM", now.format("%m").to_string()),
        ("DD", now.format("%d").to_string()),
        ("HH", now.format("%H").to_string()),
        ("mm", now.format("%M").to_string()),
        ("ss", now.format("%S").to_string()),
        ("SSS", format!("{:03}", now.timestamp_subsec_millis() % 1000)),
    ])
}

/// Parameters for the start line. `step` is only set for multi-command runs.
pub fn start_params(
    command: &str,
    index: usize,
    total: usize,
    now: DateTime<Local>,
) -> HashMap<&'static str, String> {
    let mut params = common_params(command, now);
    if total >= 2 {
        params.insert("step", format!("({}/{})", index + 1, total));
    }
    params
}

pub fn end_params(
    command: &str,
    elapsed: Duration,
    now: DateTime<Local>,
) -> HashMap<&'static str, String> {
    let mut params = common_params(command, now);
    params.insert("elapsed_ms", elapsed.as_millis().to_string());
    params
}

/// Renders the configured templates and prints non-empty results.
#[derive(Debug, Clone, Copy)]
pub struct ProgressLog<'a> {
    templates: &'a LogTemplates,
    cache: &'a TemplateCache,
}

impl<'a> ProgressLog<'a> {
    pub fn new(templates: &'a LogTemplates, cache: &'a TemplateCache) -> Self {
        Self { templates, cache }
    }

    pub fn start(&self, command: &str, index: usize, total: usize) {
        let params = start_params(command, index, total, Local::now());
        self.emit(&self.templates.start, &params);
    }

    pub fn end(&self, command: &str, elapsed: Duration) {
        let params = end_params(command, elapsed, Local::now());
        self.emit(&self.templates.end, &params);
    }

    fn emit(&self, template: &str, params: &HashMap<&'static str, String>) {
        match self.cache.render(template, params) {
            Ok(line) if line.is_empty() => {}
            Ok(line) => info!("{line}"),
            Err(err) => warn!(error = %err, "log template failed to render"),
        }
    }
}
