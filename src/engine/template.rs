// src/engine/template.rs

//! `{{name}}` placeholder substitution for command and log templates.
//!
//! Values are inserted verbatim. Unknown names render as the empty string.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::watch::path_utils::{base_name, clean_path, dir_name, extension_with_dot, to_slash};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}({source_text})")]
pub struct TemplateError {
    pub message: String,
    pub source_text: String,
}

impl TemplateError {
    fn new(message: impl Into<String>, source_text: &str) -> Self {
        Self {
            message: message.into(),
            source_text: source_text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after_open = &rest[open + 2..];

            // `{{{name}}}` is accepted as a plain variable.
            let (inner, consumed) = if let Some(raw) = after_open.strip_prefix('{') {
                let close = raw
                    .find("}}}")
                    .ok_or_else(|| TemplateError::new("unmatched open tag", source))?;
                (&raw[..close], 1 + close + 3)
            } else {
                let close = after_open
                    .find("}}")
                    .ok_or_else(|| TemplateError::new("unmatched open tag", source))?;
                (&after_open[..close], close + 2)
            };

            let name = inner.trim();
            if name.is_empty() || name.contains("{{") {
                return Err(TemplateError::new("empty or malformed tag", source));
            }
            match name.chars().next() {
                Some('!') => {}
                Some('#' | '^' | '/' | '>' | '&' | '=') => {
                    return Err(TemplateError::new(
                        format!("unsupported tag '{{{{{name}}}}}'"),
                        source,
                    ));
                }
                _ => segments.push(Segment::Var(name.to_string())),
            }

            rest = &after_open[consumed..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn render(&self, params: &HashMap<&str, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(name) => {
                    if let Some(value) = params.get(name.as_str()) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

/// Parsed templates keyed by their source text.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: Mutex<HashMap<String, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Template>, TemplateError> {
        if let Some(template) = self.templates.lock().get(source) {
            return Ok(Arc::clone(template));
        }
        let template = Arc::new(Template::parse(source)?);
        self.templates
            .lock()
            .insert(source.to_string(), Arc::clone(&template));
        Ok(template)
    }

    pub fn render(
        &self,
        source: &str,
        params: &HashMap<&str, String>,
    ) -> Result<String, TemplateError> {
        Ok(self.get_or_parse(source)?.render(params))
    }

    pub fn len(&self) -> usize {
        self.templates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The placeholders available to command templates for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileParams {
    pub file: String,
    pub ext: String,
    pub base: String,
    pub abs: String,
    pub dir: String,
    pub base0: String,
    pub base1: String,
    pub base2: String,
}

impl FileParams {
    pub fn from_path(path: &Path) -> Self {
        let file = to_slash(path);
        let base = base_name(&file).to_string();

        let abs = std::path::absolute(path)
            .map(|p| to_slash(&clean_path(&p)))
            .unwrap_or_else(|_| file.clone());

        let parts: Vec<&str> = base.split('.').collect();
        let base_n = |n: usize| parts[..parts.len().min(n + 1)].join(".");

        Self {
            ext: extension_with_dot(&file).to_string(),
            dir: dir_name(&file),
            abs,
            base0: base_n(0),
            base1: base_n(1),
            base2: base_n(2),
            base,
            file,
        }
    }

    pub fn to_map(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("file", self.file.clone()),
            ("ext", self.ext.clone()),
            ("base", self.base.clone()),
            ("abs", self.abs.clone()),
            ("dir", self.dir.clone()),
            ("base0", self.base0.clone()),
            ("base1", self.base1.clone()),
            ("base2", self.base2.clone()),
        ])
    }
}
