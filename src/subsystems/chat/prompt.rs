//! Layered prompt builder for the system preamble.
//!
//! Prompts are assembled from plain-text fragments stored under the
//! configured prompts directory (`config/prompts/` by default). Each layer
//! is appended in order; missing files are skipped, or replaced by a
//! built-in fallback when one is given.
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const SEPARATOR: &str = "\n\n";

/// Persona used when `persona.md` is absent.
pub const DEFAULT_PERSONA: &str = "You are {{title}}, a friendly assistant having a conversation with a human. \
You are talkative and provide lots of specific details from the conversation. \
If you do not know the answer to a question, you truthfully say that you do not know.";

/// Fluent builder that assembles a layered prompt from template files.
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append a layer loaded from `filename`; skipped when the file is missing.
    pub fn layer(self, filename: &str) -> Self {
        self.load_layer(filename, None)
    }

    /// Append a layer loaded from `filename`, or `fallback` when the file is missing.
    pub fn layer_or(self, filename: &str, fallback: &str) -> Self {
        self.load_layer(filename, Some(fallback))
    }

    fn load_layer(mut self, filename: &str, fallback: Option<&str>) -> Self {
        let path = self.prompts_dir.join(filename);
        let text = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found", path.display());
                fallback.map(str::to_string)
            }
        };
        if let Some(text) = text {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                self.parts.push(trimmed.to_string());
            }
        }
        self
    }

    /// Directly append a text fragment.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register a `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join all layers with blank lines and apply variable substitution.
    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            let placeholder = format!("{{{{{}}}}}", k);
            prompt = prompt.replace(&placeholder, v);
        }
        prompt
    }
}

/// The system preamble for a chat with the bot named `title`.
pub fn system_prompt(prompts_dir: impl Into<PathBuf>, title: &str) -> String {
    PromptBuilder::new(prompts_dir)
        .layer_or("persona.md", DEFAULT_PERSONA)
        .layer("guidelines.md")
        .var("title", title)
        .build()
}
