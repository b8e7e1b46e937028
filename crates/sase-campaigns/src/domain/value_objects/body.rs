//! Message body source
//!
//! A campaign body is either a pre-built template (by identifier) or raw
//! custom markup. `input_mode` decides which one is authoritative.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Template,
    Custom,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySource {
    pub input_mode: InputMode,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub custom_html: String,
}

impl BodySource {
    pub fn custom(html: impl Into<String>) -> Self {
        Self { input_mode: InputMode::Custom, template_id: None, custom_html: html.into() }
    }

    pub fn template(template_id: impl Into<String>) -> Self {
        Self { input_mode: InputMode::Template, template_id: Some(template_id.into()), custom_html: String::new() }
    }

    /// Markup used at send time. A template selection that never came back
    /// from the editor has no markup of its own.
    pub fn html(&self) -> &str {
        match self.input_mode {
            InputMode::Custom => &self.custom_html,
            InputMode::Template => "",
        }
    }

    /// Replace the body with markup returned from the template editor.
    pub fn apply_edited(&mut self, html: impl Into<String>) {
        self.custom_html = html.into();
        self.input_mode = InputMode::Custom;
    }
}
