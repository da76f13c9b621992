/// Per-form configuration supplied by the host page
use serde::{Deserialize, Serialize};
use url::Url;
use wasm_bindgen::JsValue;

use crate::error::ShareError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_STATUS_DISMISS_MS: u32 = 3000;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    pub api_base_url: String,
    pub tags_path: String,
    pub submit_path: String,
    /// JSON key carrying the primary value in the submission payload
    pub primary_field: String,
    /// Used in prompts such as "Please enter a link"
    pub primary_label: String,
    pub placeholder: String,
    pub require_url: bool,
    pub success_message: String,
    pub failure_message: String,
    pub status_dismiss_ms: u32,
    /// 0 turns off recent submission tracking
    pub recent_limit: usize,
    /// Element to mount into; the document body when absent
    pub mount_id: Option<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        FormConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            tags_path: "/tags".to_string(),
            submit_path: "/urls".to_string(),
            primary_field: "url".to_string(),
            primary_label: "link".to_string(),
            placeholder: "Paste a link to share...".to_string(),
            require_url: true,
            success_message: "Link shared successfully!".to_string(),
            failure_message: "Failed to share link. Please try again.".to_string(),
            status_dismiss_ms: DEFAULT_STATUS_DISMISS_MS,
            recent_limit: DEFAULT_RECENT_LIMIT,
            mount_id: None,
        }
    }
}

impl FormConfig {
    /// Link sharing form posting `{ url, tags }` to `/urls`
    pub fn share_link(api_base_url: &str) -> FormConfig {
        FormConfig {
            api_base_url: api_base_url.to_string(),
            ..FormConfig::default()
        }
    }

    /// Webhook registration form posting `{ webhook_url, tags }` to `/webhooks`
    pub fn webhook(api_base_url: &str) -> FormConfig {
        FormConfig {
            api_base_url: api_base_url.to_string(),
            submit_path: "/webhooks".to_string(),
            primary_field: "webhook_url".to_string(),
            primary_label: "webhook URL".to_string(),
            placeholder: "https://example.com/webhook".to_string(),
            require_url: false,
            success_message: "✓ Webhook registered successfully!".to_string(),
            failure_message: "Failed to register webhook".to_string(),
            recent_limit: 0,
            ..FormConfig::default()
        }
    }

    /// Parse the object handed over by JavaScript; missing keys take defaults
    pub fn from_js(value: JsValue) -> Result<FormConfig, ShareError> {
        let config: FormConfig = if value.is_null() || value.is_undefined() {
            FormConfig::default()
        } else {
            serde_wasm_bindgen::from_value(value).map_err(|e| ShareError::Config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ShareError> {
        if self.primary_field.is_empty() || self.primary_field == "tags" {
            return Err(ShareError::Config(format!(
                "primaryField cannot be \"{}\"",
                self.primary_field
            )));
        }
        self.tags_url()?;
        self.submit_url()?;
        Ok(())
    }

    pub fn tags_url(&self) -> Result<Url, ShareError> {
        self.endpoint(&self.tags_path)
    }

    pub fn submit_url(&self) -> Result<Url, ShareError> {
        self.endpoint(&self.submit_path)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ShareError> {
        let base = self.api_base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| ShareError::Config(format!("bad endpoint for {}: {}", path, e)))
    }
}
