/// Reusable UI pieces: status banner and recent submissions

use log::warn;
use patternfly_yew::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use yew::prelude::*;

use crate::error::ShareError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Info,
    /// Transient problem, such as the directory failing to load
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        StatusMessage {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    /// Errors stay until the next status replaces them
    pub fn auto_dismiss_after(&self, dismiss_ms: u32) -> Option<u32> {
        match self.kind {
            StatusKind::Success | StatusKind::Info | StatusKind::Warning => Some(dismiss_ms),
            StatusKind::Error => None,
        }
    }
}

impl From<&ShareError> for StatusMessage {
    fn from(error: &ShareError) -> Self {
        match error {
            ShareError::DirectoryFetch(_) => StatusMessage::warning(error.to_string()),
            _ => StatusMessage::error(error.to_string()),
        }
    }
}

/// Run `callback` once after `delay_ms`
pub fn schedule(delay_ms: u32, callback: impl FnOnce() + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let closure = Closure::once_into_js(callback);
    let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.unchecked_ref::<js_sys::Function>(),
        delay,
    ) {
        warn!("Failed to schedule timer: {:?}", e);
    }
}

#[derive(Properties, PartialEq)]
pub struct StatusBannerProps {
    #[prop_or_default]
    pub status: Option<StatusMessage>,
}

#[function_component(StatusBanner)]
pub fn status_banner(props: &StatusBannerProps) -> Html {
    let Some(status) = &props.status else {
        return html! {};
    };

    let (alert_type, title) = match status.kind {
        StatusKind::Success => (AlertType::Success, "Done"),
        StatusKind::Info => (AlertType::Info, "Info"),
        StatusKind::Warning => (AlertType::Warning, "Warning"),
        StatusKind::Error => (AlertType::Danger, "Error"),
    };

    html! {
        <div class="status" role="status">
            <Alert r#type={alert_type} title={title} inline={true}>
                {status.text.clone()}
            </Alert>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct RecentListProps {
    pub entries: Vec<String>,
}

#[function_component(RecentList)]
pub fn recent_list(props: &RecentListProps) -> Html {
    if props.entries.is_empty() {
        return html! {};
    }

    html! {
        <div class="recent-shares">
            <h2 class="recent-title">{"Recently shared"}</h2>
            <ul class="recent-list">
                {for props.entries.iter().map(|entry| html! {
                    <li key={entry.clone()} class="recent-item">{entry}</li>
                })}
            </ul>
        </div>
    }
}
