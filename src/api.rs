/// `fetch`-backed implementations of the tag directory and submission service
use serde::Serialize;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::config::FormConfig;
use crate::error::ShareError;
use crate::service::{
    CreateTagRequest, Submission, SubmissionService, TagDirectory, parse_create_response,
    parse_submission_response, parse_tag_list,
};
use crate::tag::Tag;

struct RawResponse {
    status: u16,
    body: String,
}

fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

async fn send(method: &str, url: &Url, body: Option<String>) -> Result<RawResponse, String> {
    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = &body {
        init.set_body(&JsValue::from_str(body));
    }

    let request = Request::new_with_str_and_init(url.as_str(), &init).map_err(describe)?;
    if body.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(describe)?;
    }

    let window = web_sys::window().ok_or_else(|| "No window".to_string())?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(describe)?
        .dyn_into()
        .map_err(describe)?;

    let text = JsFuture::from(response.text().map_err(describe)?)
        .await
        .map_err(describe)?;

    Ok(RawResponse {
        status: response.status(),
        body: text.as_string().unwrap_or_default(),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to serialize: {}", e))
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpTagDirectory {
    tags_url: Url,
}

impl HttpTagDirectory {
    pub fn from_config(config: &FormConfig) -> Result<Self, ShareError> {
        Ok(HttpTagDirectory {
            tags_url: config.tags_url()?,
        })
    }
}

impl TagDirectory for HttpTagDirectory {
    async fn list_tags(&self) -> Result<Vec<String>, ShareError> {
        let response = send("GET", &self.tags_url, None)
            .await
            .map_err(ShareError::DirectoryFetch)?;
        parse_tag_list(response.status, &response.body)
    }

    async fn create_tag(&self, tag: &Tag) -> Result<String, ShareError> {
        let failure = |reason: String| ShareError::TagCreate {
            tag: tag.to_string(),
            reason,
        };

        let body = to_json(&CreateTagRequest { name: tag.as_str() }).map_err(failure)?;
        let response = send("POST", &self.tags_url, Some(body))
            .await
            .map_err(failure)?;
        parse_create_response(tag, response.status, &response.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpSubmission {
    submit_url: Url,
    failure_message: String,
}

impl HttpSubmission {
    pub fn from_config(config: &FormConfig) -> Result<Self, ShareError> {
        Ok(HttpSubmission {
            submit_url: config.submit_url()?,
            failure_message: config.failure_message.clone(),
        })
    }
}

impl SubmissionService for HttpSubmission {
    async fn submit(&self, submission: &Submission) -> Result<(), ShareError> {
        let body = to_json(submission).map_err(ShareError::Submission)?;
        let response = send("POST", &self.submit_url, Some(body))
            .await
            .map_err(|e| {
                log::error!("Submission request failed: {}", e);
                ShareError::Submission(self.failure_message.clone())
            })?;
        parse_submission_response(response.status, &response.body, &self.failure_message)
    }
}
