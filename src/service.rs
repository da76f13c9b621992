/// Remote collaborators: the tag directory and the submission endpoint
///
/// The traits are implemented over `fetch` in `api`; tests use the recording
/// doubles in `testing`.
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ShareError;
use crate::tag::Tag;

#[allow(async_fn_in_trait)]
pub trait TagDirectory {
    /// All tag names, in whatever order the server returns them
    async fn list_tags(&self) -> Result<Vec<String>, ShareError>;

    /// Create a tag, returning the server's confirmation message
    async fn create_tag(&self, tag: &Tag) -> Result<String, ShareError>;
}

#[allow(async_fn_in_trait)]
pub trait SubmissionService {
    async fn submit(&self, submission: &Submission) -> Result<(), ShareError>;
}

/// `GET /tags` body
#[derive(Debug, Clone, Deserialize)]
pub struct TagListResponse {
    pub tags: Vec<String>,
}

/// `POST /tags` body
#[derive(Debug, Clone, Serialize)]
pub struct CreateTagRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload posted to the submission endpoint.
///
/// Serializes as `{ <field>: value, "tags": [...] }`; the primary field name
/// comes from the form configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub field: String,
    pub value: String,
    pub tags: Vec<String>,
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.serialize_entry("tags", &self.tags)?;
        map.end()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|response| response.message)
}

pub fn parse_tag_list(status: u16, body: &str) -> Result<Vec<String>, ShareError> {
    if !is_success(status) {
        return Err(ShareError::DirectoryFetch(format!("HTTP {}", status)));
    }
    serde_json::from_str::<TagListResponse>(body)
        .map(|response| response.tags)
        .map_err(|e| ShareError::DirectoryFetch(e.to_string()))
}

/// A create only counts when the status is 2xx and the body carries `message`
pub fn parse_create_response(tag: &Tag, status: u16, body: &str) -> Result<String, ShareError> {
    let failure = |reason: String| ShareError::TagCreate {
        tag: tag.to_string(),
        reason,
    };

    if !is_success(status) {
        return Err(failure(parse_message(body).unwrap_or_else(|| format!("HTTP {}", status))));
    }
    parse_message(body).ok_or_else(|| failure("no confirmation message".to_string()))
}

pub fn parse_submission_response(status: u16, body: &str, fallback: &str) -> Result<(), ShareError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(ShareError::Submission(
            parse_message(body).unwrap_or_else(|| fallback.to_string()),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_uses_configured_field() {
        let submission = Submission {
            field: "webhook_url".to_string(),
            value: "https://hooks.example.com/x".to_string(),
            tags: vec!["news".to_string()],
        };

        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"webhook_url": "https://hooks.example.com/x", "tags": ["news"]})
        );
    }

    #[test]
    fn test_submission_with_no_tags() {
        let submission = Submission {
            field: "url".to_string(),
            value: "https://example.com".to_string(),
            tags: Vec::new(),
        };

        let json = serde_json::to_string(&submission).unwrap();
        assert_eq!(json, r#"{"url":"https://example.com","tags":[]}"#);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(
            parse_tag_list(200, r#"{"tags": ["news", "music"]}"#),
            Ok(vec!["news".to_string(), "music".to_string()])
        );
        assert!(matches!(
            parse_tag_list(200, "not json"),
            Err(ShareError::DirectoryFetch(_))
        ));
        assert_eq!(
            parse_tag_list(503, ""),
            Err(ShareError::DirectoryFetch("HTTP 503".to_string()))
        );
    }

    #[test]
    fn test_parse_create_response() {
        let tag = Tag::new("xyz").unwrap();

        assert_eq!(
            parse_create_response(&tag, 201, r#"{"message": "Tag created"}"#),
            Ok("Tag created".to_string())
        );
        assert_eq!(
            parse_create_response(&tag, 200, r#"{}"#),
            Err(ShareError::TagCreate {
                tag: "xyz".to_string(),
                reason: "no confirmation message".to_string(),
            })
        );
        assert_eq!(
            parse_create_response(&tag, 409, r#"{"message": "exists"}"#),
            Err(ShareError::TagCreate {
                tag: "xyz".to_string(),
                reason: "exists".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_submission_response() {
        assert_eq!(parse_submission_response(204, "", "failed"), Ok(()));
        assert_eq!(
            parse_submission_response(400, r#"{"message": "Invalid webhook"}"#, "failed"),
            Err(ShareError::Submission("Invalid webhook".to_string()))
        );
        assert_eq!(
            parse_submission_response(500, "<html>", "failed"),
            Err(ShareError::Submission("failed".to_string()))
        );
    }
}
