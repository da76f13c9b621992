/// Error kinds surfaced by the tag selector and the share form
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShareError {
    /// Listing the tag directory failed; the previous snapshot is kept
    #[error("Error fetching tags: {0}")]
    DirectoryFetch(String),

    #[error("Error adding tag \"{tag}\": {reason}")]
    TagCreate { tag: String, reason: String },

    /// Carries the server's `message` when one was returned
    #[error("{0}")]
    Submission(String),

    #[error("Please enter a {0}")]
    MissingValue(String),

    #[error("Please enter a valid URL")]
    InvalidUrl,

    #[error("Tags cannot be empty")]
    EmptyTag,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
