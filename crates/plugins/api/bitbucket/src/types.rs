//! Bitbucket Cloud request and envelope types.
//!
//! Request payloads are serialized once at the transport boundary; optional
//! keys are skipped entirely rather than sent as `null`.

use bkt_core::BranchRef;
use serde::{Deserialize, Serialize};

// =============================================================================
// Pagination
// =============================================================================

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    /// Link to the following page; absent or empty on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> Paginated<T> {
    /// Next page link, ignoring empty strings.
    pub fn next_link(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| !n.is_empty())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error envelope returned with non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    /// Usually a string, occasionally a structured object.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// `message: detail` when both are present, otherwise whichever is.
    pub fn describe(&self) -> String {
        let detail = match &self.detail {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        match (self.message.trim(), detail.as_str()) {
            (message, "") => message.to_string(),
            ("", detail) => detail.to_string(),
            (message, detail) => format!("{}: {}", message, detail),
        }
    }
}

// =============================================================================
// Pull request payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSpec {
    pub branch: BranchRef,
}

impl BranchSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            branch: BranchRef { name: name.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerRef {
    pub username: String,
}

/// Body of `POST /repositories/{workspace}/{repo}/pullrequests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePullRequestRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: BranchSpec,
    pub destination: BranchSpec,
    pub close_source_branch: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviewers: Vec<ReviewerRef>,
}

/// Body of `PUT /repositories/{workspace}/{repo}/pullrequests/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePullRequestRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// =============================================================================
// Comment payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentContent {
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineRequest {
    pub path: String,
    pub to: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
}

/// Body of `POST /repositories/{workspace}/{repo}/pullrequests/{id}/comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: CommentContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineRequest>,
}
