//! Pull request types shared by the client and the layers consuming it.
//!
//! Result types (`PullRequest`, `PullRequestComment`) mirror the Bitbucket
//! Cloud JSON shape so they can be decoded directly. Input types carry their
//! own validation, which always runs before any request is built.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default number of items requested per page.
pub const DEFAULT_PAGE_LEN: usize = 20;

/// Largest page size the API accepts.
pub const MAX_PAGE_LEN: usize = 100;

// =============================================================================
// Accounts and references
// =============================================================================

/// Bitbucket account as embedded in pull requests and comments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitRef {
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// One side (source or destination) of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestEndpoint {
    #[serde(default)]
    pub branch: BranchRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<Link>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<Link>,
}

/// Text as stored by the server: the raw input plus its rendered forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedText {
    #[serde(default)]
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

// =============================================================================
// Pull requests
// =============================================================================

/// Snapshot of a remote pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Server-defined lifecycle state, e.g. `OPEN`, `MERGED`, `DECLINED`.
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub author: Account,
    #[serde(default)]
    pub source: PullRequestEndpoint,
    #[serde(default)]
    pub destination: PullRequestEndpoint,
    #[serde(default)]
    pub links: PullRequestLinks,
    #[serde(default)]
    pub summary: RenderedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_on: Option<String>,
}

impl PullRequest {
    /// Browser URL of the pull request, when the server sent one.
    pub fn html_url(&self) -> Option<&str> {
        self.links.html.as_ref().map(|l| l.href.as_str())
    }
}

// =============================================================================
// Comments
// =============================================================================

/// File anchor of an inline comment as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineAnchor {
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u32>,
}

/// Comment on a pull request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestComment {
    pub id: u64,
    #[serde(default)]
    pub content: RenderedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Account>,
    #[serde(default)]
    pub created_on: String,
    #[serde(default)]
    pub updated_on: String,
    #[serde(default)]
    pub links: CommentLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineAnchor>,
}

impl PullRequestComment {
    /// Browser URL of the comment, when the server sent one.
    pub fn html_url(&self) -> Option<&str> {
        self.links.html.as_ref().map(|l| l.href.as_str())
    }

    /// Whether the comment is anchored to a file.
    pub fn is_inline(&self) -> bool {
        self.inline.is_some()
    }
}

// =============================================================================
// Inputs
// =============================================================================

/// Reject calls that do not name a repository.
pub fn require_repository(workspace: &str, repo_slug: &str) -> Result<()> {
    if workspace.is_empty() || repo_slug.is_empty() {
        return Err(Error::validation(
            "workspace and repository slug are required",
        ));
    }
    Ok(())
}

/// Query shape for listing pull requests.
#[derive(Debug, Clone, Default)]
pub struct PullRequestListOptions {
    /// State filter; empty or `all` (any case) disables filtering.
    pub state: Option<String>,
    /// Cap on the number of results across all pages; `None` or `0` is
    /// unbounded.
    pub limit: Option<usize>,
    /// Only pull requests authored by this username.
    pub mine: Option<String>,
}

impl PullRequestListOptions {
    /// Page size to request: the limit when it fits a single page, else 20.
    pub fn page_len(&self) -> usize {
        page_len_for(self.limit)
    }

    /// Overall item cap, `None` when unbounded.
    pub fn item_limit(&self) -> Option<usize> {
        self.limit.filter(|&l| l > 0)
    }

    /// Upper-cased state filter, `None` when listing every state.
    pub fn state_filter(&self) -> Option<String> {
        let state = self.state.as_deref()?.trim();
        if state.is_empty() || state.eq_ignore_ascii_case("all") {
            return None;
        }
        Some(state.to_uppercase())
    }

    /// Author filter, `None` when unset or empty.
    pub fn author_filter(&self) -> Option<&str> {
        self.mine.as_deref().filter(|m| !m.is_empty())
    }
}

/// Page size for an optional caller limit.
pub fn page_len_for(limit: Option<usize>) -> usize {
    match limit {
        Some(l) if l > 0 && l <= MAX_PAGE_LEN => l,
        _ => DEFAULT_PAGE_LEN,
    }
}

/// Parameters for opening a pull request.
#[derive(Debug, Clone, Default)]
pub struct CreatePullRequestInput {
    pub title: String,
    /// Omitted from the request when `None` or empty.
    pub description: Option<String>,
    pub source: String,
    pub destination: String,
    pub close_source_branch: bool,
    /// Reviewer usernames.
    pub reviewers: Vec<String>,
}

impl CreatePullRequestInput {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.source.trim().is_empty() || self.destination.trim().is_empty() {
            return Err(Error::validation(
                "source and destination branches are required",
            ));
        }
        Ok(())
    }
}

/// Sparse update of a pull request.
///
/// `None` leaves a field unchanged; `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdatePullRequestInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl UpdatePullRequestInput {
    /// True when neither field is present.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

/// Parameters for commenting on a pull request.
///
/// Setting `file_path` turns the comment into an inline comment on `line`,
/// or on the range `line_from..=line` when `line_from` is set.
#[derive(Debug, Clone, Default)]
pub struct CommentPullRequestOptions {
    pub text: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub line_from: Option<u32>,
}

/// Validated inline comment geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineLocation {
    pub path: String,
    pub to: u32,
    pub from: Option<u32>,
}

impl CommentPullRequestOptions {
    /// Check the text and line geometry, returning the inline location if
    /// the comment is anchored to a file.
    pub fn validate(&self) -> Result<Option<InlineLocation>> {
        if self.text.trim().is_empty() {
            return Err(Error::validation("comment text is required"));
        }

        let Some(path) = self.file_path.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        let to = match self.line {
            Some(line) if line > 0 => line,
            _ => {
                return Err(Error::validation(
                    "line number must be positive when file path is specified",
                ))
            }
        };

        let from = self.line_from.filter(|&f| f > 0);
        if let Some(from) = from {
            if from > to {
                return Err(Error::validation(format!(
                    "line range start ({}) must be less than or equal to end ({})",
                    from, to
                )));
            }
        }

        Ok(Some(InlineLocation {
            path: path.to_string(),
            to,
            from,
        }))
    }
}
