//! Provider traits for pull request hosting services.

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::types::{
    CommentPullRequestOptions, CreatePullRequestInput, PullRequest, PullRequestComment,
    PullRequestListOptions, UpdatePullRequestInput,
};

/// Read-only pull request operations.
#[async_trait]
pub trait PullRequestReader: Send + Sync {
    /// List pull requests of a repository, following pagination.
    async fn list_pull_requests(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        opts: &PullRequestListOptions,
    ) -> Result<Vec<PullRequest>>;

    /// Get a single pull request by id.
    async fn get_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<PullRequest>;

    /// List comments of a pull request; `limit` of `None` or `0` is unbounded.
    async fn list_pull_request_comments(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<PullRequestComment>>;
}

/// Pull request operations that change server state.
///
/// Implementations validate their input before issuing any request.
#[async_trait]
pub trait PullRequestWriter: Send + Sync {
    async fn create_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        input: &CreatePullRequestInput,
    ) -> Result<PullRequest>;

    async fn update_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        input: &UpdatePullRequestInput,
    ) -> Result<PullRequest>;

    async fn comment_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        opts: &CommentPullRequestOptions,
    ) -> Result<PullRequestComment>;
}
