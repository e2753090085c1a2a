//! Bitbucket Cloud API client implementation.

use async_trait::async_trait;
use bkt_core::config::Config;
use bkt_core::types::{page_len_for, require_repository};
use bkt_core::{
    CommentPullRequestOptions, Context, CreatePullRequestInput, Error, PullRequest,
    PullRequestComment, PullRequestListOptions, PullRequestReader, PullRequestWriter, Result,
    UpdatePullRequestInput,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::form_urlencoded;

use crate::pagination::collect_pages;
use crate::transport::{ClientOptions, Credentials, HttpTransport, NO_BODY};
use crate::types::{
    BranchSpec, CommentContent, CreateCommentRequest, CreatePullRequestRequest, InlineRequest,
    ReviewerRef, UpdatePullRequestRequest,
};

/// Characters left as-is in a path segment (RFC 3986 unreserved).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Bitbucket Cloud API client.
///
/// Holds only read-only configuration, so one client can serve concurrent
/// calls.
#[derive(Debug)]
pub struct BitbucketClient {
    http: HttpTransport,
}

impl BitbucketClient {
    /// Create a new client from explicit options.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(options)?,
        })
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        Self::new(ClientOptions::new(base_url, credentials))
    }

    /// Create a client from the config file and credentials in the
    /// environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let bitbucket = config.bitbucket_or_default();
        let credentials = Credentials::from_env(bitbucket.username.as_deref());
        Self::with_base_url(bitbucket.base_url, credentials)
    }

    /// Underlying transport, for endpoints this client does not wrap.
    pub fn transport(&self) -> &HttpTransport {
        &self.http
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let request = self.http.new_request(ctx, method, path, body)?;
        self.http.execute(request).await
    }
}

// =============================================================================
// Paths
// =============================================================================

fn escape_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn pull_requests_path(workspace: &str, repo_slug: &str) -> String {
    format!(
        "/repositories/{}/{}/pullrequests",
        escape_segment(workspace),
        escape_segment(repo_slug)
    )
}

fn pull_request_path(workspace: &str, repo_slug: &str, id: u64) -> String {
    format!("{}/{}", pull_requests_path(workspace, repo_slug), id)
}

fn comments_path(workspace: &str, repo_slug: &str, id: u64) -> String {
    format!("{}/comments", pull_request_path(workspace, repo_slug, id))
}

/// Listing path with `pagelen`, `state` and `q` query parameters.
fn list_path(workspace: &str, repo_slug: &str, opts: &PullRequestListOptions) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("pagelen", &opts.page_len().to_string());
    if let Some(state) = opts.state_filter() {
        query.append_pair("state", &state);
    }
    if let Some(author) = opts.author_filter() {
        query.append_pair("q", &format!("author.username=\"{}\"", author));
    }

    format!("{}?{}", pull_requests_path(workspace, repo_slug), query.finish())
}

// =============================================================================
// Payload builders
// =============================================================================

/// Validate `input` and build the creation payload.
pub(crate) fn build_create_request(
    input: &CreatePullRequestInput,
) -> Result<CreatePullRequestRequest> {
    input.validate()?;

    Ok(CreatePullRequestRequest {
        title: input.title.clone(),
        description: input.description.clone().filter(|d| !d.is_empty()),
        source: BranchSpec::named(&input.source),
        destination: BranchSpec::named(&input.destination),
        close_source_branch: input.close_source_branch,
        reviewers: input
            .reviewers
            .iter()
            .map(|username| ReviewerRef {
                username: username.clone(),
            })
            .collect(),
    })
}

/// Build the sparse update payload, rejecting it if nothing is set.
pub(crate) fn build_update_request(
    input: &UpdatePullRequestInput,
) -> Result<UpdatePullRequestRequest> {
    if input.is_empty() {
        return Err(Error::validation(
            "at least one field (title or description) must be provided",
        ));
    }

    Ok(UpdatePullRequestRequest {
        title: input.title.clone(),
        description: input.description.clone(),
    })
}

/// Validate `opts` and build the comment payload.
pub(crate) fn build_comment_request(
    opts: &CommentPullRequestOptions,
) -> Result<CreateCommentRequest> {
    let inline = opts.validate()?.map(|location| InlineRequest {
        path: location.path,
        to: location.to,
        from: location.from,
    });

    Ok(CreateCommentRequest {
        content: CommentContent {
            raw: opts.text.clone(),
        },
        inline,
    })
}

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl PullRequestReader for BitbucketClient {
    async fn list_pull_requests(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        opts: &PullRequestListOptions,
    ) -> Result<Vec<PullRequest>> {
        require_repository(workspace, repo_slug)?;

        let path = list_path(workspace, repo_slug, opts);
        debug!(
            workspace = workspace,
            repo = repo_slug,
            limit = ?opts.item_limit(),
            "Listing pull requests"
        );

        collect_pages(&self.http, ctx, path, opts.item_limit()).await
    }

    async fn get_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
    ) -> Result<PullRequest> {
        require_repository(workspace, repo_slug)?;

        let path = pull_request_path(workspace, repo_slug, id);
        self.send(ctx, Method::GET, &path, NO_BODY).await
    }

    async fn list_pull_request_comments(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        limit: Option<usize>,
    ) -> Result<Vec<PullRequestComment>> {
        require_repository(workspace, repo_slug)?;

        let path = format!(
            "{}?pagelen={}",
            comments_path(workspace, repo_slug, id),
            page_len_for(limit)
        );
        collect_pages(&self.http, ctx, path, limit).await
    }
}

#[async_trait]
impl PullRequestWriter for BitbucketClient {
    async fn create_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        input: &CreatePullRequestInput,
    ) -> Result<PullRequest> {
        require_repository(workspace, repo_slug)?;
        let request = build_create_request(input)?;

        debug!(
            workspace = workspace,
            repo = repo_slug,
            source = %input.source,
            destination = %input.destination,
            "Creating pull request"
        );

        let path = pull_requests_path(workspace, repo_slug);
        self.send(ctx, Method::POST, &path, Some(&request)).await
    }

    async fn update_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        input: &UpdatePullRequestInput,
    ) -> Result<PullRequest> {
        require_repository(workspace, repo_slug)?;
        let request = build_update_request(input)?;

        let path = pull_request_path(workspace, repo_slug, id);
        self.send(ctx, Method::PUT, &path, Some(&request)).await
    }

    async fn comment_pull_request(
        &self,
        ctx: &Context,
        workspace: &str,
        repo_slug: &str,
        id: u64,
        opts: &CommentPullRequestOptions,
    ) -> Result<PullRequestComment> {
        require_repository(workspace, repo_slug)?;
        let request = build_comment_request(opts)?;

        debug!(
            workspace = workspace,
            repo = repo_slug,
            id = id,
            inline = request.inline.is_some(),
            "Commenting on pull request"
        );

        let path = comments_path(workspace, repo_slug, id);
        self.send(ctx, Method::POST, &path, Some(&request)).await
    }
}
