//! Cursor pagination over Bitbucket listing endpoints.

use bkt_core::{Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::transport::{HttpTransport, NO_BODY};
use crate::types::Paginated;

/// Fetch `path` and every page its `next` links lead to.
///
/// Stops at the last page or once `limit` items are collected, truncating to
/// exactly `limit`. A `limit` of `None` or `0` is unbounded. Any failure
/// discards what was collected so far.
pub async fn collect_pages<T: DeserializeOwned>(
    http: &HttpTransport,
    ctx: &Context,
    path: impl Into<String>,
    limit: Option<usize>,
) -> Result<Vec<T>> {
    let limit = limit.filter(|&l| l > 0);
    let mut path = path.into();
    let mut items = Vec::new();
    let mut pages = 0usize;

    loop {
        let request = http.new_request(ctx, Method::GET, &path, NO_BODY)?;
        let page: Paginated<T> = http.execute(request).await?;
        pages += 1;

        let next = page.next_link().map(str::to_string);
        items.extend(page.values);

        debug!(
            page = pages,
            collected = items.len(),
            has_next = next.is_some(),
            "Fetched page"
        );

        if let Some(limit) = limit {
            if items.len() >= limit {
                items.truncate(limit);
                break;
            }
        }

        match next {
            Some(link) => path = http.relative_path(&link)?,
            None => break,
        }
    }

    Ok(items)
}
