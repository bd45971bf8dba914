//! Bounded pagination over list APIs.

use std::future::Future;

/// One page returned by a list call.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token for marker-based APIs.
    pub next: Option<String>,
    /// Whether the API reports further results.
    pub more: bool,
}

impl<T> Page<T> {
    /// A page from a page-numbered API, which never reports its own end.
    pub fn numbered(items: Vec<T>) -> Self {
        Self {
            items,
            next: None,
            more: true,
        }
    }
}

/// Limits for a pagination loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_pages: 100,
        }
    }
}

/// Fetch pages until one comes back shorter than `page_size`.
///
/// `fetch` receives the 1-based page number and the continuation token of the
/// previous page. The loop also ends when the API reports no further results,
/// and never runs more than `max_pages` iterations.
pub async fn collect_pages<T, E, F, Fut>(limits: PageLimits, mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let max_pages = limits.max_pages.max(1);
    let mut all = Vec::new();
    let mut token: Option<String> = None;

    for page_number in 1..=max_pages {
        let page = fetch(page_number, token.take()).await?;
        let done = page.items.len() < limits.page_size || !page.more;
        all.extend(page.items);
        if done {
            return Ok(all);
        }
        token = page.next;
    }

    tracing::warn!(
        max_pages,
        "pagination stopped at page limit; results may be incomplete"
    );
    Ok(all)
}
