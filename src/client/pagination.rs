//! Offset pagination driven by the `X-Next-Page` response header
//!
//! GitLab reports pagination solely through response headers: `X-Next-Page`
//! holds the next page number, or is empty on the last page.

use reqwest::header::HeaderMap;

use super::error::{ClientError, Result};

pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// One decoded page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Fetching(u32),
    Done,
}

/// Tracks the page to request next for a single listing.
///
/// Starts at page 1 and only reaches [PageState::Done] once upstream stops
/// announcing a next page.
#[derive(Debug)]
pub struct Paginator {
    endpoint: String,
    state: PageState,
    fetched: u32,
    max_pages: Option<u32>,
}

impl Paginator {
    pub fn new(endpoint: impl Into<String>, max_pages: Option<u32>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: PageState::Fetching(1),
            fetched: 0,
            max_pages,
        }
    }

    /// Page to request next, `None` once the listing is exhausted
    pub fn current(&self) -> Option<u32> {
        match self.state {
            PageState::Fetching(page) => Some(page),
            PageState::Done => None,
        }
    }

    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }

    /// Records a fetched page and moves to the page it announced.
    pub fn advance(&mut self, next_page: Option<u32>) -> Result<()> {
        self.fetched += 1;

        self.state = match next_page {
            None => PageState::Done,
            Some(_) if self.max_pages.is_some_and(|max| self.fetched >= max) => {
                return Err(ClientError::page_limit_exceeded(
                    self.endpoint.clone(),
                    self.fetched,
                ));
            },
            Some(page) => PageState::Fetching(page),
        };

        Ok(())
    }
}

/// Reads the continuation signal from a response's headers
pub fn next_page_from_headers(endpoint: &str, headers: &HeaderMap) -> Result<Option<u32>> {
    match headers.get(NEXT_PAGE_HEADER) {
        None => Ok(None),
        Some(value) => match value.to_str() {
            Ok(value) => parse_next_page(endpoint, Some(value)),
            Err(_) => Err(ClientError::malformed_page_header(
                endpoint,
                String::from_utf8_lossy(value.as_bytes()),
            )),
        },
    }
}

/// Parses an `X-Next-Page` value: absent or blank ends the listing, a positive
/// decimal number continues it, anything else is a protocol violation.
pub fn parse_next_page(endpoint: &str, value: Option<&str>) -> Result<Option<u32>> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(value) => value,
    };

    match value.parse::<u32>() {
        Ok(page) if page > 0 => Ok(Some(page)),
        _ => Err(ClientError::malformed_page_header(endpoint, value)),
    }
}
