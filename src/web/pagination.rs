use crate::config::ApiConfig;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use axum::extract::{FromRequestParts, Query};
use axum::http::header::HOST;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use url::form_urlencoded;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// A missing or unparsable `page_size` falls back to the default; an
    /// unparsable, zero or out-of-range `page` is an invalid page.
    pub fn resolve(params: &PageParams, api: &ApiConfig) -> Result<Self, ApiError> {
        let page = match params.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|&p| p > 0)
                .ok_or(ApiError::InvalidPage)?,
        };
        let page_size = params
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|&size| size > 0)
            .map_or(api.page_size, |size| size.min(api.max_page_size));

        // The last row of the page must be addressable as an SQLite offset.
        page.checked_mul(page_size)
            .filter(|&end| i64::try_from(end).is_ok())
            .ok_or(ApiError::InvalidPage)?;

        Ok(Self { page, page_size })
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn has_next(&self, count: i64) -> bool {
        i64::try_from(self.page.saturating_mul(self.page_size)).map_or(false, |end| end < count)
    }

    /// Page 1 always exists, even for an empty collection.
    pub fn check(&self, count: i64) -> Result<(), ApiError> {
        let past_end = i64::try_from(self.offset()).map_or(true, |offset| offset >= count);
        if self.page > 1 && past_end {
            return Err(ApiError::InvalidPage);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Page selection plus what is needed to link to neighbouring pages.
pub struct Pager {
    pub request: PageRequest,
    base: String,
    query: Vec<(String, String)>,
}

impl Pager {
    pub fn new(request: PageRequest, base: impl Into<String>, query: Option<&str>) -> Self {
        let query = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .filter(|(key, _)| key != "page")
                    .collect()
            })
            .unwrap_or_default();
        Self {
            request,
            base: base.into(),
            query,
        }
    }

    pub fn limit(&self) -> usize {
        self.request.limit()
    }

    pub fn offset(&self) -> usize {
        self.request.offset()
    }

    pub fn check(&self, count: i64) -> Result<(), ApiError> {
        self.request.check(count)
    }

    fn page_url(&self, page: usize) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.extend_pairs(self.query.iter());
        if page > 1 {
            serializer.append_pair("page", &page.to_string());
        }
        let query = serializer.finish();
        if query.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{}", self.base, query)
        }
    }

    pub fn page<T>(&self, count: i64, results: Vec<T>) -> Page<T> {
        let page = self.request.page;
        Page {
            count,
            next: self
                .request
                .has_next(count)
                .then(|| self.page_url(page + 1)),
            previous: (page > 1).then(|| self.page_url(page - 1)),
            results,
        }
    }
}

impl FromRequestParts<Arc<AppState>> for Pager {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        Box::pin(async move {
            let Query(params) = Query::<PageParams>::try_from_uri(&parts.uri)
                .map_err(|rejection| ApiError::Malformed(rejection.body_text()))?;
            let request = PageRequest::resolve(&params, &state.config.api)?;

            let path = parts.uri.path();
            let base = match parts.headers.get(HOST).and_then(|h| h.to_str().ok()) {
                Some(host) => format!("http://{}{}", host, path),
                None => path.to_string(),
            };

            Ok(Pager::new(request, base, parts.uri.query()))
        })
    }
}
