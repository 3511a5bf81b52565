// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP page fetcher. GETs a document with reqwest, then hands the body to a
// markup renderer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docmorph_core::error::{DocMorphError, Result};
use reqwest::{Client, Url};
use tracing::{debug, info, instrument};

use super::traits::{MarkupRenderer, PageFetcher, RenderSurface};

pub struct HttpFetcher {
    client: Client,
    renderer: Arc<dyn MarkupRenderer>,
}

impl HttpFetcher {
    pub fn new(renderer: Arc<dyn MarkupRenderer>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("docmorph/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| DocMorphError::render(format!("cannot build HTTP client: {err}")))?;
        Ok(Self { client, renderer })
    }
}

/// Accept only absolute http(s) URLs.
pub fn parse_capture_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|err| DocMorphError::validation(format!("not a valid URL '{url}': {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(DocMorphError::validation(format!(
            "unsupported URL scheme '{other}', expected http or https"
        ))),
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch_page(&self, url: &str, width: u32, timeout: Duration) -> Result<Box<dyn RenderSurface>> {
        let url = parse_capture_url(url)?;

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                if err.is_timeout() {
                    DocMorphError::timeout(format!("{url} did not respond within {timeout:?}"))
                } else {
                    DocMorphError::render(format!("failed to fetch {url}: {err}"))
                }
            })?;

        let body = response
            .text()
            .await
            .map_err(|err| DocMorphError::render(format!("failed to read body of {url}: {err}")))?;
        info!(bytes = body.len(), "page fetched");

        let surface = self.renderer.render_markup(&body, width)?;
        debug!(width = surface.width(), height = surface.height(), "page rendered");
        Ok(surface)
    }
}
