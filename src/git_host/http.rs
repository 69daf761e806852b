// file: src/git_host/http.rs
// description: authenticated JSON client with page/per_page pagination
// reference: https://docs.rs/reqwest

use crate::error::{Result, WorklogError};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub const PER_PAGE: usize = 100;

/// Hard stop for runaway pagination.
pub const MAX_PAGES: usize = 100;

pub type Query = Vec<(&'static str, String)>;

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    service: &'static str,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WorklogError::Config(format!("Failed to build {} HTTP client: {}", service, e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, path: &str, query: &[(&'static str, String)]) -> Result<Response> {
        let url = self.url(path);
        debug!("{} GET {} {:?}", self.service, url, query);

        self.client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| WorklogError::remote(self.service, format!("request to {} failed: {}", url, e)))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WorklogError::remote(
                self.service,
                format!("request failed with status {}: {}", status, body),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            WorklogError::remote(self.service, format!("malformed response payload: {}", e))
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let response = self.send(path, query).await?;
        self.decode(response).await
    }

    /// Like `get_json`, but a 404 yields `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Option<T>> {
        let response = self.send(path, query).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.decode(response).await.map(Some)
    }

    /// Follows `page` until a page comes back shorter than `per_page`.
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut page_query = query.to_vec();
            page_query.push(("page", page.to_string()));
            page_query.push(("per_page", PER_PAGE.to_string()));

            let batch: Vec<T> = self.get_json(path, &page_query).await?;
            let batch_len = batch.len();
            items.extend(batch);

            if batch_len < PER_PAGE {
                break;
            }
        }

        debug!("{} {} returned {} items", self.service, path, items.len());
        Ok(items)
    }
}
