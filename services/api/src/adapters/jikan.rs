//! services/api/src/adapters/jikan.rs
//!
//! This module contains the adapter for the Jikan anime metadata API.
//! It implements the `MetadataProvider` port from the `core` crate.

use anistream_core::domain::ExternalTitle;
use anistream_core::ports::{MetadataProvider, PortError, PortResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

const SEARCH_PAGE_SIZE: u32 = 20;

/// An adapter that implements `MetadataProvider` against a Jikan-compatible API.
#[derive(Clone)]
pub struct JikanAdapter {
    client: Client,
    base_url: String,
}

impl JikanAdapter {
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    data: AnimeRecord,
}

#[derive(Deserialize)]
struct AnimeRecord {
    mal_id: i64,
    title: String,
    title_japanese: Option<String>,
    synopsis: Option<String>,
    images: Option<Images>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    airing: bool,
    score: Option<f64>,
    year: Option<i32>,
    episodes: Option<i32>,
}

#[derive(Deserialize)]
struct Images {
    jpg: Option<JpgImages>,
}

#[derive(Deserialize)]
struct JpgImages {
    large_image_url: Option<String>,
}

#[derive(Deserialize)]
struct Genre {
    name: String,
}

impl AnimeRecord {
    fn into_external(self) -> ExternalTitle {
        ExternalTitle {
            external_id: self.mal_id,
            name: self.title,
            name_native: self.title_japanese,
            synopsis: self.synopsis,
            image_url: self
                .images
                .and_then(|images| images.jpg)
                .and_then(|jpg| jpg.large_image_url),
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            airing: self.airing,
            score: self.score,
            year: self.year,
            episodes: self.episodes,
        }
    }
}

#[async_trait]
impl MetadataProvider for JikanAdapter {
    async fn search(&self, query: &str, page: u32) -> PortResult<serde_json::Value> {
        let response = self
            .client
            .get(format!("{}/anime", self.base_url))
            .query(&[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("limit", SEARCH_PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PortError::Upstream(format!(
                "Metadata search failed with status {}",
                response.status()
            )));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed search response: {}", e)))
    }

    async fn fetch(&self, external_id: i64) -> PortResult<Option<ExternalTitle>> {
        let response = self
            .client
            .get(format!("{}/anime/{}", self.base_url, external_id))
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(PortError::Upstream(format!(
                    "Metadata lookup for {} failed with status {}",
                    external_id, status
                )))
            }
            _ => {}
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| PortError::Upstream(format!("Malformed anime response: {}", e)))?;
        Ok(Some(envelope.data.into_external()))
    }
}
