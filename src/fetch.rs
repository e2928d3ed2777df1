//! The page-fetching boundary: one bounded "give me `limit` items at `offset`"
//! request against the paginated provider, with a schema-validated decode so
//! nothing past this module handles untyped JSON.

use std::marker::PhantomData;

use async_trait::async_trait;
use geo::Point;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::PageError;
use crate::query::SearchParams;
use crate::types::{Page, Resource};

/// Wire-facing projection of a filter set: the query parameters sent to the
/// provider, excluding pagination (the fetcher owns `limit`/`offset`).
pub trait ProviderQuery: Send + Sync {
    fn request_params(&self) -> SearchParams;
}

/// Issues a single page request. Implementations must be idempotent for the
/// same arguments under a stable filter, and must resolve HTTP-level failure
/// to `Err(PageError)` so the aggregator can tell a failed page apart from a
/// page that succeeded with zero items.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Filters: ProviderQuery;

    async fn fetch_page(
        &self,
        filters: &Self::Filters,
        limit: u32,
        offset: u64,
    ) -> Result<Page, PageError>;
}

#[derive(Debug, Deserialize)]
struct WirePage {
    items: Vec<WireItem>,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct WireItem {
    id: String,
    category: String,
    #[serde(rename = "geoJson")]
    geo_json: WireFeature,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    geometry: WireGeometry,
    #[serde(default)]
    properties: Value,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    /// GeoJSON order: longitude first, latitude second.
    coordinates: [f64; 2],
}

/// Decodes a provider page body into a typed [`Page`].
pub fn decode_page(body: &[u8], limit: u32, offset: u64) -> Result<Page, PageError> {
    let wire: WirePage = serde_json::from_slice(body)?;

    let mut items = Vec::with_capacity(wire.items.len());
    for (index, item) in wire.items.into_iter().enumerate() {
        let [lon, lat] = item.geo_json.geometry.coordinates;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(PageError::InvalidCoordinate { index });
        }

        let mut metadata = item.extra;
        if !item.geo_json.properties.is_null() {
            metadata.insert("properties".to_string(), item.geo_json.properties);
        }

        items.push(Resource {
            id: item.id,
            category: item.category,
            position: Point::new(lon, lat),
            metadata: Value::Object(metadata),
        });
    }

    Ok(Page {
        items,
        total: wire.total,
        offset,
        limit,
    })
}

/// [`PageFetcher`] over HTTP GET with `limit`/`offset`/filter query
/// parameters and a JSON `{ items, total }` body.
pub struct HttpPageFetcher<F> {
    client: reqwest::Client,
    endpoint: Url,
    _filters: PhantomData<F>,
}

impl<F> HttpPageFetcher<F> {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        HttpPageFetcher {
            client,
            endpoint,
            _filters: PhantomData,
        }
    }
}

#[async_trait]
impl<F: ProviderQuery + 'static> PageFetcher for HttpPageFetcher<F> {
    type Filters = F;

    async fn fetch_page(
        &self,
        filters: &F,
        limit: u32,
        offset: u64,
    ) -> Result<Page, PageError> {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            query.append_pair("offset", &offset.to_string());
            for (key, value) in filters.request_params().iter() {
                query.append_pair(key, value);
            }
        }

        tracing::debug!(%url, "fetching page");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        decode_page(&body, limit, offset)
    }
}
