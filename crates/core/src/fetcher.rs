use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    cache::{CacheKey, SegmentCache},
    error::FetchError,
    provider::ProviderConfig,
    types::{DEFAULT_CATEGORY, Segment, SegmentList, VideoId, empty_segments},
};

/// Transport for segment lookups. Returns the provider's decoded JSON body.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn lookup(&self, video: &VideoId, categories: &[String]) -> Result<Value, FetchError>;
}

/// Looks segments up over HTTP, one GET per call.
pub struct HttpSegmentSource {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl HttpSegmentSource {
    pub fn new(config: ProviderConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SegmentSource for HttpSegmentSource {
    async fn lookup(&self, video: &VideoId, categories: &[String]) -> Result<Value, FetchError> {
        let categories = serde_json::to_string(categories)?;

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&[("videoID", video.as_str()), ("categories", categories.as_str())])
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a provider body into a sorted segment list.
///
/// Records carrying a `segment: [start, end]` pair or numeric `start`/`end`
/// fields are kept; anything else is dropped without error. The sort is stable,
/// so equal starts keep provider order.
pub fn parse_segments(body: &Value) -> Result<Vec<Segment>, FetchError> {
    let records = body
        .as_array()
        .ok_or_else(|| FetchError::UnexpectedShape(json_kind(body)))?;

    let mut segments: Vec<Segment> = records.iter().filter_map(segment_from_record).collect();
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(segments)
}

fn segment_from_record(record: &Value) -> Option<Segment> {
    let (start, end) = match record.get("segment").and_then(Value::as_array) {
        Some(pair) => (coerce_number(pair.first()), coerce_number(pair.get(1))),
        None => (
            record.get("start")?.as_f64()?,
            record.get("end")?.as_f64()?,
        ),
    };

    let start = start.max(0.0);
    if end <= start {
        return None;
    }

    let category = record
        .get("category")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_CATEGORY);

    Some(Segment::new(start, end, category))
}

// Numbers and numeric strings pass through, everything else reads as 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Cache-backed segment resolution. Cloning shares the cache and the source.
#[derive(Clone)]
pub struct SegmentFetcher {
    source: Arc<dyn SegmentSource>,
    cache: Arc<Mutex<SegmentCache>>,
}

impl SegmentFetcher {
    pub fn new(source: Arc<dyn SegmentSource>) -> Self {
        Self {
            source,
            cache: Arc::new(Mutex::new(SegmentCache::new())),
        }
    }

    pub fn http(config: ProviderConfig) -> crate::Result<Self> {
        Ok(Self::new(Arc::new(HttpSegmentSource::new(config)?)))
    }

    /// Resolve segments, reporting why a lookup failed. Failures are not cached.
    /// An empty category set resolves to an empty list without a lookup.
    pub async fn try_fetch(
        &self,
        video: &VideoId,
        categories: &[String],
    ) -> Result<SegmentList, FetchError> {
        if categories.is_empty() {
            return Ok(empty_segments());
        }

        let key = CacheKey::new(video, categories);

        let cached = self.cache().get(&key);
        if let Some(hit) = cached {
            debug!(%video, categories = key.signature(), "segment cache hit");
            return Ok(hit);
        }

        let body = self.source.lookup(video, categories).await?;
        let segments = parse_segments(&body)?;
        debug!(%video, count = segments.len(), "segments resolved");

        Ok(self.cache().insert(key, Arc::from(segments)))
    }

    /// Resolve segments; any failure degrades to an empty list.
    pub async fn fetch(&self, video: &VideoId, categories: &[String]) -> SegmentList {
        match self.try_fetch(video, categories).await {
            Ok(segments) => segments,
            Err(err) => {
                warn!(%video, error = %err, "segment lookup failed");
                empty_segments()
            }
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache().len()
    }

    // Entries are inserted whole, so a poisoned lock still guards a
    // consistent map.
    fn cache(&self) -> std::sync::MutexGuard<'_, SegmentCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
