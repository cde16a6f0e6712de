//! HTTP adapters for the persistence API, the buildable-area service and geocoding.
//!
//! Every request runs under `tokio::time::timeout`. Reads (snapshot loads and
//! address lookups) are retried with a linear backoff on network failures;
//! writes and computations are not.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use siteinspect_core::config::LayeredConfig;
use siteinspect_core::error::{Result, SiteError};
use siteinspect_core::models::{
    BuildableAreaRequest, BuildableAreaResponse, GeocodeLocation, GeocodeRequest, GeocodeResult,
    ProjectId, RawSnapshot, SnapshotKind,
};
use siteinspect_core::ports::{BuildableAreaService, Geocoder, SnapshotStore};
use tracing::{debug, warn};

/// Connection settings shared by the HTTP adapters
#[derive(Debug, Clone, PartialEq)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub geocode_timeout: Duration,
    pub read_retries: u32,
    pub retry_backoff: Duration,
}

impl HttpSettings {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            base_url: config.api_base_url.value.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            geocode_timeout: config.geocode_timeout(),
            read_retries: config.read_retries.value,
            retry_backoff: config.retry_backoff(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Run `future` with a deadline, mapping expiry to [`SiteError::Timeout`]
pub async fn with_timeout<T>(
    operation: &str,
    limit: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(SiteError::Timeout { operation: operation.to_string(), seconds: limit.as_secs() }),
    }
}

/// Retry a network operation up to `retries` extra times, waiting `backoff * attempt` in between.
///
/// Only network errors are retried.
pub async fn with_retries<T, F, Fut>(
    operation: &str,
    retries: u32,
    backoff: Duration,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_network() && failures < retries => {
                failures += 1;
                let delay = backoff * failures;
                warn!(operation, attempt = failures, delay_ms = delay.as_millis() as u64, error = %err, "Retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn transport(operation: &str, err: reqwest::Error) -> SiteError {
    SiteError::transport(operation, err)
}

async fn read_json<T: DeserializeOwned>(operation: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SiteError::transport(operation, format!("HTTP {}: {}", status, body)));
    }
    response.json().await.map_err(|e| transport(operation, e))
}

#[derive(Debug, Clone)]
struct HttpClient {
    settings: HttpSettings,
    client: reqwest::Client,
}

impl HttpClient {
    fn new(settings: HttpSettings) -> Self {
        Self { settings, client: reqwest::Client::new() }
    }

    async fn get<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        let url = self.settings.url(path);
        debug!(operation, %url, "GET");
        with_timeout(operation, self.settings.timeout, async {
            let response = self.client.get(&url).send().await.map_err(|e| transport(operation, e))?;
            read_json(operation, response).await
        })
        .await
    }

    async fn post<B, T>(&self, operation: &str, path: &str, body: &B, limit: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.settings.url(path);
        debug!(operation, %url, "POST");
        with_timeout(operation, limit, async {
            let response =
                self.client.post(&url).json(body).send().await.map_err(|e| transport(operation, e))?;
            read_json(operation, response).await
        })
        .await
    }
}

/// Snapshot persistence over the project API
#[derive(Debug, Clone)]
pub struct HttpSnapshotStore {
    http: HttpClient,
}

impl HttpSnapshotStore {
    pub fn new(settings: HttpSettings) -> Self {
        Self { http: HttpClient::new(settings) }
    }
}

/// Accept a bare array or an object wrapping it under `snapshots`
fn snapshot_list(body: Value) -> Result<Vec<RawSnapshot>> {
    let list = match body {
        Value::Object(mut map) => map.remove("snapshots").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| SiteError::SnapshotParse { reason: e.to_string() })
}

#[async_trait]
impl SnapshotStore for HttpSnapshotStore {
    async fn load_snapshots(&self, project: ProjectId) -> Result<Vec<RawSnapshot>> {
        let path = format!("/api/projects/{}/snapshots", project);
        let settings = &self.http.settings;
        let body: Value = with_retries("load_snapshots", settings.read_retries, settings.retry_backoff, || {
            self.http.get("load_snapshots", &path)
        })
        .await?;
        snapshot_list(body)
    }

    async fn save_snapshot(&self, project: ProjectId, kind: SnapshotKind, data: Value) -> Result<()> {
        let path = format!("/api/projects/{}/snapshots", project);
        let body = json!({ "type": kind.as_str(), "data": data });
        let _: Value = self.http.post("save_snapshot", &path, &body, self.http.settings.timeout).await?;
        Ok(())
    }
}

/// Remote buildable-area computation
#[derive(Debug, Clone)]
pub struct HttpBuildableAreaService {
    http: HttpClient,
}

impl HttpBuildableAreaService {
    pub fn new(settings: HttpSettings) -> Self {
        Self { http: HttpClient::new(settings) }
    }
}

#[async_trait]
impl BuildableAreaService for HttpBuildableAreaService {
    async fn calculate(&self, request: &BuildableAreaRequest) -> Result<BuildableAreaResponse> {
        self.http
            .post("calculate_buildable_area", "/api/calculate-buildable-area", request, self.http.settings.timeout)
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Address lookup through the geocoding endpoint
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    http: HttpClient,
}

impl HttpGeocoder {
    pub fn new(settings: HttpSettings) -> Self {
        Self { http: HttpClient::new(settings) }
    }
}

/// `display_name` may sit next to `location` or inside it
fn geocode_result(body: &Value) -> Option<GeocodeResult> {
    let location = body.get("location")?;
    let lng = location.get("lng")?.as_f64()?;
    let lat = location.get("lat")?.as_f64()?;
    let display_name = body
        .get("display_name")
        .or_else(|| location.get("display_name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(GeocodeResult { location: GeocodeLocation { lng, lat }, display_name })
}

/// Resolve `query`, calling `fetch` once per attempt.
///
/// Network failures are retried; an answer without a location is not.
async fn lookup_location<F, Fut>(
    query: &str,
    retries: u32,
    backoff: Duration,
    mut fetch: F,
) -> Result<GeocodeResult>
where
    F: FnMut(GeocodeRequest) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let query = query.trim();
    if query.is_empty() {
        return Err(SiteError::ConfigInvalid {
            key: "query".to_string(),
            reason: "Location query cannot be empty".to_string(),
        });
    }
    let request = GeocodeRequest { query: query.to_string() };
    let body = with_retries("geocode", retries, backoff, || fetch(request.clone())).await?;
    geocode_result(&body)
        .ok_or_else(|| SiteError::transport("geocode", format!("No results found for '{}'", query)))
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, query: &str) -> Result<GeocodeResult> {
        let settings = &self.http.settings;
        lookup_location(query, settings.read_retries, settings.retry_backoff, |request| async move {
            self.http
                .post("geocode", "/api/geocode-location", &request, settings.geocode_timeout)
                .await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_timeout_maps_to_timeout_error() {
        let result: Result<()> = with_timeout("slow", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(SiteError::Timeout { ref operation, .. }) if operation == "slow"));
    }

    #[tokio::test]
    async fn test_retries_network_errors_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retries("load", 2, Duration::from_millis(1), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(SiteError::transport("load", "connection reset"))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retries("load", 2, Duration::from_millis(1), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SiteError::transport("load", "down"))
        })
        .await;
        assert!(result.unwrap_err().is_network());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_network_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retries("load", 2, Duration::from_millis(1), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SiteError::EmptyResult)
        })
        .await;
        assert!(matches!(result, Err(SiteError::EmptyResult)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_geocode_retries_after_a_dropped_connection() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = lookup_location(" Jl. Sudirman 1 ", 2, Duration::from_millis(1), move |request| async move {
            assert_eq!(request.query, "Jl. Sudirman 1");
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SiteError::transport("geocode", "connection reset"))
            } else {
                Ok(json!({"location": {"lng": 106.82, "lat": -6.2}, "display_name": "Sudirman"}))
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.display_name, "Sudirman");
        assert_eq!(result.location.lng, 106.82);
    }

    #[tokio::test]
    async fn test_geocode_without_location_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = lookup_location("nowhere", 2, Duration::from_millis(1), move |_| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"results": []}))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let empty = lookup_location("  ", 2, Duration::from_millis(1), move |_| async move { Ok(json!({})) }).await;
        assert!(matches!(empty, Err(SiteError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_snapshot_list_shapes() {
        let bare = json!([{"type": "site_boundary", "data": {"coordinates": []}}]);
        assert_eq!(snapshot_list(bare).unwrap().len(), 1);

        let wrapped = json!({"snapshots": [{"type": "buildable_area", "data": "{}"}]});
        let snapshots = snapshot_list(wrapped).unwrap();
        assert_eq!(snapshots[0].kind, "buildable_area");
        assert_eq!(snapshots[0].data, Value::String("{}".to_string()));

        assert!(snapshot_list(json!({})).unwrap().is_empty());
        assert!(matches!(snapshot_list(json!("nope")), Err(SiteError::SnapshotParse { .. })));
    }

    #[test]
    fn test_geocode_result_shapes() {
        let flat = json!({"location": {"lng": 151.2, "lat": -33.8}, "display_name": "Sydney"});
        let result = geocode_result(&flat).unwrap();
        assert_eq!(result.display_name, "Sydney");
        assert_eq!(result.point().lat, -33.8);

        let nested = json!({"success": true, "location": {"lng": 1.0, "lat": 2.0, "display_name": "Somewhere"}});
        assert_eq!(geocode_result(&nested).unwrap().display_name, "Somewhere");

        assert!(geocode_result(&json!({"success": false})).is_none());
    }

    #[test]
    fn test_settings_trim_trailing_slash() {
        let mut config = LayeredConfig::with_defaults();
        config.api_base_url.value = "http://localhost:5000/".to_string();
        let settings = HttpSettings::from_config(&config);
        assert_eq!(settings.url("/api/geocode-location"), "http://localhost:5000/api/geocode-location");
    }
}
