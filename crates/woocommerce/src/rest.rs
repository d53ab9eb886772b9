//! REST implementation of [`ShopClient`].
//!
//! Requests go to `<base_url>/wp-json/<api_version>/<path>` with HTTP basic
//! auth using the consumer key and secret.  Reads are retried with
//! exponential back-off on 5xx and timeouts; writes are sent once.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use uuid::Uuid;

use sb_domain::config::ShopConfig;
use sb_domain::error::{Error, Result};
use sb_domain::trace::TraceEvent;

use crate::client::ShopClient;

/// Page size for list endpoints.
const PER_PAGE: u32 = 100;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct RestShopClient {
    http: Client,
    api_root: String,
    credentials: Option<(String, String)>,
    max_retries: u32,
}

impl RestShopClient {
    /// Build from config, reading the consumer key and secret from the
    /// environment variables it names.  Missing credentials are not an error
    /// here; requests fail with [`Error::Config`] instead.
    pub fn new(cfg: &ShopConfig) -> Result<Self> {
        let key = std::env::var(&cfg.consumer_key_env).ok();
        let secret = std::env::var(&cfg.consumer_secret_env).ok();
        let credentials = match (key, secret) {
            (Some(k), Some(s)) if !k.is_empty() && !s.is_empty() => Some((k, s)),
            _ => {
                tracing::warn!(
                    key_env = %cfg.consumer_key_env,
                    secret_env = %cfg.consumer_secret_env,
                    "shop credentials not set; store calls will fail"
                );
                None
            }
        };
        Self::build(cfg, credentials)
    }

    /// Build with explicit credentials.
    pub fn with_credentials(cfg: &ShopConfig, key: &str, secret: &str) -> Result<Self> {
        Self::build(cfg, Some((key.to_owned(), secret.to_owned())))
    }

    fn build(cfg: &ShopConfig, credentials: Option<(String, String)>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        let base = cfg.base_url.trim_end_matches('/');
        let api_root = if base.is_empty() {
            String::new()
        } else {
            format!("{base}/wp-json/{}", cfg.api_version.trim_matches('/'))
        };

        Ok(Self {
            http,
            api_root,
            credentials,
            max_retries: cfg.max_retries,
        })
    }

    /// Full URL for `path` (empty path = API index).
    pub fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.api_root.clone()
        } else {
            format!("{}/{}", self.api_root, path.trim_start_matches('/'))
        }
    }

    // ── request helpers ──────────────────────────────────────────────

    fn ready(&self, endpoint: &str) -> Result<&(String, String)> {
        if self.api_root.is_empty() {
            return Err(Error::Config("shop.base_url is not set".into()));
        }
        self.credentials.as_ref().ok_or_else(|| {
            Error::Config(format!("{endpoint}: shop credentials are not set"))
        })
    }

    fn decorate(&self, rb: RequestBuilder, (key, secret): &(String, String)) -> RequestBuilder {
        rb.basic_auth(key, Some(secret))
            .header("X-Request-Id", Uuid::new_v4().to_string())
    }

    /// Send a request, retrying only when `retry` is set.
    ///
    /// * 5xx and transport errors are retried (reads only).
    /// * 4xx is permanent.
    /// * Emits a `TraceEvent::ShopCall` after every attempt.
    async fn execute(
        &self,
        endpoint: &str,
        retry: bool,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let creds = self.ready(endpoint)?;
        let attempts = if retry { self.max_retries + 1 } else { 1 };
        let mut last_err: Option<Error> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = Duration::from_millis(200 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let result = self.decorate(build_request(), creds).send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::ShopCall {
                        endpoint: endpoint.to_owned(),
                        status: status.as_u16(),
                        duration_ms,
                    }
                    .emit();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let err = Error::Shop {
                        endpoint: endpoint.to_owned(),
                        message: format!("{status}: {body}"),
                    };
                    if status.is_server_error() {
                        tracing::warn!(endpoint, attempt, status = status.as_u16(), "shop call failed");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    TraceEvent::ShopCall {
                        endpoint: endpoint.to_owned(),
                        status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                        duration_ms,
                    }
                    .emit();
                    tracing::warn!(endpoint, attempt, error = %e, "shop request error");
                    last_err = Some(from_reqwest(e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Shop {
            endpoint: endpoint.to_owned(),
            message: "all retries exhausted".into(),
        }))
    }

    async fn read_json(&self, endpoint: &str, resp: Response) -> Result<Value> {
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| Error::Shop {
            endpoint: endpoint.to_owned(),
            message: format!("invalid JSON body: {e}"),
        })
    }

    async fn get(&self, endpoint: &str, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.url(path);
        let resp = self
            .execute(endpoint, true, || self.http.get(&url).query(query))
            .await?;
        self.read_json(endpoint, resp).await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl ShopClient for RestShopClient {
    async fn list_products(&self) -> Result<Value> {
        tracing::info!("listing products");
        self.get("GET products", "products", &[("per_page", PER_PAGE.to_string())])
            .await
    }

    async fn get_product(&self, id: u64) -> Result<Value> {
        tracing::info!(product_id = id, "fetching product");
        self.get("GET products/{id}", &format!("products/{id}"), &[]).await
    }

    async fn list_categories(&self) -> Result<Value> {
        tracing::info!("listing categories");
        self.get(
            "GET products/categories",
            "products/categories",
            &[("per_page", PER_PAGE.to_string())],
        )
        .await
    }

    async fn list_orders(&self) -> Result<Value> {
        tracing::info!("listing orders");
        self.get("GET orders", "orders", &[("per_page", PER_PAGE.to_string())])
            .await
    }

    async fn get_order(&self, id: u64) -> Result<Value> {
        tracing::info!(order_id = id, "fetching order");
        self.get("GET orders/{id}", &format!("orders/{id}"), &[]).await
    }

    async fn store_info(&self) -> Result<Value> {
        tracing::info!("fetching store info");
        self.get("GET /", "", &[]).await
    }

    async fn create_product(&self, data: Value) -> Result<Value> {
        let name = data.get("name").and_then(Value::as_str).unwrap_or_default();
        tracing::info!(name = %name, "creating product");
        let url = self.url("products");
        let resp = self
            .execute("POST products", false, || self.http.post(&url).json(&data))
            .await?;
        self.read_json("POST products", resp).await
    }

    async fn update_product(&self, id: u64, data: Value) -> Result<Value> {
        tracing::info!(product_id = id, "updating product");
        let url = self.url(&format!("products/{id}"));
        let resp = self
            .execute("PUT products/{id}", false, || self.http.put(&url).json(&data))
            .await?;
        self.read_json("PUT products/{id}", resp).await
    }

    async fn delete_product(&self, id: u64) -> Result<bool> {
        tracing::info!(product_id = id, "deleting product");
        let url = self.url(&format!("products/{id}"));
        let resp = self
            .execute("DELETE products/{id}", false, || {
                self.http.delete(&url).query(&[("force", "true")])
            })
            .await?;
        Ok(resp.status() == reqwest::StatusCode::OK)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Timeouts become `Error::Timeout`; everything else `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(base_url: &str) -> ShopConfig {
        ShopConfig {
            base_url: base_url.into(),
            ..ShopConfig::default()
        }
    }

    #[test]
    fn urls_are_rooted_at_wp_json() {
        let client = RestShopClient::with_credentials(&cfg("https://shop.example.com/"), "ck", "cs")
            .unwrap();
        assert_eq!(
            client.url("products/17"),
            "https://shop.example.com/wp-json/wc/v3/products/17"
        );
        assert_eq!(client.url(""), "https://shop.example.com/wp-json/wc/v3");
    }

    #[tokio::test]
    async fn unconfigured_base_url_is_a_config_error() {
        let client = RestShopClient::with_credentials(&cfg(""), "ck", "cs").unwrap();
        let err = client.list_products().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let mut config = cfg("http://127.0.0.1:9");
        config.consumer_key_env = "SB_TEST_UNSET_KEY_ENV".into();
        config.consumer_secret_env = "SB_TEST_UNSET_SECRET_ENV".into();
        let client = RestShopClient::new(&config).unwrap();
        let err = client.get_order(1).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
