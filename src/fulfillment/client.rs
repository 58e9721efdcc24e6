use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use super::payload::OrderPayload;
use super::token::{TokenCache, TOKEN_TTL};

/// A stalled provider must not hold a request slot indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FulfillmentError {
    #[error("access token request failed: {0}")]
    TokenExchange(String),
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(rename = "Accesstoken")]
    access_token: Option<String>,
}

/// Client for the print-on-demand fulfillment API. Holds the shared token
/// cache, so clones observe the same credential. It never retries; retry
/// policy belongs to callers.
#[derive(Clone, Debug)]
pub struct FulfillmentClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token_cache: TokenCache,
}

impl FulfillmentClient {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            token_cache: TokenCache::new(),
        }
    }

    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self::new(
            std::env::var("QIKINK_API_URL")?,
            std::env::var("QIKINK_CLIENT_ID")?,
            std::env::var("QIKINK_CLIENT_SECRET")?,
        ))
    }

    /// Exchange client credentials for a bearer token. Pure fetch, no caching.
    pub async fn fetch_access_token(&self) -> Result<String, FulfillmentError> {
        let url = format!("{}/api/token", self.base_url);
        let form = [
            ("ClientId", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Access token request failed");
            return Err(FulfillmentError::HttpStatus { status, body });
        }

        let body: TokenResponse = response.json().await?;
        body.access_token.ok_or_else(|| {
            FulfillmentError::TokenExchange("Accesstoken missing from response".to_string())
        })
    }

    /// The cached token when fresh, otherwise a new exchange stored for an
    /// hour. Safe to call repeatedly; a hit skips the upstream round-trip.
    pub async fn access_token(&self) -> Result<String, FulfillmentError> {
        if let Some(token) = self.token_cache.get().await {
            return Ok(token);
        }

        let token = self.fetch_access_token().await?;
        self.token_cache.store(token.clone(), TOKEN_TTL).await;
        Ok(token)
    }

    /// POST an order to the provider. A 2xx body comes back as parsed JSON
    /// for the caller to interpret; transport failures and non-2xx statuses
    /// are upstream errors.
    pub async fn submit_order(&self, payload: &OrderPayload) -> Result<Value, FulfillmentError> {
        let token = self.access_token().await?;
        let url = format!("{}/api/order/create", self.base_url);

        let response = self
            .http
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("ClientId", &self.client_id)
            .header("Accesstoken", token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Order creation request failed");
            return Err(FulfillmentError::HttpStatus { status, body });
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::fulfillment::payload::{build_line_items, format_money, AddOn, ShippingAddress};
    use crate::models::cart::CartLine;

    #[derive(Clone, Default)]
    struct StubState {
        token_requests: Arc<AtomicUsize>,
    }

    async fn token_endpoint(State(state): State<StubState>) -> Json<Value> {
        state.token_requests.fetch_add(1, Ordering::SeqCst);
        Json(json!({ "Accesstoken": "stub-token" }))
    }

    async fn order_endpoint(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("ClientId").is_none()
            || headers.get("Accesstoken").and_then(|v| v.to_str().ok()) != Some("stub-token")
        {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" })));
        }
        if body.get("order_number").and_then(Value::as_str).is_none() {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "order_number required" })));
        }
        (
            StatusCode::OK,
            Json(json!({
                "message": "Order created successfully",
                "tracking_url": "https://track.example/abc"
            })),
        )
    }

    async fn spawn_stub(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn spawn_provider(state: StubState) -> String {
        let app = Router::new()
            .route("/api/token", post(token_endpoint))
            .route("/api/order/create", post(order_endpoint))
            .with_state(state);
        spawn_stub(app).await
    }

    fn sample_payload() -> OrderPayload {
        let lines = [CartLine {
            serial_number: 1,
            name: "Round Neck Tee".to_string(),
            sku: "SKU-TEE-1".to_string(),
            unit_price: 100.0,
            sizes: Some("S,M,L".to_string()),
            quantity: 2,
        }];
        let (line_items, total) = build_line_items(&lines);
        OrderPayload {
            order_number: "test-order-1".to_string(),
            qikink_shipping: "1".to_string(),
            gateway: "COD".to_string(),
            total_order_value: format_money(total),
            line_items,
            add_ons: vec![AddOn::default()],
            shipping_address: ShippingAddress {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                address1: "123 Test Street".to_string(),
                phone: "+919876543210".to_string(),
                email: "test@example.com".to_string(),
                city: "TestCity".to_string(),
                zip: "12345".to_string(),
                province: "TS".to_string(),
                country_code: "IN".to_string(),
            },
        }
    }

    fn client_for(base_url: String) -> FulfillmentClient {
        FulfillmentClient::new(base_url, "client-id".to_string(), "client-secret".to_string())
    }

    #[tokio::test]
    async fn token_exchange_returns_provider_token() {
        let base_url = spawn_provider(StubState::default()).await;
        let client = client_for(base_url);

        let token = client.fetch_access_token().await.unwrap();
        assert_eq!(token, "stub-token");
    }

    #[tokio::test]
    async fn access_token_is_cached_across_calls() {
        let state = StubState::default();
        let token_requests = state.token_requests.clone();
        let base_url = spawn_provider(state).await;
        let client = client_for(base_url);

        assert_eq!(client.access_token().await.unwrap(), "stub-token");
        assert_eq!(client.access_token().await.unwrap(), "stub-token");
        assert_eq!(token_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_token_field_is_an_error() {
        let app = Router::new().route("/api/token", post(|| async { Json(json!({ "ok": true })) }));
        let base_url = spawn_stub(app).await;
        let client = client_for(base_url);

        let err = client.fetch_access_token().await.unwrap_err();
        assert!(matches!(err, FulfillmentError::TokenExchange(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn submit_order_returns_provider_body() {
        let base_url = spawn_provider(StubState::default()).await;
        let client = client_for(base_url);

        let body = client.submit_order(&sample_payload()).await.unwrap();
        assert_eq!(body["message"], "Order created successfully");
        assert_eq!(body["tracking_url"], "https://track.example/abc");
    }

    #[tokio::test]
    async fn non_success_status_is_an_upstream_error() {
        let app = Router::new()
            .route("/api/token", post(|| async { Json(json!({ "Accesstoken": "stub-token" })) }))
            .route(
                "/api/order/create",
                post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({ "error": "down" }))) }),
            );
        let base_url = spawn_stub(app).await;
        let client = client_for(base_url);

        let err = client.submit_order(&sample_payload()).await.unwrap_err();
        match err {
            FulfillmentError::HttpStatus { status, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        // Bind then drop to find a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{addr}"));
        let err = client.fetch_access_token().await.unwrap_err();
        assert!(matches!(err, FulfillmentError::Transport(_)), "got {err:?}");
    }
}
