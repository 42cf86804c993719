//! HTTP client for the store backend's admin endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::candidates::BackendEndpoint;
use crate::models::{
    Ack, ApiResponse, LoginData, OrderList, OrderStatus, ProductList, ReviewList,
};
use crate::{Error, Result};

/// Generous default for slow mobile networks.
pub const API_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout of the manual "is the backend up" check.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
/// Header carrying the session token on authenticated calls.
pub const TOKEN_HEADER: &str = "token";

/// Backend operations the screens and the session need. Every answer comes
/// back in its envelope; callers decide what `success: false` means.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Base URL this client talks to.
    fn base_url(&self) -> &BackendEndpoint;
    /// Session token attached to requests, if any.
    fn token(&self) -> Option<&str>;
    /// Same backend and settings, carrying `token` instead.
    fn with_token(&self, token: Option<&str>) -> Result<Self>
    where
        Self: Sized;
    /// GET `/`; any 2xx answer counts as up.
    async fn ping(&self) -> Result<()>;
    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<LoginData>>;
    /// GET `/api/user/profile`; `success` tells whether the token still holds.
    async fn validate_token(&self) -> Result<ApiResponse<Ack>>;
    async fn list_products(&self) -> Result<ApiResponse<ProductList>>;
    async fn remove_product(&self, id: &str) -> Result<ApiResponse<Ack>>;
    async fn list_orders(&self) -> Result<ApiResponse<OrderList>>;
    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<ApiResponse<Ack>>;
    async fn list_reviews(&self) -> Result<ApiResponse<ReviewList>>;
    async fn delete_review(&self, id: &str) -> Result<ApiResponse<Ack>>;
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RemoveProductBody<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody<'a> {
    order_id: &'a str,
    status: OrderStatus,
}

/// Client bound to one backend and, optionally, one session token.
#[derive(Clone)]
pub struct ApiClient {
    base: BackendEndpoint,
    token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl ApiClient {
    /// Build a client for `base`. Every request carries JSON content type,
    /// `Cache-Control: no-cache` and, when given, the `token` header.
    pub fn new(base: BackendEndpoint, token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        if let Some(t) = token.filter(|t| !t.is_empty()) {
            headers.insert(TOKEN_HEADER, HeaderValue::from_str(t)?);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(ApiClient {
            base,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
            timeout,
            client,
        })
    }

    /// Response-side hook: network-class failures are logged with the base
    /// URL, then handed back unchanged to the caller.
    fn observe(&self, path: &str, e: reqwest::Error) -> Error {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            log::warn!("Network error accessing: {}{} ({})", self.base, path, e);
        }
        e.into()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = request.send().await.map_err(|e| self.observe(path, e))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            log::debug!("{} {} answered {}", self.base, path, status);
            return Err(Error::Status(status.as_u16()));
        }
        response.json().await.map_err(|e| self.observe(path, e))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path);
        self.send(path, self.client.get(&url)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base.join(path);
        self.send(path, self.client.post(&url).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path);
        self.send(path, self.client.delete(&url)).await
    }
}

#[async_trait]
impl AdminApi for ApiClient {
    fn base_url(&self) -> &BackendEndpoint {
        &self.base
    }

    fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn with_token(&self, token: Option<&str>) -> Result<Self> {
        ApiClient::new(self.base.clone(), token, self.timeout)
    }

    async fn ping(&self) -> Result<()> {
        let request = self.client.get(self.base.join("/")).timeout(PING_TIMEOUT);
        let response = request.send().await.map_err(|e| self.observe("/", e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Status(response.status().as_u16()))
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<LoginData>> {
        self.post("/api/user/admin", &LoginBody { email, password })
            .await
    }

    async fn validate_token(&self) -> Result<ApiResponse<Ack>> {
        self.get("/api/user/profile").await
    }

    async fn list_products(&self) -> Result<ApiResponse<ProductList>> {
        self.get("/api/product/list").await
    }

    async fn remove_product(&self, id: &str) -> Result<ApiResponse<Ack>> {
        self.post("/api/product/remove", &RemoveProductBody { id })
            .await
    }

    async fn list_orders(&self) -> Result<ApiResponse<OrderList>> {
        self.post("/api/order/list", &serde_json::json!({})).await
    }

    async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<ApiResponse<Ack>> {
        self.post("/api/order/status", &StatusBody { order_id, status })
            .await
    }

    async fn list_reviews(&self) -> Result<ApiResponse<ReviewList>> {
        self.get("/api/review/all").await
    }

    async fn delete_review(&self, id: &str) -> Result<ApiResponse<Ack>> {
        let path = format!("/api/review/delete/{}", urlencoding::encode(id));
        self.delete(&path).await
    }
}
