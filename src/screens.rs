//! Headless screen controllers: products, orders, reviews and profile.
//!
//! Every list screen follows one policy:
//!
//! - no backend, or the request fails: show the embedded sample dataset;
//! - backend answers `success: false`: surface its message, then sample data;
//! - mutations change local state first; a failed call leaves the change in
//!   place and warns that it is local only, an explicit rejection undoes it;
//! - a refused token undoes the change too and flags the session as expired.
//!
//! Controllers queue [`Notice`]s for the UI to drain.

use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;

use crate::api::AdminApi;
use crate::models::{
    Ack, ApiResponse, Order, OrderList, OrderStatus, Product, ProductList, Review, ReviewList,
};
use crate::{sample, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient user-facing message (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub detail: Option<String>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, detail: Option<String>) -> Self {
        Notice {
            level,
            title: title.into(),
            detail,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, None)
    }

    pub fn info(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, Some(detail.into()))
    }

    pub fn warning(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, Some(detail.into()))
    }

    pub fn error(title: impl Into<String>, detail: Option<String>) -> Self {
        Self::new(NoticeLevel::Error, title, detail)
    }
}

/// Where the displayed rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Loading,
    Live,
    Sample,
}

/// Result of one fetch-with-fallback.
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub source: DataSource,
    pub notice: Option<Notice>,
    pub auth_failed: bool,
}

/// Run `fetch` (absent when there is no backend) and keep its rows if
/// `success` accepts the answer; otherwise fall back to `sample`.
pub async fn fetch_with_fallback<T, R, Fut, P>(
    fetch: Option<Fut>,
    sample: fn() -> Vec<T>,
    success: P,
    label: &str,
) -> Loaded<T>
where
    Fut: Future<Output = Result<R>>,
    P: FnOnce(R) -> Result<Vec<T>>,
{
    let fallback = |notice: Option<Notice>, auth_failed: bool| Loaded {
        items: sample(),
        source: DataSource::Sample,
        notice,
        auth_failed,
    };
    let Some(fetch) = fetch else {
        return fallback(None, false);
    };
    match fetch.await.and_then(success) {
        Ok(items) => Loaded {
            items,
            source: DataSource::Live,
            notice: Some(Notice::success(format!("{} loaded successfully", capitalize(label)))),
            auth_failed: false,
        },
        Err(e) if e.is_network() => {
            log::info!("Error fetching {}: {}", label, e);
            fallback(
                Some(Notice::info("Using sample data", "App running in offline mode")),
                false,
            )
        }
        Err(e) => {
            log::info!("API returned error for {}: {}", label, e);
            fallback(
                Some(Notice::error(
                    format!("Failed to load {}", label),
                    Some(e.to_string()),
                )),
                e.is_auth(),
            )
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// How a mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Backend confirmed the change.
    Applied,
    /// Sample data only; nothing was sent.
    SampleOnly,
    /// Backend call failed; the local change stays.
    LocalOnly,
    /// Backend refused the change or the token; the local change was undone.
    Rejected,
    NotFound,
}

enum Commit {
    Confirmed,
    Failed,
    Rejected { message: String },
    Unauthorized,
}

async fn commit<F>(call: Option<F>, fallback: &str) -> Commit
where
    F: Future<Output = Result<ApiResponse<Ack>>>,
{
    let Some(call) = call else {
        return Commit::Failed;
    };
    match call.await.and_then(|resp| resp.into_result(fallback)) {
        Ok(_) => Commit::Confirmed,
        Err(e) if e.is_auth() => {
            log::info!("{}: {}", fallback, e);
            Commit::Unauthorized
        }
        Err(e @ Error::Api { .. }) => Commit::Rejected {
            message: e.to_string(),
        },
        Err(e) => {
            log::warn!("{}: {}", fallback, e);
            Commit::Failed
        }
    }
}

/// Rows, their provenance and pending notices; shared by every list screen.
#[derive(Debug)]
pub struct ListState<T> {
    items: Vec<T>,
    source: DataSource,
    notices: Vec<Notice>,
    auth_expired: bool,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        ListState {
            items: Vec::new(),
            source: DataSource::Loading,
            notices: Vec::new(),
            auth_expired: false,
        }
    }
}

impl<T> ListState<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn is_sample(&self) -> bool {
        self.source == DataSource::Sample
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// True once since the backend last rejected the session token.
    pub fn take_auth_expired(&mut self) -> bool {
        std::mem::take(&mut self.auth_expired)
    }

    fn begin_load(&mut self) {
        self.source = DataSource::Loading;
    }

    fn apply(&mut self, loaded: Loaded<T>) {
        self.items = loaded.items;
        self.source = loaded.source;
        self.notices.extend(loaded.notice);
        self.auth_expired |= loaded.auth_failed;
    }

    fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn position(&self, pred: impl Fn(&T) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    /// Settle an optimistic change after the backend answered.
    fn settle(
        &mut self,
        commit: Commit,
        success_title: &str,
        local_detail: &str,
        rejected_title: &str,
        undo: impl FnOnce(&mut Vec<T>),
    ) -> MutationOutcome {
        match commit {
            Commit::Confirmed => {
                self.push(Notice::success(success_title));
                MutationOutcome::Applied
            }
            Commit::Failed => {
                self.push(Notice::warning("Network issue", local_detail));
                MutationOutcome::LocalOnly
            }
            Commit::Rejected { message } => {
                undo(&mut self.items);
                self.push(Notice::error(rejected_title, Some(message)));
                MutationOutcome::Rejected
            }
            Commit::Unauthorized => {
                self.auth_expired = true;
                undo(&mut self.items);
                self.push(Notice::error(
                    rejected_title,
                    Some("Not authorized. The change was not saved.".to_string()),
                ));
                MutationOutcome::Rejected
            }
        }
    }
}

/// Token-only endpoints are skipped without a session token.
fn authenticated<A: AdminApi>(api: Option<&A>) -> Option<&A> {
    api.filter(|a| a.token().is_some())
}

#[derive(Debug, Default)]
pub struct ProductsScreen {
    state: ListState<Product>,
}

impl ProductsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ListState<Product> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ListState<Product> {
        &mut self.state
    }

    pub async fn refresh<A: AdminApi>(&mut self, api: Option<&A>) {
        self.state.begin_load();
        log::debug!("Fetching products...");
        let loaded = fetch_with_fallback(
            api.map(|a| a.list_products()),
            sample::products,
            |resp: ApiResponse<ProductList>| {
                Ok(resp.into_result("Failed to load products")?.products)
            },
            "products",
        )
        .await;
        self.state.apply(loaded);
    }

    pub async fn remove<A: AdminApi>(&mut self, api: Option<&A>, id: &str) -> MutationOutcome {
        let Some(index) = self.state.position(|p| p.id == id) else {
            self.state
                .push(Notice::error("Product not found", Some(id.to_string())));
            return MutationOutcome::NotFound;
        };
        let removed = self.state.items.remove(index);
        if self.state.is_sample() {
            self.state.push(Notice::success("Product removed from sample data"));
            return MutationOutcome::SampleOnly;
        }
        let result = commit(
            authenticated(api).map(|a| a.remove_product(id)),
            "Failed to remove product",
        )
        .await;
        self.state.settle(
            result,
            "Product removed successfully",
            "Product removed locally only",
            "Failed to remove product",
            move |items| items.insert(index, removed),
        )
    }
}

#[derive(Debug, Default)]
pub struct OrdersScreen {
    state: ListState<Order>,
    date_filter: Option<NaiveDate>,
}

impl OrdersScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ListState<Order> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ListState<Order> {
        &mut self.state
    }

    /// Orders need a session token; without one the sample set is shown.
    pub async fn refresh<A: AdminApi>(&mut self, api: Option<&A>) {
        self.state.begin_load();
        if api.is_some() && authenticated(api).is_none() {
            log::info!("No auth token found, using sample data");
        }
        let loaded = fetch_with_fallback(
            authenticated(api).map(|a| a.list_orders()),
            sample::orders,
            |resp: ApiResponse<OrderList>| {
                Ok(resp.into_result("Failed to load orders")?.orders)
            },
            "orders",
        )
        .await;
        self.state.apply(loaded);
    }

    pub fn set_date_filter(&mut self, day: Option<NaiveDate>) {
        self.date_filter = day;
    }

    pub fn date_filter(&self) -> Option<NaiveDate> {
        self.date_filter
    }

    /// Orders matching the date filter, all of them when none is set.
    pub fn visible(&self) -> Vec<&Order> {
        self.state
            .items
            .iter()
            .filter(|o| self.date_filter.map_or(true, |d| o.placed_on(d)))
            .collect()
    }

    pub async fn set_status<A: AdminApi>(
        &mut self,
        api: Option<&A>,
        order_id: &str,
        status: OrderStatus,
    ) -> MutationOutcome {
        let Some(index) = self.state.position(|o| o.id == order_id) else {
            self.state
                .push(Notice::error("Order not found", Some(order_id.to_string())));
            return MutationOutcome::NotFound;
        };
        let previous = std::mem::replace(&mut self.state.items[index].status, status);
        if self.state.is_sample() {
            self.state.push(Notice::warning(
                "Status updated in sample data",
                "Changes are not sent to the server",
            ));
            return MutationOutcome::SampleOnly;
        }
        let result = commit(
            authenticated(api).map(|a| a.update_order_status(order_id, status)),
            "Failed to update status",
        )
        .await;
        self.state.settle(
            result,
            "Status updated successfully",
            "Status updated locally only",
            "Failed to update status",
            move |items| {
                if let Some(order) = items.get_mut(index) {
                    order.status = previous;
                }
            },
        )
    }
}

#[derive(Debug, Default)]
pub struct ReviewsScreen {
    state: ListState<Review>,
}

impl ReviewsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ListState<Review> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ListState<Review> {
        &mut self.state
    }

    /// Reviews need a session token; without one the sample set is shown.
    pub async fn refresh<A: AdminApi>(&mut self, api: Option<&A>) {
        self.state.begin_load();
        if api.is_some() && authenticated(api).is_none() {
            self.state.push(Notice::error(
                "Authentication Error",
                Some("No authentication token found. Please log in again.".to_string()),
            ));
        }
        let loaded = fetch_with_fallback(
            authenticated(api).map(|a| a.list_reviews()),
            sample::reviews,
            |resp: ApiResponse<ReviewList>| {
                Ok(resp.into_result("Failed to load reviews")?.reviews)
            },
            "reviews",
        )
        .await;
        self.state.apply(loaded);
    }

    pub async fn delete<A: AdminApi>(&mut self, api: Option<&A>, id: &str) -> MutationOutcome {
        let Some(index) = self.state.position(|r| r.id == id) else {
            self.state
                .push(Notice::error("Review not found", Some(id.to_string())));
            return MutationOutcome::NotFound;
        };
        let removed = self.state.items.remove(index);
        if self.state.is_sample() {
            self.state.push(Notice::success("Review deleted from sample data"));
            return MutationOutcome::SampleOnly;
        }
        let result = commit(
            authenticated(api).map(|a| a.delete_review(id)),
            "Failed to delete review",
        )
        .await;
        self.state.settle(
            result,
            "Review deleted successfully",
            "Review deleted locally only",
            "Failed to delete review",
            move |items| items.insert(index, removed),
        )
    }
}

/// Administrator card plus the manual backend check.
#[derive(Debug)]
pub struct ProfileScreen {
    pub email: String,
    pub role: String,
    pub last_login: DateTime<Utc>,
    backend_connected: bool,
    notices: Vec<Notice>,
}

impl ProfileScreen {
    pub fn new(email: impl Into<String>, backend_connected: bool) -> Self {
        ProfileScreen {
            email: email.into(),
            role: "Administrator".to_string(),
            last_login: Utc::now(),
            backend_connected,
            notices: Vec::new(),
        }
    }

    pub fn backend_connected(&self) -> bool {
        self.backend_connected
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// GET `/` with a short timeout. Updates the displayed status either way.
    pub async fn check_connection<A: AdminApi>(&mut self, api: Option<&A>) -> bool {
        let result = match api {
            Some(a) => a.ping().await.map_err(|e| (a.base_url().to_string(), e)),
            None => Err((String::new(), Error::NoBackendReachable)),
        };
        self.backend_connected = match result {
            Ok(()) => {
                self.notices.push(Notice::info(
                    "Backend server is connected!",
                    "API is operational",
                ));
                true
            }
            Err((url, e)) => {
                log::info!("Backend connection check failed: {}", e);
                let detail = if url.is_empty() {
                    "No backend server is reachable. Sample data will be used instead.".to_string()
                } else {
                    format!(
                        "Could not connect to the backend server at {}. Sample data will be used instead.",
                        url
                    )
                };
                self.notices
                    .push(Notice::error("Backend Connection Failed", Some(detail)));
                false
            }
        };
        self.backend_connected
    }
}
