use crate::api::ProductApi;
use crate::error::DashboardError;
use crate::model::{
    ExportQuery, Filter, OrderBy, Product, ProductQuery, ScrapeParams, Severity, SortDirection,
    Toast,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const PAGE_SIZE: u32 = 200;

/// What to do with a listing response that was overtaken by a newer load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Every completion is applied; the last one to arrive wins.
    #[default]
    Apply,
    /// Only the most recently started load may touch the state.
    Discard,
}

impl fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StalePolicy::Apply => f.write_str("apply"),
            StalePolicy::Discard => f.write_str("discard"),
        }
    }
}

impl FromStr for StalePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apply" => Ok(StalePolicy::Apply),
            "discard" => Ok(StalePolicy::Discard),
            other => Err(format!(
                "Invalid stale policy '{}'. Valid: apply, discard",
                other
            )),
        }
    }
}

#[derive(Debug, Default)]
struct UiState {
    items: Vec<Product>,
    loading: bool,
    toast: Option<Toast>,
    filters: Filter,
    last_toast_id: u64,
    load_generation: u64,
}

impl UiState {
    fn set_toast(&mut self, text: String, severity: Severity) {
        self.last_toast_id += 1;
        self.toast = Some(Toast {
            id: self.last_toast_id,
            text,
            severity,
        });
    }
}

/// Owner of the dashboard state: listing, busy flag, toast and filters.
///
/// Actions may overlap. The lock is never held across a backend call, so two
/// actions in flight interleave at their await points and, under
/// [`StalePolicy::Apply`], whichever completes last decides the final state.
pub struct Dashboard<A> {
    api: Arc<A>,
    state: Arc<Mutex<UiState>>,
    policy: StalePolicy,
}

impl<A> Clone for Dashboard<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            policy: self.policy,
        }
    }
}

impl<A: ProductApi> Dashboard<A> {
    pub fn new(api: A, policy: StalePolicy) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::default(),
            policy,
        }
    }

    pub fn items(&self) -> Vec<Product> {
        self.state.lock().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn toast(&self) -> Option<Toast> {
        self.state.lock().toast.clone()
    }

    pub fn filters(&self) -> Filter {
        self.state.lock().filters.clone()
    }

    /// CSV link for the current filters.
    pub fn export_url(&self) -> String {
        self.api.csv_url(&ExportQuery {
            filter: self.filters(),
            ..Default::default()
        })
    }

    /// Initial listing fetch.
    pub async fn start(&self) {
        self.load().await;
    }

    /// Fetches the first page for the current filters, newest first.
    pub async fn load(&self) {
        let (filter, generation) = {
            let mut state = self.state.lock();
            state.loading = true;
            state.load_generation += 1;
            (state.filters.clone(), state.load_generation)
        };
        if !filter.is_empty() {
            tracing::debug!("Loading with filter {:?}", filter);
        }

        let query = ProductQuery {
            filter,
            page: Some(1),
            page_size: Some(PAGE_SIZE),
            order_by: Some(OrderBy::CreatedAt),
            order: Some(SortDirection::Desc),
        };
        let result = self.api.fetch_products(&query).await;

        let mut state = self.state.lock();
        let current = self.policy == StalePolicy::Apply || generation == state.load_generation;
        match result {
            Ok(resp) if current => {
                tracing::debug!("Loaded {} of {} products", resp.items.len(), resp.total);
                state.items = resp.items;
            }
            Err(e) if current => {
                tracing::warn!("Listing failed: {}", e);
                state.set_toast(message_or(&e, "Failed to load"), Severity::Error);
            }
            _ => {
                tracing::debug!(
                    "Dropping listing response from load {} (latest is {})",
                    generation,
                    state.load_generation
                );
            }
        }
        if current {
            state.loading = false;
        }
    }

    /// Triggers a scrape and, once it succeeds, reloads the listing.
    pub async fn scrape(&self, params: ScrapeParams) {
        self.state.lock().loading = true;

        let req = params.into_request();
        tracing::info!(
            "Scraping {} on {} ({} page(s))",
            req.keyword
                .as_deref()
                .or(req.search_url.as_deref())
                .unwrap_or("<nothing>"),
            req.domain,
            req.max_pages
        );

        match self.api.trigger_scrape(&req).await {
            Ok(resp) => {
                self.state.lock().set_toast(
                    format!(
                        "Fetched {}. Updated {}.",
                        resp.fetched, resp.inserted_or_updated
                    ),
                    Severity::Success,
                );
                self.load().await;
            }
            Err(e) => {
                tracing::warn!("Scrape failed: {}", e);
                self.state
                    .lock()
                    .set_toast(message_or(&e, "Scrape failed"), Severity::Error);
            }
        }

        self.state.lock().loading = false;
    }

    /// Replaces the filters and reloads.
    pub async fn filter(&self, filters: Filter) {
        self.state.lock().filters = filters;
        self.load().await;
    }

    /// Clears the toast if it is still the one with `id`.
    pub fn dismiss_toast(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        if state.toast.as_ref().is_some_and(|t| t.id == id) {
            state.toast = None;
            true
        } else {
            false
        }
    }
}

fn message_or(err: &DashboardError, fallback: &str) -> String {
    let text = err.to_string();
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
