use crate::error::DashboardError;
use crate::model::{
    ExportQuery, HistoryResponse, ProductQuery, ProductsResponse, ScrapeRequest, ScrapeResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

/// Backend operations the dashboard state depends on.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn trigger_scrape(&self, req: &ScrapeRequest) -> Result<ScrapeResponse, DashboardError>;

    async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<ProductsResponse, DashboardError>;

    fn csv_url(&self, query: &ExportQuery) -> String;
}

/// HTTP client for the scraper backend. The base address is fixed at construction.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Result<Self, DashboardError> {
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(DashboardError::Config(format!(
                "API base must be an http(s) URL, got '{}'",
                base
            )));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("scrape-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub async fn trigger_scrape(
        &self,
        req: &ScrapeRequest,
    ) -> Result<ScrapeResponse, DashboardError> {
        let url = self.endpoint(&["scrape"]);
        tracing::debug!("POST {}", url);
        let resp = self.http.post(url).json(req).send().await?;
        read_json(resp).await
    }

    pub async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<ProductsResponse, DashboardError> {
        let url = with_query(self.endpoint(&["products"]), query.query_pairs());
        tracing::debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }

    pub async fn get_history(&self, asin: &str) -> Result<HistoryResponse, DashboardError> {
        if asin.is_empty() {
            return Err(DashboardError::Request("asin must not be empty".to_string()));
        }
        let url = self.endpoint(&["history", asin]);
        tracing::debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        read_json(resp).await
    }

    /// Link target for the CSV export. Never fetched by this client.
    pub fn csv_url(&self, query: &ExportQuery) -> String {
        with_query(self.endpoint(&["products.csv"]), query.query_pairs()).into()
    }

    /// Appends percent-encoded path segments to the base address.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Cannot fail: `new` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl ProductApi for ApiClient {
    async fn trigger_scrape(&self, req: &ScrapeRequest) -> Result<ScrapeResponse, DashboardError> {
        ApiClient::trigger_scrape(self, req).await
    }

    async fn fetch_products(
        &self,
        query: &ProductQuery,
    ) -> Result<ProductsResponse, DashboardError> {
        ApiClient::fetch_products(self, query).await
    }

    fn csv_url(&self, query: &ExportQuery) -> String {
        ApiClient::csv_url(self, query)
    }
}

fn with_query(mut url: Url, pairs: Vec<(&'static str, String)>) -> Url {
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, DashboardError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        tracing::warn!("Backend returned {}: {}", status, body);
        return Err(DashboardError::Request(body));
    }
    Ok(serde_json::from_str(&body)?)
}
