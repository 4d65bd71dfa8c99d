use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DOMAIN: &str = "amazon.com";
pub const DEFAULT_MAX_PAGES: u32 = 1;
pub const DELAY_LO: f64 = 2.5;
pub const DELAY_HI: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub asin: String,
    pub title: String,
    pub product_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_raw: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub items: Vec<Product>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_raw: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    pub seen_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub asin: String,
    pub count: u64,
    pub points: Vec<PricePoint>,
}

/// Body of `POST /scrape`. Both `keyword` and `search_url` are always sent,
/// as `null` when unset; the backend picks which one applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub keyword: Option<String>,
    pub search_url: Option<String>,
    pub domain: String,
    pub max_pages: u32,
    pub delay_lo: f64,
    pub delay_hi: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub fetched: u64,
    pub inserted_or_updated: u64,
}

/// Scrape parameters as submitted from a form.
///
/// `search_url` distinguishes "not given" (`None`) from "explicitly no URL"
/// (`Some(None)`). Both end up as `null` on the wire, but the form paths
/// produce them differently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeParams {
    pub keyword: Option<String>,
    pub search_url: Option<Option<String>>,
    pub domain: Option<String>,
    pub max_pages: Option<u32>,
}

impl ScrapeParams {
    pub fn into_request(self) -> ScrapeRequest {
        ScrapeRequest {
            keyword: self.keyword,
            search_url: self.search_url.flatten(),
            domain: self.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_string()),
            max_pages: self.max_pages.unwrap_or(DEFAULT_MAX_PAGES),
            delay_lo: DELAY_LO,
            delay_hi: DELAY_HI,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub q: Option<String>,
    pub min_rating: Option<f64>,
    pub max_price: Option<f64>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.q.is_none() && self.min_rating.is_none() && self.max_price.is_none()
    }

    fn push_pairs(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(ref q) = self.q {
            pairs.push(("q", q.clone()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("min_rating", rating.to_string()));
        }
        if let Some(price) = self.max_price {
            pairs.push(("max_price", price.to_string()));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Price,
    Rating,
    CreatedAt,
    UpdatedAt,
    Title,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Price => "price",
            OrderBy::Rating => "rating",
            OrderBy::CreatedAt => "created_at",
            OrderBy::UpdatedAt => "updated_at",
            OrderBy::Title => "title",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(OrderBy::Price),
            "rating" => Ok(OrderBy::Rating),
            "created_at" => Ok(OrderBy::CreatedAt),
            "updated_at" => Ok(OrderBy::UpdatedAt),
            "title" => Ok(OrderBy::Title),
            other => Err(format!(
                "Invalid order field '{}'. Valid: price, rating, created_at, updated_at, title",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("Invalid sort direction '{}'. Valid: asc, desc", other)),
        }
    }
}

/// Query for `GET /products`. Only fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub filter: Filter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub order_by: Option<OrderBy>,
    pub order: Option<SortDirection>,
}

impl ProductQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        self.filter.push_pairs(&mut pairs);
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size", size.to_string()));
        }
        push_ordering(&mut pairs, self.order_by, self.order);
        pairs
    }
}

/// Query for the CSV export link: same keys as [`ProductQuery`] minus pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportQuery {
    pub filter: Filter,
    pub order_by: Option<OrderBy>,
    pub order: Option<SortDirection>,
}

impl ExportQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        self.filter.push_pairs(&mut pairs);
        push_ordering(&mut pairs, self.order_by, self.order);
        pairs
    }
}

fn push_ordering(
    pairs: &mut Vec<(&'static str, String)>,
    order_by: Option<OrderBy>,
    order: Option<SortDirection>,
) {
    if let Some(field) = order_by {
        pairs.push(("order_by", field.to_string()));
    }
    if let Some(dir) = order {
        pairs.push(("order", dir.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub text: String,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(&'static str, String)]) -> Vec<&'static str> {
        pairs.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn empty_query_sends_nothing() {
        assert!(ProductQuery::default().query_pairs().is_empty());
        assert!(ExportQuery::default().query_pairs().is_empty());
    }

    #[test]
    fn only_defined_fields_become_pairs() {
        let query = ProductQuery {
            filter: Filter {
                q: None,
                min_rating: Some(4.0),
                max_price: None,
            },
            page_size: Some(200),
            order: Some(SortDirection::Asc),
            ..Default::default()
        };
        let pairs = query.query_pairs();
        assert_eq!(keys(&pairs), vec!["min_rating", "page_size", "order"]);
        assert!(pairs.iter().all(|(_, v)| !v.is_empty()));
    }

    #[test]
    fn numbers_use_shortest_form() {
        let filter = Filter {
            q: Some("phone".into()),
            min_rating: Some(4.0),
            max_price: Some(99.5),
        };
        let pairs = ExportQuery {
            filter,
            ..Default::default()
        }
        .query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("q", "phone".to_string()),
                ("min_rating", "4".to_string()),
                ("max_price", "99.5".to_string()),
            ]
        );
    }

    #[test]
    fn export_and_product_queries_agree_on_filter_keys() {
        let filter = Filter {
            q: Some("usb c".into()),
            min_rating: None,
            max_price: Some(25.0),
        };
        let product = ProductQuery {
            filter: filter.clone(),
            order_by: Some(OrderBy::Price),
            order: Some(SortDirection::Desc),
            ..Default::default()
        };
        let export = ExportQuery {
            filter,
            order_by: Some(OrderBy::Price),
            order: Some(SortDirection::Desc),
        };
        assert_eq!(product.query_pairs(), export.query_pairs());
    }

    #[test]
    fn every_filter_combination_sends_exactly_its_keys() {
        for mask in 0..8u8 {
            let filter = Filter {
                q: (mask & 1 != 0).then(|| "usb c".to_string()),
                min_rating: (mask & 2 != 0).then_some(4.5),
                max_price: (mask & 4 != 0).then_some(30.0),
            };
            let expected: Vec<&str> = [(1, "q"), (2, "min_rating"), (4, "max_price")]
                .into_iter()
                .filter(|(bit, _)| mask & bit != 0)
                .map(|(_, key)| key)
                .collect();

            let product = ProductQuery {
                filter: filter.clone(),
                ..Default::default()
            }
            .query_pairs();
            let export = ExportQuery {
                filter,
                ..Default::default()
            }
            .query_pairs();

            assert_eq!(keys(&product), expected, "mask {:03b}", mask);
            assert!(product.iter().all(|(_, v)| !v.is_empty()));
            assert_eq!(product, export, "mask {:03b}", mask);
        }
    }

    #[test]
    fn scrape_params_apply_defaults() {
        let req = ScrapeParams {
            search_url: Some(None),
            ..Default::default()
        }
        .into_request();
        assert_eq!(req.keyword, None);
        assert_eq!(req.search_url, None);
        assert_eq!(req.domain, "amazon.com");
        assert_eq!(req.max_pages, 1);
        assert_eq!(req.delay_lo, 2.5);
        assert_eq!(req.delay_hi, 5.0);
    }

    #[test]
    fn scrape_request_serializes_unset_inputs_as_null() {
        let req = ScrapeParams {
            keyword: Some("headphones".into()),
            ..Default::default()
        }
        .into_request();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["keyword"], "headphones");
        assert!(json["search_url"].is_null());
        assert_eq!(json["max_pages"], 1);
    }

    #[test]
    fn order_tokens_parse_and_print() {
        for token in ["price", "rating", "created_at", "updated_at", "title"] {
            let parsed: OrderBy = token.parse().unwrap();
            assert_eq!(parsed.to_string(), token);
        }
        assert!("newest".parse::<OrderBy>().is_err());
        assert_eq!("desc".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert!("down".parse::<SortDirection>().is_err());
    }

    #[test]
    fn product_optional_fields_may_be_missing() {
        let json = r#"{
            "id": 7, "asin": "B0TEST", "title": "Cable",
            "product_url": "https://www.amazon.com/dp/B0TEST",
            "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-01T10:00:00"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert!(product.price.is_none());
        assert!(product.image_url.is_none());
    }
}
