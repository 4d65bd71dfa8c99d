use crate::model::{Filter, ScrapeParams, DEFAULT_DOMAIN};

pub const KNOWN_DOMAINS: &[&str] = &["amazon.com", "amazon.ae", "amazon.co.uk"];

/// Raw text of the scrape controls, converted on submit.
#[derive(Debug, Clone)]
pub struct ScrapeForm {
    pub keyword: String,
    pub domain: String,
    pub pages: String,
    pub search_url: String,
}

impl Default for ScrapeForm {
    fn default() -> Self {
        Self {
            keyword: "wireless headphones".to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            pages: "1".to_string(),
            search_url: String::new(),
        }
    }
}

impl ScrapeForm {
    /// The keyword button: keyword, domain and page count.
    pub fn submit_keyword(&self) -> ScrapeParams {
        ScrapeParams {
            keyword: non_blank(&self.keyword),
            search_url: None,
            domain: non_blank(&self.domain),
            max_pages: Some(parse_pages(&self.pages)),
        }
    }

    /// The URL button. A blank URL is sent as an explicit null, and the domain
    /// is left to the default.
    pub fn submit_url(&self) -> ScrapeParams {
        ScrapeParams {
            keyword: None,
            search_url: Some(non_blank(&self.search_url)),
            domain: None,
            max_pages: Some(parse_pages(&self.pages)),
        }
    }
}

/// Raw text of the listing filters.
#[derive(Debug, Clone, Default)]
pub struct FilterForm {
    pub q: String,
    pub min_rating: String,
    pub max_price: String,
}

impl FilterForm {
    pub fn submit(&self) -> Filter {
        Filter {
            q: non_blank(&self.q),
            min_rating: parse_number(&self.min_rating),
            max_price: parse_number(&self.max_price),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// The leading decimal number of the text, so `"4.5 stars"` reads as 4.5.
/// Malformed input is treated as unset rather than reported.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    s[..numeric_prefix_len(s)]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Length of the longest `[+-]digits[.digits][e[+-]digits]` prefix.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa = int_end > end;
    end = int_end;

    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if mantissa || frac_end > end + 1 {
            mantissa = true;
            end = frac_end;
        }
    }
    if !mantissa {
        return 0;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    end
}

/// Leading digits as an integer, `1` when there are none.
fn parse_pages(s: &str) -> u32 {
    let digits: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(1)
}
