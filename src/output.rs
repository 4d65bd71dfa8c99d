use crate::model::{HistoryResponse, Product, ProductsResponse, Severity, Toast};

pub fn format_product_table(items: &[Product]) -> String {
    let mut out = String::new();

    out.push_str("| Image | ASIN | Title | Price | Rating | Link |\n");
    out.push_str("|---|---|---|---|---|---|\n");

    for product in items {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            cell(product.image_url.as_deref().unwrap_or("")),
            cell(&product.asin),
            cell(&product.title),
            optional_number(product.price),
            optional_number(product.rating),
            cell(&product.product_url),
        ));
    }

    if items.is_empty() {
        out.push_str("\n_No products._\n");
    }

    out
}

pub fn format_products_page(resp: &ProductsResponse) -> String {
    let mut out = format_product_table(&resp.items);
    out.push_str(&format!(
        "\nPage {} ({} per page), {} total\n",
        resp.page, resp.page_size, resp.total
    ));
    out
}

pub fn format_history(history: &HistoryResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "## Price history for {} ({} points)\n\n",
        history.asin, history.count
    ));

    if history.points.is_empty() {
        out.push_str("_No price points recorded._\n");
        return out;
    }

    out.push_str("| Seen | Price | Raw | Currency |\n");
    out.push_str("|---|---|---|---|\n");
    for point in &history.points {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(&point.seen_at),
            optional_number(point.price),
            cell(point.price_raw.as_deref().unwrap_or("")),
            cell(point.currency.as_deref().unwrap_or("")),
        ));
    }

    out
}

pub fn format_toast(toast: &Toast) -> String {
    format!("[{}] {}", toast.severity.as_str(), toast.text)
}

/// Local hint that never reaches the dashboard's toast slot.
pub fn format_notice(text: &str) -> String {
    format!("[{}] {}", Severity::Info.as_str(), text)
}

pub fn format_status(loading: bool, count: usize) -> String {
    if loading {
        // Scrapes drive a real browser on the backend
        "Working... this may take 10-30s while the backend loads pages.".to_string()
    } else {
        format!("{} product(s) listed", count)
    }
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
