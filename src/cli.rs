use crate::dashboard::StalePolicy;
use crate::model::{OrderBy, SortDirection};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "scrape-dashboard",
    version,
    about = "Trigger scrapes and browse products from the scraper backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend base address (default: http://127.0.0.1:8000)
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// How overtaken listing responses are handled: apply or discard
    #[arg(long, global = true)]
    pub stale: Option<StalePolicy>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Listing filters as typed by the user; parsed leniently like the form fields.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Name contains
    #[arg(long)]
    pub q: Option<String>,

    /// Minimum rating (e.g., 4.3)
    #[arg(long)]
    pub min_rating: Option<String>,

    /// Maximum price (e.g., 100)
    #[arg(long)]
    pub max_price: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List products straight from the backend
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        /// price, rating, created_at, updated_at or title
        #[arg(long)]
        order_by: Option<OrderBy>,

        /// asc or desc
        #[arg(long)]
        order: Option<SortDirection>,
    },

    /// Trigger a scrape, then show the refreshed listing
    Scrape {
        /// Search keyword (e.g., "wireless headphones")
        #[arg(long, conflicts_with = "url")]
        keyword: Option<String>,

        /// Full search URL instead of a keyword
        #[arg(long)]
        url: Option<String>,

        /// Marketplace domain: amazon.com, amazon.ae, amazon.co.uk
        #[arg(long)]
        domain: Option<String>,

        /// Number of result pages (1-10)
        #[arg(long)]
        pages: Option<String>,
    },

    /// Show recorded prices for a product
    History {
        /// Product ASIN
        asin: String,
    },

    /// Print the CSV export link for a filter
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long)]
        order_by: Option<OrderBy>,

        #[arg(long)]
        order: Option<SortDirection>,
    },

    /// Interactive dashboard session
    Dashboard,
}
