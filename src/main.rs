mod api;
mod cli;
mod config;
mod dashboard;
mod error;
mod form;
mod model;
mod notify;
mod output;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, FilterArgs};
use config::AppConfig;

use crate::api::ApiClient;
use crate::dashboard::Dashboard;
use crate::form::{FilterForm, ScrapeForm};
use crate::model::{ExportQuery, OrderBy, ProductQuery, Severity, SortDirection};
use crate::session::Session;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "scrape_dashboard=debug"
    } else {
        "scrape_dashboard=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = AppConfig::load(cli.api_base, cli.stale)?;
    tracing::debug!(
        "Using API base {} (stale responses: {})",
        config.api_base,
        config.stale_policy
    );

    ctrlc::set_handler(|| {
        eprintln!("\nInterrupted.");
        std::process::exit(130);
    })
    .context("Failed to set Ctrl+C handler")?;

    let client = ApiClient::new(config.api_base.clone()).context("Failed to build API client")?;

    match cli.command {
        Commands::List {
            filter,
            page,
            page_size,
            order_by,
            order,
        } => cmd_list(&client, filter, page, page_size, order_by, order).await?,
        Commands::Scrape {
            keyword,
            url,
            domain,
            pages,
        } => cmd_scrape(&config, client, keyword, url, domain, pages).await?,
        Commands::History { asin } => cmd_history(&client, &asin).await?,
        Commands::Export {
            filter,
            order_by,
            order,
        } => {
            let query = ExportQuery {
                filter: filter_form(filter).submit(),
                order_by,
                order,
            };
            println!("{}", client.csv_url(&query));
        }
        Commands::Dashboard => {
            let dash = Dashboard::new(client.clone(), config.stale_policy);
            Session::new(dash, client, config.domain.clone()).run().await?;
        }
    }

    Ok(())
}

async fn cmd_list(
    client: &ApiClient,
    filter: FilterArgs,
    page: Option<u32>,
    page_size: Option<u32>,
    order_by: Option<OrderBy>,
    order: Option<SortDirection>,
) -> Result<()> {
    let query = ProductQuery {
        filter: filter_form(filter).submit(),
        page,
        page_size,
        order_by,
        order,
    };
    let resp = client
        .fetch_products(&query)
        .await
        .context("Failed to list products")?;
    print!("{}", output::format_products_page(&resp));
    Ok(())
}

async fn cmd_scrape(
    config: &AppConfig,
    client: ApiClient,
    keyword: Option<String>,
    url: Option<String>,
    domain: Option<String>,
    pages: Option<String>,
) -> Result<()> {
    let by_url = url.is_some();
    if keyword.is_none() && !by_url {
        anyhow::bail!("Provide --keyword or --url");
    }

    let form = ScrapeForm {
        keyword: keyword.unwrap_or_default(),
        domain: domain.unwrap_or_else(|| config.domain.clone()),
        pages: pages.unwrap_or_else(|| "1".to_string()),
        search_url: url.unwrap_or_default(),
    };
    let params = if by_url {
        form.submit_url()
    } else {
        form.submit_keyword()
    };

    let dash = Dashboard::new(client, config.stale_policy);
    dash.scrape(params).await;

    match dash.toast() {
        Some(toast) if toast.severity == Severity::Error => anyhow::bail!("{}", toast.text),
        Some(toast) => eprintln!("{}", output::format_toast(&toast)),
        None => {}
    }
    print!("{}", output::format_product_table(&dash.items()));
    Ok(())
}

async fn cmd_history(client: &ApiClient, asin: &str) -> Result<()> {
    let history = client
        .get_history(asin)
        .await
        .with_context(|| format!("Failed to fetch history for {}", asin))?;
    print!("{}", output::format_history(&history));
    Ok(())
}

fn filter_form(args: FilterArgs) -> FilterForm {
    FilterForm {
        q: args.q.unwrap_or_default(),
        min_rating: args.min_rating.unwrap_or_default(),
        max_price: args.max_price.unwrap_or_default(),
    }
}
