use crate::api::ApiClient;
use crate::dashboard::Dashboard;
use crate::form::{FilterForm, ScrapeForm, KNOWN_DOMAINS};
use crate::notify::{Notification, TOAST_DURATION};
use crate::output;
use anyhow::Result;
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::future::Future;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  scrape [keyword]      scrape by keyword (uses the last keyword if omitted)
  url [search-url]      scrape a full search URL
  domain <domain>       marketplace for keyword scrapes
  pages <n>             result pages per scrape
  filter [q=..] [min_rating=..] [max_price=..]
                        apply listing filters (no arguments clears them)
  reload                fetch the listing again
  history <asin>        price history for a product
  export                print the CSV export link
  show                  print the current listing
  dismiss               dismiss the current notification
  help                  this text
  quit                  leave";

enum Flow {
    Continue,
    Quit,
}

/// Interactive dashboard: reads commands from stdin while earlier actions are
/// still in flight. Everything runs on the calling task.
pub struct Session {
    dash: Dashboard<ApiClient>,
    client: ApiClient,
    scrape_form: ScrapeForm,
    filter_form: FilterForm,
    notification: Option<Notification>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Outcome>>,
}

/// What a finished background job may have changed.
enum Outcome {
    Listing,
    Printed,
}

impl Session {
    pub fn new(dash: Dashboard<ApiClient>, client: ApiClient, domain: String) -> Self {
        Self {
            dash,
            client,
            scrape_form: ScrapeForm {
                domain,
                ..Default::default()
            },
            filter_form: FilterForm::default(),
            notification: None,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub async fn run(mut self) -> Result<()> {
        println!("API: {}", self.client.base());
        println!("{}\n", HELP);

        let dash = self.dash.clone();
        self.spawn(async move { dash.start().await });

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if let Flow::Quit = self.handle_line(line.trim()) {
                        break;
                    }
                }
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    if let Outcome::Listing = outcome {
                        print!("{}", output::format_product_table(&self.dash.items()));
                        println!("{}", self.status());
                    }
                }
            }
            self.sync_notification();
        }

        if !self.in_flight.is_empty() {
            tracing::info!("Leaving with {} request(s) still running", self.in_flight.len());
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "scrape" => {
                if !rest.is_empty() {
                    self.scrape_form.keyword = rest.to_string();
                }
                let params = self.scrape_form.submit_keyword();
                let dash = self.dash.clone();
                self.spawn(async move { dash.scrape(params).await });
            }
            "url" => {
                self.scrape_form.search_url = rest.to_string();
                let params = self.scrape_form.submit_url();
                let dash = self.dash.clone();
                self.spawn(async move { dash.scrape(params).await });
            }
            "domain" => {
                if !KNOWN_DOMAINS.contains(&rest) {
                    println!(
                        "{}",
                        output::format_notice(&format!(
                            "'{}' is not one of {}",
                            rest,
                            KNOWN_DOMAINS.join(", ")
                        ))
                    );
                }
                self.scrape_form.domain = rest.to_string();
            }
            "pages" => self.scrape_form.pages = rest.to_string(),
            "filter" => match parse_filter_form(rest) {
                Ok(form) => {
                    self.filter_form = form;
                    let filters = self.filter_form.submit();
                    let dash = self.dash.clone();
                    self.spawn(async move { dash.filter(filters).await });
                }
                Err(msg) => println!("{}", msg),
            },
            "reload" => {
                let dash = self.dash.clone();
                self.spawn(async move { dash.load().await });
            }
            "history" => {
                let client = self.client.clone();
                let asin = rest.to_string();
                self.in_flight.push(
                    async move {
                        match client.get_history(&asin).await {
                            Ok(history) => print!("{}", output::format_history(&history)),
                            Err(e) => println!("History failed: {}", e),
                        }
                        Outcome::Printed
                    }
                    .boxed_local(),
                );
            }
            "export" => println!("{}", self.dash.export_url()),
            "show" => {
                print!("{}", output::format_product_table(&self.dash.items()));
                println!("{}", self.status());
                if let Some(toast) = self.dash.toast() {
                    println!("{}", output::format_toast(&toast));
                }
            }
            "dismiss" => match self.notification.take() {
                Some(notification) if notification.is_active() => notification.dismiss(),
                _ => println!("{}", output::format_notice("Nothing to dismiss")),
            },
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Flow::Quit,
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
        Flow::Continue
    }

    /// Starts a dashboard action and reports the busy state.
    ///
    /// The action is polled once right away so it has raised the loading flag
    /// (and sent its request) before the status line is printed.
    fn spawn(&mut self, action: impl Future<Output = ()> + 'static) {
        let mut job = async move {
            action.await;
            Outcome::Listing
        }
        .boxed_local();
        match (&mut job).now_or_never() {
            Some(_) => {
                print!("{}", output::format_product_table(&self.dash.items()));
            }
            // Re-polled with a real waker once inside the set.
            None => self.in_flight.push(job),
        }
        println!("{}", self.status());
    }

    fn status(&self) -> String {
        output::format_status(self.dash.is_loading(), self.dash.items().len())
    }

    /// Shows a toast the dashboard raised since the last check, replacing
    /// (and cancelling) the previous one.
    fn sync_notification(&mut self) {
        let current = self.dash.toast();
        let shown = self.notification.as_ref().map(|n| n.toast().id);

        match current {
            Some(toast) if Some(toast.id) != shown => {
                println!("{}", output::format_toast(&toast));
                let dash = self.dash.clone();
                let id = toast.id;
                self.notification = Some(Notification::show(toast, TOAST_DURATION, move || {
                    dash.dismiss_toast(id);
                }));
            }
            None => self.notification = None,
            _ => {}
        }
    }
}

/// `q=usb c min_rating=4` style arguments. Words without a key continue the
/// previous value.
fn parse_filter_form(args: &str) -> Result<FilterForm, String> {
    let mut form = FilterForm::default();
    let mut current: Option<&str> = None;

    for word in args.split_whitespace() {
        let (key, value) = match word.split_once('=') {
            Some((key, value)) => {
                current = Some(key);
                (key, value)
            }
            None => match current {
                Some(key) => (key, word),
                None => return Err(format!("Expected key=value, got '{}'", word)),
            },
        };

        let field = match key {
            "q" => &mut form.q,
            "min_rating" => &mut form.min_rating,
            "max_price" => &mut form.max_price,
            other => {
                return Err(format!(
                    "Unknown filter '{}'. Use q, min_rating or max_price",
                    other
                ))
            }
        };
        if word.contains('=') {
            field.clear();
        } else {
            field.push(' ');
        }
        field.push_str(value);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_arguments_split_on_keys() {
        let form = parse_filter_form("q=usb c hub min_rating=4.5").unwrap();
        assert_eq!(form.q, "usb c hub");
        assert_eq!(form.min_rating, "4.5");
        assert_eq!(form.max_price, "");
    }

    #[test]
    fn empty_filter_clears_everything() {
        let filter = parse_filter_form("").unwrap().submit();
        assert!(filter.is_empty());
    }

    #[test]
    fn bad_rating_text_is_dropped_not_rejected() {
        let filter = parse_filter_form("min_rating=abc max_price=30").unwrap().submit();
        assert_eq!(filter.min_rating, None);
        assert_eq!(filter.max_price, Some(30.0));
    }

    #[test]
    fn unknown_keys_and_bare_words_are_errors() {
        assert!(parse_filter_form("brand=sony").is_err());
        assert!(parse_filter_form("phone").is_err());
    }
}
