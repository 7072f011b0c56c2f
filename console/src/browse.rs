use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use evadmin_client::resources::{ConnectorType, InvoiceStatus, ReservationStatus, StationStatus};
use evadmin_client::sync::{ListController, ListSource, LoadStatus, Sort};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{Console, canonical_status};
use crate::render::{self, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrowseResource {
    Stations,
    Plans,
    Vehicles,
    Reservations,
    Invoices,
    Sessions,
    UninvoicedSessions,
    Locations,
}

impl BrowseResource {
    /// Field that receives `/text` input.
    fn text_field(self) -> &'static str {
        match self {
            Self::Vehicles => "model",
            Self::Reservations => "userId",
            Self::Locations => "city",
            _ => "search",
        }
    }

    /// Checks a typed status filter and returns its wire spelling.
    fn status_filter(self, raw: &str) -> Result<String, String> {
        match self {
            Self::Stations => canonical_status::<StationStatus>(raw),
            Self::Vehicles => canonical_status::<ConnectorType>(raw),
            Self::Reservations => canonical_status::<ReservationStatus>(raw),
            Self::Invoices => {
                let status: InvoiceStatus = raw.parse()?;
                if !status.is_filterable() {
                    return Err(format!("invoices cannot be filtered by {status}"));
                }
                Ok(status.to_string())
            }
            Self::Plans | Self::Sessions | Self::UninvoicedSessions | Self::Locations => {
                Err("this list has no status filter".to_owned())
            }
        }
    }
}

pub async fn run(console: &Console, resource: BrowseResource) -> Result<()> {
    let list = &console.config().list;
    let gateway = console.gateway();

    let (page_size, debounce) = (list.page_size, list.debounce);
    match resource {
        BrowseResource::Stations => {
            browse(console, gateway.stations(), page_size, debounce, resource).await
        }
        BrowseResource::Plans => {
            browse(console, gateway.plans(), page_size, debounce, resource).await
        }
        BrowseResource::Vehicles => {
            let (page_size, debounce) = (list.vehicles_page_size, list.vehicles_debounce);
            browse(console, gateway.vehicles(), page_size, debounce, resource).await
        }
        BrowseResource::Reservations => {
            browse(console, gateway.reservations(), page_size, debounce, resource).await
        }
        BrowseResource::Invoices => {
            browse(console, gateway.invoices(), page_size, debounce, resource).await
        }
        BrowseResource::Sessions => {
            browse(console, gateway.sessions(), page_size, debounce, resource).await
        }
        BrowseResource::UninvoicedSessions => {
            let source = gateway.sessions().uninvoiced();
            browse(console, source, page_size, debounce, resource).await
        }
        BrowseResource::Locations => {
            browse(console, gateway.locations(), page_size, debounce, resource).await
        }
    }
}

async fn browse<S>(
    console: &Console,
    source: S,
    page_size: u32,
    debounce: Duration,
    resource: BrowseResource,
) -> Result<()>
where
    S: ListSource,
    S::Item: Row,
{
    let mut list = ListController::new(source, page_size, debounce);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("{HELP}");
    list.mount().await;
    show(&list, console.json())?;

    loop {
        if console.session_expired() {
            anyhow::bail!("browsing stopped");
        }

        tokio::select! {
            field = list.debounced(), if list.has_pending_input() => {
                list.commit_input(&field).await;
                show(&list, console.json())?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };

                let command = match Command::parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{e}");
                        continue;
                    }
                };

                let fetches = match command {
                    Command::Quit => break,
                    Command::Help => {
                        eprintln!("{HELP}");
                        continue;
                    }
                    Command::Type { field, text } => {
                        let field = field.as_deref().unwrap_or(resource.text_field());
                        list.input_text(field, &text);
                        continue;
                    }
                    Command::Flush => list.flush_input().await,
                    Command::Next => list.next_page().await,
                    Command::Previous => list.previous_page().await,
                    Command::Page(page) => list.go_to_page(page).await,
                    Command::Sort(field) => list.select_sort(&field).await,
                    Command::Status(None) => list.set_status(None).await,
                    Command::Status(Some(raw)) => match resource.status_filter(&raw) {
                        Ok(status) => list.set_status(Some(status.as_str())).await,
                        Err(e) => {
                            eprintln!("{e}");
                            continue;
                        }
                    },
                    Command::Clear => list.clear_filters().await,
                    Command::Refresh => list.refresh().await,
                };

                if fetches == 0 {
                    eprintln!("(unchanged)");
                } else {
                    show(&list, console.json())?;
                }
            }
        }
    }

    Ok(())
}

fn show<S>(list: &ListController<S>, json: bool) -> Result<()>
where
    S: ListSource,
    S::Item: Row,
{
    let view = list.view();
    if view.status() == LoadStatus::Failed {
        eprintln!("{}", view.error().unwrap_or("Fetch failed"));
    }

    let state = list.state();
    if !json && state.has_active_filters() {
        let texts: Vec<String> = ["search", "model", "brand", "userId", "city"]
            .iter()
            .filter_map(|field| Some(format!("{field}={}", state.debounced_text(field)?)))
            .collect();
        let sort = state.sort().map(describe_sort);
        let status = state.status().map(|s| format!("status={s}"));

        let summary: Vec<String> = texts.into_iter().chain(sort).chain(status).collect();
        if !summary.is_empty() {
            println!("filters: {}", summary.join(", "));
        }
    }

    render::print_items(view.items(), view.page(), json)
}

fn describe_sort(sort: &Sort) -> String {
    let direction = if sort.descending { "desc" } else { "asc" };
    format!("sort={} {direction}", sort.field)
}

const HELP: &str = "\
/TEXT          filter by text (applied after a short pause)
f FIELD TEXT   filter FIELD by text
!              apply typed filters now
s FIELD        sort by FIELD, again to flip direction
st [STATUS]    filter by status, empty to drop it
n / p          next / previous page
g N            go to page N
c              clear all filters
r              reload the current page
q              quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Type { field: Option<String>, text: String },
    Flush,
    Next,
    Previous,
    Page(u32),
    Sort(String),
    Status(Option<String>),
    Clear,
    Refresh,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        if let Some(text) = line.strip_prefix('/') {
            return Ok(Self::Type {
                field: None,
                text: text.to_owned(),
            });
        }

        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "q" | "quit" | "exit" => Self::Quit,
            "?" | "h" | "help" => Self::Help,
            "!" => Self::Flush,
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Previous,
            "c" | "clear" => Self::Clear,
            "r" | "refresh" => Self::Refresh,
            "g" | "page" => {
                let page = rest
                    .parse::<u32>()
                    .map_err(|_| format!("not a page number: '{rest}'"))?;
                Self::Page(page)
            }
            "s" | "sort" if !rest.is_empty() => Self::Sort(rest.to_owned()),
            "st" | "status" => Self::Status((!rest.is_empty()).then(|| rest.to_owned())),
            "f" | "filter" => {
                let (field, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if field.is_empty() {
                    return Err("usage: f FIELD TEXT".to_owned());
                }
                Self::Type {
                    field: Some(field.to_owned()),
                    text: text.to_owned(),
                }
            }
            "" => return Err("type ? for help".to_owned()),
            other => return Err(format!("unknown command '{other}', type ? for help")),
        };
        Ok(command)
    }
}
