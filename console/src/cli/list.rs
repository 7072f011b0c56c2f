use std::fmt::Display;
use std::str::FromStr;

use anyhow::Result;
use clap::Args;
use evadmin_client::sync::{ListRequest, Sort};

/// Filters shared by every `list` command.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Page to fetch, starting at 1.
    #[clap(long, default_value_t = 1)]
    page: u32,

    /// Items per page. Defaults to the configured page size.
    #[clap(long)]
    page_size: Option<u32>,

    /// Free-text search.
    #[clap(short, long)]
    search: Option<String>,

    /// Additional text filter, e.g. `-f brand=Tesla` or `-f city=Hanoi`.
    #[clap(short, long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Field to sort by.
    #[clap(long)]
    sort: Option<String>,

    /// Sort in descending order.
    #[clap(long, requires = "sort")]
    desc: bool,

    /// Status (or connector type for vehicles).
    #[clap(long)]
    status: Option<String>,
}

impl ListArgs {
    pub fn page_size_or(&self, default: u32) -> u32 {
        self.page_size.unwrap_or(default)
    }

    /// Builds the request. Blank filters are dropped, the rest trimmed.
    pub fn to_request(&self, default_page_size: u32) -> ListRequest {
        let mut request = ListRequest::new(self.page, self.page_size_or(default_page_size));

        let texts = self
            .search
            .iter()
            .map(|search| ("search", search.as_str()))
            .chain(self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        for (field, value) in texts {
            let value = value.trim();
            if !value.is_empty() {
                request.texts.insert(field.to_owned(), value.to_owned());
            }
        }

        request.sort = self.sort.as_ref().map(|field| Sort {
            field: field.clone(),
            descending: self.desc,
        });
        request.status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        request
    }

    /// Like [`ListArgs::to_request`], with `--status` checked against `T`
    /// and sent in its canonical spelling.
    pub fn to_request_with_status<T>(&self, default_page_size: u32) -> Result<ListRequest>
    where
        T: FromStr<Err = String> + Display,
    {
        let mut request = self.to_request(default_page_size);
        if let Some(raw) = request.status.take() {
            let status: T = raw.parse().map_err(anyhow::Error::msg)?;
            request.status = Some(status.to_string());
        }
        Ok(request)
    }
}

/// Parses a status filter typed by the user into its wire spelling.
pub fn canonical_status<T>(raw: &str) -> Result<String, String>
where
    T: FromStr<Err = String> + Display,
{
    raw.parse::<T>().map(|status| status.to_string())
}

fn parse_filter(value: &str) -> Result<(String, String), String> {
    let (field, text) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=TEXT, got '{value}'"))?;

    let field = field.trim();
    if field.is_empty() {
        return Err("filter field must not be empty".to_owned());
    }
    Ok((field.to_owned(), text.to_owned()))
}
