use std::{num::NonZeroU32, time::Duration};

use campus_pagination::{
    api_client::ApiClient,
    config::{ClientConfig, LoaderConfig},
    list_loader::{ListLoader, ListQuery},
    request_pacer::PacingPolicy,
};
use clap::Args;
use comfy_table::Table;
use serde_json::Value;
use tracing::{info, warn};

use crate::{parsers, scope::ScopeArgs};

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    scope: ScopeArgs,

    /// Page to print once the prefetch is done
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Page size (default: CAMPUS_PAGE_LIMIT or 20)
    #[arg(short, long)]
    limit: Option<NonZeroU32>,

    /// Filter sent as a query parameter, e.g. status=active
    #[arg(short, long = "filter", value_parser = parsers::parse_filter)]
    filters: Vec<(String, String)>,

    /// Pages loaded up front (default: CAMPUS_MAX_PREFETCH_PAGES or 3)
    #[arg(long)]
    max_prefetch: Option<NonZeroU32>,

    /// Delay between prefetch requests (e.g. "100ms", "1s")
    #[arg(long, value_parser = parsers::parse_duration, conflicts_with = "rate")]
    delay: Option<jiff::SignedDuration>,

    /// Pace requests with a token bucket of this many requests per second
    #[arg(long)]
    rate: Option<NonZeroU32>,

    /// Columns to print (default: every field of the first item)
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Print the page as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    fn loader_config(&self) -> anyhow::Result<LoaderConfig> {
        let mut config = LoaderConfig::from_env()?;

        if let Some(limit) = self.limit {
            config.limit = limit.get();
        }
        if let Some(max_prefetch) = self.max_prefetch {
            config.max_prefetch_pages = max_prefetch.get();
        }
        if let Some(delay) = self.delay {
            config.pacing = PacingPolicy::FixedDelay {
                delay: Duration::try_from(delay.abs())?,
            };
        }
        if let Some(per_second) = self.rate {
            config.pacing = PacingPolicy::TokenBucket {
                per_second,
                burst: per_second,
            };
        }

        Ok(config)
    }
}

pub async fn run(args: ListArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(ClientConfig::from_env()?)?;
    let loader_config = args.loader_config()?;

    let mut query = ListQuery::new(args.scope.into_scope());
    for (key, value) in args.filters {
        query = query.with_filter(key, value);
    }

    let loader: ListLoader<Value, _> = ListLoader::new(client, loader_config);

    let report = loader.load(query).await?;
    for (page, err) in &report.failed_pages {
        warn!("Page {} could not be prefetched: {}", page, err.user_message());
    }

    if args.page != 1 && !loader.go_to_page(args.page).await? {
        anyhow::bail!(
            "Page {} is out of range (1..={})",
            args.page,
            loader.pagination().total_pages
        );
    }

    let items = loader.visible_items();
    let state = loader.pagination();

    if args.json {
        let output = serde_json::json!({
            "items": items,
            "pagination": state,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", render_table(&items, &args.columns));
    info!(
        "Page {}/{} ({} items total, {} cached)",
        state.current_page,
        state.total_pages,
        report.total,
        loader.cached_item_count()
    );

    Ok(())
}

fn render_table(items: &[Value], columns: &[String]) -> Table {
    let columns: Vec<String> = if columns.is_empty() {
        items
            .first()
            .and_then(Value::as_object)
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        columns.to_vec()
    };

    let mut table = Table::new();
    table.set_header(&columns);

    for item in items {
        table.add_row(columns.iter().map(|column| cell(item.get(column))));
    }

    table
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell(None), "");
        assert_eq!(cell(Some(&Value::Null)), "");
        assert_eq!(cell(Some(&json!("Math 101"))), "Math 101");
        assert_eq!(cell(Some(&json!(true))), "true");
        assert_eq!(cell(Some(&json!(42))), "42");
    }

    #[test]
    fn test_render_table_uses_first_item_keys() {
        let items = vec![
            json!({"id": "c1", "name": "Math"}),
            json!({"id": "c2", "name": "Art", "extra": 1}),
        ];

        let table = render_table(&items, &[]).to_string();

        assert!(table.contains("id"));
        assert!(table.contains("Math"));
        assert!(table.contains("Art"));
        assert!(!table.contains("extra"));
    }
}
