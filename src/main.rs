use anyhow::{Context, Result};
use clap::Parser;
use debounced_search::{
    LiveFilter, OutputFormat, Settings, load_records, logging, output::write_view,
};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "dsearch",
    version,
    about = "Filter JSON records with a debounced query read line by line from stdin",
    long_about = None
)]
struct Cli {
    /// JSON file holding an array of records
    #[arg(short, long)]
    items: PathBuf,

    /// Field to search; repeat for any-of matching, dots reach nested fields (e.g. profile.email)
    #[arg(short, long = "key")]
    keys: Vec<String>,

    /// Quiet period before a query settles, in milliseconds
    #[arg(short, long, env = "DSEARCH_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,

    /// Maximum number of records printed per view
    #[arg(short = 'n', long)]
    max_results: Option<usize>,

    /// Settings file (default: <config dir>/dsearch/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_tracing(cli.verbose);

    let mut settings = Settings::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;
    settings.apply_overrides(cli.debounce_ms, cli.format, &cli.keys);

    let key = settings.search_key()?.ok_or_else(|| {
        anyhow::anyhow!("No search key given (use --key or set `keys` in the settings file)")
    })?;

    let records = load_records(&cli.items)?;

    // one logical thread: the timer task and the stdin reader share it
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    info!(%key, delay_ms = settings.debounce_ms, "filtering");
    let filter = LiveFilter::with_delay(records, key, settings.delay());
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    runtime.block_on(run(filter, stdin, &mut handle, settings.format, cli.max_results))
}

/// Feed each input line to the filter and print the view whenever a query settles.
async fn run<R, W>(
    mut filter: LiveFilter<Value>,
    input: R,
    out: &mut W,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut settled = filter.subscribe();
    let mut lines = input.lines();

    print_view(&filter, out, "", format, limit)?;

    loop {
        tokio::select! {
            // a settled query is printed before end of input is acted on
            biased;

            changed = settled.changed() => {
                if changed.is_err() {
                    break;
                }
                let query = settled.borrow_and_update().clone();
                print_view(&filter, out, &query, format, limit)?;
            }
            line = lines.next_line() => {
                match line.context("Failed to read query from stdin")? {
                    Some(query) => {
                        debug!(%query, "query typed");
                        filter.set_query(query);
                    }
                    None => break,
                }
            }
        }
    }

    if settled.has_changed().unwrap_or(false) {
        let query = settled.borrow_and_update().clone();
        print_view(&filter, out, &query, format, limit)?;
    }

    // input is over; the last query should not wait out its quiet period
    if let Some(query) = filter.flush() {
        print_view(&filter, out, &query, format, limit)?;
    }
    filter.close();

    Ok(())
}

fn print_view<W: Write>(
    filter: &LiveFilter<Value>,
    out: &mut W,
    query: &str,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<()> {
    filter
        .with_filtered(|view| write_view(out, view, query, format, limit))
        .context("Failed to write results")
}

#[cfg(test)]
mod tests {
    use super::*;
    use debounced_search::SearchKey;
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncWriteExt, duplex};
    use tokio::time::sleep;

    fn filter() -> LiveFilter<Value> {
        LiveFilter::new(
            vec![
                json!({"id": 1, "username": "john_doe"}),
                json!({"id": 2, "username": "jane_doe"}),
                json!({"id": 3, "username": "michael_smith"}),
            ],
            SearchKey::field("username"),
        )
    }

    fn headers(output: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(output)
            .lines()
            .filter(|line| !line.starts_with("  "))
            .map(str::to_string)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_of_input_flushes_pending_query() {
        let mut out = Vec::new();
        run(filter(), &b"j\njo\ndoe\n"[..], &mut out, OutputFormat::Text, None)
            .await
            .unwrap();

        assert_eq!(
            headers(&out),
            vec![
                "Found 3 matches for \"\":".to_string(),
                "Found 2 matches for \"doe\":".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_queries_are_printed_as_they_settle() {
        let (mut writer, reader) = duplex(64);
        tokio::spawn(async move {
            writer.write_all(b"smith\n").await.unwrap();
            sleep(Duration::from_secs(1)).await;
            writer.write_all(b"jane\n").await.unwrap();
        });

        let mut out = Vec::new();
        run(filter(), BufReader::new(reader), &mut out, OutputFormat::JsonL, None)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let ids: Vec<i64> = text
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["id"].as_i64().unwrap())
            .collect();
        // full view, then "smith" settled by the timer, then "jane" flushed at end of input
        assert_eq!(ids, vec![1, 2, 3, 3, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_right_before_end_of_input_is_printed() {
        let (mut writer, reader) = duplex(64);
        tokio::spawn(async move {
            writer.write_all(b"doe\n").await.unwrap();
            // input closes at the same instant the quiet period ends
            sleep(Duration::from_millis(300)).await;
        });

        let mut out = Vec::new();
        run(filter(), BufReader::new(reader), &mut out, OutputFormat::Text, None)
            .await
            .unwrap();

        let headers = headers(&out);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[1], "Found 2 matches for \"doe\":");
    }
}
