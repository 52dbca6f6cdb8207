use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use termscout::generation::SearchGeneration;
use termscout::glossary::{check_for_updates, GlossarySource, RemoteSource};
use termscout::watcher::{AutoSearcher, AUTO_SEARCH_SETTLE_MS};
use termscout::{GlossaryMatcher, MatchCandidate, MatchConfig, SearchOrigin};

/// Find glossary entries relevant to a piece of text.
#[derive(Debug, Parser)]
#[command(name = "termscout", version)]
struct Cli {
    /// Glossary CSV/JSON file, or an http(s) URL to a CSV.
    #[arg(short, long)]
    glossary: String,

    /// JSON file overriding matching thresholds and word lists.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat the query as passively captured text (stricter thresholds).
    #[arg(long)]
    auto: bool,

    /// Read context text from stdin line by line and auto-search each settled line.
    #[arg(long, conflicts_with = "query")]
    watch: bool,

    /// Settle interval for --watch, in milliseconds.
    #[arg(long, default_value_t = AUTO_SEARCH_SETTLE_MS)]
    settle_ms: u64,

    /// Print matches as JSON.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Log search latency percentiles before exiting.
    #[arg(long)]
    stats: bool,

    /// URL of a version.json document; report available updates before searching.
    #[arg(long, value_name = "URL")]
    check_updates: Option<String>,

    /// Text to search for.
    #[arg(required_unless_present = "watch")]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    termscout::init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => match MatchConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, path = %path.display(), "config load failed");
                return ExitCode::FAILURE;
            }
        },
        None => MatchConfig::default(),
    };

    let remote = match RemoteSource::new() {
        Ok(remote) => remote,
        Err(e) => {
            error!(error = %e, "http client init failed");
            return ExitCode::FAILURE;
        }
    };
    let source = GlossarySource::parse(&cli.glossary);
    let glossary = match source.load(&remote).await {
        Ok(glossary) => glossary,
        Err(e) => {
            error!(error = %e, location = %cli.glossary, "glossary load failed");
            return ExitCode::FAILURE;
        }
    };
    if glossary.is_empty() {
        warn!("glossary is empty, nothing will match");
    }

    if let Some(version_url) = &cli.check_updates {
        match check_for_updates(&remote, version_url, &source, &glossary).await {
            Ok(status) => eprintln!("update check: {status}"),
            Err(e) => warn!(error = %e, url = %version_url, "update check failed"),
        }
    }

    let matcher = Arc::new(GlossaryMatcher::new(config));
    matcher.load_glossary(glossary);

    if cli.watch {
        watch_stdin(Arc::clone(&matcher), Duration::from_millis(cli.settle_ms), cli.json).await;
    } else {
        let origin = if cli.auto {
            SearchOrigin::Auto
        } else {
            SearchOrigin::Manual
        };
        let matches = matcher.search(&cli.query.join(" "), origin);
        print_matches(&matches, cli.json);
    }

    if cli.stats {
        log_latency(&matcher);
    }
    ExitCode::SUCCESS
}

fn log_latency(matcher: &GlossaryMatcher) {
    let cache = matcher.cache_stats();
    info!(
        phrase_entries = cache.phrase_entries,
        similarity_entries = cache.similarity_entries,
        "cache"
    );
    for summary in matcher.metrics().snapshot() {
        info!(
            metric = summary.metric.as_str(),
            samples = summary.samples,
            p50_us = summary.p50_us,
            p95_us = summary.p95_us,
            p99_us = summary.p99_us,
            "latency"
        );
    }
}

/// Feed stdin lines into the auto-search loop until EOF.
async fn watch_stdin(matcher: Arc<GlossaryMatcher>, settle: Duration, json: bool) {
    let (text_tx, text_rx) = watch::channel(String::new());
    let (updates_tx, mut updates_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let searcher = AutoSearcher::new(matcher, Arc::new(SearchGeneration::new()), settle);
    let loop_handle = tokio::spawn(searcher.run(text_rx, updates_tx, cancel.clone()));

    let printer = tokio::spawn(async move {
        while let Some(update) = updates_rx.recv().await {
            if !json {
                println!("# {}", update.text);
            }
            print_matches(&update.matches, json);
        }
    });

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let _ = text_tx.send(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }

    // let the last line settle before shutting down
    tokio::time::sleep(settle * 2).await;
    cancel.cancel();
    let _ = loop_handle.await;
    let _ = printer.await;
}

fn print_matches(matches: &[MatchCandidate], json: bool) {
    if json {
        match serde_json::to_string_pretty(matches) {
            Ok(out) => println!("{out}"),
            Err(e) => error!(error = %e, "result serialization failed"),
        }
        return;
    }

    if matches.is_empty() {
        println!("No matches found");
        return;
    }
    for m in matches {
        println!(
            "{} | {} | {} | {} ({}%)",
            m.entry.source,
            m.entry.target,
            m.entry.note,
            m.matched_phrase,
            (m.score * 100.0).round() as u32
        );
    }
}
