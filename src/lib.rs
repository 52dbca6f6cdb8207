//! termscout: fuzzy glossary matching for in-context translation.
//! Given free text and a glossary of source/target/note/category entries,
//! finds the entries whose terms appear (exactly or approximately) in the text.

pub mod config;
pub mod generation;
pub mod glossary;
pub mod matching;
pub mod metrics;
pub mod phase;
pub mod watcher;

pub use config::{ConfigError, MatchConfig};
pub use glossary::{Glossary, GlossaryEntry, GlossaryError};
pub use matching::{GlossaryMatcher, MatchCandidate, SearchOrigin};

/// Install the fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("termscout=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed (tests, embedding apps).
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
