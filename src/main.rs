mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;
use tangle_visualizer::feed::FeedSource;
use tangle_visualizer::tangle::{DEFAULT_SHORT_ID_LEN, DEFAULT_VERTEX_LIMIT, EngineConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Live view of a streaming transaction tangle.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON-lines event file to replay, or `-` for stdin. Without it a
    /// synthetic tangle is generated.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Seed for the synthetic tangle.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Lines per second when replaying, vertices per second when synthetic;
    /// 0 disables pacing.
    #[arg(long, default_value_t = 40)]
    rate: u32,

    /// Vertices kept before the oldest are evicted.
    #[arg(long, default_value_t = DEFAULT_VERTEX_LIMIT)]
    vertex_limit: usize,

    /// Characters of each id used as the vertex key.
    #[arg(long, default_value_t = DEFAULT_SHORT_ID_LEN, value_parser = parse_short_id_len)]
    short_id_len: usize,

    /// Default log level; RUST_LOG directives take precedence.
    #[arg(long, default_value = "info")]
    log: LevelFilter,
}

fn parse_short_id_len(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_owned()),
        Ok(len) => Ok(len),
        Err(error) => Err(error.to_string()),
    }
}

impl Args {
    fn settings(&self) -> app::Settings {
        let source = match &self.events {
            Some(path) if path.as_os_str() == "-" => FeedSource::Stdin,
            Some(path) => FeedSource::File(path.clone()),
            None => FeedSource::Synthetic { seed: self.seed },
        };

        app::Settings {
            config: EngineConfig {
                vertex_limit: self.vertex_limit,
                short_id_len: self.short_id_len,
            },
            source,
            rate: (self.rate > 0).then_some(self.rate),
        }
    }
}

fn init_tracing(default_level: LevelFilter) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log)?;

    let settings = args.settings();
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "tangle visualizer",
        options,
        Box::new(move |cc| Ok(Box::new(app::TangleApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_a_paced_synthetic_feed() {
        let args = Args::try_parse_from(["tangle-visualizer"]).expect("defaults parse");
        let settings = args.settings();

        assert_eq!(settings.source, FeedSource::Synthetic { seed: 1 });
        assert_eq!(settings.rate, Some(40));
        assert_eq!(settings.config, EngineConfig::default());
    }

    #[test]
    fn dash_reads_stdin_and_zero_rate_is_unpaced() {
        let args = Args::try_parse_from(["tangle-visualizer", "--events", "-", "--rate", "0"])
            .expect("flags parse");
        let settings = args.settings();

        assert_eq!(settings.source, FeedSource::Stdin);
        assert_eq!(settings.rate, None);
    }

    #[test]
    fn log_level_is_parsed_up_front() {
        let args = Args::try_parse_from(["tangle-visualizer", "--log", "debug"])
            .expect("level parses");
        assert_eq!(args.log, LevelFilter::DEBUG);
        assert!(Args::try_parse_from(["tangle-visualizer", "--log", "chatty"]).is_err());
    }

    #[test]
    fn short_id_len_must_be_positive() {
        assert!(Args::try_parse_from(["tangle-visualizer", "--short-id-len", "0"]).is_err());
    }
}
