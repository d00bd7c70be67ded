//! Event sources that feed a [`GraphEngine`](crate::tangle::GraphEngine) from
//! a background thread.

mod lines;
mod synthetic;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::tangle::InboundEvent;

pub use lines::read_event_lines;
pub use synthetic::SyntheticTangle;

/// Events buffered between the feed thread and the consumer before the feed
/// blocks.
const FEED_BACKLOG: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
    Synthetic { seed: u64 },
}

impl FeedSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_owned(),
            Self::File(path) => path.display().to_string(),
            Self::Synthetic { seed } => format!("synthetic (seed {seed})"),
        }
    }

    /// Whether a second [`spawn_feed`] starts from the beginning again.
    /// Stdin is consumed by the first reader.
    pub fn is_replayable(&self) -> bool {
        !matches!(self, Self::Stdin)
    }
}

#[derive(Debug)]
pub enum FeedMessage {
    Event(InboundEvent),
    Error(String),
    Finished,
}

/// Starts `source` on its own thread.
///
/// `rate` caps lines per second for line feeds and vertices per second for
/// the synthetic feed. The thread exits once the receiver is dropped.
pub fn spawn_feed(source: FeedSource, rate: Option<u32>) -> Receiver<FeedMessage> {
    let (tx, rx) = mpsc::sync_channel(FEED_BACKLOG);

    thread::spawn(move || {
        let mut pacer = Pacer::new(rate);
        let result = match &source {
            FeedSource::Stdin => run_lines(io::stdin().lock(), &tx, &mut pacer),
            FeedSource::File(path) => File::open(path)
                .with_context(|| format!("failed to open event feed {}", path.display()))
                .and_then(|file| run_lines(BufReader::new(file), &tx, &mut pacer)),
            FeedSource::Synthetic { seed } => {
                run_synthetic(*seed, &tx, &mut pacer);
                Ok(())
            }
        };

        let message = match result {
            Ok(()) => FeedMessage::Finished,
            Err(error) => FeedMessage::Error(format!("{error:#}")),
        };
        let _ = tx.send(message);
    });

    rx
}

fn run_lines(
    reader: impl BufRead,
    tx: &SyncSender<FeedMessage>,
    pacer: &mut Pacer,
) -> Result<()> {
    let count = read_event_lines(reader, |event| {
        pacer.wait();
        tx.send(FeedMessage::Event(event)).is_ok()
    })?;
    info!(events = count, "event feed drained");
    Ok(())
}

fn run_synthetic(seed: u64, tx: &SyncSender<FeedMessage>, pacer: &mut Pacer) {
    let mut tangle = SyntheticTangle::new(seed);
    loop {
        pacer.wait();
        for event in tangle.next_events() {
            if tx.send(FeedMessage::Event(event)).is_err() {
                info!(vertices = tangle.steps(), "synthetic feed closed");
                return;
            }
        }
    }
}

struct Pacer {
    interval: Option<Duration>,
}

impl Pacer {
    fn new(rate: Option<u32>) -> Self {
        Self {
            interval: rate
                .filter(|rate| *rate > 0)
                .map(|rate| Duration::from_secs_f64(1.0 / f64::from(rate))),
        }
    }

    fn wait(&mut self) {
        if let Some(interval) = self.interval {
            thread::sleep(interval);
        }
    }
}
