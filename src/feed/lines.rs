use std::io::BufRead;

use anyhow::{Context, Result};
use tracing::warn;

use crate::tangle::{InboundEvent, parse_event_line};

/// Decodes a JSON-lines stream, handing each event to `emit`.
///
/// Malformed lines are logged and skipped. Returns the number of events
/// emitted; stops early once `emit` returns `false`.
pub fn read_event_lines<R, F>(reader: R, mut emit: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(InboundEvent) -> bool,
{
    let mut emitted = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("failed to read event feed line {line_number}"))?;

        match parse_event_line(&line) {
            Ok(Some(event)) => {
                emitted += 1;
                if !emit(event) {
                    break;
                }
            }
            Ok(None) => {}
            Err(error) => {
                warn!(line = line_number, error = %format!("{error:#}"), "skipping malformed event");
            }
        }
    }

    Ok(emitted)
}
