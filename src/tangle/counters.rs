use tracing::warn;

use super::vertex::{Flag, VertexFlags};

/// Totals over the current working set, as reported to subscribers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub solid: usize,
    pub referenced: usize,
    pub conflicting: usize,
    pub tips: usize,
}

impl Counts {
    /// Count for a tracked flag; `None` for flags the counters do not track.
    pub fn get(&self, flag: Flag) -> Option<usize> {
        match flag {
            Flag::Solid => Some(self.solid),
            Flag::Referenced => Some(self.referenced),
            Flag::Conflicting => Some(self.conflicting),
            Flag::Tip => Some(self.tips),
            Flag::Milestone | Flag::Selected => None,
        }
    }

    /// Share of `total` holding `flag`, in percent.
    pub fn percent(&self, flag: Flag) -> f32 {
        match self.get(flag) {
            Some(count) if self.total > 0 => (count as f32 / self.total as f32) * 100.0,
            _ => 0.0,
        }
    }

    fn slot_mut(&mut self, flag: Flag) -> Option<&mut usize> {
        match flag {
            Flag::Solid => Some(&mut self.solid),
            Flag::Referenced => Some(&mut self.referenced),
            Flag::Conflicting => Some(&mut self.conflicting),
            Flag::Tip => Some(&mut self.tips),
            Flag::Milestone | Flag::Selected => None,
        }
    }
}

/// Incrementally maintained [`Counts`].
///
/// Every flag write in the engine reports its transition here; the counters
/// never scan the store.
#[derive(Debug, Default)]
pub struct AggregateCounters {
    counts: Counts,
}

impl AggregateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn reset(&mut self) {
        self.counts = Counts::default();
    }

    pub fn on_admitted(&mut self) {
        self.counts.total += 1;
    }

    /// Drops a removed vertex from the totals, including every flag it held.
    pub fn on_removed(&mut self, flags: &VertexFlags) {
        for flag in Flag::ALL {
            self.on_flag_transition(flag, flags.get(flag), false);
        }
        self.counts.total = decrement(self.counts.total, "total");
    }

    pub fn on_flag_transition(&mut self, flag: Flag, old_value: bool, new_value: bool) {
        if old_value == new_value {
            return;
        }
        let Some(slot) = self.counts.slot_mut(flag) else {
            return;
        };
        *slot = if new_value {
            *slot + 1
        } else {
            decrement(*slot, flag.label())
        };
    }
}

fn decrement(value: usize, name: &str) -> usize {
    if value == 0 {
        warn!(counter = name, "counter underflow ignored");
        debug_assert!(false, "counter {name} underflow");
    }
    value.saturating_sub(1)
}
