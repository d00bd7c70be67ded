use std::borrow::Borrow;
use std::fmt;

pub const DEFAULT_SHORT_ID_LEN: usize = 7;

/// Truncated vertex identifier used as the graph's primary key.
///
/// Two full identifiers sharing the same prefix collapse onto one vertex.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortId(String);

impl ShortId {
    /// Keeps the first `len` characters of `full_id`.
    pub fn truncate(full_id: &str, len: usize) -> Self {
        let end = full_id
            .char_indices()
            .nth(len)
            .map(|(index, _)| index)
            .unwrap_or(full_id.len());
        Self(full_id[..end].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ShortId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ShortId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flag {
    Solid,
    Referenced,
    Conflicting,
    Milestone,
    Tip,
    Selected,
}

impl Flag {
    pub const ALL: [Flag; 6] = [
        Flag::Solid,
        Flag::Referenced,
        Flag::Conflicting,
        Flag::Milestone,
        Flag::Tip,
        Flag::Selected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Referenced => "referenced",
            Self::Conflicting => "conflicting",
            Self::Milestone => "milestone",
            Self::Tip => "tip",
            Self::Selected => "selected",
        }
    }

    /// Whether the aggregate counters track this flag.
    pub fn is_counted(self) -> bool {
        matches!(
            self,
            Self::Solid | Self::Referenced | Self::Conflicting | Self::Tip
        )
    }

    /// Once set, a one-way flag stays set until the vertex is evicted.
    pub fn is_one_way(self) -> bool {
        matches!(
            self,
            Self::Solid | Self::Referenced | Self::Conflicting | Self::Milestone
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexFlags {
    pub is_solid: bool,
    pub is_referenced: bool,
    pub is_conflicting: bool,
    pub is_milestone: bool,
    pub is_tip: bool,
    pub is_selected: bool,
}

impl VertexFlags {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Solid => self.is_solid,
            Flag::Referenced => self.is_referenced,
            Flag::Conflicting => self.is_conflicting,
            Flag::Milestone => self.is_milestone,
            Flag::Tip => self.is_tip,
            Flag::Selected => self.is_selected,
        }
    }

    pub(crate) fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Solid => &mut self.is_solid,
            Flag::Referenced => &mut self.is_referenced,
            Flag::Conflicting => &mut self.is_conflicting,
            Flag::Milestone => &mut self.is_milestone,
            Flag::Tip => &mut self.is_tip,
            Flag::Selected => &mut self.is_selected,
        };
        *slot = value;
    }

    /// A referenced or conflicting vertex has reached its final confirmation state.
    pub fn is_resolved(&self) -> bool {
        self.is_referenced || self.is_conflicting
    }
}

/// Lifecycle position of a vertex, derived from its parents and flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexState {
    /// Referenced by a child before its own event arrived.
    Unknown,
    Unsolid,
    Solid,
    Confirmed,
    Conflicting,
}

impl VertexState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Unsolid => "unsolid",
            Self::Solid => "solid",
            Self::Confirmed => "confirmed",
            Self::Conflicting => "conflicting",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub short_id: ShortId,
    pub full_id: String,
    /// `None` until the vertex's own event has been seen.
    pub parents: Option<Vec<ShortId>>,
    pub children: Vec<ShortId>,
    pub flags: VertexFlags,
    /// Admission sequence number; lower means older.
    pub admitted: u64,
}

impl Vertex {
    pub(crate) fn new(short_id: ShortId, full_id: String, admitted: u64) -> Self {
        Self {
            short_id,
            full_id,
            parents: None,
            children: Vec::new(),
            flags: VertexFlags::default(),
            admitted,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.parents.is_none()
    }

    pub fn state(&self) -> VertexState {
        if self.flags.is_conflicting {
            VertexState::Conflicting
        } else if self.flags.is_referenced {
            VertexState::Confirmed
        } else if self.parents.is_none() {
            VertexState::Unknown
        } else if self.flags.is_solid {
            VertexState::Solid
        } else {
            VertexState::Unsolid
        }
    }

    pub fn parent_ids(&self) -> &[ShortId] {
        self.parents.as_deref().unwrap_or(&[])
    }

    /// Records parent edges; repeated edges and self references are dropped.
    pub(crate) fn merge_parents(&mut self, parents: &[ShortId]) {
        let known = self.parents.get_or_insert_with(Vec::new);
        for parent in parents {
            if *parent != self.short_id && !known.contains(parent) {
                known.push(parent.clone());
            }
        }
    }

    pub(crate) fn link_child(&mut self, child: &ShortId) {
        if !self.children.contains(child) {
            self.children.push(child.clone());
        }
    }

    pub(crate) fn unlink_child(&mut self, child: &ShortId) {
        self.children.retain(|existing| existing != child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(id: &str) -> ShortId {
        ShortId::truncate(id, DEFAULT_SHORT_ID_LEN)
    }

    #[test]
    fn truncate_keeps_prefix_by_characters() {
        assert_eq!(short("abcdef0123456789").as_str(), "abcdef0");
        assert_eq!(short("abc").as_str(), "abc");
        assert_eq!(ShortId::truncate("ééééééééé", 3).as_str(), "ééé");
    }

    #[test]
    fn colliding_prefixes_share_a_key() {
        assert_eq!(short("1234567aaaa"), short("1234567bbbb"));
    }

    #[test]
    fn state_follows_lifecycle() {
        let mut vertex = Vertex::new(short("aaaaaaa"), "aaaaaaa".to_owned(), 0);
        assert_eq!(vertex.state(), VertexState::Unknown);

        vertex.merge_parents(&[]);
        assert_eq!(vertex.state(), VertexState::Unsolid);

        vertex.flags.set(Flag::Solid, true);
        assert_eq!(vertex.state(), VertexState::Solid);

        vertex.flags.set(Flag::Referenced, true);
        assert_eq!(vertex.state(), VertexState::Confirmed);
    }

    #[test]
    fn merge_parents_is_idempotent_and_skips_self() {
        let mut vertex = Vertex::new(short("aaaaaaa"), "aaaaaaa".to_owned(), 0);
        let parents = [short("bbbbbbb"), short("aaaaaaa"), short("bbbbbbb")];
        vertex.merge_parents(&parents);
        vertex.merge_parents(&parents);
        assert_eq!(vertex.parent_ids(), &[short("bbbbbbb")]);
    }
}
