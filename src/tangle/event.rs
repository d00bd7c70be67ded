use anyhow::{Context, Result};
use serde::Deserialize;

use super::vertex::{Flag, ShortId};

/// One message from the transport, as it appears on the wire.
///
/// IDs are full ledger identifiers; the engine truncates them on entry.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    Vertex {
        id: String,
        #[serde(default)]
        parents: Vec<String>,
        #[serde(default)]
        is_solid: Option<bool>,
        #[serde(default)]
        is_referenced: Option<bool>,
        #[serde(default)]
        is_conflicting: Option<bool>,
        #[serde(default)]
        is_milestone: Option<bool>,
        #[serde(default)]
        is_tip: Option<bool>,
    },
    Solid {
        id: String,
    },
    Milestone {
        id: String,
    },
    Tip {
        id: String,
        is_tip: bool,
    },
    Confirmed {
        id: String,
        #[serde(default)]
        excluded_ids: Vec<String>,
    },
}

impl InboundEvent {
    /// A bare vertex event carrying only its parent list.
    pub fn vertex(id: impl Into<String>, parents: Vec<String>) -> Self {
        Self::Vertex {
            id: id.into(),
            parents,
            is_solid: None,
            is_referenced: None,
            is_conflicting: None,
            is_milestone: None,
            is_tip: None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Vertex { id, .. }
            | Self::Solid { id }
            | Self::Milestone { id }
            | Self::Tip { id, .. }
            | Self::Confirmed { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Vertex { .. } => "vertex",
            Self::Solid { .. } => "solid",
            Self::Milestone { .. } => "milestone",
            Self::Tip { .. } => "tip",
            Self::Confirmed { .. } => "confirmed",
        }
    }

    /// Converts to the engine's keyed form using `short_id_len`-character keys.
    pub fn normalize(self, short_id_len: usize) -> TangleEvent {
        let key = |full_id: &str| ShortId::truncate(full_id, short_id_len);
        match self {
            Self::Vertex {
                id,
                parents,
                is_solid,
                is_referenced,
                is_conflicting,
                is_milestone,
                is_tip,
            } => {
                let mut parent_refs: Vec<VertexRef> = Vec::with_capacity(parents.len());
                for parent in parents {
                    let short_id = key(&parent);
                    if !parent_refs.iter().any(|known| known.short_id == short_id) {
                        parent_refs.push(VertexRef {
                            short_id,
                            full_id: parent,
                        });
                    }
                }

                TangleEvent::Vertex {
                    vertex: VertexRef {
                        short_id: key(&id),
                        full_id: id,
                    },
                    parents: parent_refs,
                    flags: FlagUpdates {
                        is_solid,
                        is_referenced,
                        is_conflicting,
                        is_milestone,
                        is_tip,
                    },
                }
            }
            Self::Solid { id } => TangleEvent::Solid { id: key(&id) },
            Self::Milestone { id } => TangleEvent::Milestone { id: key(&id) },
            Self::Tip { id, is_tip } => TangleEvent::Tip {
                id: key(&id),
                is_tip,
            },
            Self::Confirmed { id, excluded_ids } => TangleEvent::Confirmed {
                id: key(&id),
                excluded: excluded_ids.iter().map(|excluded| key(excluded)).collect(),
            },
        }
    }
}

/// Decodes one line of a JSON-lines feed. Blank lines yield `None`.
pub fn parse_event_line(line: &str) -> Result<Option<InboundEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let event = serde_json::from_str(line)
        .with_context(|| format!("invalid tangle event: {}", preview(line)))?;
    Ok(Some(event))
}

fn preview(line: &str) -> &str {
    const PREVIEW_CHARS: usize = 96;
    let end = line
        .char_indices()
        .nth(PREVIEW_CHARS)
        .map(|(index, _)| index)
        .unwrap_or(line.len());
    &line[..end]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VertexRef {
    pub short_id: ShortId,
    pub full_id: String,
}

/// Flag values supplied with a vertex event; `None` means not supplied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagUpdates {
    pub is_solid: Option<bool>,
    pub is_referenced: Option<bool>,
    pub is_conflicting: Option<bool>,
    pub is_milestone: Option<bool>,
    pub is_tip: Option<bool>,
}

impl FlagUpdates {
    /// Supplied values in application order. Referenced precedes conflicting,
    /// so a message claiming both resolves as referenced.
    pub fn supplied(&self) -> impl Iterator<Item = (Flag, bool)> {
        [
            (Flag::Solid, self.is_solid),
            (Flag::Milestone, self.is_milestone),
            (Flag::Tip, self.is_tip),
            (Flag::Referenced, self.is_referenced),
            (Flag::Conflicting, self.is_conflicting),
        ]
        .into_iter()
        .filter_map(|(flag, value)| value.map(|value| (flag, value)))
    }
}

/// Canonical event shape consumed by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TangleEvent {
    Vertex {
        vertex: VertexRef,
        parents: Vec<VertexRef>,
        flags: FlagUpdates,
    },
    Solid {
        id: ShortId,
    },
    Milestone {
        id: ShortId,
    },
    Tip {
        id: ShortId,
        is_tip: bool,
    },
    Confirmed {
        id: ShortId,
        excluded: Vec<ShortId>,
    },
}
