//! Streaming model of the vertex graph: ingestion, bounded storage, derived
//! counters and confirmation propagation.

mod counters;
mod engine;
mod event;
mod propagate;
mod store;
mod vertex;

pub use counters::{AggregateCounters, Counts};
pub use engine::{
    DEFAULT_VERTEX_LIMIT, EngineConfig, GraphEngine, GraphSubscriber, VertexOp,
};
pub use event::{FlagUpdates, InboundEvent, TangleEvent, VertexRef, parse_event_line};
pub use propagate::{Resolution, resolve_ancestors};
pub use store::VertexStore;
pub use vertex::{DEFAULT_SHORT_ID_LEN, Flag, ShortId, Vertex, VertexFlags, VertexState};
