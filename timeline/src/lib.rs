//! Trace-timeline shaping engine.
//!
//! This crate is UI-framework agnostic. It turns the sparse, hierarchical
//! results of a trace-analysis server into dense rows of time-normalized
//! states that any timeline, table or chart widget can draw directly, and it
//! resolves the visual style of every state through the output's style model.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`time_range`] | Half-open time intervals with an origin offset |
//! | [`entry`] | Entry forest built from the output tree |
//! | [`style`] | Style inheritance walk, color parsing and blending |
//! | [`shaper`] | Row data shaper: ordering, gap synthesis, annotations |
//! | [`sequence`] | Request tickets used to drop stale responses |
//! | [`client`] | Analysis-server capability trait and its errors |
//! | [`session`] | Output session tying client, shaper and styles together |
//! | [`config`] | Environment-driven tuning knobs |

pub mod client;
pub mod config;
pub mod entry;
pub mod sequence;
pub mod session;
pub mod shaper;
pub mod style;
pub mod time_range;

pub use client::{AnalysisClient, ClientError, OutputKey};
pub use config::TimelineConfig;
pub use entry::{Entry, EntryId, EntryTree};
pub use sequence::{RequestClass, RequestSequencer, Ticket};
pub use session::{FetchOutcome, OutputCapability, OutputSession, ServerOutput};
pub use shaper::{Annotation, FetchWindow, Row, RowShaper, State, TimelineModel};
pub use style::{ResolvedStyle, Rgba, StyleResolver};
pub use time_range::TimeRange;
