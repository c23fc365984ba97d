//! Navigation and cross-widget synchronization for trace timelines.
//!
//! Everything here is single-threaded: one trace context, its bus, its
//! navigation controller and the widgets subscribed to it live on the UI
//! thread and share state through `Rc`, `Cell` and `RefCell`.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`navigation`] | Absolute/view/selection ranges with zoom, pan and clamping |
//! | [`bus`] | Typed synchronous publish/subscribe bus |
//! | [`guard`] | One-shot echo guard for widgets that write what they observe |
//! | [`context`] | Per-trace owner of the bus and the shared controller |
//! | [`debounce`] | Trailing-edge fetch debouncer |
//! | [`input`] | Pointer/wheel/key gestures mapped to navigation |
//! | [`widgets`] | Headless timeline, event table and properties participants |
//! | [`consts`] | Zoom, pan and input constants |

pub mod bus;
pub mod consts;
pub mod context;
pub mod debounce;
pub mod guard;
pub mod input;
pub mod navigation;
pub mod widgets;

pub use bus::{RowSelection, Signal, SignalBus, SignalKind, Subscription};
pub use context::TraceContext;
pub use debounce::{DebounceDecision, FetchDebouncer};
pub use guard::EchoGuard;
pub use input::{Button, InputState, Key, Modifiers, TimelineInput, WheelDelta};
pub use navigation::{NavigationController, NavigationState, PanDirection};
pub use widgets::{EventTableWidget, PropertiesPanel, TableRow, TimelineWidget};
