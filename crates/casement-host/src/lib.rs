//! # Host-toolkit seam
//!
//! The bridge never talks to a real toolkit directly; it talks to this
//! crate. Two pieces:
//!
//! - [`UiDispatcher`] — the UI-affine executor. One thread owns the widget
//!   state; everything that mutates it is a closure submitted there.
//! - [`HostTree`] — the widget arena: panels, sliders and labels with
//!   bounds, transform/projection/clip state, child collections, event
//!   handlers, resize listeners and a dialog surface.
//!
//! ```rust
//! use casement_core::Tag;
//! use casement_host::UiDispatcher;
//!
//! let ui = UiDispatcher::spawn();
//! let count = ui.run(|host| {
//!     host.create_panel(Tag::new(1));
//!     host.view_count()
//! });
//! assert_eq!(count, 1);
//! ```
//!
//! Handles are arena keys, stable for the lifetime of the view and
//! independent of the tags the remote side assigns. `HostTree` is
//! deliberately not `Sync`: the only way to reach it is through the
//! dispatcher, which makes "touched a view off the UI thread" unrepresentable
//! rather than merely discouraged.

pub mod dispatcher;
pub mod drag;
pub mod error;
pub mod tree;

pub use dispatcher::UiDispatcher;
pub use drag::{AccessList, DragContent, DragDataSource, DragFile};
pub use error::HostError;
pub use tree::{
    Dialog, DialogButton, Handler, HandlerArgs, HandlerKind, HostTree, HostView, LabelState,
    PanelState, ResizeListener, SliderState, ViewHandle, Widget,
};
