//! # The UI manager bridge
//!
//! Casement-bridge reconciles a remotely-described UI tree against native
//! widgets. Batches of instructions — create, update props, manage
//! children, remove subtrees, dispatch commands — arrive from the
//! cross-boundary channel on any thread; the bridge validates them against
//! the shadow tree, runs the flex layout pass, and applies the resulting
//! native mutations on the UI thread as one atomic step.
//!
//! ```rust
//! use casement_bridge::{EventDispatcher, Instruction, ManagerRegistry, UiManagerModule};
//! use casement_core::{Size, Tag};
//! use casement_host::UiDispatcher;
//! use serde_json::json;
//!
//! let ui = UiDispatcher::spawn();
//! let (events, _rx) = EventDispatcher::channel();
//! let manager = UiManagerModule::new(ui, ManagerRegistry::with_builtins(), events);
//! manager
//!     .register_root(Tag::new(1), Size { width: 800.0, height: 600.0 })
//!     .unwrap();
//! let report = manager
//!     .dispatch_batch(vec![
//!         Instruction::Create {
//!             tag: Tag::new(2),
//!             class: "Slider".into(),
//!             props: json!({ "minimumValue": 0.0, "maximumValue": 10.0 }),
//!         },
//!     ])
//!     .unwrap();
//! assert!(report.is_clean());
//! ```
//!
//! Property dispatch is table-driven: each view-manager type declares its
//! props once through [`props::PropTableBuilder`] and the table is cached
//! for the process lifetime. Unknown incoming names are skipped, a failed
//! coercion fails only that property, and an explicit null re-applies the
//! declared default.

pub mod events;
pub mod framework;
pub mod manager;
pub mod modal;
pub mod props;
pub mod uimanager;
pub mod views;

mod tests;

pub use events::{EventDispatcher, UiEvent};
pub use framework::DimensionBoundStore;
pub use manager::{
    ChildManageable, CommandError, Creatable, EventEmitting, ManagerRegistry,
    PropertyDispatchable, UiCtx, ViewManager,
};
pub use modal::{AlertConfig, DialogPresenter, PresentError};
pub use props::{ApplyOutcome, PropDefault, PropError, PropTable, PropTableBuilder};
pub use uimanager::{
    BatchReport, ChildInsert, Instruction, PropFailure, UiManagerError, UiManagerModule,
};
