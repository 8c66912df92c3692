//! View-manager capabilities.
//!
//! Instead of one deep base-class chain, a manager is a composition of
//! narrow capabilities: it can create its view, dispatch props to it, wire
//! event emitters, and — if it is a container — manage native children. The
//! shared framework behavior (transforms, overflow, dimension-bound state)
//! lives in [`crate::framework`] and is the default implementation of the
//! composed [`ViewManager`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use casement_core::{Dimensions, Tag};
use casement_host::{AccessList, HostError, HostTree, ViewHandle};

use crate::events::EventDispatcher;
use crate::framework::{self, DimensionBoundStore};
use crate::props::{PropError, PropTable};

/// Everything an operation running on the UI thread may touch: the widget
/// arena, the dimension-bound store, the outbound event channel, the drop
/// access list, and the tag of the node the operation belongs to.
pub struct UiCtx<'a> {
    pub host: &'a mut HostTree,
    pub aux: &'a DimensionBoundStore,
    pub events: &'a EventDispatcher,
    pub access: &'a Arc<AccessList>,
    pub tag: Tag,
}

pub trait Creatable {
    /// Materializes the native view for `ctx.tag`. Must not touch any other
    /// node.
    fn create_view(&self, ctx: &mut UiCtx<'_>) -> ViewHandle;
}

pub trait PropertyDispatchable {
    /// The cached, process-lifetime dispatch table for this view type.
    fn prop_table(&self) -> &'static PropTable;
}

pub trait EventEmitting {
    /// Wires native event handlers, exactly once per view. Must stay
    /// symmetric with `ViewManager::drop_view_instance`.
    fn add_event_emitters(&self, ctx: &mut UiCtx<'_>, view: ViewHandle);
}

pub trait ChildManageable {
    fn add_child(
        &self,
        host: &mut HostTree,
        parent: ViewHandle,
        child: ViewHandle,
        index: usize,
    ) -> Result<(), HostError>;

    fn remove_child_at(
        &self,
        host: &mut HostTree,
        parent: ViewHandle,
        index: usize,
    ) -> Result<ViewHandle, HostError>;

    fn child_count(&self, host: &HostTree, parent: ViewHandle) -> Result<usize, HostError>;

    fn remove_all_children(&self, host: &mut HostTree, parent: ViewHandle)
    -> Result<(), HostError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("class `{class}` does not handle command `{command}`")]
    UnknownCommand {
        class: &'static str,
        command: String,
    },
    #[error(transparent)]
    Host(#[from] HostError),
}

pub trait ViewManager: Creatable + PropertyDispatchable + EventEmitting + Send + Sync {
    /// The class name the instruction channel uses to pick this manager.
    fn name(&self) -> &'static str;

    /// Applies a computed layout box. The default re-applies dimension-bound
    /// transform and clip state against the new box in the same call, so a
    /// stale box is never observable.
    fn set_dimensions(
        &self,
        ctx: &mut UiCtx<'_>,
        view: ViewHandle,
        dims: Dimensions,
    ) -> Result<(), PropError> {
        framework::set_dimensions(ctx, view, dims)
    }

    /// Called when the view leaves the native tree. The default unwires every
    /// handler `add_event_emitters` installed and releases per-view state.
    fn drop_view_instance(&self, ctx: &mut UiCtx<'_>, view: ViewHandle) {
        framework::drop_view_instance(ctx, view);
    }

    /// Command names this view type accepts.
    fn commands(&self) -> &'static [&'static str] {
        &[]
    }

    fn dispatch_command(
        &self,
        _ctx: &mut UiCtx<'_>,
        _view: ViewHandle,
        command: &str,
        _args: &Value,
    ) -> Result<(), CommandError> {
        Err(CommandError::UnknownCommand {
            class: self.name(),
            command: command.to_string(),
        })
    }

    /// Present for container types only.
    fn children(&self) -> Option<&dyn ChildManageable> {
        None
    }

    /// The view lays out its children itself; computed boxes for them are
    /// not published.
    fn needs_custom_layout(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct ManagerRegistry {
    by_name: HashMap<&'static str, Arc<dyn ViewManager>>,
}

impl ManagerRegistry {
    pub fn new() -> ManagerRegistry {
        ManagerRegistry::default()
    }

    pub fn register(&mut self, manager: Arc<dyn ViewManager>) {
        let previous = self.by_name.insert(manager.name(), manager);
        assert!(previous.is_none(), "view-manager class registered twice");
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ViewManager>> {
        self.by_name.get(name).cloned()
    }

    /// The stock set of managers.
    pub fn with_builtins() -> ManagerRegistry {
        let mut registry = ManagerRegistry::new();
        registry.register(Arc::new(crate::views::PanelManager));
        registry.register(Arc::new(crate::views::SliderManager));
        registry.register(Arc::new(crate::views::LabelManager));
        registry
    }
}
