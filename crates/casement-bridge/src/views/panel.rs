//! The container view: hosts ordered native children.

use std::sync::OnceLock;

use serde_json::Value;

use casement_host::{HostError, HostTree, ViewHandle};

use crate::framework;
use crate::manager::{
    ChildManageable, CommandError, Creatable, EventEmitting, PropertyDispatchable, UiCtx,
    ViewManager,
};
use crate::props::{PropError, PropTable};

pub struct PanelManager;

struct PanelChildren;

impl Creatable for PanelManager {
    fn create_view(&self, ctx: &mut UiCtx<'_>) -> ViewHandle {
        ctx.host.create_panel(ctx.tag)
    }
}

impl PropertyDispatchable for PanelManager {
    fn prop_table(&self) -> &'static PropTable {
        static TABLE: OnceLock<PropTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            framework::register_base_props(PropTable::builder())
                .prop("backgroundColor", set_background_color)
                .build()
        })
    }
}

impl EventEmitting for PanelManager {
    fn add_event_emitters(&self, ctx: &mut UiCtx<'_>, view: ViewHandle) {
        framework::add_base_event_emitters(ctx, view);
    }
}

impl ViewManager for PanelManager {
    fn name(&self) -> &'static str {
        "Panel"
    }

    fn children(&self) -> Option<&dyn ChildManageable> {
        Some(&PanelChildren)
    }

    fn commands(&self) -> &'static [&'static str] {
        &["focus", "blur"]
    }

    fn dispatch_command(
        &self,
        ctx: &mut UiCtx<'_>,
        view: ViewHandle,
        command: &str,
        _args: &Value,
    ) -> Result<(), CommandError> {
        match command {
            "focus" => ctx.host.view_mut(view)?.focused = true,
            "blur" => ctx.host.view_mut(view)?.focused = false,
            _ => {
                return Err(CommandError::UnknownCommand {
                    class: self.name(),
                    command: command.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl ChildManageable for PanelChildren {
    fn add_child(
        &self,
        host: &mut HostTree,
        parent: ViewHandle,
        child: ViewHandle,
        index: usize,
    ) -> Result<(), HostError> {
        host.add_child(parent, child, index)
    }

    fn remove_child_at(
        &self,
        host: &mut HostTree,
        parent: ViewHandle,
        index: usize,
    ) -> Result<ViewHandle, HostError> {
        host.remove_child_at(parent, index)
    }

    fn child_count(&self, host: &HostTree, parent: ViewHandle) -> Result<usize, HostError> {
        host.child_count(parent)
    }

    fn remove_all_children(
        &self,
        host: &mut HostTree,
        parent: ViewHandle,
    ) -> Result<(), HostError> {
        host.remove_all_children(parent)
    }
}

fn set_background_color(
    ctx: &mut UiCtx<'_>,
    view: ViewHandle,
    value: &Value,
) -> Result<(), PropError> {
    let color = framework::color_or_none("backgroundColor", value)?;
    ctx.host.panel_mut(view)?.background = color;
    Ok(())
}
