//! Leaf text view.

use std::sync::OnceLock;

use serde_json::Value;

use casement_core::value;
use casement_host::ViewHandle;

use crate::framework;
use crate::manager::{Creatable, EventEmitting, PropertyDispatchable, UiCtx, ViewManager};
use crate::props::{PropDefault, PropError, PropTable};

pub struct LabelManager;

impl Creatable for LabelManager {
    fn create_view(&self, ctx: &mut UiCtx<'_>) -> ViewHandle {
        ctx.host.create_label(ctx.tag)
    }
}

impl PropertyDispatchable for LabelManager {
    fn prop_table(&self) -> &'static PropTable {
        static TABLE: OnceLock<PropTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            framework::register_base_props(PropTable::builder())
                .prop("text", set_text)
                .prop("color", set_color)
                .prop_with_default("fontSize", PropDefault::Number(14.0), set_font_size)
                .build()
        })
    }
}

impl EventEmitting for LabelManager {
    fn add_event_emitters(&self, ctx: &mut UiCtx<'_>, view: ViewHandle) {
        framework::add_base_event_emitters(ctx, view);
    }
}

impl ViewManager for LabelManager {
    fn name(&self) -> &'static str {
        "Label"
    }
}

fn set_text(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let text = value::str_or("text", value, "")?.to_string();
    ctx.host.label_mut(view)?.text = text;
    Ok(())
}

fn set_color(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let color = framework::color_or_none("color", value)?;
    ctx.host.label_mut(view)?.color = color;
    Ok(())
}

fn set_font_size(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let size = value::expect_f64("fontSize", value)?;
    ctx.host.label_mut(view)?.font_size = size;
    Ok(())
}
