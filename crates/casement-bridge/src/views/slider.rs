//! Slider: value changes stream out as `topChange`; releasing the thumb
//! emits `topSlidingComplete` with the settled value.

use std::rc::Rc;
use std::sync::OnceLock;

use serde_json::{Value, json};

use casement_core::value;
use casement_host::{HandlerArgs, HandlerKind, ViewHandle};

use crate::events::{EventDispatcher, UiEvent};
use crate::framework;
use crate::manager::{Creatable, EventEmitting, PropertyDispatchable, UiCtx, ViewManager};
use crate::props::{PropError, PropTable};

pub struct SliderManager;

impl Creatable for SliderManager {
    fn create_view(&self, ctx: &mut UiCtx<'_>) -> ViewHandle {
        ctx.host.create_slider(ctx.tag)
    }
}

impl PropertyDispatchable for SliderManager {
    fn prop_table(&self) -> &'static PropTable {
        static TABLE: OnceLock<PropTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            framework::register_base_props(PropTable::builder())
                .prop("disabled", set_disabled)
                .prop("minimumValue", set_minimum_value)
                .prop("maximumValue", set_maximum_value)
                .prop("value", set_value)
                .prop("step", set_step)
                .build()
        })
    }
}

impl EventEmitting for SliderManager {
    fn add_event_emitters(&self, ctx: &mut UiCtx<'_>, view: ViewHandle) {
        framework::add_base_event_emitters(ctx, view);
        ctx.host.add_handler(
            view,
            HandlerKind::ValueChanged,
            value_change_handler(ctx.events.clone()),
        );
        ctx.host.add_handler(
            view,
            HandlerKind::PointerReleased,
            sliding_complete_handler(ctx.events.clone()),
        );
    }
}

impl ViewManager for SliderManager {
    fn name(&self) -> &'static str {
        "Slider"
    }
}

fn value_change_handler(events: EventDispatcher) -> casement_host::Handler {
    Rc::new(move |host, view, args| {
        let HandlerArgs::Value(value) = args else {
            return;
        };
        if let Ok(tag) = host.tag_of(view) {
            events.dispatch(UiEvent {
                tag,
                name: "topChange".to_string(),
                payload: json!({ "target": tag.raw(), "value": value }),
            });
        }
    })
}

fn sliding_complete_handler(events: EventDispatcher) -> casement_host::Handler {
    Rc::new(move |host, view, _args| {
        let (Ok(tag), Ok(slider)) = (host.tag_of(view), host.slider(view)) else {
            return;
        };
        events.dispatch(UiEvent {
            tag,
            name: "topSlidingComplete".to_string(),
            payload: json!({ "target": tag.raw(), "value": slider.value }),
        });
    })
}

fn set_disabled(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let disabled = value::bool_or("disabled", value, false)?;
    ctx.host.slider_mut(view)?.enabled = !disabled;
    Ok(())
}

fn set_minimum_value(
    ctx: &mut UiCtx<'_>,
    view: ViewHandle,
    value: &Value,
) -> Result<(), PropError> {
    let minimum = value::f64_or("minimumValue", value, 0.0)?;
    ctx.host.slider_mut(view)?.minimum = minimum;
    Ok(())
}

fn set_maximum_value(
    ctx: &mut UiCtx<'_>,
    view: ViewHandle,
    value: &Value,
) -> Result<(), PropError> {
    let maximum = value::f64_or("maximumValue", value, 0.0)?;
    ctx.host.slider_mut(view)?.maximum = maximum;
    Ok(())
}

fn set_value(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let new_value = value::f64_or("value", value, 0.0)?;
    ctx.host.slider_mut(view)?.value = new_value;
    Ok(())
}

fn set_step(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let step = value::f64_or("step", value, 0.0)?;
    ctx.host.slider_mut(view)?.step = step;
    Ok(())
}
