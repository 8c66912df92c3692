//! Framework behavior shared by every view type: the base property set,
//! dimension-bound transform and clip state, pointer event emitters, and
//! drag-and-drop payload assembly.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;
use serde_json::{Value, json};

use casement_core::{Color, Dimensions, transform, value};
use casement_host::{
    AccessList, DragFile, HandlerArgs, Handler, HandlerKind, HostTree, ResizeListener, ViewHandle,
};

use crate::events::{EventDispatcher, UiEvent};
use crate::manager::UiCtx;
use crate::props::{PropDefault, PropError, PropTableBuilder};

#[derive(Clone, Debug, Default)]
struct DimensionBoundState {
    /// The declared transform list, kept so the matrix can be recomputed
    /// whenever the box changes.
    transform_list: Option<Vec<Value>>,
    overflow_hidden: bool,
}

/// Per-view auxiliary state keyed by view identity. View detach can race a
/// property batch still in flight for the same view, so the map is guarded;
/// removing an absent entry is a no-op.
#[derive(Default)]
pub struct DimensionBoundStore {
    inner: RwLock<HashMap<ViewHandle, DimensionBoundState>>,
}

impl DimensionBoundStore {
    pub fn new() -> DimensionBoundStore {
        DimensionBoundStore::default()
    }

    fn update(&self, view: ViewHandle, mutate: impl FnOnce(&mut DimensionBoundState)) {
        mutate(self.inner.write().entry(view).or_default())
    }

    fn snapshot(&self, view: ViewHandle) -> DimensionBoundState {
        self.inner.read().get(&view).cloned().unwrap_or_default()
    }

    pub fn remove(&self, view: ViewHandle) {
        self.inner.write().remove(&view);
    }

    pub fn contains(&self, view: ViewHandle) -> bool {
        self.inner.read().contains_key(&view)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Registers the property set every view type shares.
pub fn register_base_props(builder: PropTableBuilder) -> PropTableBuilder {
    builder
        .prop("transform", set_transform)
        .prop_with_default("opacity", PropDefault::Number(1.0), set_opacity)
        .prop("overflow", set_overflow)
        .prop("zIndex", set_z_index)
        .prop("display", set_display)
        .prop("tooltip", set_tooltip)
        .prop("testID", set_test_id)
        .prop_with_default("allowDrop", PropDefault::Bool(false), set_allow_drop)
}

/// Wires the pointer enter/leave emitters every view gets.
pub fn add_base_event_emitters(ctx: &mut UiCtx<'_>, view: ViewHandle) {
    ctx.host.add_handler(
        view,
        HandlerKind::PointerEntered,
        pointer_handler("topPointerEnter", ctx.events.clone()),
    );
    ctx.host.add_handler(
        view,
        HandlerKind::PointerExited,
        pointer_handler("topPointerLeave", ctx.events.clone()),
    );
}

/// Applies a computed box. Dimension-bound state is recomputed against the
/// new box in the same call; the resize listener is detached around the
/// bounds assignment so it never observes a half-applied update.
pub fn set_dimensions(
    ctx: &mut UiCtx<'_>,
    view: ViewHandle,
    dims: Dimensions,
) -> Result<(), PropError> {
    let state = ctx.aux.snapshot(view);
    if let Some(list) = &state.transform_list {
        apply_projection(ctx.host, view, list, dims)?;
    }
    if state.overflow_hidden {
        clip_to_dimensions(ctx.host, view, dims)?;
        ctx.host.clear_resize_listener(view);
    }
    ctx.host.set_bounds(view, dims)?;
    if state.overflow_hidden {
        ctx.host.set_resize_listener(view, resize_clip_listener());
    }
    Ok(())
}

/// Symmetric teardown for `add_base_event_emitters` and everything the base
/// props wired: all handlers, the resize listener, and the dimension-bound
/// record.
pub fn drop_view_instance(ctx: &mut UiCtx<'_>, view: ViewHandle) {
    ctx.host.clear_handlers(view);
    ctx.host.clear_resize_listener(view);
    ctx.aux.remove(view);
}

// ---- base prop setters ----

fn set_transform(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    if value.is_null() {
        if ctx.aux.snapshot(view).transform_list.is_some() {
            ctx.aux.update(view, |s| s.transform_list = None);
            ctx.host.clear_projection(view)?;
            ctx.host.clear_render_transform(view)?;
        }
        return Ok(());
    }
    let list = value::expect_array("transform", value)?.to_vec();
    ctx.aux
        .update(view, |s| s.transform_list = Some(list.clone()));
    let dims = ctx.host.bounds(view)?;
    apply_projection(ctx.host, view, &list, dims)
}

fn set_opacity(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let opacity = value::expect_f64("opacity", value)?;
    ctx.host.view_mut(view)?.opacity = opacity;
    Ok(())
}

fn set_overflow(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let overflow = value::str_or("overflow", value, "visible")?;
    if overflow == "hidden" {
        ctx.aux.update(view, |s| s.overflow_hidden = true);
        let dims = ctx.host.bounds(view)?;
        clip_to_dimensions(ctx.host, view, dims)?;
        ctx.host.set_resize_listener(view, resize_clip_listener());
    } else {
        ctx.host.clear_resize_listener(view);
        if ctx.aux.snapshot(view).overflow_hidden {
            ctx.aux.update(view, |s| s.overflow_hidden = false);
            ctx.host.set_clip(view, None)?;
        }
    }
    Ok(())
}

fn set_z_index(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let z_index = value::i32_or("zIndex", value, 0)?;
    ctx.host.view_mut(view)?.z_index = z_index;
    Ok(())
}

fn set_display(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let display = value::str_or("display", value, "flex")?;
    ctx.host.view_mut(view)?.visible = display != "none";
    Ok(())
}

fn set_tooltip(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let tooltip = match value.as_str() {
        Some(text) => Some(text.to_string()),
        None if value.is_null() => None,
        None => return Err(value::expect_str("tooltip", value).unwrap_err().into()),
    };
    ctx.host.view_mut(view)?.tooltip = tooltip;
    Ok(())
}

fn set_test_id(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let id = value::str_or("testID", value, "")?.to_string();
    ctx.host.view_mut(view)?.automation_id = Some(id);
    Ok(())
}

fn set_allow_drop(ctx: &mut UiCtx<'_>, view: ViewHandle, value: &Value) -> Result<(), PropError> {
    let allow = value::expect_bool("allowDrop", value)?;
    ctx.host.view_mut(view)?.allow_drop = allow;
    if allow {
        ctx.host.add_handler(
            view,
            HandlerKind::DragEnter,
            drag_handler("topDragEnter", ctx.events.clone(), None),
        );
        ctx.host.add_handler(
            view,
            HandlerKind::DragOver,
            drag_handler("topDragOver", ctx.events.clone(), None),
        );
        ctx.host.add_handler(
            view,
            HandlerKind::DragLeave,
            drag_handler("topDragLeave", ctx.events.clone(), None),
        );
        // Only the drop phase mints access tokens.
        ctx.host.add_handler(
            view,
            HandlerKind::Drop,
            drag_handler("topDrop", ctx.events.clone(), Some(ctx.access.clone())),
        );
    } else {
        for kind in [
            HandlerKind::DragEnter,
            HandlerKind::DragOver,
            HandlerKind::DragLeave,
            HandlerKind::Drop,
        ] {
            ctx.host.remove_handlers(view, kind);
        }
    }
    Ok(())
}

// ---- transform machinery ----

fn apply_projection(
    host: &mut HostTree,
    view: ViewHandle,
    list: &[Value],
    dims: Dimensions,
) -> Result<(), PropError> {
    let matrix = transform::process_transform(list)?;
    let matrix = transform::center_pivot(matrix, dims);
    if transform::is_translation_only(&matrix) {
        host.clear_projection(view)?;
        let (x, y) = transform::translation_of(&matrix);
        host.set_render_translation(view, x, y)?;
    } else {
        host.clear_render_transform(view)?;
        host.set_projection(view, matrix)?;
    }
    Ok(())
}

// ---- overflow machinery ----

fn clip_to_dimensions(
    host: &mut HostTree,
    view: ViewHandle,
    dims: Dimensions,
) -> Result<(), PropError> {
    // An unset box leaves the view unclipped until layout publishes one.
    host.set_clip(view, dims.size())?;
    Ok(())
}

fn resize_clip_listener() -> ResizeListener {
    Rc::new(|host, view, size| {
        let _ = host.set_clip(view, Some(size));
    })
}

// ---- event emitters ----

fn pointer_handler(name: &'static str, events: EventDispatcher) -> Handler {
    Rc::new(move |host, view, _args| {
        if let Ok(tag) = host.tag_of(view) {
            events.dispatch(UiEvent {
                tag,
                name: name.to_string(),
                payload: json!({ "target": tag.raw() }),
            });
        }
    })
}

fn drag_handler(
    name: &'static str,
    events: EventDispatcher,
    access: Option<Arc<AccessList>>,
) -> Handler {
    Rc::new(move |host, view, args| {
        let HandlerArgs::Drag(content) = args else {
            return;
        };
        let Ok(tag) = host.tag_of(view) else {
            return;
        };
        let source = content.source.clone();
        let events = events.clone();
        let access = access.clone();
        // File metadata can be slow to read. Resolve it off the UI thread
        // and dispatch this one event when it completes; other dispatch is
        // never blocked on it.
        thread::spawn(move || {
            let payload = data_transfer_payload(&source.files(), access.as_deref());
            events.dispatch(UiEvent {
                tag,
                name: name.to_string(),
                payload,
            });
        });
    })
}

fn data_transfer_payload(files: &[DragFile], access: Option<&AccessList>) -> Value {
    let mut file_entries = Vec::new();
    let mut items = Vec::new();
    let mut types = Vec::new();
    for file in files {
        let uri = access
            .map(|list| list.grant(&file.name))
            .unwrap_or_default();
        file_entries.push(json!({
            "name": file.name,
            "size": file.size,
            "type": file.content_type,
            "uri": uri,
        }));
        items.push(json!({ "kind": "file", "type": file.content_type }));
        types.push(json!(file.content_type));
    }
    json!({ "files": file_entries, "items": items, "types": types })
}

/// Parses a color prop; null clears it.
pub(crate) fn color_or_none(prop: &str, value: &Value) -> Result<Option<Color>, PropError> {
    if value.is_null() {
        return Ok(None);
    }
    let text = value::expect_str(prop, value)?;
    Ok(Some(Color::from_hex(text)?))
}
