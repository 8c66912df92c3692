//! The native widget arena.
//!
//! `HostTree` stands in for the toolkit surface the bridge drives: widgets
//! with bounds, render transforms, projections, clips and child collections,
//! plus the event-handler and resize-listener registries the toolkit would
//! own. It lives on the UI thread and is only reachable through the
//! [`UiDispatcher`](crate::UiDispatcher); handles stay valid until the view
//! is removed, independent of how the remote side numbers its nodes.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap, new_key_type};
use smallvec::SmallVec;

use casement_core::transform::Matrix;
use casement_core::{Color, Dimensions, Size, Tag, TransformError};

use crate::drag::DragContent;
use crate::error::HostError;

new_key_type! {
    /// Stable identity of a live native view.
    pub struct ViewHandle;
}

/// The cheap per-view transform primitive: a plain offset. Anything heavier
/// goes through [`Projection`]. `Foreign` models a transform some other part
/// of the application installed; the bridge refuses to touch it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderTransform {
    Translation { x: f64, y: f64 },
    Foreign,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Matrix(Matrix),
    Foreign,
}

#[derive(Debug, Default)]
pub struct PanelState {
    pub background: Option<Color>,
    pub children: SmallVec<[ViewHandle; 4]>,
}

#[derive(Debug)]
pub struct SliderState {
    pub enabled: bool,
    pub minimum: f64,
    pub maximum: f64,
    pub value: f64,
    pub step: f64,
}

impl Default for SliderState {
    fn default() -> Self {
        SliderState {
            enabled: true,
            minimum: 0.0,
            maximum: 100.0,
            value: 0.0,
            step: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct LabelState {
    pub text: String,
    pub color: Option<Color>,
    pub font_size: f64,
}

impl Default for LabelState {
    fn default() -> Self {
        LabelState {
            text: String::new(),
            color: None,
            font_size: 14.0,
        }
    }
}

#[derive(Debug)]
pub enum Widget {
    Panel(PanelState),
    Slider(SliderState),
    Label(LabelState),
}

impl Widget {
    fn kind_name(&self) -> &'static str {
        match self {
            Widget::Panel(_) => "panel",
            Widget::Slider(_) => "slider",
            Widget::Label(_) => "label",
        }
    }
}

#[derive(Debug)]
pub struct HostView {
    pub tag: Tag,
    pub widget: Widget,
    pub bounds: Dimensions,
    pub opacity: f64,
    pub visible: bool,
    pub z_index: i32,
    pub tooltip: Option<String>,
    pub automation_id: Option<String>,
    pub focused: bool,
    pub allow_drop: bool,
    render_transform: Option<RenderTransform>,
    projection: Option<Projection>,
    clip: Option<Size>,
}

impl HostView {
    fn new(tag: Tag, widget: Widget) -> HostView {
        HostView {
            tag,
            widget,
            bounds: Dimensions::UNSET,
            opacity: 1.0,
            visible: true,
            z_index: 0,
            tooltip: None,
            automation_id: None,
            focused: false,
            allow_drop: false,
            render_transform: None,
            projection: None,
            clip: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerKind {
    PointerEntered,
    PointerExited,
    PointerReleased,
    ValueChanged,
    DragEnter,
    DragOver,
    DragLeave,
    Drop,
}

pub enum HandlerArgs<'a> {
    None,
    Value(f64),
    Drag(&'a DragContent),
}

pub type Handler = Rc<dyn Fn(&mut HostTree, ViewHandle, &HandlerArgs<'_>)>;
pub type ResizeListener = Rc<dyn Fn(&mut HostTree, ViewHandle, Size)>;

pub struct DialogButton {
    pub label: String,
    pub key: i64,
}

pub struct Dialog {
    pub title: Option<String>,
    pub message: String,
    pub buttons: Vec<DialogButton>,
    pub on_command: Box<dyn Fn(i64)>,
}

#[derive(Default)]
pub struct HostTree {
    views: SlotMap<ViewHandle, HostView>,
    by_tag: HashMap<Tag, ViewHandle>,
    handlers: SecondaryMap<ViewHandle, Vec<(HandlerKind, Handler)>>,
    resize_listeners: SecondaryMap<ViewHandle, ResizeListener>,
    dialog: Option<Dialog>,
}

impl HostTree {
    pub fn new() -> HostTree {
        HostTree::default()
    }

    // ---- lifecycle ----

    pub fn create_panel(&mut self, tag: Tag) -> ViewHandle {
        self.create(tag, Widget::Panel(PanelState::default()))
    }

    pub fn create_slider(&mut self, tag: Tag) -> ViewHandle {
        self.create(tag, Widget::Slider(SliderState::default()))
    }

    pub fn create_label(&mut self, tag: Tag) -> ViewHandle {
        self.create(tag, Widget::Label(LabelState::default()))
    }

    fn create(&mut self, tag: Tag, widget: Widget) -> ViewHandle {
        let handle = self.views.insert(HostView::new(tag, widget));
        self.by_tag.insert(tag, handle);
        handle
    }

    /// Destroys the view and everything registered against it. The caller is
    /// responsible for having detached it from its parent first; as the
    /// toolkit would, we also drop any remaining child references to it.
    pub fn remove_view(&mut self, handle: ViewHandle) {
        let Some(view) = self.views.remove(handle) else {
            log::debug!("remove_view on an already-removed handle");
            return;
        };
        self.by_tag.remove(&view.tag);
        self.handlers.remove(handle);
        self.resize_listeners.remove(handle);
        for other in self.views.values_mut() {
            if let Widget::Panel(panel) = &mut other.widget {
                panel.children.retain(|c| *c != handle);
            }
        }
    }

    pub fn resolve(&self, tag: Tag) -> Option<ViewHandle> {
        self.by_tag.get(&tag).copied()
    }

    pub fn contains(&self, handle: ViewHandle) -> bool {
        self.views.contains_key(handle)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn view(&self, handle: ViewHandle) -> Result<&HostView, HostError> {
        self.views.get(handle).ok_or(HostError::UnknownView)
    }

    pub fn view_mut(&mut self, handle: ViewHandle) -> Result<&mut HostView, HostError> {
        self.views.get_mut(handle).ok_or(HostError::UnknownView)
    }

    pub fn tag_of(&self, handle: ViewHandle) -> Result<Tag, HostError> {
        Ok(self.view(handle)?.tag)
    }

    // ---- typed widget access ----

    pub fn panel(&self, handle: ViewHandle) -> Result<&PanelState, HostError> {
        match &self.view(handle)?.widget {
            Widget::Panel(panel) => Ok(panel),
            other => Err(mismatch("panel", other)),
        }
    }

    pub fn panel_mut(&mut self, handle: ViewHandle) -> Result<&mut PanelState, HostError> {
        match &mut self.view_mut(handle)?.widget {
            Widget::Panel(panel) => Ok(panel),
            other => Err(mismatch("panel", other)),
        }
    }

    pub fn slider(&self, handle: ViewHandle) -> Result<&SliderState, HostError> {
        match &self.view(handle)?.widget {
            Widget::Slider(slider) => Ok(slider),
            other => Err(mismatch("slider", other)),
        }
    }

    pub fn slider_mut(&mut self, handle: ViewHandle) -> Result<&mut SliderState, HostError> {
        match &mut self.view_mut(handle)?.widget {
            Widget::Slider(slider) => Ok(slider),
            other => Err(mismatch("slider", other)),
        }
    }

    pub fn label(&self, handle: ViewHandle) -> Result<&LabelState, HostError> {
        match &self.view(handle)?.widget {
            Widget::Label(label) => Ok(label),
            other => Err(mismatch("label", other)),
        }
    }

    pub fn label_mut(&mut self, handle: ViewHandle) -> Result<&mut LabelState, HostError> {
        match &mut self.view_mut(handle)?.widget {
            Widget::Label(label) => Ok(label),
            other => Err(mismatch("label", other)),
        }
    }

    // ---- children ----

    pub fn add_child(
        &mut self,
        parent: ViewHandle,
        child: ViewHandle,
        index: usize,
    ) -> Result<(), HostError> {
        if !self.contains(child) {
            return Err(HostError::UnknownView);
        }
        let panel = self.panel_mut(parent)?;
        if index > panel.children.len() {
            return Err(HostError::ChildIndexOutOfRange(index));
        }
        panel.children.insert(index, child);
        Ok(())
    }

    pub fn remove_child_at(
        &mut self,
        parent: ViewHandle,
        index: usize,
    ) -> Result<ViewHandle, HostError> {
        let panel = self.panel_mut(parent)?;
        if index >= panel.children.len() {
            return Err(HostError::ChildIndexOutOfRange(index));
        }
        Ok(panel.children.remove(index))
    }

    pub fn child_count(&self, parent: ViewHandle) -> Result<usize, HostError> {
        Ok(self.panel(parent)?.children.len())
    }

    pub fn child_at(&self, parent: ViewHandle, index: usize) -> Result<ViewHandle, HostError> {
        self.panel(parent)?
            .children
            .get(index)
            .copied()
            .ok_or(HostError::ChildIndexOutOfRange(index))
    }

    pub fn remove_all_children(&mut self, parent: ViewHandle) -> Result<(), HostError> {
        self.panel_mut(parent)?.children.clear();
        Ok(())
    }

    // ---- bounds, clip, transforms ----

    /// Assigns the computed box. A size change notifies the view's resize
    /// listener after the new bounds are in place.
    pub fn set_bounds(&mut self, handle: ViewHandle, bounds: Dimensions) -> Result<(), HostError> {
        let view = self.view_mut(handle)?;
        let old_size = view.bounds.size();
        view.bounds = bounds;
        let new_size = bounds.size();
        if new_size.is_some() && new_size != old_size {
            if let Some(listener) = self.resize_listeners.get(handle).cloned() {
                listener(self, handle, new_size.unwrap_or_default());
            }
        }
        Ok(())
    }

    pub fn bounds(&self, handle: ViewHandle) -> Result<Dimensions, HostError> {
        Ok(self.view(handle)?.bounds)
    }

    pub fn set_clip(&mut self, handle: ViewHandle, clip: Option<Size>) -> Result<(), HostError> {
        self.view_mut(handle)?.clip = clip;
        Ok(())
    }

    pub fn clip(&self, handle: ViewHandle) -> Result<Option<Size>, HostError> {
        Ok(self.view(handle)?.clip)
    }

    pub fn set_render_translation(
        &mut self,
        handle: ViewHandle,
        x: f64,
        y: f64,
    ) -> Result<(), HostError> {
        let view = self.view_mut(handle)?;
        if matches!(view.render_transform, Some(RenderTransform::Foreign)) {
            return Err(TransformError::ForeignTransform.into());
        }
        view.render_transform = Some(RenderTransform::Translation { x, y });
        Ok(())
    }

    pub fn clear_render_transform(&mut self, handle: ViewHandle) -> Result<(), HostError> {
        let view = self.view_mut(handle)?;
        if matches!(view.render_transform, Some(RenderTransform::Foreign)) {
            return Err(TransformError::ForeignTransform.into());
        }
        view.render_transform = None;
        Ok(())
    }

    pub fn render_translation(&self, handle: ViewHandle) -> Result<Option<(f64, f64)>, HostError> {
        Ok(match self.view(handle)?.render_transform {
            Some(RenderTransform::Translation { x, y }) => Some((x, y)),
            _ => None,
        })
    }

    pub fn set_projection(&mut self, handle: ViewHandle, matrix: Matrix) -> Result<(), HostError> {
        let view = self.view_mut(handle)?;
        if matches!(view.projection, Some(Projection::Foreign)) {
            return Err(TransformError::ForeignProjection.into());
        }
        view.projection = Some(Projection::Matrix(matrix));
        Ok(())
    }

    pub fn clear_projection(&mut self, handle: ViewHandle) -> Result<(), HostError> {
        let view = self.view_mut(handle)?;
        if matches!(view.projection, Some(Projection::Foreign)) {
            return Err(TransformError::ForeignProjection.into());
        }
        view.projection = None;
        Ok(())
    }

    pub fn projection(&self, handle: ViewHandle) -> Result<Option<Matrix>, HostError> {
        Ok(match self.view(handle)?.projection {
            Some(Projection::Matrix(m)) => Some(m),
            _ => None,
        })
    }

    /// Models another part of the application installing its own transform,
    /// which the bridge must refuse to clobber.
    pub fn install_foreign_render_transform(&mut self, handle: ViewHandle) -> Result<(), HostError> {
        self.view_mut(handle)?.render_transform = Some(RenderTransform::Foreign);
        Ok(())
    }

    pub fn install_foreign_projection(&mut self, handle: ViewHandle) -> Result<(), HostError> {
        self.view_mut(handle)?.projection = Some(Projection::Foreign);
        Ok(())
    }

    // ---- handlers and listeners ----

    pub fn add_handler(&mut self, handle: ViewHandle, kind: HandlerKind, handler: Handler) {
        if let Some(entry) = self.handlers.entry(handle) {
            entry.or_default().push((kind, handler));
        }
    }

    pub fn remove_handlers(&mut self, handle: ViewHandle, kind: HandlerKind) {
        if let Some(list) = self.handlers.get_mut(handle) {
            list.retain(|(k, _)| *k != kind);
        }
    }

    pub fn clear_handlers(&mut self, handle: ViewHandle) {
        self.handlers.remove(handle);
    }

    pub fn handler_count(&self, handle: ViewHandle) -> usize {
        self.handlers.get(handle).map_or(0, Vec::len)
    }

    pub fn set_resize_listener(&mut self, handle: ViewHandle, listener: ResizeListener) {
        self.resize_listeners.insert(handle, listener);
    }

    pub fn clear_resize_listener(&mut self, handle: ViewHandle) {
        self.resize_listeners.remove(handle);
    }

    pub fn has_resize_listener(&self, handle: ViewHandle) -> bool {
        self.resize_listeners.contains_key(handle)
    }

    // ---- interactions arriving from the toolkit ----

    pub fn pointer_entered(&mut self, handle: ViewHandle) {
        self.fire(handle, HandlerKind::PointerEntered, &HandlerArgs::None);
    }

    pub fn pointer_exited(&mut self, handle: ViewHandle) {
        self.fire(handle, HandlerKind::PointerExited, &HandlerArgs::None);
    }

    pub fn pointer_released(&mut self, handle: ViewHandle) {
        self.fire(handle, HandlerKind::PointerReleased, &HandlerArgs::None);
    }

    /// A user drag of the slider thumb: updates the widget and notifies.
    pub fn slider_drag_to(&mut self, handle: ViewHandle, value: f64) -> Result<(), HostError> {
        let slider = self.slider_mut(handle)?;
        if !slider.enabled {
            return Ok(());
        }
        slider.value = value.clamp(slider.minimum, slider.maximum);
        let value = slider.value;
        self.fire(handle, HandlerKind::ValueChanged, &HandlerArgs::Value(value));
        Ok(())
    }

    pub fn drag_entered(&mut self, handle: ViewHandle, content: &DragContent) {
        self.fire(handle, HandlerKind::DragEnter, &HandlerArgs::Drag(content));
    }

    pub fn drag_over(&mut self, handle: ViewHandle, content: &DragContent) {
        self.fire(handle, HandlerKind::DragOver, &HandlerArgs::Drag(content));
    }

    pub fn drag_left(&mut self, handle: ViewHandle, content: &DragContent) {
        self.fire(handle, HandlerKind::DragLeave, &HandlerArgs::Drag(content));
    }

    pub fn dropped(&mut self, handle: ViewHandle, content: &DragContent) {
        self.fire(handle, HandlerKind::Drop, &HandlerArgs::Drag(content));
    }

    fn fire(&mut self, handle: ViewHandle, kind: HandlerKind, args: &HandlerArgs<'_>) {
        let matching: Vec<Handler> = self
            .handlers
            .get(handle)
            .map(|list| {
                list.iter()
                    .filter(|(k, _)| *k == kind)
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();
        for handler in matching {
            handler(self, handle, args);
        }
    }

    // ---- dialogs ----

    /// Only one dialog can be on screen; a second request while one is
    /// showing is a shell-boundary failure reported to the caller.
    pub fn present_dialog(&mut self, dialog: Dialog) -> Result<(), HostError> {
        if self.dialog.is_some() {
            return Err(HostError::DialogBusy);
        }
        self.dialog = Some(dialog);
        Ok(())
    }

    pub fn presented_dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// The user picked a button; the dialog leaves the screen.
    pub fn invoke_dialog_button(&mut self, key: i64) -> Result<(), HostError> {
        let dialog = self.dialog.take().ok_or(HostError::NoDialog)?;
        (dialog.on_command)(key);
        Ok(())
    }
}

fn mismatch(expected: &'static str, found: &Widget) -> HostError {
    HostError::WidgetMismatch {
        expected,
        found: found.kind_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn tree_with_panel_and_slider() -> (HostTree, ViewHandle, ViewHandle) {
        let mut host = HostTree::new();
        let panel = host.create_panel(Tag::new(1));
        let slider = host.create_slider(Tag::new(2));
        (host, panel, slider)
    }

    #[test]
    fn test_resolve_and_tag_roundtrip() {
        let (host, panel, slider) = tree_with_panel_and_slider();
        assert_eq!(host.resolve(Tag::new(1)), Some(panel));
        assert_eq!(host.tag_of(slider).unwrap(), Tag::new(2));
        assert_eq!(host.resolve(Tag::new(3)), None);
    }

    #[test]
    fn test_child_mutation_on_non_panel_is_refused() {
        let (mut host, _, slider) = tree_with_panel_and_slider();
        let err = host.add_child(slider, slider, 0).unwrap_err();
        assert_eq!(
            err,
            HostError::WidgetMismatch {
                expected: "panel",
                found: "slider"
            }
        );
    }

    #[test]
    fn test_remove_view_detaches_from_parents() {
        let (mut host, panel, slider) = tree_with_panel_and_slider();
        host.add_child(panel, slider, 0).unwrap();
        host.remove_view(slider);
        assert_eq!(host.child_count(panel).unwrap(), 0);
        assert_eq!(host.resolve(Tag::new(2)), None);
        assert!(!host.contains(slider));
    }

    #[test]
    fn test_resize_listener_fires_on_size_change_only() {
        let (mut host, panel, _) = tree_with_panel_and_slider();
        let seen: Rc<RefCell<Vec<Size>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        host.set_resize_listener(
            panel,
            Rc::new(move |_, _, size| sink.borrow_mut().push(size)),
        );
        host.set_bounds(panel, Dimensions::new(0.0, 0.0, 100.0, 50.0))
            .unwrap();
        // Same size, different position: no notification.
        host.set_bounds(panel, Dimensions::new(5.0, 5.0, 100.0, 50.0))
            .unwrap();
        host.set_bounds(panel, Dimensions::new(5.0, 5.0, 120.0, 50.0))
            .unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].width, 120.0);
    }

    #[test]
    fn test_foreign_projection_is_refused() {
        let (mut host, panel, _) = tree_with_panel_and_slider();
        host.install_foreign_projection(panel).unwrap();
        let identity = casement_core::transform::process_transform(&[]).unwrap();
        let err = host.set_projection(panel, identity).unwrap_err();
        assert_eq!(err, HostError::Transform(TransformError::ForeignProjection));
        let err = host.clear_projection(panel).unwrap_err();
        assert_eq!(err, HostError::Transform(TransformError::ForeignProjection));
    }

    #[test]
    fn test_disabled_slider_swallows_drags() {
        let (mut host, _, slider) = tree_with_panel_and_slider();
        let fired = Rc::new(RefCell::new(0));
        let sink = fired.clone();
        host.add_handler(
            slider,
            HandlerKind::ValueChanged,
            Rc::new(move |_, _, _| *sink.borrow_mut() += 1),
        );
        host.slider_drag_to(slider, 40.0).unwrap();
        host.slider_mut(slider).unwrap().enabled = false;
        host.slider_drag_to(slider, 60.0).unwrap();
        assert_eq!(*fired.borrow(), 1);
        assert_eq!(host.slider(slider).unwrap().value, 40.0);
    }

    #[test]
    fn test_dialog_presentation_is_exclusive() {
        let mut host = HostTree::new();
        let dialog = |marker: Rc<RefCell<Option<i64>>>| Dialog {
            title: None,
            message: "hello".into(),
            buttons: vec![DialogButton {
                label: "OK".into(),
                key: 0,
            }],
            on_command: Box::new(move |key| *marker.borrow_mut() = Some(key)),
        };
        let picked = Rc::new(RefCell::new(None));
        host.present_dialog(dialog(picked.clone())).unwrap();
        assert_eq!(
            host.present_dialog(dialog(picked.clone())).unwrap_err(),
            HostError::DialogBusy
        );
        host.invoke_dialog_button(0).unwrap();
        assert_eq!(*picked.borrow(), Some(0));
        assert!(host.presented_dialog().is_none());
    }
}
