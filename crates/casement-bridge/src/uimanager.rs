//! The UI manager module: batched reconciliation of the shadow tree against
//! the native tree.
//!
//! Batches arrive on any thread. Validation, shadow mutation and layout run
//! under the module lock; the resulting native mutations are submitted to
//! the UI executor as one task, so observers of the native tree never see a
//! half-applied batch. A reference to a tag with no prior create is a
//! contract violation between the two trees and is returned to the caller,
//! never swallowed.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use casement_core::{Dimensions, LayoutBridge, ShadowError, ShadowTree, Size, Tag};
use casement_host::{AccessList, HostTree, UiDispatcher};

use crate::events::EventDispatcher;
use crate::framework::DimensionBoundStore;
use crate::manager::{CommandError, ManagerRegistry, UiCtx, ViewManager};
use crate::props::PropError;

#[derive(Debug, Clone)]
pub struct ChildInsert {
    pub tag: Tag,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub enum Instruction {
    Create {
        tag: Tag,
        class: String,
        props: Value,
    },
    UpdateProps {
        tag: Tag,
        props: Value,
    },
    ManageChildren {
        parent: Tag,
        insert: Vec<ChildInsert>,
        remove_at: Vec<usize>,
    },
    RemoveSubtree {
        tag: Tag,
    },
    DispatchCommand {
        tag: Tag,
        command: String,
        args: Value,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UiManagerError {
    #[error("unknown tag {0}; a node must be created before it is referenced")]
    UnknownTag(Tag),
    #[error("unknown view class `{0}`")]
    UnknownClass(String),
    #[error("props for tag {0} must be an object or null")]
    MalformedProps(Tag),
    #[error("class `{class}` cannot hold children")]
    NotAContainer { class: &'static str },
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Shadow(#[from] ShadowError),
}

/// One entry per property application that failed inside an applied batch.
#[derive(Debug)]
pub struct PropFailure {
    pub tag: Tag,
    pub prop: String,
    pub error: PropError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub failures: Vec<PropFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Native mutation derived from a validated instruction. Everything needed
/// to apply it on the UI thread travels with it.
enum NativeOp {
    Create {
        tag: Tag,
        manager: Arc<dyn ViewManager>,
        props: Option<Map<String, Value>>,
    },
    UpdateProps {
        tag: Tag,
        manager: Arc<dyn ViewManager>,
        props: Map<String, Value>,
    },
    AddChild {
        parent: Tag,
        manager: Arc<dyn ViewManager>,
        child: Tag,
        index: usize,
    },
    RemoveChildAt {
        parent: Tag,
        manager: Arc<dyn ViewManager>,
        index: usize,
    },
    DropView {
        tag: Tag,
        manager: Arc<dyn ViewManager>,
    },
    SetDimensions {
        tag: Tag,
        manager: Arc<dyn ViewManager>,
        dims: Dimensions,
    },
    Command {
        tag: Tag,
        manager: Arc<dyn ViewManager>,
        command: String,
        args: Value,
    },
}

struct RootBinding {
    tag: Tag,
    size: Size,
}

struct DescriptionState {
    shadow: ShadowTree,
    layout: LayoutBridge,
    managers: HashMap<Tag, Arc<dyn ViewManager>>,
    root: Option<RootBinding>,
}

pub struct UiManagerModule {
    ui: Arc<UiDispatcher>,
    registry: ManagerRegistry,
    events: EventDispatcher,
    aux: Arc<DimensionBoundStore>,
    access: Arc<AccessList>,
    state: Mutex<DescriptionState>,
}

impl UiManagerModule {
    pub fn new(
        ui: Arc<UiDispatcher>,
        registry: ManagerRegistry,
        events: EventDispatcher,
    ) -> UiManagerModule {
        UiManagerModule {
            ui,
            registry,
            events,
            aux: Arc::new(DimensionBoundStore::new()),
            access: Arc::new(AccessList::new()),
            state: Mutex::new(DescriptionState {
                shadow: ShadowTree::new(),
                layout: LayoutBridge::new(),
                managers: HashMap::new(),
                root: None,
            }),
        }
    }

    pub fn ui(&self) -> &Arc<UiDispatcher> {
        &self.ui
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn aux(&self) -> &Arc<DimensionBoundStore> {
        &self.aux
    }

    pub fn access(&self) -> &Arc<AccessList> {
        &self.access
    }

    /// Registers the host-provided root container and gives the flex engine
    /// its viewport.
    pub fn register_root(&self, tag: Tag, size: Size) -> Result<(), UiManagerError> {
        let manager = self
            .registry
            .get("Panel")
            .ok_or_else(|| UiManagerError::UnknownClass("Panel".to_string()))?;
        let mut state = self.state.lock();
        let state = &mut *state;
        let node = state.shadow.create(tag, "Panel")?;
        node.set_property("width", Value::from(size.width));
        node.set_property("height", Value::from(size.height));
        state.layout.register(tag)?;
        state.layout.update_style(tag, &state.shadow.get(tag)?.props)?;
        state.managers.insert(tag, manager.clone());
        state.root = Some(RootBinding { tag, size });
        self.events.register(tag);

        let aux = self.aux.clone();
        let events = self.events.clone();
        let access = self.access.clone();
        self.ui.run(move |host| {
            let mut ctx = UiCtx {
                host,
                aux: &aux,
                events: &events,
                access: &access,
                tag,
            };
            let view = manager.create_view(&mut ctx);
            manager.add_event_emitters(&mut ctx, view);
        });
        Ok(())
    }

    /// Applies one ordered batch. Validation errors abort before any native
    /// mutation; per-property failures are collected in the report while the
    /// rest of the batch proceeds.
    pub fn dispatch_batch(&self, batch: Vec<Instruction>) -> Result<BatchReport, UiManagerError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut ops: Vec<NativeOp> = Vec::new();
        let mut created: Vec<Tag> = Vec::new();

        for instruction in batch {
            match instruction {
                Instruction::Create { tag, class, props } => {
                    self.plan_create(state, &mut ops, &mut created, tag, class, props)?;
                }
                Instruction::UpdateProps { tag, props } => {
                    self.plan_update_props(state, &mut ops, tag, props)?;
                }
                Instruction::ManageChildren {
                    parent,
                    insert,
                    remove_at,
                } => {
                    self.plan_manage_children(state, &mut ops, parent, insert, remove_at)?;
                }
                Instruction::RemoveSubtree { tag } => {
                    self.plan_remove_subtree(state, &mut ops, tag)?;
                }
                Instruction::DispatchCommand { tag, command, args } => {
                    let manager = manager_of(state, tag)?;
                    if !manager.commands().contains(&command.as_str()) {
                        return Err(CommandError::UnknownCommand {
                            class: manager.name(),
                            command,
                        }
                        .into());
                    }
                    ops.push(NativeOp::Command {
                        tag,
                        manager,
                        command,
                        args,
                    });
                }
            }
        }

        // Layout runs to completion and publishes its boxes before any
        // set_dimensions op exists for this batch.
        self.plan_layout(state, &mut ops)?;

        for tag in &created {
            self.events.register(*tag);
        }

        let aux = self.aux.clone();
        let events = self.events.clone();
        let access = self.access.clone();
        let report = self
            .ui
            .run(move |host| apply_native_ops(host, &aux, &events, &access, ops));
        Ok(report)
    }

    fn plan_create(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
        created: &mut Vec<Tag>,
        tag: Tag,
        class: String,
        props: Value,
    ) -> Result<(), UiManagerError> {
        let manager = self
            .registry
            .get(&class)
            .ok_or_else(|| UiManagerError::UnknownClass(class.clone()))?;
        let props = match props {
            Value::Null => None,
            Value::Object(map) => Some(map),
            _ => return Err(UiManagerError::MalformedProps(tag)),
        };
        let needs_custom_layout = manager.needs_custom_layout();
        let node = state.shadow.create(tag, &class)?;
        node.needs_custom_layout = needs_custom_layout;
        if let Some(map) = &props {
            for (name, value) in map {
                node.set_property(name, value.clone());
            }
        }
        state.layout.register(tag)?;
        state.layout.update_style(tag, &state.shadow.get(tag)?.props)?;
        state.managers.insert(tag, manager.clone());
        created.push(tag);
        ops.push(NativeOp::Create { tag, manager, props });
        Ok(())
    }

    fn plan_update_props(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
        tag: Tag,
        props: Value,
    ) -> Result<(), UiManagerError> {
        let manager = manager_of(state, tag)?;
        let map = match props {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return Err(UiManagerError::MalformedProps(tag)),
        };
        let node = state.shadow.get_mut(tag)?;
        for (name, value) in &map {
            node.set_property(name, value.clone());
        }
        state.layout.update_style(tag, &state.shadow.get(tag)?.props)?;
        ops.push(NativeOp::UpdateProps {
            tag,
            manager,
            props: map,
        });
        Ok(())
    }

    fn plan_manage_children(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
        parent: Tag,
        insert: Vec<ChildInsert>,
        mut remove_at: Vec<usize>,
    ) -> Result<(), UiManagerError> {
        let parent_manager = manager_of(state, parent)?;
        if parent_manager.children().is_none() {
            return Err(UiManagerError::NotAContainer {
                class: parent_manager.name(),
            });
        }

        // Removals first, descending, so earlier indices stay valid. Each
        // removal releases the whole subtree.
        remove_at.sort_unstable_by(|a, b| b.cmp(a));
        for index in remove_at {
            let child = state.shadow.remove_child_at(parent, index)?;
            ops.push(NativeOp::RemoveChildAt {
                parent,
                manager: parent_manager.clone(),
                index,
            });
            self.plan_release_subtree(state, ops, child)?;
        }

        for ChildInsert { tag: child, index } in insert {
            state.shadow.insert_child(parent, child, index)?;
            ops.push(NativeOp::AddChild {
                parent,
                manager: parent_manager.clone(),
                child,
                index,
            });
        }

        let children: Vec<Tag> = state.shadow.get(parent)?.children.to_vec();
        state.layout.set_children(parent, &children)?;
        Ok(())
    }

    fn plan_remove_subtree(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
        tag: Tag,
    ) -> Result<(), UiManagerError> {
        let parent = state.shadow.get(tag)?.parent;
        if let Some(parent) = parent {
            let index = state
                .shadow
                .get(parent)?
                .children
                .iter()
                .position(|child| *child == tag);
            if let (Some(index), Some(parent_manager)) =
                (index, state.managers.get(&parent).cloned())
            {
                ops.push(NativeOp::RemoveChildAt {
                    parent,
                    manager: parent_manager,
                    index,
                });
            }
        }
        self.plan_release_subtree(state, ops, tag)?;
        if let Some(parent) = parent {
            let children: Vec<Tag> = state.shadow.get(parent)?.children.to_vec();
            state.layout.set_children(parent, &children)?;
        }
        Ok(())
    }

    /// Cascades over the (already detached) subtree: every node loses its
    /// shadow state, layout node, manager binding and event liveness, and a
    /// drop op releases its native view.
    fn plan_release_subtree(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
        tag: Tag,
    ) -> Result<(), UiManagerError> {
        for removed in state.shadow.remove_subtree(tag)? {
            state.layout.unregister(removed);
            self.events.unregister(removed);
            if let Some(manager) = state.managers.remove(&removed) {
                ops.push(NativeOp::DropView {
                    tag: removed,
                    manager,
                });
            }
        }
        Ok(())
    }

    fn plan_layout(
        &self,
        state: &mut DescriptionState,
        ops: &mut Vec<NativeOp>,
    ) -> Result<(), UiManagerError> {
        let Some(root) = &state.root else {
            log::debug!("no root registered; skipping the layout pass");
            return Ok(());
        };
        let root_tag = root.tag;
        state.layout.compute(root_tag, root.size)?;

        let mut stack = vec![root_tag];
        while let Some(tag) = stack.pop() {
            let node = state.shadow.get(tag)?;
            if !node.needs_custom_layout {
                stack.extend(node.children.iter().copied());
            }
            let computed = state.layout.layout_of(tag)?;
            let node = state.shadow.get_mut(tag)?;
            if !computed.same_box(&node.layout) {
                node.layout = computed;
                if let Some(manager) = state.managers.get(&tag).cloned() {
                    ops.push(NativeOp::SetDimensions {
                        tag,
                        manager,
                        dims: computed,
                    });
                }
            }
        }
        Ok(())
    }
}

fn manager_of(
    state: &DescriptionState,
    tag: Tag,
) -> Result<Arc<dyn ViewManager>, UiManagerError> {
    state
        .managers
        .get(&tag)
        .cloned()
        .ok_or(UiManagerError::UnknownTag(tag))
}

/// The UI-thread half of a batch: a single task applying every native op in
/// order. Per-property failures land in the report; a desynchronized native
/// tree (which validation makes unreachable) is logged, not guessed around.
fn apply_native_ops(
    host: &mut HostTree,
    aux: &DimensionBoundStore,
    events: &EventDispatcher,
    access: &Arc<AccessList>,
    ops: Vec<NativeOp>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for op in ops {
        match op {
            NativeOp::Create { tag, manager, props } => {
                let mut ctx = UiCtx {
                    host: &mut *host,
                    aux,
                    events,
                    access,
                    tag,
                };
                let view = manager.create_view(&mut ctx);
                manager.add_event_emitters(&mut ctx, view);
                if let Some(props) = props {
                    for (prop, error) in manager.prop_table().apply_object(&mut ctx, view, &props)
                    {
                        report.failures.push(PropFailure { tag, prop, error });
                    }
                }
            }
            NativeOp::UpdateProps { tag, manager, props } => {
                let Some(view) = host.resolve(tag) else {
                    desync(tag, "update");
                    continue;
                };
                let mut ctx = UiCtx {
                    host: &mut *host,
                    aux,
                    events,
                    access,
                    tag,
                };
                for (prop, error) in manager.prop_table().apply_object(&mut ctx, view, &props) {
                    report.failures.push(PropFailure { tag, prop, error });
                }
            }
            NativeOp::AddChild {
                parent,
                manager,
                child,
                index,
            } => {
                let (Some(parent_view), Some(child_view)) =
                    (host.resolve(parent), host.resolve(child))
                else {
                    desync(parent, "add-child");
                    continue;
                };
                if let Some(children) = manager.children() {
                    if let Err(error) = children.add_child(host, parent_view, child_view, index) {
                        log::error!("adding child {child} to {parent} failed: {error}");
                    }
                }
            }
            NativeOp::RemoveChildAt {
                parent,
                manager,
                index,
            } => {
                let Some(parent_view) = host.resolve(parent) else {
                    desync(parent, "remove-child");
                    continue;
                };
                if let Some(children) = manager.children() {
                    if let Err(error) = children.remove_child_at(host, parent_view, index) {
                        log::error!("removing child {index} of {parent} failed: {error}");
                    }
                }
            }
            NativeOp::DropView { tag, manager } => {
                let Some(view) = host.resolve(tag) else {
                    desync(tag, "drop");
                    continue;
                };
                let mut ctx = UiCtx {
                    host: &mut *host,
                    aux,
                    events,
                    access,
                    tag,
                };
                manager.drop_view_instance(&mut ctx, view);
                host.remove_view(view);
            }
            NativeOp::SetDimensions { tag, manager, dims } => {
                let Some(view) = host.resolve(tag) else {
                    desync(tag, "set-dimensions");
                    continue;
                };
                let mut ctx = UiCtx {
                    host: &mut *host,
                    aux,
                    events,
                    access,
                    tag,
                };
                if let Err(error) = manager.set_dimensions(&mut ctx, view, dims) {
                    report.failures.push(PropFailure {
                        tag,
                        prop: "<dimensions>".to_string(),
                        error,
                    });
                }
            }
            NativeOp::Command {
                tag,
                manager,
                command,
                args,
            } => {
                let Some(view) = host.resolve(tag) else {
                    desync(tag, "command");
                    continue;
                };
                let mut ctx = UiCtx {
                    host: &mut *host,
                    aux,
                    events,
                    access,
                    tag,
                };
                if let Err(error) = manager.dispatch_command(&mut ctx, view, &command, &args) {
                    log::error!("command `{command}` on {tag} failed: {error}");
                }
            }
        }
    }
    report
}

fn desync(tag: Tag, what: &str) {
    log::error!("native view for tag {tag} missing during {what}; trees are desynchronized");
}
