//! Bridge to the external flex engine (taffy).
//!
//! The bridge owns the mapping from shadow tags to taffy nodes and the
//! translation from declared layout props to taffy styles. Layout itself is
//! entirely taffy's; results are read back as [`Dimensions`] relative to the
//! parent box.

use std::collections::HashMap;

use serde_json::Value;
use taffy::prelude::*;

use crate::error::ShadowError;
use crate::geometry::{Dimensions, Size as BoxSize};
use crate::node::Tag;

pub struct LayoutBridge {
    taffy: TaffyTree<()>,
    by_tag: HashMap<Tag, taffy::NodeId>,
}

impl Default for LayoutBridge {
    fn default() -> Self {
        LayoutBridge::new()
    }
}

impl LayoutBridge {
    pub fn new() -> LayoutBridge {
        LayoutBridge {
            taffy: TaffyTree::new(),
            by_tag: HashMap::new(),
        }
    }

    fn node(&self, tag: Tag) -> Result<taffy::NodeId, ShadowError> {
        self.by_tag
            .get(&tag)
            .copied()
            .ok_or(ShadowError::UnknownTag(tag))
    }

    pub fn register(&mut self, tag: Tag) -> Result<(), ShadowError> {
        if self.by_tag.contains_key(&tag) {
            return Err(ShadowError::DuplicateTag(tag));
        }
        let node = self.taffy.new_leaf(base_style()).unwrap();
        self.by_tag.insert(tag, node);
        Ok(())
    }

    pub fn unregister(&mut self, tag: Tag) {
        if let Some(node) = self.by_tag.remove(&tag) {
            self.taffy.remove(node).unwrap();
        }
    }

    /// Mirrors a shadow node's full child sequence; order is significant.
    pub fn set_children(&mut self, parent: Tag, children: &[Tag]) -> Result<(), ShadowError> {
        let parent_node = self.node(parent)?;
        let child_nodes: Vec<taffy::NodeId> = children
            .iter()
            .map(|child| self.node(*child))
            .collect::<Result<_, _>>()?;
        self.taffy.set_children(parent_node, &child_nodes).unwrap();
        Ok(())
    }

    /// Rebuilds the node's style from its full declared prop map. Non-layout
    /// props are skipped here; the dispatch table owns them.
    pub fn update_style(
        &mut self,
        tag: Tag,
        props: &HashMap<String, Value>,
    ) -> Result<(), ShadowError> {
        let node = self.node(tag)?;
        self.taffy.set_style(node, style_from_props(props)).unwrap();
        Ok(())
    }

    pub fn mark_dirty(&mut self, tag: Tag) -> Result<(), ShadowError> {
        let node = self.node(tag)?;
        self.taffy.mark_dirty(node).unwrap();
        Ok(())
    }

    pub fn compute(&mut self, root: Tag, available: BoxSize) -> Result<(), ShadowError> {
        let root_node = self.node(root)?;
        let space = taffy::geometry::Size {
            width: AvailableSpace::Definite(available.width as f32),
            height: AvailableSpace::Definite(available.height as f32),
        };
        self.taffy.compute_layout(root_node, space).unwrap();
        Ok(())
    }

    /// The computed box, positioned relative to the parent.
    pub fn layout_of(&self, tag: Tag) -> Result<Dimensions, ShadowError> {
        let node = self.node(tag)?;
        let layout = self.taffy.layout(node).unwrap();
        Ok(Dimensions::new(
            layout.location.x as f64,
            layout.location.y as f64,
            layout.size.width as f64,
            layout.size.height as f64,
        ))
    }
}

/// Styles start from the description side's defaults: flex containers stack
/// vertically unless told otherwise.
fn base_style() -> Style {
    Style {
        display: Display::Flex,
        flex_direction: FlexDirection::Column,
        ..Style::default()
    }
}

fn dimension(value: &Value) -> Option<Dimension> {
    if let Some(n) = value.as_f64() {
        return Some(length(n as f32));
    }
    match value.as_str()? {
        "auto" => Some(auto()),
        text => Some(percent(parse_percent(text)?)),
    }
}

fn length_percentage_auto(value: &Value) -> Option<LengthPercentageAuto> {
    if let Some(n) = value.as_f64() {
        return Some(length(n as f32));
    }
    match value.as_str()? {
        "auto" => Some(auto()),
        text => Some(percent(parse_percent(text)?)),
    }
}

fn length_percentage(value: &Value) -> Option<LengthPercentage> {
    if let Some(n) = value.as_f64() {
        return Some(length(n as f32));
    }
    Some(percent(parse_percent(value.as_str()?)?))
}

fn parse_percent(text: &str) -> Option<f32> {
    let number: f32 = text.strip_suffix('%')?.trim().parse().ok()?;
    Some(number / 100.0)
}

fn style_from_props(props: &HashMap<String, Value>) -> Style {
    let mut s = base_style();

    for (name, value) in props {
        if value.is_null() {
            continue;
        }
        match name.as_str() {
            "width" => set_or_skip(name, dimension(value), |d| s.size.width = d),
            "height" => set_or_skip(name, dimension(value), |d| s.size.height = d),
            "minWidth" => set_or_skip(name, dimension(value), |d| s.min_size.width = d),
            "minHeight" => set_or_skip(name, dimension(value), |d| s.min_size.height = d),
            "maxWidth" => set_or_skip(name, dimension(value), |d| s.max_size.width = d),
            "maxHeight" => set_or_skip(name, dimension(value), |d| s.max_size.height = d),
            "flex" | "flexGrow" => {
                set_or_skip(name, value.as_f64(), |f| s.flex_grow = f as f32)
            }
            "flexShrink" => set_or_skip(name, value.as_f64(), |f| s.flex_shrink = f as f32),
            "flexBasis" => set_or_skip(name, dimension(value), |d| s.flex_basis = d),
            "aspectRatio" => set_or_skip(name, value.as_f64(), |r| {
                s.aspect_ratio = Some(r as f32)
            }),
            "flexDirection" => set_or_skip(
                name,
                value.as_str().and_then(flex_direction),
                |d| s.flex_direction = d,
            ),
            "flexWrap" => {
                set_or_skip(name, value.as_str().and_then(flex_wrap), |w| s.flex_wrap = w)
            }
            "justifyContent" => set_or_skip(
                name,
                value.as_str().and_then(justify_content),
                |j| s.justify_content = Some(j),
            ),
            "alignItems" => set_or_skip(name, value.as_str().and_then(align_items), |a| {
                s.align_items = Some(a)
            }),
            "alignSelf" => set_or_skip(name, value.as_str().and_then(align_items), |a| {
                s.align_self = Some(a)
            }),
            "position" => {
                if value.as_str() == Some("absolute") {
                    s.position = Position::Absolute;
                }
            }
            "left" => set_or_skip(name, length_percentage_auto(value), |v| s.inset.left = v),
            "right" => set_or_skip(name, length_percentage_auto(value), |v| s.inset.right = v),
            "top" => set_or_skip(name, length_percentage_auto(value), |v| s.inset.top = v),
            "bottom" => {
                set_or_skip(name, length_percentage_auto(value), |v| s.inset.bottom = v)
            }
            "margin" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin = taffy::geometry::Rect {
                    left: v,
                    right: v,
                    top: v,
                    bottom: v,
                }
            }),
            "marginLeft" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin.left = v
            }),
            "marginRight" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin.right = v
            }),
            "marginTop" => {
                set_or_skip(name, length_percentage_auto(value), |v| s.margin.top = v)
            }
            "marginBottom" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin.bottom = v
            }),
            "marginHorizontal" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin.left = v;
                s.margin.right = v;
            }),
            "marginVertical" => set_or_skip(name, length_percentage_auto(value), |v| {
                s.margin.top = v;
                s.margin.bottom = v;
            }),
            "padding" => set_or_skip(name, length_percentage(value), |v| {
                s.padding = taffy::geometry::Rect {
                    left: v,
                    right: v,
                    top: v,
                    bottom: v,
                }
            }),
            "paddingLeft" => {
                set_or_skip(name, length_percentage(value), |v| s.padding.left = v)
            }
            "paddingRight" => {
                set_or_skip(name, length_percentage(value), |v| s.padding.right = v)
            }
            "paddingTop" => set_or_skip(name, length_percentage(value), |v| s.padding.top = v),
            "paddingBottom" => {
                set_or_skip(name, length_percentage(value), |v| s.padding.bottom = v)
            }
            "paddingHorizontal" => set_or_skip(name, length_percentage(value), |v| {
                s.padding.left = v;
                s.padding.right = v;
            }),
            "paddingVertical" => set_or_skip(name, length_percentage(value), |v| {
                s.padding.top = v;
                s.padding.bottom = v;
            }),
            "display" => {
                if value.as_str() == Some("none") {
                    s.display = Display::None;
                }
            }
            // Everything else is a visual prop, not layout input.
            _ => {}
        }
    }

    s
}

fn set_or_skip<T>(name: &str, parsed: Option<T>, mut assign: impl FnMut(T)) {
    match parsed {
        Some(v) => assign(v),
        None => log::debug!("ignoring malformed layout prop `{name}`"),
    }
}

fn flex_direction(text: &str) -> Option<FlexDirection> {
    match text {
        "row" => Some(FlexDirection::Row),
        "row-reverse" => Some(FlexDirection::RowReverse),
        "column" => Some(FlexDirection::Column),
        "column-reverse" => Some(FlexDirection::ColumnReverse),
        _ => None,
    }
}

fn flex_wrap(text: &str) -> Option<FlexWrap> {
    match text {
        "nowrap" => Some(FlexWrap::NoWrap),
        "wrap" => Some(FlexWrap::Wrap),
        "wrap-reverse" => Some(FlexWrap::WrapReverse),
        _ => None,
    }
}

fn justify_content(text: &str) -> Option<JustifyContent> {
    match text {
        "flex-start" => Some(JustifyContent::FlexStart),
        "flex-end" => Some(JustifyContent::FlexEnd),
        "center" => Some(JustifyContent::Center),
        "space-between" => Some(JustifyContent::SpaceBetween),
        "space-around" => Some(JustifyContent::SpaceAround),
        "space-evenly" => Some(JustifyContent::SpaceEvenly),
        _ => None,
    }
}

fn align_items(text: &str) -> Option<AlignItems> {
    match text {
        "flex-start" => Some(AlignItems::FlexStart),
        "flex-end" => Some(AlignItems::FlexEnd),
        "center" => Some(AlignItems::Center),
        "stretch" => Some(AlignItems::Stretch),
        "baseline" => Some(AlignItems::Baseline),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_row_split_between_flex_children() {
        let mut bridge = LayoutBridge::new();
        let root = Tag::new(1);
        let a = Tag::new(2);
        let b = Tag::new(3);
        for tag in [root, a, b] {
            bridge.register(tag).unwrap();
        }
        bridge
            .update_style(
                root,
                &props(&[
                    ("flexDirection", json!("row")),
                    ("width", json!(400.0)),
                    ("height", json!(100.0)),
                ]),
            )
            .unwrap();
        bridge
            .update_style(a, &props(&[("flexGrow", json!(1.0))]))
            .unwrap();
        bridge
            .update_style(b, &props(&[("flexGrow", json!(3.0))]))
            .unwrap();
        bridge.set_children(root, &[a, b]).unwrap();
        bridge
            .compute(
                root,
                BoxSize {
                    width: 400.0,
                    height: 100.0,
                },
            )
            .unwrap();

        let box_a = bridge.layout_of(a).unwrap();
        let box_b = bridge.layout_of(b).unwrap();
        assert_eq!(box_a.width, 100.0);
        assert_eq!(box_a.x, 0.0);
        assert_eq!(box_b.width, 300.0);
        assert_eq!(box_b.x, 100.0);
        assert_eq!(box_a.height, 100.0);

        // An explicit invalidation recomputes to the same stable result.
        bridge.mark_dirty(a).unwrap();
        bridge
            .compute(
                root,
                BoxSize {
                    width: 400.0,
                    height: 100.0,
                },
            )
            .unwrap();
        assert_eq!(bridge.layout_of(a).unwrap().width, 100.0);
    }

    #[test]
    fn test_absolute_positioning() {
        let mut bridge = LayoutBridge::new();
        let root = Tag::new(1);
        let child = Tag::new(2);
        bridge.register(root).unwrap();
        bridge.register(child).unwrap();
        bridge
            .update_style(
                root,
                &props(&[("width", json!(300.0)), ("height", json!(200.0))]),
            )
            .unwrap();
        bridge
            .update_style(
                child,
                &props(&[
                    ("position", json!("absolute")),
                    ("left", json!(10.0)),
                    ("top", json!(20.0)),
                    ("width", json!(50.0)),
                    ("height", json!(25.0)),
                ]),
            )
            .unwrap();
        bridge.set_children(root, &[child]).unwrap();
        bridge
            .compute(
                root,
                BoxSize {
                    width: 300.0,
                    height: 200.0,
                },
            )
            .unwrap();

        let layout = bridge.layout_of(child).unwrap();
        assert_eq!((layout.x, layout.y), (10.0, 20.0));
        assert_eq!((layout.width, layout.height), (50.0, 25.0));
    }

    #[test]
    fn test_percent_width_and_unknown_props_ignored() {
        let mut bridge = LayoutBridge::new();
        let root = Tag::new(1);
        let child = Tag::new(2);
        bridge.register(root).unwrap();
        bridge.register(child).unwrap();
        bridge
            .update_style(
                root,
                &props(&[("width", json!(200.0)), ("height", json!(100.0))]),
            )
            .unwrap();
        bridge
            .update_style(
                child,
                &props(&[
                    ("width", json!("50%")),
                    ("height", json!(30.0)),
                    ("backgroundColor", json!("#336699")),
                    ("opacity", json!(0.5)),
                ]),
            )
            .unwrap();
        bridge.set_children(root, &[child]).unwrap();
        bridge
            .compute(
                root,
                BoxSize {
                    width: 200.0,
                    height: 100.0,
                },
            )
            .unwrap();

        let layout = bridge.layout_of(child).unwrap();
        assert_eq!(layout.width, 100.0);
        assert_eq!(layout.height, 30.0);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut bridge = LayoutBridge::new();
        let tag = Tag::new(7);
        bridge.register(tag).unwrap();
        bridge.unregister(tag);
        bridge.unregister(tag);
        assert!(bridge.layout_of(tag).is_err());
    }
}
