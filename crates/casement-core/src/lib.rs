//! # Shadow tree and property model
//!
//! Casement's core is everything the bridge needs *off* the UI thread: the
//! shadow tree mirroring the declarative description, dynamically-typed
//! property values and their coercion, 3D transform composition, and the
//! bridge to the external flex engine.
//!
//! ## Shadow nodes
//!
//! A [`ShadowNode`] is pure data: declared props, ordered children, and the
//! layout box the flex engine last published for it. Nodes are addressed by
//! [`Tag`], the identifier the instruction channel assigns:
//!
//! ```rust
//! use casement_core::{ShadowTree, Tag};
//!
//! let mut tree = ShadowTree::new();
//! tree.create(Tag::new(1), "Panel").unwrap();
//! tree.create(Tag::new(2), "Slider").unwrap();
//! tree.insert_child(Tag::new(1), Tag::new(2), 0).unwrap();
//! assert_eq!(tree.get(Tag::new(2)).unwrap().parent, Some(Tag::new(1)));
//! ```
//!
//! ## Layout
//!
//! [`LayoutBridge`] keeps a taffy tree in lockstep with the shadow tree,
//! translating declared layout props (`width`, `flexGrow`, `margin`, ...)
//! into taffy styles. The layout algorithm itself is taffy's; the bridge only
//! feeds it and reads the computed boxes back.
//!
//! ## Transforms
//!
//! [`transform::process_transform`] folds a declarative transform list into a
//! single `Matrix4<f64>`; [`transform::is_translation_only`] decides whether
//! the cheap translation primitive suffices or a full projection is needed.

pub mod color;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod node;
pub mod transform;
pub mod value;

pub use color::*;
pub use error::*;
pub use geometry::*;
pub use layout::*;
pub use node::*;
