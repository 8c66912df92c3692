use crate::node::Tag;

/// A wire value could not be coerced to the type a property setter declared.
///
/// Fails only the single property application it belongs to; the rest of the
/// batch keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("property `{prop}` expected {expected}, got {found}")]
pub struct CoerceError {
    pub prop: String,
    pub expected: &'static str,
    pub found: &'static str,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("transform entry must be an object with exactly one key")]
    MalformedEntry,
    #[error("unknown transform operation `{0}`")]
    UnknownOp(String),
    #[error("operand of transform `{op}` is not a number")]
    BadOperand { op: String },
    #[error("angle `{0}` must be a number or end in `deg`/`rad`")]
    BadAngle(String),
    #[error("transform matrix must be an array of 16 numbers")]
    BadMatrix,
    /// The view carries a render transform this bridge did not install.
    /// Proceeding would clobber foreign state, so the operation is refused.
    #[error("a render transform not owned by the bridge is set on the view")]
    ForeignTransform,
    #[error("a projection not owned by the bridge is set on the view")]
    ForeignProjection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShadowError {
    #[error("unknown tag {0}")]
    UnknownTag(Tag),
    #[error("tag {0} already exists")]
    DuplicateTag(Tag),
    #[error("child index {index} out of range for tag {parent}")]
    ChildIndexOutOfRange { parent: Tag, index: usize },
}
