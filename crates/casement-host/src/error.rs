use casement_core::TransformError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("unknown view handle")]
    UnknownView,
    #[error("view is a {found}, expected a {expected}")]
    WidgetMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("child index {0} out of range")]
    ChildIndexOutOfRange(usize),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("a dialog is already being presented")]
    DialogBusy,
    #[error("no dialog is being presented")]
    NoDialog,
}
