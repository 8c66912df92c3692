//! Concrete view managers.

mod label;
mod panel;
mod slider;

pub use label::LabelManager;
pub use panel::PanelManager;
pub use slider::SliderManager;
