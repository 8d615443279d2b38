//! Scene module
//!
//! Node hierarchy, render units and the two-phase traversal that turns a
//! tree into draw calls once per frame.

mod attribute_map;
mod buffer_source;
mod render_unit;
mod render_context;
mod node;
mod traversal;

pub use attribute_map::{AttributeMap, AttributeMapEntry};
pub use buffer_source::BufferSource;
pub use render_unit::{AttributeBinding, RenderUnit, RenderUnitBuilder};
pub use render_context::{FrameStats, RenderContext, VisitPhase};
pub use node::{ModelShading, NodeKind, PointLightShading, SceneNode, Transform};
pub use traversal::SceneRenderer;
