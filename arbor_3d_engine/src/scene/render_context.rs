/// Per-frame state threaded through scene traversal.
///
/// Built once per frame, passed by `&mut` through the whole traversal and
/// dropped afterwards. It carries:
/// - the camera stack (the current camera is always the top)
/// - the world transform stack (one entry per node on the current path)
/// - frame-global uniforms applied to every program that declares them
/// - frame statistics
///
/// A failed frame simply discards its context.

use std::fmt;
use std::sync::Arc;
use glam::Mat4;
use crate::camera::CameraView;
use crate::graphics_device::UniformValue;
use crate::resource::UniformData;

/// Counters collected during one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes whose before-children phase ran
    pub nodes_entered: u32,
    /// Nodes whose after-children phase ran
    pub nodes_exited: u32,
    /// Render units drawn
    pub draw_calls: u32,
}

/// Traversal phase of a node, as recorded by `RenderContext::record_visits`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitPhase {
    BeforeChildren,
    AfterChildren,
}

pub struct RenderContext {
    camera_stack: Vec<Arc<dyn CameraView>>,
    world_stack: Vec<Mat4>,
    frame_uniforms: Vec<(String, UniformValue)>,
    stats: FrameStats,
    visits: Option<Vec<(String, VisitPhase)>>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    /// Empty context: no camera, identity world transform
    pub fn new() -> Self {
        Self {
            camera_stack: Vec::new(),
            world_stack: Vec::new(),
            frame_uniforms: Vec::new(),
            stats: FrameStats::default(),
            visits: None,
        }
    }

    /// Context whose base camera is `camera`
    pub fn with_camera(camera: Arc<dyn CameraView>) -> Self {
        let mut ctx = Self::new();
        ctx.push_camera(camera);
        ctx
    }

    // ===== CAMERA STACK =====

    pub fn push_camera(&mut self, camera: Arc<dyn CameraView>) {
        self.camera_stack.push(camera);
    }

    pub fn pop_camera(&mut self) -> Option<Arc<dyn CameraView>> {
        self.camera_stack.pop()
    }

    /// Top of the camera stack
    pub fn current_camera(&self) -> Option<&Arc<dyn CameraView>> {
        self.camera_stack.last()
    }

    pub fn camera_depth(&self) -> usize {
        self.camera_stack.len()
    }

    // ===== WORLD STACK =====

    /// World transform of the node being visited (identity above the root)
    pub fn world_transform(&self) -> Mat4 {
        self.world_stack.last().copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Enter a node: its world transform is `parent * local`
    pub(crate) fn push_world(&mut self, local: Mat4) -> Mat4 {
        let world = self.world_transform() * local;
        self.world_stack.push(world);
        world
    }

    pub(crate) fn pop_world(&mut self) {
        self.world_stack.pop();
    }

    pub fn world_depth(&self) -> usize {
        self.world_stack.len()
    }

    // ===== FRAME UNIFORMS =====

    /// Set a frame-global uniform (replaces a previous value of the same name)
    pub fn set_frame_uniform<V: UniformData>(&mut self, name: &str, value: V) {
        let value = value.into_value();
        match self.frame_uniforms.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.frame_uniforms.push((name.to_string(), value)),
        }
    }

    pub fn frame_uniform(&self, name: &str) -> Option<UniformValue> {
        self.frame_uniforms.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Frame uniforms in insertion order
    pub fn frame_uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.frame_uniforms.iter().map(|(n, v)| (n.as_str(), v))
    }

    // ===== STATS / DIAGNOSTICS =====

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut FrameStats {
        &mut self.stats
    }

    /// Start recording every node phase in visit order
    pub fn record_visits(&mut self) {
        self.visits = Some(Vec::new());
    }

    /// Recorded (node name, phase) pairs, empty unless `record_visits` was called
    pub fn visits(&self) -> &[(String, VisitPhase)] {
        self.visits.as_deref().unwrap_or(&[])
    }

    pub(crate) fn record_visit(&mut self, node: &str, phase: VisitPhase) {
        if let Some(visits) = self.visits.as_mut() {
            visits.push((node.to_string(), phase));
        }
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("camera_depth", &self.camera_stack.len())
            .field("world_depth", &self.world_stack.len())
            .field("frame_uniforms", &self.frame_uniforms)
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
