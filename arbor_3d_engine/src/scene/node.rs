/// Scene nodes: transform, owned children, render units and a node kind.
///
/// A parent exclusively owns its children, so the hierarchy is a tree by
/// construction. Removing a child drops it and, with it, every GPU
/// resource only that subtree owned.
///
/// World transforms are never stored: traversal recomputes
/// `world = parent_world * local` every frame.
///
/// Each node runs two phases per frame:
/// - before children: push state (camera), set uniforms, draw its units
/// - after children: pop what the before phase pushed

use std::fmt;
use std::sync::Arc;
use glam::{Mat4, Quat, Vec3};
use crate::camera::CameraView;
use crate::error::{Error, Result};
use crate::resource::ShaderProgram;
use super::buffer_source::BufferSource;
use super::render_context::RenderContext;
use super::render_unit::{RenderUnit, RenderUnitBuilder};

// ===== TRANSFORM =====

/// Local transform of a node: scale, then rotate, then translate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, ..Self::IDENTITY }
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self { scale, ..Self::IDENTITY }
    }

    /// Local matrix (T * R * S)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

// ===== SHADING =====

/// Uniform names set by model-like nodes before drawing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelShading {
    pub projection_uniform: String,
    pub view_uniform: String,
    pub model_uniform: String,
}

impl Default for ModelShading {
    fn default() -> Self {
        Self {
            projection_uniform: "projectionMatrix".to_string(),
            view_uniform: "viewMatrix".to_string(),
            model_uniform: "modelMatrix".to_string(),
        }
    }
}

/// Point light lit model: model shading plus light uniforms
///
/// Sets `normalMatrix` (transpose of inverse of view * model) and
/// `lightPosition` (light position in eye space). Diffuse and ambient colors
/// are written when present. The light itself is white.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLightShading {
    pub matrices: ModelShading,
    /// Light position in world space
    pub light_position: Vec3,
    pub diffuse_color: Option<Vec3>,
    pub ambient_color: Option<Vec3>,
}

impl PointLightShading {
    pub const NORMAL_MATRIX: &'static str = "normalMatrix";
    pub const LIGHT_POSITION: &'static str = "lightPosition";
    pub const DIFFUSE_COLOR: &'static str = "diffuseColor";
    pub const AMBIENT_COLOR: &'static str = "ambientColor";

    pub fn new(light_position: Vec3) -> Self {
        Self {
            matrices: ModelShading::default(),
            light_position,
            diffuse_color: None,
            ambient_color: None,
        }
    }

    /// Normal matrix for `view * model`
    pub fn normal_matrix(view: Mat4, model: Mat4) -> Mat4 {
        (view * model).inverse().transpose()
    }

    /// Light position transformed into eye space
    pub fn eye_light_position(&self, view: Mat4) -> Vec3 {
        (view * self.light_position.extend(1.0)).truncate()
    }
}

// ===== NODE KIND =====

/// Closed set of node behaviours
#[derive(Clone)]
pub enum NodeKind {
    /// Transform only; its units (if any) draw with whatever uniforms are set
    Group,
    /// Makes `camera` current for the whole subtree
    Camera(Arc<dyn CameraView>),
    /// Sets projection/view/model matrices and frame uniforms, then draws
    Model(ModelShading),
    /// Model shading plus point light uniforms
    PointLight(PointLightShading),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => write!(f, "Group"),
            NodeKind::Camera(_) => write!(f, "Camera"),
            NodeKind::Model(shading) => f.debug_tuple("Model").field(shading).finish(),
            NodeKind::PointLight(shading) => f.debug_tuple("PointLight").field(shading).finish(),
        }
    }
}

// ===== SCENE NODE =====

#[derive(Debug)]
pub struct SceneNode {
    name: String,
    transform: Transform,
    kind: NodeKind,
    children: Vec<SceneNode>,
    render_units: Vec<RenderUnit>,
    /// Programs this node keeps alive for its units
    programs: Vec<Arc<ShaderProgram>>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            kind,
            children: Vec::new(),
            render_units: Vec::new(),
            programs: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn camera(name: impl Into<String>, camera: Arc<dyn CameraView>) -> Self {
        Self::new(name, NodeKind::Camera(camera))
    }

    pub fn model(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Model(ModelShading::default()))
    }

    pub fn point_light(name: impl Into<String>, shading: PointLightShading) -> Self {
        Self::new(name, NodeKind::PointLight(shading))
    }

    /// Builder-style transform setter
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str { &self.name }
    pub fn transform(&self) -> &Transform { &self.transform }
    pub fn transform_mut(&mut self) -> &mut Transform { &mut self.transform }
    pub fn set_transform(&mut self, transform: Transform) { self.transform = transform; }
    pub fn kind(&self) -> &NodeKind { &self.kind }
    pub fn kind_mut(&mut self) -> &mut NodeKind { &mut self.kind }
    pub fn render_units(&self) -> &[RenderUnit] { &self.render_units }

    /// Local matrix of this node
    pub fn local_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    // ===== RENDER UNITS =====

    /// Build a render unit from `builder` and `source` and attach it
    ///
    /// The node keeps the builder's program alive for as long as it exists.
    pub fn add_render_unit(&mut self, builder: &RenderUnitBuilder, source: &mut dyn BufferSource) -> Result<()> {
        let unit = builder.build(source)?;
        if !self.programs.iter().any(|p| Arc::ptr_eq(p, builder.program())) {
            self.programs.push(builder.program().clone());
        }
        self.render_units.push(unit);
        Ok(())
    }

    // ===== CHILDREN =====

    /// Append `child`; returns its index
    pub fn add_child(&mut self, child: SceneNode) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Detach and return child `index`, `None` when out of range
    pub fn remove_child(&mut self, index: usize) -> Option<SceneNode> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    pub fn child(&self, index: usize) -> Option<&SceneNode> {
        self.children.get(index)
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.children.get_mut(index)
    }

    pub fn children(&self) -> &[SceneNode] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// First node named `name` in this subtree (depth-first, self included)
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(name))
    }

    /// Number of nodes in this subtree, self included
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SceneNode::subtree_len).sum::<usize>()
    }

    // ===== PHASES =====

    /// Before-children phase; `ctx` already holds this node's world transform
    pub fn render_before_children(&self, ctx: &mut RenderContext) -> Result<()> {
        match &self.kind {
            NodeKind::Group => {}
            NodeKind::Camera(camera) => ctx.push_camera(camera.clone()),
            NodeKind::Model(shading) => {
                for unit in &self.render_units {
                    let program = unit.program()?;
                    self.apply_matrices(&program, shading, ctx)?;
                }
            }
            NodeKind::PointLight(shading) => {
                for unit in &self.render_units {
                    let program = unit.program()?;
                    let (view, model) = self.apply_matrices(&program, &shading.matrices, ctx)?;
                    program.set_uniform(PointLightShading::NORMAL_MATRIX, PointLightShading::normal_matrix(view, model))?;
                    program.set_uniform(PointLightShading::LIGHT_POSITION, shading.eye_light_position(view))?;
                    if let Some(color) = shading.diffuse_color {
                        program.set_uniform(PointLightShading::DIFFUSE_COLOR, color)?;
                    }
                    if let Some(color) = shading.ambient_color {
                        program.set_uniform(PointLightShading::AMBIENT_COLOR, color)?;
                    }
                }
            }
        }

        for unit in &self.render_units {
            unit.render()?;
            ctx.stats_mut().draw_calls += 1;
        }
        Ok(())
    }

    /// After-children phase: undo what the before phase pushed
    pub fn render_after_children(&self, ctx: &mut RenderContext) -> Result<()> {
        if matches!(self.kind, NodeKind::Camera(_)) {
            if ctx.pop_camera().is_none() {
                return Err(Error::UsageError(format!(
                    "camera node '{}' found an empty camera stack", self.name
                )));
            }
        }
        Ok(())
    }

    /// Set the matrix and frame uniforms the program declares
    ///
    /// Returns the (view, model) matrices used.
    fn apply_matrices(
        &self,
        program: &ShaderProgram,
        shading: &ModelShading,
        ctx: &RenderContext,
    ) -> Result<(Mat4, Mat4)> {
        let camera = ctx.current_camera().ok_or_else(|| Error::UsageError(format!(
            "node '{}' drawn with no camera on the stack", self.name
        )))?;
        let projection = camera.projection_matrix();
        let view = camera.view_matrix();
        let model = ctx.world_transform();

        for (name, value) in [
            (&shading.projection_uniform, projection),
            (&shading.view_uniform, view),
            (&shading.model_uniform, model),
        ] {
            if program.has_uniform(name) {
                program.set_uniform(name, value)?;
            }
        }
        for (name, value) in ctx.frame_uniforms() {
            if program.has_uniform(name) {
                program.set_uniform_value(name, *value)?;
            }
        }
        Ok((view, model))
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
