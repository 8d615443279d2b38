/// Shader stage kinds and uniform values crossing the driver boundary

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Shader stage kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Type of a uniform variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    UInt,
    Bool,
    Mat3,
    Mat4,
}

/// A typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
    UInt(u32),
    Bool(bool),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Kind of this value
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::UInt(_) => UniformKind::UInt,
            UniformValue::Bool(_) => UniformKind::Bool,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Zero value of the given kind (value of a never-written uniform)
    pub fn zero(kind: UniformKind) -> Self {
        match kind {
            UniformKind::Float => UniformValue::Float(0.0),
            UniformKind::Vec2 => UniformValue::Vec2(Vec2::ZERO),
            UniformKind::Vec3 => UniformValue::Vec3(Vec3::ZERO),
            UniformKind::Vec4 => UniformValue::Vec4(Vec4::ZERO),
            UniformKind::Int => UniformValue::Int(0),
            UniformKind::UInt => UniformValue::UInt(0),
            UniformKind::Bool => UniformValue::Bool(false),
            UniformKind::Mat3 => UniformValue::Mat3(Mat3::ZERO),
            UniformKind::Mat4 => UniformValue::Mat4(Mat4::ZERO),
        }
    }
}
