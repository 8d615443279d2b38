/// Texture and sampler enums used at the driver boundary

/// Texture binding target (dimensionality)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture1D,
    Texture2D,
    Texture3D,
    CubeMap,
    Rectangle,
    Texture2DArray,
}

/// Pixel formats understood by the image-storage calls
///
/// The pixel-data boundary is always 32 bits per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8G8B8A8_UNORM,
    B8G8R8A8_UNORM,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn size_bytes(&self) -> u32 {
        4
    }
}

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// One sampler state parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerParameter {
    MinFilter(Filter),
    MagFilter(Filter),
    WrapS(Wrap),
    WrapT(Wrap),
    WrapR(Wrap),
    BorderColor([f32; 4]),
}
