//! Decoded texture data.
//!
//! Provides [`Texture2d`], the CPU-side result of decoding a source image:
//! RGBA8 pixels plus the color-space interpretation and an alpha-channel
//! flag the material resolver uses to enable transparency.

/// A decoded 2D texture.
#[derive(Debug, Clone)]
pub struct Texture2d {
    /// Texture name (the source texture id).
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel data, tightly packed RGBA8.
    pub rgba: Vec<u8>,
    /// Whether the pixel data is sRGB-encoded.
    pub srgb: bool,
    /// Whether the source image carried an alpha channel.
    pub has_alpha: bool,
}

impl Texture2d {
    /// Create a texture from already-decoded RGBA8 pixels.
    pub fn new(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            rgba,
            srgb: false,
            has_alpha: false,
        }
    }

    /// Set the sRGB interpretation flag.
    #[must_use]
    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    /// Set the alpha-channel flag.
    #[must_use]
    pub fn with_alpha(mut self, has_alpha: bool) -> Self {
        self.has_alpha = has_alpha;
        self
    }

    /// Size of the pixel data in bytes.
    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}
