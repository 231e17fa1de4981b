use image::imageops::FilterType;
use scene::components::TextureSlot;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("texture decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture is empty")]
    Empty,
}

/// Tightly packed RGBA8 pixels, row 0 at the top (north).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedTexture {
    /// 1×1 stand-in shown until the real asset arrives.
    pub fn placeholder(slot: TextureSlot) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: slot.placeholder().to_vec(),
        }
    }
}

/// Decode a JPEG/PNG asset, shrinking it to fit `max_dim` on both axes.
pub fn decode_texture(bytes: &[u8], max_dim: u32) -> Result<DecodedTexture, TextureError> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(TextureError::Empty);
    }

    let max_dim = max_dim.max(1);
    let img = if w > max_dim || h > max_dim {
        let scale = max_dim as f64 / w.max(h) as f64;
        let nw = ((w as f64 * scale).round() as u32).clamp(1, max_dim);
        let nh = ((h as f64 * scale).round() as u32).clamp(1, max_dim);
        tracing::debug!(from = ?(w, h), to = ?(nw, nh), "downscaling texture");
        img.resize_exact(nw, nh, FilterType::Triangle)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    Ok(DecodedTexture {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
