//! Image references and decoded bitmaps.

use image::RgbaImage;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::ImageError;

fn image_ref_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[([^\]]*)\]\(([^\)]+)\)").ok())
        .as_ref()
}

fn image_line_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^!\[([^\]]*)\]\(([^\)]+)\)").ok())
        .as_ref()
}

/// Image reference parsed from a block line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub alt: &'a str,
    pub url: &'a str,
}

/// Parse `![alt](url)` anchored at the start of `line`.
///
/// Text after the closing parenthesis is ignored.
pub fn parse_image_line(line: &str) -> Option<ImageRef<'_>> {
    let caps = image_line_regex()?.captures(line)?;
    let alt = caps.get(1).map_or("", |m| m.as_str());
    let url = caps.get(2)?.as_str().trim();
    Some(ImageRef { alt, url })
}

/// Unique image URLs referenced anywhere in `markdown`, first occurrence order.
pub fn extract_image_urls(markdown: &str) -> Vec<String> {
    let Some(re) = image_ref_regex() else {
        return Vec::new();
    };
    let mut urls: Vec<String> = Vec::new();
    for caps in re.captures_iter(markdown) {
        let Some(url) = caps.get(2).map(|m| m.as_str().trim()) else {
            continue;
        };
        if url.is_empty() || urls.iter().any(|seen| seen == url) {
            continue;
        }
        urls.push(url.to_string());
    }
    urls
}

/// Decoded RGBA bitmap shared between renders.
#[derive(Clone, Debug)]
pub struct ImageBitmap {
    pixels: Arc<RgbaImage>,
}

impl ImageBitmap {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Height over width; zero for degenerate bitmaps.
    pub fn aspect(&self) -> f32 {
        if self.width() == 0 {
            return 0.0;
        }
        self.height() as f32 / self.width() as f32
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl PartialEq for ImageBitmap {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels) || *self.pixels == *other.pixels
    }
}

/// URL to decoded bitmap map consulted during layout.
pub type ImageMap = HashMap<String, ImageBitmap>;

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP).
pub fn decode_image_bitmap(bytes: &[u8]) -> Result<ImageBitmap, ImageError> {
    let decoded = image::load_from_memory(bytes)?.to_rgba8();
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(ImageError::EmptyImage);
    }
    Ok(ImageBitmap::new(decoded))
}
