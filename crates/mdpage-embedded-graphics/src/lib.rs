//! embedded-graphics renderer for `mdpage-render` pages.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

use core::convert::Infallible;
use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_10X20, FONT_6X10, FONT_6X12, FONT_6X13_BOLD, FONT_6X9, FONT_7X14,
            FONT_7X14_BOLD, FONT_9X18, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle},
    text::{Baseline, Text},
};
use image::{
    imageops::{self, FilterType},
    Rgb, RgbImage,
};
use mdpage::ImageMap;
use mdpage_render::{
    Color, DrawCommand, FontExtents, ImageObjectCommand, LayoutConfig, LayoutEngine, LinkRect,
    RenderPage, ResolvedTextStyle, TextCommand, TextMeasurer,
};
use std::borrow::Cow;
use std::sync::Arc;

mod page_textures;

pub use page_textures::{PageTexture, PageTextureConfig, PageTextureManager};

/// Backend-local font identifier used for metrics and rasterization dispatch.
pub type FontId = u8;

/// Backend-provided metrics for a specific font id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    pub char_width: i32,
    pub space_width: i32,
    /// Pixels from the top of the glyph cell to the baseline.
    pub ascent: i32,
    /// Pixels from the baseline to the bottom of the glyph cell.
    pub descent: i32,
}

/// Font abstraction used by the renderer's text paths.
pub trait FontBackend {
    fn resolve_font(&self, style: &ResolvedTextStyle) -> FontId;
    fn metrics(&self, font_id: FontId) -> FontMetrics;
    /// Draw `text` with its baseline at `origin`; returns the advance in pixels.
    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
        color: Rgb888,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = Rgb888>;
}

/// `TextMeasurer` adapter backed by this crate's `FontBackend` metrics.
#[derive(Clone, Debug)]
pub struct EgTextMeasurer<B = MonoFontBackend> {
    backend: B,
}

impl EgTextMeasurer<MonoFontBackend> {
    /// Create a default measurer using the mono backend.
    pub fn new() -> Self {
        Self {
            backend: MonoFontBackend,
        }
    }

    /// Create a shared measurer trait object for layout-engine wiring.
    pub fn shared() -> Arc<dyn TextMeasurer> {
        Arc::new(Self::new())
    }
}

impl Default for EgTextMeasurer<MonoFontBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> EgTextMeasurer<B>
where
    B: FontBackend,
{
    /// Create a measurer using an explicit backend.
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }
}

impl<B> TextMeasurer for EgTextMeasurer<B>
where
    B: FontBackend + Send + Sync,
{
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        let metrics = self.backend.metrics(self.backend.resolve_font(style));
        let normalized = normalize_text_for_mono(text);
        let mut chars = 0i32;
        let mut spaces = 0i32;
        for ch in normalized.chars() {
            if ch == ' ' {
                spaces += 1;
            } else {
                chars += 1;
            }
        }
        (chars * metrics.char_width + spaces * metrics.space_width).max(0) as f32
    }

    fn font_extents(&self, style: &ResolvedTextStyle) -> Option<FontExtents> {
        let metrics = self.backend.metrics(self.backend.resolve_font(style));
        Some(FontExtents {
            ascent: metrics.ascent as f32,
            descent: metrics.descent as f32,
        })
    }
}

/// Mono-font backend mapping pixel sizes onto the built-in ASCII fonts.
///
/// Characters outside ASCII draw as the font's replacement glyph.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    const SIZE_10: FontId = 0;
    const SIZE_12: FontId = 1;
    const SIZE_14: FontId = 2;
    const SIZE_18: FontId = 3;
    const SIZE_XL: FontId = 4;

    const VARIANT_REGULAR: FontId = 0;
    const VARIANT_BOLD: FontId = 1;

    fn encode_font_id(size_bucket: FontId, variant: FontId) -> FontId {
        (size_bucket << 1) | (variant & 0x01)
    }

    fn decode_font_id(font_id: FontId) -> (FontId, FontId) {
        (font_id >> 1, font_id & 0x01)
    }

    fn size_bucket_for(style: &ResolvedTextStyle) -> FontId {
        if style.size_px <= 10.0 {
            Self::SIZE_10
        } else if style.size_px <= 12.0 {
            Self::SIZE_12
        } else if style.size_px <= 14.0 {
            Self::SIZE_14
        } else if style.size_px <= 18.0 {
            Self::SIZE_18
        } else {
            Self::SIZE_XL
        }
    }

    fn font_for(font_id: FontId) -> &'static MonoFont<'static> {
        let (size_bucket, variant) = Self::decode_font_id(font_id);
        match (size_bucket, variant) {
            (Self::SIZE_10, Self::VARIANT_REGULAR) => &FONT_6X10,
            (Self::SIZE_10, _) => &FONT_6X13_BOLD,
            (Self::SIZE_12, Self::VARIANT_REGULAR) => &FONT_6X12,
            (Self::SIZE_12, _) => &FONT_6X13_BOLD,
            (Self::SIZE_14, Self::VARIANT_REGULAR) => &FONT_7X14,
            (Self::SIZE_14, _) => &FONT_7X14_BOLD,
            (Self::SIZE_18, Self::VARIANT_REGULAR) => &FONT_9X18,
            (Self::SIZE_18, _) => &FONT_9X18_BOLD,
            (Self::SIZE_XL, Self::VARIANT_REGULAR) => &FONT_10X20,
            (Self::SIZE_XL, _) => &FONT_9X18_BOLD,
            _ => &FONT_6X12,
        }
    }
}

impl FontBackend for MonoFontBackend {
    fn resolve_font(&self, style: &ResolvedTextStyle) -> FontId {
        let variant = if style.is_bold() {
            Self::VARIANT_BOLD
        } else {
            Self::VARIANT_REGULAR
        };
        Self::encode_font_id(Self::size_bucket_for(style), variant)
    }

    fn metrics(&self, font_id: FontId) -> FontMetrics {
        let font = Self::font_for(font_id);
        let width = (font.character_size.width + font.character_spacing) as i32;
        let ascent = font.baseline as i32;
        FontMetrics {
            char_width: width,
            space_width: width,
            ascent,
            descent: (font.character_size.height as i32 - ascent).max(0),
        }
    }

    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
        color: Rgb888,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let font = Self::font_for(font_id);
        let style = MonoTextStyle::new(font, color);
        let normalized = normalize_text_for_mono(text);
        Text::with_baseline(normalized.as_ref(), origin, style, Baseline::Alphabetic)
            .draw(display)?;
        let advance = (font.character_size.width + font.character_spacing) as i32;
        Ok(normalized.chars().count() as i32 * advance)
    }
}

fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| {
        matches!(
            ch,
            '\u{00A0}' // nbsp
                | '\u{3000}' // ideographic space
                | '\u{2013}' // en dash
                | '\u{2014}' // em dash
                | '\u{2018}' // left single quote
                | '\u{2019}' // right single quote
                | '\u{201C}' // left double quote
                | '\u{201D}' // right double quote
        )
    }) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00A0}' | '\u{3000}' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Convert IR colors to the display color space.
pub fn to_rgb888(color: Color) -> Rgb888 {
    Rgb888::new(color.r, color.g, color.b)
}

/// RGB framebuffer implementing `DrawTarget`; out-of-bounds pixels are dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pixels: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbImage::from_pixel(width, height, Rgb([0xff, 0xff, 0xff])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let Rgb([r, g, b]) = *self.pixels.get_pixel(x, y);
        Some(Rgb888::new(r, g, b))
    }

    /// Borrow the underlying buffer.
    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        self.pixels.clone()
    }

    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<(), image::ImageError> {
        self.pixels.save_with_format(path, image::ImageFormat::Png)
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.pixels.dimensions();
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < width && y < height {
                self.pixels
                    .put_pixel(x, y, Rgb([color.r(), color.g(), color.b()]));
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        let fill = Rgb([color.r(), color.g(), color.b()]);
        for px in self.pixels.pixels_mut() {
            *px = fill;
        }
        Ok(())
    }
}

/// Renderer behavior switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Honor `DrawCommand::Clear`; when false the display keeps its contents.
    pub clear_first: bool,
    /// Policy used when an image object has no decoded bitmap.
    pub image_fallback: ImageFallbackPolicy,
    /// Color that translucent image pixels are blended over.
    pub image_matte: Color,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        Self {
            clear_first: true,
            image_fallback: ImageFallbackPolicy::OutlineWithAltText,
            image_matte: Color::WHITE,
        }
    }
}

/// Fallback behavior for unresolved image payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFallbackPolicy {
    /// Draw only outline rectangle placeholders.
    OutlineOnly,
    /// Draw outlines with compact label text when available.
    OutlineWithAltText,
}

/// Draw-command executor for embedded-graphics targets.
#[derive(Clone, Debug)]
pub struct EgRenderer<B = MonoFontBackend> {
    cfg: EgRenderConfig,
    backend: B,
}

impl Default for EgRenderer<MonoFontBackend> {
    fn default() -> Self {
        Self::new(EgRenderConfig::default())
    }
}

impl EgRenderer<MonoFontBackend> {
    /// Create renderer with config.
    pub fn new(cfg: EgRenderConfig) -> Self {
        Self {
            cfg,
            backend: MonoFontBackend,
        }
    }
}

impl<B> EgRenderer<B>
where
    B: FontBackend,
{
    /// Create renderer with config and backend.
    pub fn with_backend(cfg: EgRenderConfig, backend: B) -> Self {
        Self { cfg, backend }
    }

    pub fn config(&self) -> EgRenderConfig {
        self.cfg
    }

    /// Execute every command of `page` in order.
    pub fn render_page<D>(
        &self,
        page: &RenderPage,
        images: Option<&ImageMap>,
        display: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        for cmd in &page.commands {
            self.draw_command(display, cmd, images)?;
        }
        Ok(())
    }

    fn draw_command<D>(
        &self,
        display: &mut D,
        cmd: &DrawCommand,
        images: Option<&ImageMap>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        match cmd {
            DrawCommand::Clear(color) => {
                if self.cfg.clear_first {
                    display.clear(to_rgb888(*color))?;
                }
                Ok(())
            }
            DrawCommand::Text(text) => self.draw_text(display, text),
            DrawCommand::Rule(rule) => {
                let style = PrimitiveStyle::with_stroke(to_rgb888(rule.color), rule.thickness);
                let end = if rule.horizontal {
                    Point::new(rule.x + rule.length as i32, rule.y)
                } else {
                    Point::new(rule.x, rule.y + rule.length as i32)
                };
                Line::new(Point::new(rule.x, rule.y), end)
                    .into_styled(style)
                    .draw(display)?;
                Ok(())
            }
            DrawCommand::Rect(rect) => {
                let shape = Rectangle::new(
                    Point::new(rect.x, rect.y),
                    Size::new(rect.width, rect.height),
                );
                let color = to_rgb888(rect.color);
                if rect.fill {
                    shape
                        .into_styled(PrimitiveStyle::with_fill(color))
                        .draw(display)?;
                } else {
                    shape
                        .into_styled(PrimitiveStyle::with_stroke(color, 1))
                        .draw(display)?;
                }
                Ok(())
            }
            DrawCommand::Dot(dot) => {
                Circle::with_center(Point::new(dot.cx, dot.cy), dot.radius * 2 + 1)
                    .into_styled(PrimitiveStyle::with_fill(to_rgb888(dot.color)))
                    .draw(display)?;
                Ok(())
            }
            DrawCommand::Triangle(tri) => {
                let [a, b, c] = tri.vertices;
                Triangle::new(
                    Point::new(a.0, a.1),
                    Point::new(b.0, b.1),
                    Point::new(c.0, c.1),
                )
                .into_styled(PrimitiveStyle::with_fill(to_rgb888(tri.color)))
                .draw(display)?;
                Ok(())
            }
            DrawCommand::ImageObject(image) => self.draw_image(display, image, images),
        }
    }

    fn draw_text<D>(&self, display: &mut D, cmd: &TextCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if cmd.text.trim().is_empty() {
            return Ok(());
        }
        let font_id = self.backend.resolve_font(&cmd.style);
        self.backend
            .draw_text_run(
                display,
                font_id,
                &cmd.text,
                Point::new(cmd.x, cmd.baseline_y),
                to_rgb888(cmd.color),
            )
            .map(|_| ())
    }

    fn draw_image<D>(
        &self,
        display: &mut D,
        image: &ImageObjectCommand,
        images: Option<&ImageMap>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let Some(bitmap) = images.and_then(|map| map.get(&image.src)) else {
            log::debug!("no bitmap for {}, drawing fallback", image.src);
            return self.draw_image_fallback(display, image);
        };
        if image.width == 0 || image.height == 0 || bitmap.width() == 0 || bitmap.height() == 0 {
            return Ok(());
        }

        let dest = Rectangle::new(
            Point::new(image.x, image.y),
            Size::new(image.width, image.height),
        );
        let visible = dest.intersection(&display.bounding_box());
        if visible.size.width == 0 || visible.size.height == 0 {
            return Ok(());
        }

        // Only the source rows and columns behind the visible area are scaled.
        let skip_x = visible.top_left.x.abs_diff(image.x);
        let skip_y = visible.top_left.y.abs_diff(image.y);
        let cols = visible_span(skip_x, visible.size.width, image.width, bitmap.width());
        let rows = visible_span(skip_y, visible.size.height, image.height, bitmap.height());
        let source = imageops::crop_imm(
            bitmap.rgba(),
            cols.src_start,
            rows.src_start,
            cols.src_len,
            rows.src_len,
        )
        .to_image();
        let scaled = imageops::resize(&source, cols.out_len, rows.out_len, FilterType::Triangle);

        let matte = self.cfg.image_matte;
        let (off_x, off_y) = (skip_x - cols.out_start, skip_y - rows.out_start);
        let (width, height) = (visible.size.width, visible.size.height);
        let colors = (0..height)
            .flat_map(move |row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| {
                let [r, g, b, a] = scaled.get_pixel(off_x + col, off_y + row).0;
                Rgb888::new(
                    blend_channel(r, matte.r, a),
                    blend_channel(g, matte.g, a),
                    blend_channel(b, matte.b, a),
                )
            });
        display.fill_contiguous(&visible, colors)
    }

    fn draw_image_fallback<D>(
        &self,
        display: &mut D,
        image: &ImageObjectCommand,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        Rectangle::new(
            Point::new(image.x, image.y),
            Size::new(image.width.max(1), image.height.max(1)),
        )
        .into_styled(PrimitiveStyle::with_stroke(Rgb888::new(0xbb, 0xbb, 0xbb), 1))
        .draw(display)?;
        if self.cfg.image_fallback == ImageFallbackPolicy::OutlineWithAltText {
            self.draw_image_fallback_label(display, image)?;
        }
        Ok(())
    }

    fn draw_image_fallback_label<D>(
        &self,
        display: &mut D,
        image: &ImageObjectCommand,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let Some(label) = fallback_image_label(image) else {
            return Ok(());
        };
        if image.width < 10 || image.height < 10 {
            return Ok(());
        }

        let style = MonoTextStyle::new(&FONT_6X9, Rgb888::new(0x66, 0x66, 0x66));
        let char_width = style.font.character_size.width.max(1) as usize;
        let max_chars = image.width.saturating_sub(4) as usize / char_width;
        let text = truncate_ascii_with_ellipsis(&label, max_chars.max(1));
        if text.is_empty() {
            return Ok(());
        }
        Text::with_baseline(
            &text,
            Point::new(image.x + 2, image.y + 2),
            style,
            Baseline::Top,
        )
        .draw(display)?;
        Ok(())
    }
}

/// Source range behind a visible slice of a scaled axis, and the scaled
/// range that source covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct AxisSpan {
    src_start: u32,
    src_len: u32,
    out_start: u32,
    out_len: u32,
}

/// Map `offset..offset + len` of a `dest_len` axis back onto `src_len`
/// source pixels. The scaled range always covers the visible one.
fn visible_span(offset: u32, len: u32, dest_len: u32, src_len: u32) -> AxisSpan {
    let dest = u64::from(dest_len.max(1));
    let src = u64::from(src_len.max(1));
    let start = u64::from(offset).min(dest - 1);
    let end = (u64::from(offset) + u64::from(len)).min(dest);
    let src_start = start * src / dest;
    let src_end = (end * src).div_ceil(dest).clamp(src_start + 1, src);
    let out_start = src_start * dest / src;
    let out_end = (src_end * dest).div_ceil(src).min(dest);
    AxisSpan {
        src_start: src_start as u32,
        src_len: (src_end - src_start) as u32,
        out_start: out_start as u32,
        out_len: (out_end - out_start) as u32,
    }
}

fn blend_channel(src: u8, matte: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + matte as u32 * (255 - a) + 127) / 255) as u8
}

fn fallback_image_label(image: &ImageObjectCommand) -> Option<String> {
    let alt = image.alt.trim();
    if !alt.is_empty() {
        return Some(alt.into());
    }
    let src = image.src.trim();
    let basename = src.rsplit('/').next().unwrap_or(src).trim();
    if basename.is_empty() {
        return None;
    }
    Some(basename.into())
}

fn truncate_ascii_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.into();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let mut out: String = chars[..(max_chars - 3)].iter().collect();
    out.push_str("...");
    out
}

/// Inputs and outputs of one markdown render beyond the surface itself.
#[derive(Debug, Default)]
pub struct MarkdownRenderOptions<'a> {
    /// Decoded images keyed by the URL written in markdown.
    pub images: Option<&'a ImageMap>,
    /// Sink for clickable link rectangles; appended in layout order.
    pub link_rects: Option<&'a mut Vec<LinkRect>>,
}

/// Layout engine plus rasterizer sharing one font model.
#[derive(Clone)]
pub struct MarkdownRenderer<B = MonoFontBackend> {
    layout: LayoutConfig,
    measurer: Arc<dyn TextMeasurer>,
    renderer: EgRenderer<B>,
}

impl<B: core::fmt::Debug> core::fmt::Debug for MarkdownRenderer<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MarkdownRenderer")
            .field("layout", &self.layout)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

impl MarkdownRenderer<MonoFontBackend> {
    /// Mono-font renderer with `layout` as the base configuration.
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            measurer: EgTextMeasurer::shared(),
            renderer: EgRenderer::default(),
        }
    }
}

impl Default for MarkdownRenderer<MonoFontBackend> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<B> MarkdownRenderer<B>
where
    B: FontBackend,
{
    /// Renderer with an explicit backend and its matching measurer.
    pub fn with_backend(
        layout: LayoutConfig,
        measurer: Arc<dyn TextMeasurer>,
        renderer: EgRenderer<B>,
    ) -> Self {
        Self {
            layout,
            measurer,
            renderer,
        }
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Layout engine sized for a `width` x `height` surface.
    pub fn engine(&self, width: u32, height: u32) -> LayoutEngine {
        let cfg = LayoutConfig {
            display_width: width,
            display_height: height,
            ..self.layout.clone()
        };
        LayoutEngine::new(cfg).with_text_measurer(Arc::clone(&self.measurer))
    }

    /// Lay out `markdown` without drawing it.
    pub fn layout(
        &self,
        markdown: &str,
        width: u32,
        height: u32,
        images: Option<&ImageMap>,
    ) -> RenderPage {
        self.engine(width, height).layout_markdown(markdown, images)
    }

    /// Rasterize a laid-out page.
    pub fn rasterize<D>(
        &self,
        page: &RenderPage,
        images: Option<&ImageMap>,
        display: &mut D,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        self.renderer.render_page(page, images, display)
    }

    /// Lay out and draw `markdown` onto `surface`.
    ///
    /// A zero-sized surface is left untouched and yields no link rects.
    pub fn render<D>(
        &self,
        surface: &mut D,
        markdown: &str,
        width: u32,
        height: u32,
        options: MarkdownRenderOptions<'_>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if width == 0 || height == 0 {
            return Ok(());
        }
        let page = self.layout(markdown, width, height, options.images);
        self.rasterize(&page, options.images, surface)?;
        if let Some(sink) = options.link_rects {
            sink.extend(page.links);
        }
        Ok(())
    }
}

/// Render `markdown` onto `surface` with the default mono-font renderer.
pub fn render_markdown_to_canvas<D>(
    surface: &mut D,
    markdown: &str,
    width: u32,
    height: u32,
    options: MarkdownRenderOptions<'_>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    MarkdownRenderer::default().render(surface, markdown, width, height, options)
}
