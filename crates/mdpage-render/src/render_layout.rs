use mdpage::{parse_inline, Block, BlockScanner, ImageMap, ImageRef, TableModel};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

use crate::render_ir::{
    Color, DotCommand, DrawCommand, ImageObjectCommand, LinkRect, RectCommand, RenderPage,
    ResolvedTextStyle, RuleCommand, TextCommand, TriangleCommand,
};

/// Vertical font metrics used for decoration and link boxes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontExtents {
    /// Distance from the baseline to the top of the glyph box.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the glyph box.
    pub descent: f32,
}

/// Optional text measurement hook for glyph-accurate line fitting.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width for the provided style.
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32;

    /// Ascent and descent for `style`, when the backend knows them.
    ///
    /// Default returns `None`; layout then falls back to a fraction of the
    /// line height.
    fn font_extents(&self, _style: &ResolvedTextStyle) -> Option<FontExtents> {
        None
    }
}

/// Width model used when no backend measurer is installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text_px(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        heuristic_measure_text(text, style)
    }
}

fn heuristic_measure_text(text: &str, style: &ResolvedTextStyle) -> f32 {
    let mut em_sum = 0.0f32;
    for ch in text.chars() {
        em_sum += if ch.is_whitespace() {
            0.28
        } else if matches!(ch, 'i' | 'l' | 'j' | 't' | 'f' | 'I' | '.' | ',' | ':' | ';' | '!') {
            0.3
        } else if matches!(ch, 'm' | 'w' | 'M' | 'W') {
            0.82
        } else if ch.is_ascii_uppercase() {
            0.66
        } else if ch.is_ascii() {
            0.54
        } else {
            1.0
        };
    }
    let weight_scale = if style.is_bold() { 1.06 } else { 1.0 };
    em_sum * style.size_px * weight_scale
}

/// Font, weight, and color for one text block kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextBlockStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Base weight is bold.
    pub bold: bool,
    /// Cursor advance per wrapped line.
    pub line_height: f32,
    /// Text color.
    pub color: Color,
    /// Cursor advance before the first line.
    pub space_before: f32,
    /// Cursor advance after the last line.
    pub space_after: f32,
}

impl TextBlockStyle {
    const fn new(size_px: f32, bold: bool, line_height: f32, color: Color) -> Self {
        Self {
            size_px,
            bold,
            line_height,
            color,
            space_before: 0.0,
            space_after: 0.0,
        }
    }

    const fn spaced(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }
}

impl Default for TextBlockStyle {
    fn default() -> Self {
        Self::new(12.0, false, 20.0, Color::BLACK)
    }
}

/// Bullet list item settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    pub text: TextBlockStyle,
    /// Text indent from the left margin.
    pub indent: f32,
    /// Dot center offset from the left margin.
    pub dot_offset_x: f32,
    /// Dot center distance above the baseline.
    pub dot_rise: f32,
    pub dot_radius: u32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            text: TextBlockStyle::new(10.0, false, 20.0, Color::BLACK),
            indent: 15.0,
            dot_offset_x: 5.0,
            dot_rise: 4.0,
            dot_radius: 2,
        }
    }
}

/// Horizontal rule settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Stroke offset below the cursor.
    pub offset: f32,
    /// Cursor advance.
    pub advance: f32,
    pub thickness: u32,
    pub color: Color,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            offset: 5.0,
            advance: 15.0,
            thickness: 1,
            color: Color::rgb(0xcc, 0xcc, 0xcc),
        }
    }
}

/// Borderless pipe table settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub size_px: f32,
    pub line_height: f32,
    pub column_gap: f32,
    pub min_column_width: f32,
    /// Added to each measured cell width.
    pub cell_padding: f32,
    /// Cursor advance after each row.
    pub row_gap: f32,
    /// Floor for the width shared by all columns.
    pub min_available_width: f32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            size_px: 14.0,
            line_height: 20.0,
            column_gap: 12.0,
            min_column_width: 40.0,
            cell_padding: 2.0,
            row_gap: 6.0,
            min_available_width: 20.0,
        }
    }
}

/// Block image and placeholder settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageBlockConfig {
    /// Cursor advance below the image or placeholder.
    pub margin_after: f32,
    pub placeholder_min_height: f32,
    /// Placeholder height as a fraction of the content width.
    pub placeholder_ratio: f32,
    pub placeholder_fill: Color,
    pub placeholder_stroke: Color,
    pub icon_offset: f32,
    pub icon_width: u32,
    pub icon_height: u32,
    pub icon_color: Color,
    pub icon_glyph_color: Color,
}

impl Default for ImageBlockConfig {
    fn default() -> Self {
        Self {
            margin_after: 15.0,
            placeholder_min_height: 80.0,
            placeholder_ratio: 0.6,
            placeholder_fill: Color::rgb(0xf7, 0xf7, 0xf7),
            placeholder_stroke: Color::rgb(0xbb, 0xbb, 0xbb),
            icon_offset: 8.0,
            icon_width: 28,
            icon_height: 20,
            icon_color: Color::rgb(0xcc, 0xcc, 0xcc),
            icon_glyph_color: Color::rgb(0xaa, 0xaa, 0xaa),
        }
    }
}

/// Layout configuration for page construction.
///
/// Every field has a default; partial JSON overrides are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Physical surface width.
    pub display_width: u32,
    /// Physical surface height.
    pub display_height: u32,
    /// Left and right margin.
    pub margin: f32,
    /// Initial cursor position.
    pub margin_top: f32,
    /// Cursor advance for an empty line.
    pub blank_line_px: f32,
    /// Font family requested for every run.
    pub font_family: String,
    pub background: Color,
    pub link_color: Color,
    /// Ascent fallback as a fraction of the line height.
    pub ascent_fallback: f32,
    /// Descent fallback as a fraction of the line height.
    pub descent_fallback: f32,
    /// Strike-through height as a fraction of the ascent.
    pub strike_position: f32,
    pub heading: TextBlockStyle,
    pub subheading: TextBlockStyle,
    pub paragraph: TextBlockStyle,
    pub bullet: BulletConfig,
    pub rule: RuleConfig,
    pub table: TableConfig,
    pub image: ImageBlockConfig,
}

impl LayoutConfig {
    /// Convenience for a display size with sensible defaults.
    pub fn for_display(width: u32, height: u32) -> Self {
        Self {
            display_width: width,
            display_height: height,
            ..Self::default()
        }
    }

    /// Decode a (possibly partial) JSON override on top of the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.display_width as f32 - 2.0 * self.margin
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            display_width: 256,
            display_height: 350,
            margin: 20.0,
            margin_top: 30.0,
            blank_line_px: 10.0,
            font_family: "Arial".to_string(),
            background: Color::WHITE,
            link_color: Color::rgb(0x1a, 0x0d, 0xab),
            ascent_fallback: 0.8,
            descent_fallback: 0.2,
            strike_position: 0.4,
            heading: TextBlockStyle::new(24.0, true, 30.0, Color::BLACK).spaced(24.0, 10.0),
            subheading: TextBlockStyle::new(18.0, true, 24.0, Color::rgb(0x33, 0x33, 0x33))
                .spaced(18.0, 3.0),
            paragraph: TextBlockStyle::new(12.0, false, 20.0, Color::BLACK),
            bullet: BulletConfig::default(),
            rule: RuleConfig::default(),
            table: TableConfig::default(),
            image: ImageBlockConfig::default(),
        }
    }
}

/// Box an inline paragraph flows into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InlineBox {
    /// Left x of every line.
    pub x: f32,
    /// Baseline of the first line.
    pub y: f32,
    /// Width available before wrapping.
    pub max_width: f32,
    /// Baseline advance per line.
    pub line_height: f32,
}

/// One whitespace-split piece of a token queued on the current line.
#[derive(Clone, Debug)]
struct LineSegment {
    text: String,
    style: ResolvedTextStyle,
    width: f32,
    strike: bool,
    underline: bool,
    link_url: Option<String>,
}

type LineSegments = SmallVec<[LineSegment; 8]>;

/// Alternating non-whitespace and whitespace runs of `text`.
///
/// Yields `(run, is_whitespace)`; empty runs never appear.
fn whitespace_runs(text: &str) -> WhitespaceRuns<'_> {
    WhitespaceRuns { rest: text }
}

struct WhitespaceRuns<'a> {
    rest: &'a str,
}

impl<'a> Iterator for WhitespaceRuns<'a> {
    type Item = (&'a str, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let ws = first.is_whitespace();
        let end = self
            .rest
            .char_indices()
            .find(|(_, ch)| ch.is_whitespace() != ws)
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some((run, ws))
    }
}

/// Deterministic single-pass markdown layout engine.
#[derive(Clone)]
pub struct LayoutEngine {
    cfg: LayoutConfig,
    family: Arc<str>,
    text_measurer: Option<Arc<dyn TextMeasurer>>,
}

impl core::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutEngine")
            .field("cfg", &self.cfg)
            .field("has_text_measurer", &self.text_measurer.is_some())
            .finish()
    }
}

impl LayoutEngine {
    /// Create a layout engine.
    pub fn new(cfg: LayoutConfig) -> Self {
        let family = Arc::from(cfg.font_family.as_str());
        Self {
            cfg,
            family,
            text_measurer: None,
        }
    }

    /// Install a shared text measurer for glyph-accurate width fitting.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.text_measurer = Some(measurer);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.cfg
    }

    /// Resolved style for a text block base.
    pub fn base_style(&self, size_px: f32, bold: bool) -> ResolvedTextStyle {
        ResolvedTextStyle::new(Arc::clone(&self.family), size_px, bold)
    }

    fn measure_text(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        self.text_measurer
            .as_ref()
            .map(|m| m.measure_text_px(text, style))
            .unwrap_or_else(|| heuristic_measure_text(text, style))
    }

    fn extents(&self, style: &ResolvedTextStyle, line_height: f32) -> FontExtents {
        self.text_measurer
            .as_ref()
            .and_then(|m| m.font_extents(style))
            .unwrap_or(FontExtents {
                ascent: line_height * self.cfg.ascent_fallback,
                descent: line_height * self.cfg.descent_fallback,
            })
    }

    /// Lay out a whole markdown page at the configured display size.
    pub fn layout_markdown(&self, markdown: &str, images: Option<&ImageMap>) -> RenderPage {
        let cfg = &self.cfg;
        let mut page = RenderPage::new(cfg.display_width, cfg.display_height);
        page.push_command(DrawCommand::Clear(cfg.background));
        let mut cursor = cfg.margin_top;

        for block in BlockScanner::new(markdown) {
            cursor = self.layout_block(&mut page, block, cursor, images);
        }
        page.cursor_y = cursor;
        page
    }

    fn layout_block(
        &self,
        page: &mut RenderPage,
        block: Block<'_>,
        cursor: f32,
        images: Option<&ImageMap>,
    ) -> f32 {
        let cfg = &self.cfg;
        let content = cfg.content_width();
        match block {
            Block::Blank => cursor + cfg.blank_line_px,
            Block::Rule => {
                let y = cursor + cfg.rule.offset;
                page.push_command(DrawCommand::Rule(RuleCommand {
                    x: cfg.margin.round() as i32,
                    y: y.round() as i32,
                    length: content.max(0.0).round() as u32,
                    thickness: cfg.rule.thickness,
                    horizontal: true,
                    color: cfg.rule.color,
                }));
                cursor + cfg.rule.advance
            }
            Block::Heading(text) => self.layout_text_block(page, text, &cfg.heading, cursor),
            Block::Subheading(text) => self.layout_text_block(page, text, &cfg.subheading, cursor),
            Block::Bullet(text) => {
                let bullet = &cfg.bullet;
                page.push_command(DrawCommand::Dot(DotCommand {
                    cx: (cfg.margin + bullet.dot_offset_x).round() as i32,
                    cy: (cursor - bullet.dot_rise).round() as i32,
                    radius: bullet.dot_radius,
                    color: bullet.text.color,
                }));
                let base = self.base_style(bullet.text.size_px, bullet.text.bold);
                self.layout_inline_paragraph(
                    page,
                    text,
                    InlineBox {
                        x: cfg.margin + bullet.indent,
                        y: cursor,
                        max_width: content - bullet.indent,
                        line_height: bullet.text.line_height,
                    },
                    &base,
                    bullet.text.color,
                )
            }
            Block::Image(image) => self.layout_image(page, image, cursor, images),
            Block::Table(lines) => {
                let model = TableModel::parse(&lines);
                self.layout_table(page, &model, cursor)
            }
            Block::Paragraph(text) => self.layout_text_block(page, text, &cfg.paragraph, cursor),
        }
    }

    fn layout_text_block(
        &self,
        page: &mut RenderPage,
        text: &str,
        block: &TextBlockStyle,
        cursor: f32,
    ) -> f32 {
        let base = self.base_style(block.size_px, block.bold);
        let end = self.layout_inline_paragraph(
            page,
            text,
            InlineBox {
                x: self.cfg.margin,
                y: cursor + block.space_before,
                max_width: self.cfg.content_width(),
                line_height: block.line_height,
            },
            &base,
            block.color,
        );
        end + block.space_after
    }

    fn layout_image(
        &self,
        page: &mut RenderPage,
        image: ImageRef<'_>,
        cursor: f32,
        images: Option<&ImageMap>,
    ) -> f32 {
        let cfg = &self.cfg;
        let content = cfg.content_width().max(0.0);
        let x = cfg.margin.round() as i32;
        let y = cursor.round() as i32;
        let bitmap = images
            .and_then(|map| map.get(image.url))
            .filter(|bmp| bmp.width() > 0);

        if let Some(bitmap) = bitmap {
            let height = (content * bitmap.height() as f32 / bitmap.width() as f32).floor();
            page.push_command(DrawCommand::ImageObject(ImageObjectCommand {
                src: image.url.to_string(),
                alt: image.alt.to_string(),
                x,
                y,
                width: content as u32,
                height: height as u32,
            }));
            return cursor + height + cfg.image.margin_after;
        }

        let img = &cfg.image;
        let height = img
            .placeholder_min_height
            .max((content * img.placeholder_ratio).floor());
        let width = content as u32;
        for (fill, color) in [(true, img.placeholder_fill), (false, img.placeholder_stroke)] {
            page.push_command(DrawCommand::Rect(RectCommand {
                x,
                y,
                width,
                height: height as u32,
                fill,
                color,
            }));
        }
        let ix = x + img.icon_offset.round() as i32;
        let iy = y + img.icon_offset.round() as i32;
        page.push_command(DrawCommand::Rect(RectCommand {
            x: ix,
            y: iy,
            width: img.icon_width,
            height: img.icon_height,
            fill: true,
            color: img.icon_color,
        }));
        for vertices in mountain_glyph(ix, iy, img.icon_width as i32, img.icon_height as i32) {
            page.push_command(DrawCommand::Triangle(TriangleCommand {
                vertices,
                color: img.icon_glyph_color,
            }));
        }
        cursor + height + img.margin_after
    }

    /// Flow one line of inline markdown into `bx`, returning the cursor after
    /// the last line drawn.
    ///
    /// Input with no segments leaves the cursor at `bx.y`.
    pub fn layout_inline_paragraph(
        &self,
        page: &mut RenderPage,
        text: &str,
        bx: InlineBox,
        base: &ResolvedTextStyle,
        color: Color,
    ) -> f32 {
        let mut y = bx.y;
        let mut line = LineSegments::new();
        let mut line_width = 0.0f32;

        for token in parse_inline(text) {
            let style = base.with_weight(token.bold);
            for (run, is_ws) in whitespace_runs(&token.text) {
                let width = self.measure_text(run, &style);
                if line_width + width > bx.max_width && !line.is_empty() && !is_ws {
                    y = self.flush_line(page, &mut line, bx, y, color);
                    line_width = 0.0;
                }
                line_width += width;
                line.push(LineSegment {
                    text: run.to_string(),
                    style: style.clone(),
                    width,
                    strike: token.strike,
                    underline: token.underline,
                    link_url: token.link_url.clone(),
                });
            }
        }
        if !line.is_empty() {
            y = self.flush_line(page, &mut line, bx, y, color);
        }
        y
    }

    fn flush_line(
        &self,
        page: &mut RenderPage,
        line: &mut LineSegments,
        bx: InlineBox,
        y: f32,
        color: Color,
    ) -> f32 {
        let mut x = bx.x;
        for seg in line.drain(..) {
            let seg_color = if seg.link_url.is_some() {
                self.cfg.link_color
            } else {
                color
            };
            let extents = self.extents(&seg.style, bx.line_height);
            let length = seg.width.round().max(0.0) as u32;

            if seg.underline {
                page.push_command(DrawCommand::Rule(decoration(
                    x,
                    y + extents.descent - 1.0,
                    length,
                    seg_color,
                )));
            }
            if seg.strike {
                page.push_command(DrawCommand::Rule(decoration(
                    x,
                    y - extents.ascent * self.cfg.strike_position,
                    length,
                    seg_color,
                )));
            }
            if let Some(url) = seg.link_url {
                page.push_link(LinkRect {
                    x,
                    y: y - extents.ascent,
                    w: seg.width,
                    h: extents.ascent + extents.descent,
                    url,
                });
            }
            page.push_command(DrawCommand::Text(TextCommand {
                x: x.round() as i32,
                baseline_y: y.round() as i32,
                text: seg.text,
                style: seg.style,
                color: seg_color,
            }));
            x += seg.width;
        }
        y + bx.line_height
    }

    /// Width of inline markdown on one line, rounded up to whole pixels.
    pub fn measure_inline_width(&self, text: &str, base: &ResolvedTextStyle) -> f32 {
        let mut sum = 0.0f32;
        for token in parse_inline(text) {
            let style = base.with_weight(token.bold);
            for (run, _) in whitespace_runs(&token.text) {
                sum += self.measure_text(run, &style);
            }
        }
        sum.ceil()
    }

    /// Shared column widths for `model` within `content_width`.
    pub fn table_column_widths(&self, model: &TableModel, content_width: f32) -> Vec<f32> {
        let table = &self.cfg.table;
        let cols = model.column_count();
        if cols == 0 {
            return Vec::new();
        }
        let regular = self.base_style(table.size_px, false);
        let bold = self.base_style(table.size_px, true);

        let mut widths = vec![table.min_column_width; cols];
        for row in 0..model.row_count() {
            let style = if model.is_header_row(row) { &bold } else { &regular };
            for (col, natural) in widths.iter_mut().enumerate() {
                let padded = self.measure_inline_width(model.cell(row, col), style) + table.cell_padding;
                if padded > *natural {
                    *natural = padded;
                }
            }
        }

        let gaps = (cols - 1) as f32 * table.column_gap;
        let available = (content_width - gaps).max(table.min_available_width);
        let natural_sum: f32 = widths.iter().sum();
        if natural_sum > available {
            let scale = available / natural_sum;
            for w in widths.iter_mut() {
                *w = (*w * scale).floor().max(table.min_column_width);
            }
            let overflow = widths.iter().sum::<f32>() - available;
            if overflow > 0.0 {
                if let Some(last) = widths.last_mut() {
                    *last = (*last - overflow).max(table.min_column_width);
                }
            }
        }
        widths
    }

    fn layout_table(&self, page: &mut RenderPage, model: &TableModel, cursor: f32) -> f32 {
        let table = &self.cfg.table;
        let widths = self.table_column_widths(model, self.cfg.content_width());
        let regular = self.base_style(table.size_px, false);
        let bold = self.base_style(table.size_px, true);
        let color = self.cfg.paragraph.color;

        let mut cursor = cursor;
        for row in 0..model.row_count() {
            let style = if model.is_header_row(row) { &bold } else { &regular };
            let mut row_end = cursor;
            let mut x = self.cfg.margin;
            for (col, width) in widths.iter().enumerate() {
                let end = self.layout_inline_paragraph(
                    page,
                    model.cell(row, col),
                    InlineBox {
                        x,
                        y: cursor,
                        max_width: *width,
                        line_height: table.line_height,
                    },
                    style,
                    color,
                );
                row_end = row_end.max(end);
                x += width + table.column_gap;
            }
            cursor = row_end + table.row_gap;
        }
        cursor
    }
}

fn decoration(x: f32, y: f32, length: u32, color: Color) -> RuleCommand {
    RuleCommand {
        x: x.round() as i32,
        y: y.round() as i32,
        length,
        thickness: 1,
        horizontal: true,
        color,
    }
}

/// Two peaks inside an icon tile at `(x, y)`.
fn mountain_glyph(x: i32, y: i32, w: i32, h: i32) -> [[(i32, i32); 3]; 2] {
    let base = y + h - 2;
    [
        [(x + 2, base), (x + w * 5 / 14, y + h / 2), (x + w * 9 / 14, base)],
        [(x + w * 5 / 14, base), (x + w * 9 / 14, y + h * 2 / 5), (x + w - 2, base)],
    ]
}
