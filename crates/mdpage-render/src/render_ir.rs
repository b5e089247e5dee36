use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// 24-bit RGB color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let nibble = |c: u8| -> Option<u8> { (c as char).to_digit(16).map(|d| d as u8) };
        let bytes = digits.as_bytes();
        match bytes.len() {
            3 => {
                let r = nibble(bytes[0])?;
                let g = nibble(bytes[1])?;
                let b = nibble(bytes[2])?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => {
                let byte = |i: usize| Some(nibble(bytes[i])? << 4 | nibble(bytes[i + 1])?);
                Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{}`", raw)))
    }
}

/// Font selection resolved for one text run.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTextStyle {
    /// Requested family name.
    pub family: Arc<str>,
    /// Size in pixels.
    pub size_px: f32,
    /// Numeric weight.
    pub weight: u16,
}

impl ResolvedTextStyle {
    pub const REGULAR_WEIGHT: u16 = 400;
    pub const BOLD_WEIGHT: u16 = 700;

    pub fn new(family: Arc<str>, size_px: f32, bold: bool) -> Self {
        Self {
            family,
            size_px,
            weight: if bold {
                Self::BOLD_WEIGHT
            } else {
                Self::REGULAR_WEIGHT
            },
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= Self::BOLD_WEIGHT
    }

    /// Bold variant when `make_bold`; an already-bold style is kept as is.
    pub fn with_weight(&self, make_bold: bool) -> Self {
        if !make_bold || self.is_bold() {
            return self.clone();
        }
        Self {
            weight: Self::BOLD_WEIGHT,
            ..self.clone()
        }
    }
}

/// Text draw command.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    /// Left x.
    pub x: i32,
    /// Baseline y.
    pub baseline_y: i32,
    /// Content.
    pub text: String,
    /// Resolved style.
    pub style: ResolvedTextStyle,
    /// Fill color.
    pub color: Color,
}

/// Rule draw command (horizontal rules, underlines, strike-throughs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleCommand {
    /// Start x.
    pub x: i32,
    /// Start y.
    pub y: i32,
    /// Length.
    pub length: u32,
    /// Thickness.
    pub thickness: u32,
    /// Horizontal if true; vertical if false.
    pub horizontal: bool,
    /// Stroke color.
    pub color: Color,
}

/// Rectangle command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectCommand {
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
    /// Fill rectangle when true; 1px outline otherwise.
    pub fill: bool,
    /// Fill or stroke color.
    pub color: Color,
}

/// Filled circle command (bullet markers).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DotCommand {
    /// Center x.
    pub cx: i32,
    /// Center y.
    pub cy: i32,
    /// Radius.
    pub radius: u32,
    /// Fill color.
    pub color: Color,
}

/// Filled triangle command (placeholder glyphs).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangleCommand {
    pub vertices: [(i32, i32); 3],
    pub color: Color,
}

/// Block image object command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageObjectCommand {
    /// Image URL as written in markdown; the key into the image map.
    pub src: String,
    /// Alt text.
    pub alt: String,
    /// Left x.
    pub x: i32,
    /// Top y.
    pub y: i32,
    /// Target width.
    pub width: u32,
    /// Target height.
    pub height: u32,
}

/// Backend-agnostic draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear(Color),
    /// Draw text.
    Text(TextCommand),
    /// Draw a line rule.
    Rule(RuleCommand),
    /// Draw rectangle.
    Rect(RectCommand),
    /// Draw a filled dot.
    Dot(DotCommand),
    /// Draw a filled triangle.
    Triangle(TriangleCommand),
    /// Draw a decoded image scaled into its box.
    ImageObject(ImageObjectCommand),
}

/// Clickable link area in surface pixel coordinates (top-left origin).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub url: String,
}

impl LinkRect {
    /// Inclusive point-in-rectangle test.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }
}

/// One laid-out page: draw commands plus the link areas they produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPage {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Draw commands in paint order.
    pub commands: Vec<DrawCommand>,
    /// Link rectangles in insertion order.
    pub links: Vec<LinkRect>,
    /// Vertical cursor after the last block.
    pub cursor_y: f32,
}

impl RenderPage {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::with_capacity(16),
            links: Vec::new(),
            cursor_y: 0.0,
        }
    }

    pub fn push_command(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }

    pub fn push_link(&mut self, link: LinkRect) {
        self.links.push(link);
    }

    /// Text commands in paint order.
    pub fn text_commands(&self) -> impl Iterator<Item = &TextCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
    }

    /// Image object commands in paint order.
    pub fn image_commands(&self) -> impl Iterator<Item = &ImageObjectCommand> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::ImageObject(image) => Some(image),
            _ => None,
        })
    }
}
