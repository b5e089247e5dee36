//! Line classification for the block layout pass.

use crate::images::{parse_image_line, ImageRef};

/// Block kind after classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Blank,
    Rule,
    Heading,
    Subheading,
    Bullet,
    Image,
    Table,
    Paragraph,
}

/// One classified unit of markdown input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block<'a> {
    /// Empty line; paragraph spacing only.
    Blank,
    /// `---` horizontal rule.
    Rule,
    /// `# ` heading text.
    Heading(&'a str),
    /// `## ` subheading text.
    Subheading(&'a str),
    /// `- ` bullet item text.
    Bullet(&'a str),
    /// `![alt](url)` block image.
    Image(ImageRef<'a>),
    /// Contiguous run of trimmed `|` lines.
    Table(Vec<&'a str>),
    /// Anything else.
    Paragraph(&'a str),
}

impl Block<'_> {
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Blank => BlockKind::Blank,
            Self::Rule => BlockKind::Rule,
            Self::Heading(_) => BlockKind::Heading,
            Self::Subheading(_) => BlockKind::Subheading,
            Self::Bullet(_) => BlockKind::Bullet,
            Self::Image(_) => BlockKind::Image,
            Self::Table(_) => BlockKind::Table,
            Self::Paragraph(_) => BlockKind::Paragraph,
        }
    }
}

/// Classify one trimmed line that does not start a table.
///
/// Image lines commit only when the full `![alt](url)` pattern matches;
/// otherwise they are paragraphs.
pub fn classify_line(line: &str) -> Block<'_> {
    if line.is_empty() {
        return Block::Blank;
    }
    if line == "---" {
        return Block::Rule;
    }
    if let Some(text) = line.strip_prefix("# ") {
        return Block::Heading(text);
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Block::Subheading(text);
    }
    if let Some(text) = line.strip_prefix("- ") {
        return Block::Bullet(text);
    }
    if line.starts_with("![") {
        if let Some(image) = parse_image_line(line) {
            return Block::Image(image);
        }
    }
    Block::Paragraph(line)
}

/// Single-pass block scanner over a markdown document.
///
/// Lines are trimmed before classification. A line starting with `|` opens a
/// table that absorbs every directly following `|` line.
#[derive(Clone, Debug)]
pub struct BlockScanner<'a> {
    lines: Vec<&'a str>,
    next: usize,
}

impl<'a> BlockScanner<'a> {
    pub fn new(markdown: &'a str) -> Self {
        Self {
            lines: markdown.split('\n').map(str::trim).collect(),
            next: 0,
        }
    }

    /// Index of the next unconsumed source line.
    pub fn line_index(&self) -> usize {
        self.next
    }
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = *self.lines.get(self.next)?;
        if line.starts_with('|') {
            let start = self.next;
            while self
                .lines
                .get(self.next)
                .is_some_and(|l| l.starts_with('|'))
            {
                self.next += 1;
            }
            return Some(Block::Table(self.lines[start..self.next].to_vec()));
        }
        self.next += 1;
        Some(classify_line(line))
    }
}

/// Collect all blocks of `markdown`.
pub fn scan_blocks(markdown: &str) -> Vec<Block<'_>> {
    BlockScanner::new(markdown).collect()
}
