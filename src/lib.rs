//! Markdown page preparation for raster book-page rendering.
//!
//! This crate holds the input side of the pipeline: inline tokenization,
//! block classification, the table model, image references and decoded
//! bitmaps, asynchronous image preloading (feature `async`), and book content
//! ingestion. Layout lives in `mdpage-render`; rasterization in
//! `mdpage-embedded-graphics`.

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

pub mod block;
pub mod content;
pub mod error;
pub mod images;
pub mod inline;
#[cfg(feature = "async")]
pub mod preload;
pub mod table;

pub use block::{classify_line, scan_blocks, Block, BlockKind, BlockScanner};
pub use content::{BookContent, ContentRecord, PageSide};
pub use error::{ContentError, ImageError};
pub use images::{
    decode_image_bitmap, extract_image_urls, parse_image_line, ImageBitmap, ImageMap, ImageRef,
};
pub use inline::{parse_inline, InlineStyle, InlineToken};
#[cfg(feature = "http")]
pub use preload::HttpImageSource;
#[cfg(feature = "async")]
pub use preload::{load_image, preload_images, preload_urls, FsImageSource, ImageSource};
pub use table::{is_separator_row, split_row, TableModel};
