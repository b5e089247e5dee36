//! Render IR, markdown layout engine, and link hit registry for `mdpage`.

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

mod link_registry;
mod render_ir;
mod render_layout;

pub use link_registry::{LinkRegistry, PageKey, PageLinks};
pub use mdpage::PageSide;
pub use render_ir::{
    Color, DotCommand, DrawCommand, ImageObjectCommand, LinkRect, RectCommand, RenderPage,
    ResolvedTextStyle, RuleCommand, TextCommand, TriangleCommand,
};
pub use render_layout::{
    BulletConfig, FontExtents, HeuristicMeasurer, ImageBlockConfig, InlineBox, LayoutConfig,
    LayoutEngine, RuleConfig, TableConfig, TextBlockStyle, TextMeasurer,
};
