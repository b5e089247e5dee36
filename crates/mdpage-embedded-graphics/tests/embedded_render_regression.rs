use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;
use image::{Rgba, RgbaImage};
use mdpage::{ImageBitmap, ImageMap};
use mdpage_embedded_graphics::{
    render_markdown_to_canvas, Canvas, MarkdownRenderOptions, MarkdownRenderer,
};
use mdpage_render::{LayoutConfig, LinkRect};
use std::time::{Duration, Instant};

const W: u32 = 256;
const H: u32 = 350;

fn render(markdown: &str, images: Option<&ImageMap>) -> (Canvas, Vec<LinkRect>) {
    let mut canvas = Canvas::new(W, H);
    let mut links = Vec::new();
    let options = MarkdownRenderOptions {
        images,
        link_rects: Some(&mut links),
    };
    render_markdown_to_canvas(&mut canvas, markdown, W, H, options).expect("infallible");
    (canvas, links)
}

fn count_dark(canvas: &Canvas) -> usize {
    canvas
        .as_rgb_image()
        .pixels()
        .filter(|px| px.0.iter().all(|c| *c < 0x80))
        .count()
}

fn rgb(hex: u32) -> Rgb888 {
    Rgb888::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

#[test]
fn heading_and_paragraph_paint_dark_pixels_in_content_area() {
    let (canvas, links) = render("# Chapter\n\nSome body text here.", None);
    assert!(links.is_empty());
    assert!(count_dark(&canvas) > 50);
    // Margins stay untouched.
    for y in 0..H {
        for x in 0..20 {
            assert_eq!(canvas.pixel(x, y), Some(Rgb888::WHITE), "({}, {})", x, y);
        }
    }
}

#[test]
fn link_rect_covers_link_colored_pixels() {
    let (canvas, links) = render("[docs](https://docs.test)", None);
    assert_eq!(links.len(), 1);
    let rect = &links[0];
    assert_eq!(rect.url, "https://docs.test");
    assert_eq!(rect.x, 20.0);
    assert!(rect.w > 0.0 && rect.h > 0.0);

    let link = rgb(0x1a0dab);
    let inside = (rect.x as u32..(rect.x + rect.w) as u32)
        .flat_map(|x| (rect.y as u32..=(rect.y + rect.h) as u32 + 2).map(move |y| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y) == Some(link))
        .count();
    assert!(inside > 0);
    let outside = canvas
        .as_rgb_image()
        .enumerate_pixels()
        .filter(|(x, y, px)| {
            Rgb888::new(px.0[0], px.0[1], px.0[2]) == link
                && (*x as f32) > rect.x + rect.w + 1.0
                && (*y as f32) > rect.y + rect.h + 3.0
        })
        .count();
    assert_eq!(outside, 0);
}

#[test]
fn missing_image_draws_placeholder_box() {
    let (canvas, _) = render("![cover](/images/cover.png)", None);
    // Box at (20, 30), 216 x 129.
    assert_eq!(canvas.pixel(20, 100), Some(rgb(0xbbbbbb)));
    assert_eq!(canvas.pixel(200, 150), Some(rgb(0xf7f7f7)));
    assert_eq!(canvas.pixel(30, 40), Some(rgb(0xcccccc)));
    let glyph = rgb(0xaaaaaa);
    let glyph_pixels = (28..56)
        .flat_map(|x| (38..58).map(move |y| (x, y)))
        .filter(|&(x, y)| canvas.pixel(x, y) == Some(glyph))
        .count();
    assert!(glyph_pixels > 20);
    assert_eq!(canvas.pixel(100, 170), Some(Rgb888::WHITE));
}

#[test]
fn decoded_image_is_scaled_to_content_width() {
    let mut images = ImageMap::new();
    images.insert(
        "/images/blue.png".to_string(),
        ImageBitmap::new(RgbaImage::from_pixel(4, 2, Rgba([0, 0, 255, 255]))),
    );
    let (canvas, _) = render("![blue](/images/blue.png)", Some(&images));
    // 216 wide, 108 tall starting at (20, 30).
    assert_eq!(canvas.pixel(20, 30), Some(Rgb888::BLUE));
    assert_eq!(canvas.pixel(235, 137), Some(Rgb888::BLUE));
    assert_eq!(canvas.pixel(236, 60), Some(Rgb888::WHITE));
    assert_eq!(canvas.pixel(100, 139), Some(Rgb888::WHITE));
}

#[test]
fn custom_layout_config_moves_content() {
    let mut cfg = LayoutConfig::for_display(W, H);
    cfg.margin = 60.0;
    let renderer = MarkdownRenderer::new(cfg);
    let mut canvas = Canvas::new(W, H);
    renderer
        .render(
            &mut canvas,
            "plain words across the line",
            W,
            H,
            MarkdownRenderOptions::default(),
        )
        .expect("infallible");
    assert!(count_dark(&canvas) > 0);
    for y in 0..H {
        for x in 0..60 {
            assert_eq!(canvas.pixel(x, y), Some(Rgb888::WHITE));
        }
    }
}

#[test]
fn png_export_matches_canvas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("page.png");
    let (canvas, _) = render("## Saved", None);
    canvas.save_png(&path).expect("save");
    let decoded = image::open(&path).expect("open").to_rgb8();
    assert_eq!(&decoded, canvas.as_rgb_image());
}

#[test]
fn tall_narrow_image_is_clipped_to_surface() {
    let mut images = ImageMap::new();
    images.insert(
        "/images/strip.png".to_string(),
        ImageBitmap::new(RgbaImage::from_pixel(1, 5000, Rgba([200, 40, 0, 255]))),
    );
    let started = Instant::now();
    let (canvas, _) = render("Above\n![strip](/images/strip.png)", Some(&images));
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);

    let strip = Rgb888::new(200, 40, 0);
    assert_eq!(canvas.pixel(20, H - 1), Some(strip));
    assert_eq!(canvas.pixel(235, H - 1), Some(strip));
    assert_eq!(canvas.pixel(19, H - 1), Some(Rgb888::WHITE));
    assert_eq!(canvas.pixel(236, H - 1), Some(Rgb888::WHITE));
}

#[test]
fn rendering_twice_is_pixel_identical() {
    let mut images = ImageMap::new();
    let mut gradient = RgbaImage::new(7, 5);
    for (x, y, px) in gradient.enumerate_pixels_mut() {
        *px = Rgba([(x * 36) as u8, (y * 50) as u8, 90, (120 + x * 19) as u8]);
    }
    images.insert("/images/g.png".to_string(), ImageBitmap::new(gradient));
    let markdown = "# Title\n![g](/images/g.png)\n\
                    **Bold** ~~gone~~ ++under++ [link](https://l.test)\n\
                    - item\n---\n| A | B |\n| --- | --- |\n| 1 | 2 |\n\
                    ![missing](/images/none.png)";

    let (first, first_links) = render(markdown, Some(&images));
    let (second, second_links) = render(markdown, Some(&images));
    assert_eq!(first.as_rgb_image(), second.as_rgb_image());
    assert_eq!(first_links, second_links);
    assert!(!first_links.is_empty());
    // The gradient sits under the heading; its blended pixels differ from white.
    assert_ne!(first.pixel(30, 150), Some(Rgb888::WHITE));
}
