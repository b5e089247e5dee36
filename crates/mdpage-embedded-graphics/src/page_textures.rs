//! Rendered page textures keyed by sheet index and side.
//!
//! Textures render synchronously with image placeholders. With the `async`
//! feature an image refresh task preloads the page's images, re-renders the
//! texture, swaps its link list, and bumps the texture generation so the
//! consumer knows to re-upload it.

use mdpage::{BookContent, ImageMap, PageSide};
use mdpage_render::{
    Color, DrawCommand, LinkRegistry, PageKey, RenderPage, TextCommand,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{Canvas, MarkdownRenderer};

/// Size and page-number placement for page textures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageTextureConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Left x of the page number.
    pub page_number_x: i32,
    /// Baseline of the page number.
    pub page_number_y: i32,
    pub page_number_size_px: f32,
    pub page_number_color: Color,
}

impl Default for PageTextureConfig {
    fn default() -> Self {
        Self {
            canvas_width: 256,
            canvas_height: 350,
            page_number_x: 120,
            page_number_y: 330,
            page_number_size_px: 14.0,
            page_number_color: Color::BLACK,
        }
    }
}

/// One rendered page face.
#[derive(Debug)]
pub struct PageTexture {
    key: PageKey,
    /// Manager-unique identity; owns the texture's entry in the link registry.
    id: u64,
    content_index: usize,
    markdown: String,
    fingerprint: u32,
    canvas: Mutex<Canvas>,
    generation: AtomicU64,
}

impl PageTexture {
    pub fn key(&self) -> PageKey {
        self.key
    }

    /// Index into the book content shown on this face.
    pub fn content_index(&self) -> usize {
        self.content_index
    }

    /// 1-based page number drawn on the texture.
    pub fn page_number(&self) -> usize {
        self.content_index.saturating_add(1)
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// CRC-32 of the markdown this texture was rendered from.
    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Back faces are mapped onto the sheet rotated by a half turn.
    pub fn is_rotated(&self) -> bool {
        self.key.side == PageSide::Back
    }

    /// Bumped whenever the pixels change after creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Run `f` with the current pixels.
    pub fn with_canvas<R>(&self, f: impl FnOnce(&Canvas) -> R) -> R {
        f(&self.lock_canvas())
    }

    /// Copy of the current pixels.
    pub fn snapshot(&self) -> image::RgbImage {
        self.lock_canvas().to_rgb_image()
    }

    fn lock_canvas(&self) -> MutexGuard<'_, Canvas> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Render one page (markdown plus page number) into `texture`. The returned
/// page carries the link rects for the caller to record.
fn paint_texture(
    renderer: &MarkdownRenderer,
    cfg: &PageTextureConfig,
    texture: &PageTexture,
    images: Option<&ImageMap>,
) -> RenderPage {
    let mut page = renderer.layout(
        &texture.markdown,
        cfg.canvas_width,
        cfg.canvas_height,
        images,
    );
    push_page_number(renderer, cfg, &mut page, texture.page_number());
    {
        let mut canvas = texture.lock_canvas();
        match renderer.rasterize(&page, images, &mut *canvas) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
    page
}

fn push_page_number(
    renderer: &MarkdownRenderer,
    cfg: &PageTextureConfig,
    page: &mut RenderPage,
    number: usize,
) {
    let style = renderer
        .engine(cfg.canvas_width, cfg.canvas_height)
        .base_style(cfg.page_number_size_px, false);
    page.push_command(DrawCommand::Text(TextCommand {
        x: cfg.page_number_x,
        baseline_y: cfg.page_number_y,
        text: number.to_string(),
        style,
        color: cfg.page_number_color,
    }));
}

/// Owner of rendered page textures, their link rectangles, and the decoded
/// image cache.
#[derive(Debug)]
pub struct PageTextureManager {
    content: BookContent,
    cfg: PageTextureConfig,
    renderer: Arc<MarkdownRenderer>,
    links: Arc<LinkRegistry>,
    #[cfg_attr(not(feature = "async"), allow(dead_code))]
    images: Arc<Mutex<ImageMap>>,
    cache: HashMap<PageKey, Arc<PageTexture>>,
    next_texture_id: u64,
}

impl PageTextureManager {
    pub fn new(content: BookContent) -> Self {
        Self::with_config(content, PageTextureConfig::default(), MarkdownRenderer::default())
    }

    pub fn with_config(
        content: BookContent,
        cfg: PageTextureConfig,
        renderer: MarkdownRenderer,
    ) -> Self {
        Self {
            content,
            cfg,
            renderer: Arc::new(renderer),
            links: Arc::new(LinkRegistry::new()),
            images: Arc::new(Mutex::new(ImageMap::new())),
            cache: HashMap::new(),
            next_texture_id: 1,
        }
    }

    pub fn content(&self) -> &BookContent {
        &self.content
    }

    pub fn config(&self) -> &PageTextureConfig {
        &self.cfg
    }

    /// Shared link registry for hit testing.
    pub fn links(&self) -> &Arc<LinkRegistry> {
        &self.links
    }

    /// Number of cached textures.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Cached texture for `(index, side)`, rendering it on first use.
    ///
    /// New textures are drawn with image placeholders; see
    /// `spawn_image_refresh` for the second pass.
    pub fn page_texture(&mut self, index: usize, side: PageSide) -> Arc<PageTexture> {
        let key = PageKey::new(index, side);
        if let Some(texture) = self.cache.get(&key) {
            return Arc::clone(texture);
        }

        let content_index = self.content.content_index(index, side).unwrap_or_else(|| {
            index
                .saturating_mul(2)
                .saturating_add(usize::from(side == PageSide::Back))
        });
        let markdown = self.content.page_markdown(content_index).to_string();
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        let texture = Arc::new(PageTexture {
            key,
            id,
            content_index,
            fingerprint: crc32fast::hash(markdown.as_bytes()),
            markdown,
            canvas: Mutex::new(Canvas::new(self.cfg.canvas_width, self.cfg.canvas_height)),
            generation: AtomicU64::new(1),
        });

        let page = paint_texture(&self.renderer, &self.cfg, &texture, None);
        self.links
            .record_owned_links(key, id, page.width, page.height, page.links);
        log::debug!(
            "rendered page texture {} {} (content {})",
            index,
            side.as_str(),
            content_index
        );
        self.cache.insert(key, Arc::clone(&texture));
        texture
    }

    /// URL under normalized coordinates of a rendered face.
    pub fn lookup_link(&self, index: usize, side: PageSide, u: f32, v: f32) -> Option<String> {
        self.links.lookup(PageKey::new(index, side), u, v)
    }

    /// Drop one cached texture and its links.
    pub fn invalidate(&mut self, index: usize, side: PageSide) -> bool {
        let key = PageKey::new(index, side);
        self.links.remove(key);
        self.cache.remove(&key).is_some()
    }

    /// Swap the book content; only textures whose markdown or page number
    /// changed are dropped. Returns how many were dropped.
    pub fn replace_content(&mut self, content: BookContent) -> usize {
        self.content = content;
        let stale: Vec<PageKey> = self
            .cache
            .iter()
            .filter(|(key, texture)| {
                match self.content.content_index(key.index, key.side) {
                    Some(content_index) => {
                        content_index != texture.content_index
                            || crc32fast::hash(self.content.page_markdown(content_index).as_bytes())
                                != texture.fingerprint
                    }
                    None => true,
                }
            })
            .map(|(key, _)| *key)
            .collect();
        for key in &stale {
            self.cache.remove(key);
            self.links.remove(*key);
        }
        log::debug!("content replaced, {} texture(s) invalidated", stale.len());
        stale.len()
    }
}

#[cfg(feature = "async")]
mod refresh {
    use super::*;
    use mdpage::{extract_image_urls, preload_urls, ImageSource};
    use tokio::task::JoinHandle;

    impl PageTextureManager {
        /// Preload `texture`'s images in the background and re-render it.
        ///
        /// Resolves to `true` when the texture was re-rendered. A texture that
        /// was invalidated or replaced before the images arrived is left alone
        /// and its links are not recorded. Must be called from within a tokio
        /// runtime.
        pub fn spawn_image_refresh<S: ImageSource>(
            &self,
            texture: Arc<PageTexture>,
            source: Arc<S>,
        ) -> JoinHandle<bool> {
            let renderer = Arc::clone(&self.renderer);
            let links = Arc::clone(&self.links);
            let cache = Arc::clone(&self.images);
            let cfg = self.cfg;
            tokio::spawn(async move {
                refresh_texture(renderer, cfg, links, cache, texture, source).await
            })
        }
    }

    async fn refresh_texture<S: ImageSource>(
        renderer: Arc<MarkdownRenderer>,
        cfg: PageTextureConfig,
        links: Arc<LinkRegistry>,
        cache: Arc<Mutex<ImageMap>>,
        texture: Arc<PageTexture>,
        source: Arc<S>,
    ) -> bool {
        let urls = extract_image_urls(&texture.markdown);
        if urls.is_empty() {
            return false;
        }
        let missing: Vec<String> = {
            let cached = cache.lock().unwrap_or_else(PoisonError::into_inner);
            urls.iter()
                .filter(|url| !cached.contains_key(url.as_str()))
                .cloned()
                .collect()
        };
        let fetched = if missing.is_empty() {
            ImageMap::new()
        } else {
            preload_urls(source, missing).await
        };

        let images: ImageMap = {
            let mut cached = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cached.extend(fetched);
            urls.iter()
                .filter_map(|url| cached.get(url).map(|bmp| (url.clone(), bmp.clone())))
                .collect()
        };
        if images.is_empty() {
            log::debug!(
                "no images decoded for page {} {}",
                texture.key.index,
                texture.key.side.as_str()
            );
            return false;
        }
        if links.owner(texture.key) != Some(texture.id) {
            log::debug!(
                "page {} {} was replaced, skipping refresh",
                texture.key.index,
                texture.key.side.as_str()
            );
            return false;
        }

        let page = paint_texture(&renderer, &cfg, &texture, Some(&images));
        let swapped = links.replace_owned_links(
            texture.key,
            texture.id,
            page.width,
            page.height,
            page.links,
        );
        if !swapped {
            return false;
        }
        let generation = texture.bump_generation();
        log::debug!(
            "re-rendered page {} {} with {} image(s), generation {}",
            texture.key.index,
            texture.key.side.as_str(),
            images.len(),
            generation
        );
        true
    }
}
