use mdpage::PageSide;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::render_ir::LinkRect;

/// Identity of one rendered page face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    /// Sheet index.
    pub index: usize,
    pub side: PageSide,
}

impl PageKey {
    pub const fn new(index: usize, side: PageSide) -> Self {
        Self { index, side }
    }
}

/// Link rectangles recorded for one surface, plus its pixel size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageLinks {
    pub width: u32,
    pub height: u32,
    pub rects: Vec<LinkRect>,
    /// Identity of the surface that recorded these rects; 0 when unowned.
    pub owner: u64,
}

impl PageLinks {
    /// First rect containing the normalized point, in insertion order.
    ///
    /// `v` grows upward (texture space), so `y = (1 - v) * height`.
    pub fn hit(&self, u: f32, v: f32) -> Option<&LinkRect> {
        let x = u * self.width as f32;
        let y = (1.0 - v) * self.height as f32;
        self.rects.iter().find(|rect| rect.contains(x, y))
    }
}

/// Per-page link lists shared between renderers and hit testing.
///
/// Each record swaps the whole list, so readers see either the previous or
/// the new set and never a mix.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    pages: RwLock<HashMap<PageKey, Arc<PageLinks>>>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rects recorded for `key`.
    pub fn record_links(&self, key: PageKey, width: u32, height: u32, rects: Vec<LinkRect>) {
        self.record_owned_links(key, 0, width, height, rects);
    }

    /// Replace the rects recorded for `key` and mark `owner` as their source.
    pub fn record_owned_links(
        &self,
        key: PageKey,
        owner: u64,
        width: u32,
        height: u32,
        rects: Vec<LinkRect>,
    ) {
        let links = Arc::new(PageLinks {
            width,
            height,
            rects,
            owner,
        });
        log::debug!(
            "recorded {} link(s) for page {} {}",
            links.rects.len(),
            key.index,
            key.side.as_str()
        );
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, links);
    }

    /// Replace the rects for `key` only while `owner` still holds the entry.
    ///
    /// Returns `false` and leaves the registry untouched when the entry was
    /// removed or recorded by another owner in the meantime.
    pub fn replace_owned_links(
        &self,
        key: PageKey,
        owner: u64,
        width: u32,
        height: u32,
        rects: Vec<LinkRect>,
    ) -> bool {
        let mut pages = self.pages.write().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = pages.get_mut(&key).filter(|links| links.owner == owner) else {
            log::debug!(
                "dropping stale links for page {} {} (owner {})",
                key.index,
                key.side.as_str(),
                owner
            );
            return false;
        };
        *slot = Arc::new(PageLinks {
            width,
            height,
            rects,
            owner,
        });
        true
    }

    /// Owner of the rects currently recorded for `key`.
    pub fn owner(&self, key: PageKey) -> Option<u64> {
        self.snapshot(key).map(|links| links.owner)
    }

    /// URL under normalized texture coordinates `(u, v)` of `key`.
    pub fn lookup(&self, key: PageKey, u: f32, v: f32) -> Option<String> {
        let links = self.snapshot(key)?;
        links.hit(u, v).map(|rect| rect.url.clone())
    }

    /// Current link list for `key`.
    pub fn snapshot(&self, key: PageKey) -> Option<Arc<PageLinks>> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    pub fn remove(&self, key: PageKey) -> Option<Arc<PageLinks>> {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key)
    }

    pub fn clear(&self) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
