//! Asynchronous image preloading.
//!
//! Every referenced URL is fetched and decoded on its own task. A failure
//! for one URL is logged and left out of the result; the batch never fails.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::error::ImageError;
use crate::images::{decode_image_bitmap, extract_image_urls, ImageBitmap, ImageMap};

/// Byte source for referenced image URLs.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ImageError>> + Send;
}

/// Reads image URLs as paths under a root directory.
///
/// Absolute URLs (`/images/a.png`) are resolved against the root, mirroring
/// how a static site serves its public folder.
#[derive(Clone, Debug)]
pub struct FsImageSource {
    root: PathBuf,
}

impl FsImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, ImageError> {
        if url.contains("://") {
            return Err(ImageError::UnsupportedUrl(url.to_string()));
        }
        let relative = url.trim_start_matches('/');
        if relative.split('/').any(|part| part == "..") {
            return Err(ImageError::UnsupportedUrl(url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ImageSource for FsImageSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let path = self.resolve(url)?;
        Ok(tokio::fs::read(path).await?)
    }
}

#[cfg(feature = "http")]
pub use http::HttpImageSource;

#[cfg(feature = "http")]
mod http {
    use super::ImageSource;
    use crate::error::ImageError;

    /// Fetches image URLs over HTTP(S), resolving relative URLs against a base.
    #[derive(Clone, Debug)]
    pub struct HttpImageSource {
        client: reqwest::Client,
        base: Option<reqwest::Url>,
    }

    impl HttpImageSource {
        pub fn new() -> Self {
            Self {
                client: reqwest::Client::new(),
                base: None,
            }
        }

        /// Resolve relative URLs (e.g. `/images/a.png`) against `base`.
        pub fn with_base(base: &str) -> Result<Self, ImageError> {
            let base =
                reqwest::Url::parse(base).map_err(|e| ImageError::UnsupportedUrl(e.to_string()))?;
            Ok(Self {
                client: reqwest::Client::new(),
                base: Some(base),
            })
        }

        fn resolve(&self, url: &str) -> Result<reqwest::Url, ImageError> {
            match reqwest::Url::parse(url) {
                Ok(parsed) => Ok(parsed),
                Err(_) => self
                    .base
                    .as_ref()
                    .and_then(|base| base.join(url).ok())
                    .ok_or_else(|| ImageError::UnsupportedUrl(url.to_string())),
            }
        }
    }

    impl Default for HttpImageSource {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ImageSource for HttpImageSource {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageError> {
            let url = self.resolve(url)?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ImageError::Fetch(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ImageError::Status(status.as_u16()));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| ImageError::Fetch(e.to_string()))?;
            Ok(bytes.to_vec())
        }
    }
}

/// Fetch and decode one URL.
pub async fn load_image<S: ImageSource>(source: &S, url: &str) -> Result<ImageBitmap, ImageError> {
    let bytes = source.fetch(url).await?;
    decode_image_bitmap(&bytes)
}

/// Preload a list of URLs concurrently.
pub async fn preload_urls<S: ImageSource>(source: Arc<S>, urls: Vec<String>) -> ImageMap {
    let mut tasks = JoinSet::new();
    for url in urls {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            let result = load_image(source.as_ref(), &url).await;
            (url, result)
        });
    }

    let mut out = ImageMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((url, Ok(bitmap))) => {
                log::debug!(
                    "preloaded image {} ({}x{})",
                    url,
                    bitmap.width(),
                    bitmap.height()
                );
                out.insert(url, bitmap);
            }
            Ok((url, Err(err))) => log::warn!("skipping image {}: {}", url, err),
            Err(err) => log::warn!("image preload task failed: {}", err),
        }
    }
    out
}

/// Preload every image referenced by `markdown`.
pub async fn preload_images<S: ImageSource>(source: Arc<S>, markdown: &str) -> ImageMap {
    let urls = extract_image_urls(markdown);
    if urls.is_empty() {
        return ImageMap::new();
    }
    preload_urls(source, urls).await
}
