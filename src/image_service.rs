// ABOUTME: Image-search service client for illustrative slide photos
// ABOUTME: Defines the ImageSearch seam, a Pexels search-and-download client and a null search

use crate::errors::{Result, SlidesError};
use crate::http::{build_client, send_with_retry, RetryPolicy};
use crate::pacing::CancelToken;
use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PEXELS_BASE_URL: &str = "https://api.pexels.com";

/// A service that finds photos for a query and downloads them into `dest`.
///
/// No results is a normal outcome and returns an empty list.
pub trait ImageSearch {
    fn search_images(&self, query: &str, n: usize, dest: &Path) -> Result<Vec<PathBuf>>;
}

impl<T: ImageSearch + ?Sized> ImageSearch for &T {
    fn search_images(&self, query: &str, n: usize, dest: &Path) -> Result<Vec<PathBuf>> {
        (**self).search_images(query, n, dest)
    }
}

impl<T: ImageSearch + ?Sized> ImageSearch for Box<T> {
    fn search_images(&self, query: &str, n: usize, dest: &Path) -> Result<Vec<PathBuf>> {
        (**self).search_images(query, n, dest)
    }
}

/// Image search that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSearch for NoImages {
    fn search_images(&self, _query: &str, _n: usize, _dest: &Path) -> Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    #[serde(default)]
    id: u64,
    src: PhotoSource,
}

#[derive(Deserialize)]
struct PhotoSource {
    original: String,
}

/// Client for the Pexels photo search API.
pub struct PexelsClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
    cancel: CancelToken,
}

impl PexelsClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry: RetryPolicy::default(),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn search_url(&self, query: &str, n: usize) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/v1/search", self.base_url))
            .map_err(|e| SlidesError::ConfigError(format!("Invalid Pexels URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("per_page", &n.max(1).to_string());
        Ok(url)
    }

    fn download(&self, photo: &Photo, dest: &Path) -> Result<PathBuf> {
        let response = send_with_retry("Pexels download", self.retry, &self.cancel, || {
            self.client.get(&photo.src.original).send()
        })?;
        let bytes = response.bytes().map_err(SlidesError::FetchError)?;

        let file_name = file_name_for(&photo.src.original, photo.id);
        let mut path = dest.join(&file_name);
        if path.exists() {
            path = dest.join(format!("{}-{}", uuid::Uuid::new_v4(), file_name));
        }
        fs::write(&path, &bytes).map_err(SlidesError::FileReadError)?;
        Ok(path)
    }
}

/// Local file name for a downloaded photo: the URL's last path segment, or a
/// generated name when the URL has none.
pub fn file_name_for(photo_url: &str, id: u64) -> String {
    let segment = Url::parse(photo_url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
            .filter(|s| !s.is_empty())
    });

    match segment {
        Some(name) => name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect(),
        None if id > 0 => format!("pexels-{}.jpg", id),
        None => format!("{}.jpg", uuid::Uuid::new_v4()),
    }
}

impl ImageSearch for PexelsClient {
    fn search_images(&self, query: &str, n: usize, dest: &Path) -> Result<Vec<PathBuf>> {
        let url = self.search_url(query, n)?;
        info!("Searching images for '{}'", query);

        let response = send_with_retry("Pexels search", self.retry, &self.cancel, || {
            self.client
                .get(url.clone())
                .header(reqwest::header::AUTHORIZATION, self.api_key.as_str())
                .send()
        })?;
        let results: SearchResponse = response.json().map_err(SlidesError::FetchError)?;

        if results.photos.is_empty() {
            info!("No images found for query: {}", query);
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for photo in results.photos.iter().take(n) {
            match self.download(photo, dest) {
                Ok(path) => paths.push(path),
                Err(SlidesError::Cancelled) => return Err(SlidesError::Cancelled),
                Err(e) => warn!("Error downloading {}: {}", photo.src.original, e),
            }
        }
        Ok(paths)
    }
}
