//! Cover image fetching and decoding.
//!
//! # Design
//! Covers are fetched after every book's metadata has been parsed, never
//! from inside the parse loop. `attach_covers` fans out one blocking fetch
//! per book onto tokio's blocking pool, with at most `workers` in flight,
//! and joins them all before returning so the host only ever sees a
//! finished list. A failed cover leaves `Book::cover` empty and never fails
//! the search.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::BooksClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::types::{Book, CoverImage};

/// Decode PNG, JPEG or GIF bytes into RGBA8 pixels.
pub fn decode_cover(bytes: &[u8]) -> Result<CoverImage, ApiError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ApiError::Image(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(CoverImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Download and decode one cover. Every failure is logged and yields `None`.
pub fn fetch_cover(transport: &dyn Transport, request: &HttpRequest) -> Option<CoverImage> {
    let response = match transport.execute(request) {
        Ok(response) => response,
        Err(e) => {
            warn!(url = %request.url, error = %e, "cover download failed");
            return None;
        }
    };
    if response.status != 200 {
        warn!(url = %request.url, status = response.status, "cover download failed");
        return None;
    }
    match decode_cover(&response.body) {
        Ok(cover) => Some(cover),
        Err(e) => {
            warn!(url = %request.url, error = %e, "error decoding cover");
            None
        }
    }
}

/// Fetch the cover of every book with at most `workers` downloads at once.
///
/// Results are matched back by list position, so the returned books keep
/// their input order.
pub async fn attach_covers(
    client: &BooksClient,
    transport: Arc<dyn Transport>,
    books: Vec<Book>,
    workers: usize,
) -> Vec<Book> {
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    for (index, book) in books.iter().enumerate() {
        let request = client.build_cover_request(&book.thumbnail_url);
        let transport = Arc::clone(&transport);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let Ok(permit) = permits.acquire_owned().await else {
                return (index, None);
            };
            let cover = tokio::task::spawn_blocking(move || fetch_cover(transport.as_ref(), &request))
                .await
                .unwrap_or_else(|e| {
                    warn!(index, error = %e, "cover worker failed");
                    None
                });
            drop(permit);
            (index, cover)
        });
    }

    let mut covers: Vec<Option<CoverImage>> = books.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, cover)) => covers[index] = cover,
            Err(e) => warn!(error = %e, "cover task failed"),
        }
    }
    debug!(
        total = books.len(),
        decoded = covers.iter().filter(|c| c.is_some()).count(),
        "covers attached"
    );

    books
        .into_iter()
        .zip(covers)
        .map(|(book, cover)| book.with_cover(cover))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;
    use crate::http::HttpResponse;

    fn encoded(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn book(title: &str, thumbnail_url: &str) -> Book {
        Book {
            title: title.to_string(),
            authors: "A".to_string(),
            description: "D".to_string(),
            rating: 0.0,
            thumbnail_url: thumbnail_url.to_string(),
            info_url: "i".to_string(),
            cover: None,
        }
    }

    /// Serves a 2x3 PNG for urls ending in `.png`, 404 otherwise, and tracks
    /// the peak number of concurrent requests.
    #[derive(Default)]
    struct CoverHost {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Transport for CoverHost {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            if request.url.ends_with(".png") {
                Ok(HttpResponse::new(200, encoded(ImageFormat::Png, 2, 3)))
            } else if request.url.ends_with(".bin") {
                Ok(HttpResponse::new(200, b"definitely not an image".to_vec()))
            } else {
                Ok(HttpResponse::new(404, ""))
            }
        }
    }

    #[test]
    fn decode_png() {
        let cover = decode_cover(&encoded(ImageFormat::Png, 4, 2)).unwrap();
        assert_eq!((cover.width, cover.height), (4, 2));
        assert_eq!(cover.pixels.len(), 4 * 2 * 4);
        assert_eq!(&cover.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn decode_gif() {
        let cover = decode_cover(&encoded(ImageFormat::Gif, 1, 1)).unwrap();
        assert_eq!((cover.width, cover.height), (1, 1));
    }

    #[test]
    fn decode_garbage_is_image_error() {
        assert!(matches!(decode_cover(b"nope"), Err(ApiError::Image(_))));
    }

    #[test]
    fn fetch_cover_failures_yield_none() {
        let host = CoverHost::default();
        let missing = HttpRequest {
            url: "http://covers/missing.jpg".into(),
            headers: Vec::new(),
        };
        let garbage = HttpRequest {
            url: "http://covers/garbage.bin".into(),
            headers: Vec::new(),
        };
        assert!(fetch_cover(&host, &missing).is_none());
        assert!(fetch_cover(&host, &garbage).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn attach_covers_keeps_order_and_bounds_concurrency() {
        let host = Arc::new(CoverHost::default());
        let client = BooksClient::new("http://localhost/volumes");
        let books = vec![
            book("a", "http://covers/a.png"),
            book("b", "http://covers/b.jpg"),
            book("c", "http://covers/c.png"),
            book("d", "http://covers/d.bin"),
            book("e", "http://covers/e.png"),
            book("f", "http://covers/f.png"),
        ];
        let transport: Arc<dyn Transport> = host.clone();
        let out = attach_covers(&client, transport, books, 2).await;

        let titles: Vec<_> = out.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c", "d", "e", "f"]);
        let has_cover: Vec<_> = out.iter().map(|b| b.cover.is_some()).collect();
        assert_eq!(has_cover, [true, false, true, false, true, true]);
        assert_eq!(out[0].cover.as_ref().map(|c| (c.width, c.height)), Some((2, 3)));
        assert!(host.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn attach_covers_empty_list() {
        let client = BooksClient::new("http://localhost/volumes");
        let transport: Arc<dyn Transport> = Arc::new(CoverHost::default());
        assert!(attach_covers(&client, transport, Vec::new(), 4).await.is_empty());
    }
}
