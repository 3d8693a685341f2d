use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use image::{ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const VOLUMES_PATH: &str = "/books/v1/volumes";
pub const PLACEHOLDER_PATH: &str = "/googlebooks/images/no_cover_thumb.gif";
pub const BROKEN_COVER: &str = "broken.png";

const DEFAULT_MAX_RESULTS: usize = 10;
const MAX_RESULTS_LIMIT: usize = 40;
pub const COVER_SIZE: (u32, u32) = (8, 12);
pub const PLACEHOLDER_SIZE: (u32, u32) = (4, 6);

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub kind: String,
    pub id: String,
    pub volume_info: Value,
}

impl Volume {
    pub fn new(volume_info: Value) -> Self {
        Self {
            kind: "books#volume".to_string(),
            id: Uuid::new_v4().to_string(),
            volume_info,
        }
    }

    /// Lowercased title and author names, for matching queries.
    fn haystack(&self) -> String {
        let title = self.volume_info["title"].as_str().unwrap_or_default();
        let authors = self.volume_info["authors"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        format!("{title} {authors}").to_lowercase()
    }

    /// Copy with a relative thumbnail path turned into an absolute URL on `host`.
    fn with_absolute_thumbnail(&self, host: Option<&str>) -> Self {
        let mut volume = self.clone();
        if let (Some(host), Some(Value::String(thumbnail))) =
            (host, volume.volume_info.pointer_mut("/imageLinks/thumbnail"))
        {
            if thumbnail.starts_with('/') {
                *thumbnail = format!("http://{host}{thumbnail}");
            }
        }
        volume
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeList {
    pub kind: String,
    pub total_items: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Volume>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub q: Option<String>,
    pub max_results: Option<usize>,
}

pub type Catalog = Arc<RwLock<Vec<Volume>>>;

/// Router seeded with `default_catalog`.
pub fn app() -> Router {
    app_with_catalog(default_catalog())
}

/// Router whose catalog holds one volume per `volumeInfo` object, in order.
pub fn app_with_catalog(volume_infos: Vec<Value>) -> Router {
    let catalog: Catalog = Arc::new(RwLock::new(
        volume_infos.into_iter().map(Volume::new).collect(),
    ));
    Router::new()
        .route(VOLUMES_PATH, get(search_volumes).post(add_volume))
        .route("/books/v1/volumes/{id}", get(get_volume))
        .route("/covers/{name}", get(cover))
        .route(PLACEHOLDER_PATH, get(placeholder_cover))
        .with_state(catalog)
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

/// A small catalog covering the shapes the client has to cope with:
/// complete volumes, volumes without optional fields, and a broken cover.
pub fn default_catalog() -> Vec<Value> {
    vec![
        json!({
            "title": "Dune",
            "authors": ["Frank Herbert"],
            "description": "A desert planet, a noble family and the spice melange.",
            "imageLinks": { "smallThumbnail": "/covers/dune-small.png", "thumbnail": "/covers/dune.png" },
            "averageRating": 4.5,
            "infoLink": "https://books.example.com/dune"
        }),
        json!({
            "title": "Dune Messiah",
            "infoLink": "https://books.example.com/dune-messiah"
        }),
        json!({
            "title": "The Hobbit",
            "authors": ["J. R. R. Tolkien"],
            "description": "There and back again.",
            "imageLinks": { "thumbnail": "/covers/hobbit.png" },
            "averageRating": 4.0,
            "infoLink": "https://books.example.com/hobbit"
        }),
        json!({
            "title": "The Fellowship of the Ring",
            "authors": ["J. R. R. Tolkien"],
            "imageLinks": { "thumbnail": format!("/covers/{BROKEN_COVER}") },
            "averageRating": 4.4,
            "infoLink": "https://books.example.com/fellowship"
        }),
        json!({
            "title": "Good Omens",
            "authors": ["Terry Pratchett", "Neil Gaiman"],
            "description": "The world ends on a Saturday.",
            "infoLink": "https://books.example.com/good-omens"
        }),
    ]
}

async fn search_volumes(
    State(catalog): State<Catalog>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<VolumeList>, (StatusCode, String)> {
    let query = params.q.unwrap_or_default();
    let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if terms.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Missing query.".to_string()));
    }
    let max_results = params
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_RESULTS_LIMIT);
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());

    let volumes = catalog.read().await;
    let matched: Vec<&Volume> = volumes
        .iter()
        .filter(|volume| {
            let haystack = volume.haystack();
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .collect();
    debug!(query = %query, matched = matched.len(), max_results, "volume search");

    Ok(Json(VolumeList {
        kind: "books#volumes".to_string(),
        total_items: matched.len(),
        items: matched
            .into_iter()
            .take(max_results)
            .map(|volume| volume.with_absolute_thumbnail(host))
            .collect(),
    }))
}

async fn add_volume(
    State(catalog): State<Catalog>,
    Json(volume_info): Json<Value>,
) -> Result<(StatusCode, Json<Volume>), StatusCode> {
    if !volume_info.is_object() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let volume = Volume::new(volume_info);
    catalog.write().await.push(volume.clone());
    Ok((StatusCode::CREATED, Json(volume)))
}

async fn get_volume(
    State(catalog): State<Catalog>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Volume>, StatusCode> {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    let volumes = catalog.read().await;
    volumes
        .iter()
        .find(|volume| volume.id == id)
        .map(|volume| Json(volume.with_absolute_thumbnail(host)))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn cover(Path(name): Path<String>) -> Response {
    if name == BROKEN_COVER {
        return image_response("image/png", b"\x89PNG truncated".to_vec());
    }
    if !name.ends_with(".png") {
        return StatusCode::NOT_FOUND.into_response();
    }
    match encode_image(ImageFormat::Png, COVER_SIZE, Rgba([180, 40, 40, 255])) {
        Ok(bytes) => image_response("image/png", bytes),
        Err(status) => status.into_response(),
    }
}

async fn placeholder_cover() -> Response {
    match encode_image(ImageFormat::Gif, PLACEHOLDER_SIZE, Rgba([200, 200, 200, 255])) {
        Ok(bytes) => image_response("image/gif", bytes),
        Err(status) => status.into_response(),
    }
}

fn image_response(content_type: &'static str, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

fn encode_image(
    format: ImageFormat,
    (width, height): (u32, u32),
    fill: Rgba<u8>,
) -> Result<Vec<u8>, StatusCode> {
    let img = RgbaImage::from_pixel(width, height, fill);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(out.into_inner())
}
