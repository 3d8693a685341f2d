use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_catalog, Volume, VolumeList, COVER_SIZE, PLACEHOLDER_SIZE};
use serde_json::json;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::HOST, "books.test:3000")
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn titles(list: &VolumeList) -> Vec<&str> {
    list.items
        .iter()
        .map(|v| v.volume_info["title"].as_str().unwrap())
        .collect()
}

// --- search ---

#[tokio::test]
async fn search_without_query_returns_400() {
    let resp = app().oneshot(get("/books/v1/volumes")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app().oneshot(get("/books/v1/volumes?q=+")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_matches_title_case_insensitively_in_catalog_order() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=DUNE&maxResults=15"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: VolumeList = body_json(resp).await;
    assert_eq!(list.kind, "books#volumes");
    assert_eq!(list.total_items, 2);
    assert_eq!(titles(&list), ["Dune", "Dune Messiah"]);
}

#[tokio::test]
async fn search_plus_separated_terms_all_match() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=the+hobbit"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(titles(&list), ["The Hobbit"]);
}

#[tokio::test]
async fn search_matches_authors() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=tolkien"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(titles(&list), ["The Hobbit", "The Fellowship of the Ring"]);
}

#[tokio::test]
async fn search_respects_max_results() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=tolkien&maxResults=1"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(list.total_items, 2);
    assert_eq!(list.items.len(), 1);
}

#[tokio::test]
async fn search_without_matches_omits_items() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=zzzz"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let raw: serde_json::Value = body_json(resp).await;
    assert_eq!(raw["totalItems"], 0);
    assert!(raw.get("items").is_none());
}

#[tokio::test]
async fn search_rewrites_relative_thumbnails_against_host() {
    let resp = app()
        .oneshot(get("/books/v1/volumes?q=dune"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(
        list.items[0].volume_info["imageLinks"]["thumbnail"],
        "http://books.test:3000/covers/dune.png"
    );
    assert!(list.items[1].volume_info.get("imageLinks").is_none());
}

#[tokio::test]
async fn search_keeps_absolute_thumbnails() {
    let app = app_with_catalog(vec![json!({
        "title": "Remote",
        "imageLinks": { "thumbnail": "http://elsewhere.test/c.jpg" },
        "infoLink": "i"
    })]);
    let resp = app.oneshot(get("/books/v1/volumes?q=remote")).await.unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(
        list.items[0].volume_info["imageLinks"]["thumbnail"],
        "http://elsewhere.test/c.jpg"
    );
}

// --- volumes ---

#[tokio::test]
async fn add_volume_returns_201() {
    let resp = app_with_catalog(Vec::new())
        .oneshot(json_request(
            "POST",
            "/books/v1/volumes",
            r#"{"title":"Neuromancer","infoLink":"i"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let volume: Volume = body_json(resp).await;
    assert_eq!(volume.kind, "books#volume");
    assert_eq!(volume.volume_info["title"], "Neuromancer");
    assert!(!volume.id.is_empty());
}

#[tokio::test]
async fn add_volume_non_object_returns_422() {
    let resp = app()
        .oneshot(json_request("POST", "/books/v1/volumes", "[1,2]"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_volume_not_found() {
    let resp = app()
        .oneshot(get("/books/v1/volumes/does-not-exist"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- covers ---

#[tokio::test]
async fn cover_is_a_png() {
    let resp = app().oneshot(get("/covers/dune.png")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/png");
    let img = image::load_from_memory(&body_bytes(resp).await).unwrap();
    assert_eq!((img.width(), img.height()), COVER_SIZE);
}

#[tokio::test]
async fn broken_cover_does_not_decode() {
    let resp = app().oneshot(get("/covers/broken.png")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(image::load_from_memory(&body_bytes(resp).await).is_err());
}

#[tokio::test]
async fn unknown_cover_returns_404() {
    let resp = app().oneshot(get("/covers/dune.jpg")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn placeholder_is_a_gif() {
    let resp = app()
        .oneshot(get("/googlebooks/images/no_cover_thumb.gif"))
        .await
        .unwrap();
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "image/gif");
    let img = image::load_from_memory(&body_bytes(resp).await).unwrap();
    assert_eq!((img.width(), img.height()), PLACEHOLDER_SIZE);
}

// --- seeded volume lifecycle ---

#[tokio::test]
async fn added_volume_is_searchable_and_fetchable() {
    use tower::Service;

    let mut app = app_with_catalog(Vec::new()).into_service();

    // empty catalog
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/books/v1/volumes?q=neuromancer"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(list.total_items, 0);

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/books/v1/volumes",
            r#"{"title":"Neuromancer","authors":["William Gibson"],"imageLinks":{"thumbnail":"/covers/n.png"},"infoLink":"i"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Volume = body_json(resp).await;

    // search by author
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/books/v1/volumes?q=gibson"))
        .await
        .unwrap();
    let list: VolumeList = body_json(resp).await;
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].id, created.id);

    // get by id, thumbnail made absolute
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&format!("/books/v1/volumes/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: Volume = body_json(resp).await;
    assert_eq!(
        fetched.volume_info["imageLinks"]["thumbnail"],
        "http://books.test:3000/covers/n.png"
    );
}
