use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

mod common;

use common::{png_bytes, png_part, TestEnv, CLUB};

fn news_form(author: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("club_id", CLUB)
        .add_text("author", author)
        .add_text("news_date", "2024-06-01")
        .add_text("post_to_public", "1")
        .add_text("show_in_homepage", "0")
        .add_text("post_to_member", "0")
}

async fn create(env: &TestEnv, form: MultipartForm) -> i64 {
    let response = env.app.post("/api/news").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_news_with_both_languages() {
    let env = TestEnv::new().await;

    let form = news_form("Coach Marie")
        .add_text("title_en", "Summer Gala")
        .add_text("summary_en", "Results are in")
        .add_text("title_fr", "Gala d'été")
        .add_part("image_fr", png_part("gala.png"));
    let id = create(&env, form).await;

    let response = env.app.get(&format!("/api/news/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let news = response.json::<Value>()["data"].clone();

    assert_eq!(news["author"], "Coach Marie");
    assert_eq!(news["news_date"], "2024-06-01");
    assert_eq!(news["post_to_public"], 1);
    assert_eq!(news["order"], 1);
    assert_eq!(news["title_en"], "Summer Gala");
    assert_eq!(news["slug_en"], "summer-gala");
    assert_eq!(news["slug_fr"], "gala-dete");
    assert_eq!(news["language_fr_id"], 2);
    assert_eq!(news["image_en"], Value::Null);

    let image = news["image_fr"].as_str().unwrap();
    let thumbnail = news["thumbnail_fr"].as_str().unwrap();
    assert!(image.starts_with("news_fr_"));
    assert!(thumbnail.starts_with("thumb_fr_"));

    let dir = env.media.path().join("images/clubs/swimdorval/news");
    assert!(dir.join(image).exists());
    assert!(dir.join("thumbnail").join(thumbnail).exists());

    let served = env
        .app
        .get(&format!("/images/clubs/swimdorval/news/{}", image))
        .await;
    assert_eq!(served.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_news_requires_club_and_author() {
    let env = TestEnv::new().await;

    let response = env
        .app
        .post("/api/news")
        .multipart(MultipartForm::new().add_text("author", "Coach"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(
        body,
        json!({"success": false, "error": "Club ID is required", "code": "VALIDATION_ERROR"})
    );

    let response = env
        .app
        .post("/api/news")
        .multipart(MultipartForm::new().add_text("club_id", CLUB).add_text("author", "  "))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_news_rejects_non_image_upload() {
    let env = TestEnv::new().await;

    let bogus = Part::bytes(b"not an image".to_vec())
        .file_name("notes.txt")
        .mime_type("text/plain");
    let form = news_form("Coach").add_text("title_fr", "Nouvelles").add_part("image_fr", bogus);
    let response = env.app.post("/api/news").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let list = env.app.get("/api/news").await.json::<Value>();
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_create_news_with_undecodable_image_leaves_no_row() {
    let env = TestEnv::new().await;

    let corrupt = Part::bytes(b"not really a png".to_vec())
        .file_name("x.png")
        .mime_type("image/png");
    let form = news_form("Coach").add_text("title_en", "Gala").add_part("image_en", corrupt);
    let response = env.app.post("/api/news").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

    let list = env.app.get("/api/news").await.json::<Value>();
    assert_eq!(list["data"], json!([]));

    let dir = env.media.path().join("images/clubs/swimdorval/news");
    let leftovers = std::fs::read_dir(&dir).map(|entries| entries.count()).unwrap_or(0);
    assert!(leftovers <= 1, "only the thumbnail directory may remain");
    let thumbnails = std::fs::read_dir(dir.join("thumbnail"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(thumbnails, 0);
}

#[tokio::test]
async fn test_create_news_with_explicit_thumbnail() {
    let env = TestEnv::new().await;

    let image = Part::bytes(png_bytes(640, 480))
        .file_name("pool.png")
        .mime_type("image/png");
    let thumbnail = Part::bytes(png_bytes(48, 24))
        .file_name("pool-small.png")
        .mime_type("image/png");
    let form = news_form("Coach")
        .add_text("title_en", "Pool reopening")
        .add_part("image_en", image)
        .add_part("thumbnail_en", thumbnail);
    let id = create(&env, form).await;

    let news = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    let dir = env.media.path().join("images/clubs/swimdorval/news");
    let image = dir.join(news["image_en"].as_str().unwrap());
    let thumbnail = dir.join("thumbnail").join(news["thumbnail_en"].as_str().unwrap());
    assert_eq!(image::image_dimensions(&image).unwrap(), (640, 480));
    assert_eq!(image::image_dimensions(&thumbnail).unwrap(), (48, 24));
}

#[tokio::test]
async fn test_update_news_thumbnail_only() {
    let env = TestEnv::new().await;
    let form = news_form("Coach")
        .add_text("title_en", "Relay")
        .add_part("image_en", png_part("relay.png"));
    let id = create(&env, form).await;
    let before = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    let old_thumbnail = before["thumbnail_en"].as_str().unwrap().to_string();

    let thumbnail = Part::bytes(png_bytes(32, 12))
        .file_name("relay-small.png")
        .mime_type("image/png");
    let response = env
        .app
        .put(&format!("/api/news/{}", id))
        .multipart(MultipartForm::new().add_text("club_id", CLUB).add_part("thumbnail_en", thumbnail))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let after = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    let new_thumbnail = after["thumbnail_en"].as_str().unwrap();
    assert_eq!(after["image_en"], before["image_en"]);
    assert_ne!(new_thumbnail, old_thumbnail);

    let thumbnails = env.media.path().join("images/clubs/swimdorval/news/thumbnail");
    assert!(!thumbnails.join(&old_thumbnail).exists());
    assert_eq!(image::image_dimensions(thumbnails.join(new_thumbnail)).unwrap(), (32, 12));
}

#[tokio::test]
async fn test_oversized_image_is_payload_too_large() {
    let env = TestEnv::with_storage(|storage| {
        storage.max_image_size = 1024;
        storage.max_file_size = 1024;
    })
    .await;

    // Over the per-image limit but inside the request body limit
    let big = Part::bytes(png_bytes(1000, 1000))
        .file_name("big.png")
        .mime_type("image/png");
    let form = news_form("Coach").add_text("title_en", "Big").add_part("image_en", big);
    let response = env.app.post("/api/news").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");

    // Over the request body limit itself
    let huge = Part::bytes(vec![0; 2 * 1024 * 1024])
        .file_name("huge.png")
        .mime_type("image/png");
    let form = news_form("Coach").add_text("title_en", "Huge").add_part("image_en", huge);
    let response = env.app.post("/api/news").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.json::<Value>()["code"], "PAYLOAD_TOO_LARGE");

    let list = env.app.get("/api/news").await.json::<Value>();
    assert_eq!(list["data"], json!([]));
}

#[tokio::test]
async fn test_malformed_news_requests_use_error_envelope() {
    let env = TestEnv::new().await;
    let id = create(&env, news_form("Coach").add_text("title_en", "Meet")).await;

    let response = env.app.get("/api/news/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].is_string());

    let response = env
        .app
        .put(&format!("/api/news/{}/order", id))
        .json(&json!({"order": "2"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

    let news = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>();
    assert_eq!(news["data"]["order"], 1);
}

#[tokio::test]
async fn test_duplicate_titles_get_numbered_slugs() {
    let env = TestEnv::new().await;

    let first = create(&env, news_form("A").add_text("title_fr", "Gala")).await;
    let second = create(&env, news_form("B").add_text("title_fr", "Gala")).await;
    let third = create(&env, news_form("C").add_text("title_fr", "Gala").add_text("slug_fr", "gala")).await;

    let slug = |id: i64| {
        let app = &env.app;
        async move {
            app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"]["slug_fr"].clone()
        }
    };
    assert_eq!(slug(first).await, "gala");
    assert_eq!(slug(second).await, "gala-2");
    assert_eq!(slug(third).await, "gala-3");
}

#[tokio::test]
async fn test_public_listing_and_slug_lookup() {
    let env = TestEnv::new().await;

    create(&env, news_form("A").add_text("title_en", "Open Day").add_text("title_fr", "Portes ouvertes")).await;
    create(
        &env,
        MultipartForm::new()
            .add_text("club_id", CLUB)
            .add_text("author", "B")
            .add_text("post_to_public", "0")
            .add_text("title_en", "Members only"),
    )
    .await;

    let en = env.app.get("/api/news/public?lang=en").await.json::<Value>();
    let items = en["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Open Day");
    assert_eq!(items[0]["language_id"], 1);

    // Missing or unknown language falls back to French
    let fr = env.app.get("/api/news/public?lang=de").await.json::<Value>();
    assert_eq!(fr["data"][0]["title"], "Portes ouvertes");

    let response = env.app.get("/api/news/slug/open-day?lang=en").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["data"]["slug"], "open-day");

    let response = env.app.get("/api/news/slug/open-day?lang=fr").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "NOT_FOUND");

    let response = env.app.get("/api/news/slug/members-only?lang=en").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_news_content() {
    let env = TestEnv::new().await;
    let id = create(
        &env,
        news_form("Coach")
            .add_text("title_en", "Old title")
            .add_text("summary_en", "Old summary"),
    )
    .await;

    let form = MultipartForm::new()
        .add_text("club_id", CLUB)
        .add_text("title_en", "New title")
        .add_text("summary_en", "")
        .add_text("title_fr", "Nouveau titre")
        .add_text("updated_by", "3");
    let response = env.app.put(&format!("/api/news/{}", id)).multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"success": true}));

    let news = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    assert_eq!(news["title_en"], "New title");
    assert_eq!(news["slug_en"], "new-title");
    assert_eq!(news["summary_en"], Value::Null);
    assert_eq!(news["author"], "Coach");
    assert_eq!(news["title_fr"], "Nouveau titre");
    assert_eq!(news["slug_fr"], "nouveau-titre");

    let response = env
        .app
        .put("/api/news/999")
        .multipart(MultipartForm::new().add_text("club_id", CLUB))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_replaces_image_and_removes_old_file() {
    let env = TestEnv::new().await;
    let id = create(
        &env,
        news_form("Coach")
            .add_text("title_en", "Meet")
            .add_part("image_en", png_part("first.png")),
    )
    .await;
    let before = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    let old_image = before["image_en"].as_str().unwrap().to_string();
    let old_thumb = before["thumbnail_en"].as_str().unwrap().to_string();

    let form = MultipartForm::new()
        .add_text("club_id", CLUB)
        .add_part("image_en", png_part("second.png"));
    let response = env.app.put(&format!("/api/news/{}", id)).multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let after = env.app.get(&format!("/api/news/{}", id)).await.json::<Value>()["data"].clone();
    let new_image = after["image_en"].as_str().unwrap();
    assert_ne!(new_image, old_image);
    assert_eq!(after["title_en"], "Meet");

    let dir = env.media.path().join("images/clubs/swimdorval/news");
    assert!(!dir.join(&old_image).exists());
    assert!(!dir.join("thumbnail").join(&old_thumb).exists());
    assert!(dir.join(new_image).exists());
}

#[tokio::test]
async fn test_delete_and_reorder_news() {
    let env = TestEnv::new().await;
    let a = create(&env, news_form("A").add_text("title_en", "A")).await;
    let b = create(&env, news_form("B").add_text("title_en", "B")).await;

    let response = env
        .app
        .put(&format!("/api/news/{}/order", b))
        .json(&json!({"order": 1}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let list = env.app.get("/api/news/public?lang=en").await.json::<Value>();
    let titles: Vec<&str> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["B", "A"]);

    let response = env.app.delete(&format!("/api/news/{}", a)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        env.app.get(&format!("/api/news/{}", a)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        env.app.delete(&format!("/api/news/{}", a)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        env.app
            .put("/api/news/999/order")
            .json(&json!({"order": 1}))
            .await
            .status_code(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_editor_image_upload_and_listing() {
    let env = TestEnv::new().await;

    let form = MultipartForm::new()
        .add_text("club_id", CLUB)
        .add_part("image", png_part("inline.PNG"));
    let response = env.app.post("/api/news/upload-image").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    let filename = body["filename"].as_str().unwrap();
    assert!(filename.starts_with("article_"));
    assert!(filename.ends_with(".png"));
    assert_eq!(
        body["url"],
        format!("/images/clubs/swimdorval/news/{}", filename)
    );

    let listing = env
        .app
        .get("/api/news/images?club_id=swimdorval")
        .await
        .json::<Value>();
    assert_eq!(listing["success"], true);
    assert_eq!(listing["images"][0]["filename"], filename);

    let response = env.app.get("/api/news/images").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = env
        .app
        .post("/api/news/upload-image")
        .multipart(MultipartForm::new().add_text("club_id", CLUB))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "No image file provided");
}

#[tokio::test]
async fn test_editor_file_upload_versions_names() {
    let env = TestEnv::new().await;

    let upload = |name: &'static str| {
        MultipartForm::new().add_text("club_id", CLUB).add_part(
            "file",
            Part::bytes(b"%PDF-1.4".to_vec())
                .file_name(name)
                .mime_type("application/pdf"),
        )
    };

    let first = env
        .app
        .post("/api/news/upload-file")
        .multipart(upload("Meet schedule.pdf"))
        .await
        .json::<Value>();
    let second = env
        .app
        .post("/api/news/upload-file")
        .multipart(upload("Meet schedule.pdf"))
        .await
        .json::<Value>();
    assert_eq!(first["filename"], "Meet_schedule.pdf");
    assert_eq!(second["filename"], "Meet_schedule_v2.pdf");
    assert_eq!(second["url"], "/files/clubs/swimdorval/news/Meet_schedule_v2.pdf");

    let files = env
        .app
        .get("/api/news/files?club_id=swimdorval")
        .await
        .json::<Value>();
    assert_eq!(files["files"].as_array().unwrap().len(), 2);

    let served = env.app.get("/files/clubs/swimdorval/news/Meet_schedule.pdf").await;
    assert_eq!(served.status_code(), StatusCode::OK);

    let exe = MultipartForm::new().add_text("club_id", CLUB).add_part(
        "file",
        Part::bytes(vec![0u8; 4]).file_name("setup.exe"),
    );
    let response = env.app.post("/api/news/upload-file").multipart(exe).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
