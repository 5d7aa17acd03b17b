use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use serde_json::{json, Value};

mod common;

use common::{png_part, TestEnv, CLUB};

async fn create_slide(env: &TestEnv, form: MultipartForm) -> Value {
    let response = env.app.post("/api/slider").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()["data"].clone()
}

#[tokio::test]
async fn test_create_slide() {
    let env = TestEnv::new().await;

    let slide = create_slide(
        &env,
        MultipartForm::new()
            .add_text("club_id", CLUB)
            .add_text("link_en", "https://example.org/register")
            .add_text("link_fr", "")
            .add_part("image_en", png_part("banner.png")),
    )
    .await;

    let image = slide["image_en"].as_str().unwrap();
    assert!(image.starts_with("slider_en_"));
    assert_eq!(slide["image_fr"], Value::Null);
    assert_eq!(slide["link_en"], "https://example.org/register");
    assert_eq!(slide["link_fr"], Value::Null);
    assert_eq!(slide["order"], 1);
    assert_eq!(slide["status"], 1);

    assert!(env
        .media
        .path()
        .join("images/clubs/swimdorval/slider")
        .join(image)
        .exists());
}

#[tokio::test]
async fn test_create_slide_requires_image() {
    let env = TestEnv::new().await;

    let response = env
        .app
        .post("/api/slider")
        .multipart(MultipartForm::new().add_text("club_id", CLUB).add_text("link_en", "x"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_update_slide_status_and_visibility() {
    let env = TestEnv::new().await;
    let slide = create_slide(
        &env,
        MultipartForm::new()
            .add_text("club_id", CLUB)
            .add_part("image_fr", png_part("banniere.png")),
    )
    .await;
    let id = slide["id"].as_i64().unwrap();

    let active = env.app.get("/api/slider/public").await.json::<Value>();
    assert_eq!(active["data"].as_array().unwrap().len(), 1);

    let response = env
        .app
        .put(&format!("/api/slider/{}", id))
        .multipart(
            MultipartForm::new()
                .add_text("club_id", CLUB)
                .add_text("status", "0")
                .add_text("link_fr", "https://example.org/fr"),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>()["data"].clone();
    assert_eq!(updated["status"], 0);
    assert_eq!(updated["link_fr"], "https://example.org/fr");
    assert_eq!(updated["image_fr"], slide["image_fr"]);

    let active = env.app.get("/api/slider/public").await.json::<Value>();
    assert_eq!(active["data"], json!([]));
    let all = env.app.get("/api/slider").await.json::<Value>();
    assert_eq!(all["data"].as_array().unwrap().len(), 1);

    let response = env
        .app
        .put(&format!("/api/slider/{}", id))
        .multipart(MultipartForm::new().add_text("club_id", CLUB).add_text("status", "2"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_slide_replaces_image() {
    let env = TestEnv::new().await;
    let slide = create_slide(
        &env,
        MultipartForm::new()
            .add_text("club_id", CLUB)
            .add_part("image_en", png_part("one.png")),
    )
    .await;
    let id = slide["id"].as_i64().unwrap();
    let old = slide["image_en"].as_str().unwrap().to_string();

    let response = env
        .app
        .put(&format!("/api/slider/{}", id))
        .multipart(
            MultipartForm::new()
                .add_text("club_id", CLUB)
                .add_part("image_en", png_part("two.png")),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let new = response.json::<Value>()["data"]["image_en"].as_str().unwrap().to_string();

    let dir = env.media.path().join("images/clubs/swimdorval/slider");
    assert_ne!(new, old);
    assert!(!dir.join(&old).exists());
    assert!(dir.join(&new).exists());
}

#[tokio::test]
async fn test_delete_and_reorder_slides() {
    let env = TestEnv::new().await;
    let form = || {
        MultipartForm::new()
            .add_text("club_id", CLUB)
            .add_part("image_en", png_part("slide.png"))
    };
    let a = create_slide(&env, form()).await["id"].as_i64().unwrap();
    let b = create_slide(&env, form()).await["id"].as_i64().unwrap();

    let response = env
        .app
        .put(&format!("/api/slider/{}/order", b))
        .json(&json!({"order": 1}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let list = env.app.get("/api/slider").await.json::<Value>();
    assert_eq!(list["data"][0]["id"], b);
    assert_eq!(list["data"][1]["id"], a);

    assert_eq!(
        env.app.delete(&format!("/api/slider/{}", a)).await.status_code(),
        StatusCode::OK
    );
    assert_eq!(
        env.app.get(&format!("/api/slider/{}", a)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        env.app.delete(&format!("/api/slider/{}", a)).await.status_code(),
        StatusCode::NOT_FOUND
    );
}
