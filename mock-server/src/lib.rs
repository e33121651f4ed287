use std::{collections::BTreeMap, time::Duration};

use axum::{
    body::Bytes,
    extract::{Multipart, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// How long the `/pets/slow` handlers sleep before answering.
pub const SLOW_DELAY: Duration = Duration::from_millis(1100);

pub const BEARER_TOKEN: &str = "let-the-bear-in";
pub const BASIC_USER: &str = "emu";
pub const BASIC_PASSWORD: &str = "wars";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
}

impl Pet {
    fn named(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

/// What the server saw of an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInfo {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

pub fn app() -> Router {
    Router::new().nest("/api/v1", api())
}

fn api() -> Router {
    Router::new()
        .route("/str", get(get_str))
        .route("/bytes", get(get_bytes))
        .route("/int", get(get_int))
        .route("/json_int", get(get_json_int))
        .route("/json_str", get(get_json_str))
        .route("/vnd_json", get(get_vnd_json))
        .route("/latin1", get(get_latin1))
        .route("/query", get(get_query))
        .route("/echo", post(echo).put(echo))
        .route("/upload_info", post(upload_info))
        .route("/bearer_protected_str", get(bearer_protected_str))
        .route("/basic_protected_str", get(basic_protected_str))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/_from_form", post(create_pet_from_form))
        .route("/pets/1", get(get_pet).put(update_pet).delete(delete_pet))
        .route("/pets/2", get(missing_pet))
        .route(
            "/pets/slow",
            get(slow_pet).post(slow_pet).put(slow_pet).delete(slow_pet),
        )
        .route("/pets/1/photo", post(set_pet_photo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_str() -> &'static str {
    "boo"
}

async fn get_bytes() -> &'static [u8] {
    b"bin-boo"
}

async fn get_int() -> &'static str {
    "1"
}

async fn get_json_int() -> Json<i64> {
    Json(1)
}

async fn get_json_str() -> Json<&'static str> {
    Json("boo")
}

async fn get_vnd_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/vnd.api+json")],
        r#"{"name":"foo"}"#,
    )
}

async fn get_latin1() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=iso-8859-1")],
        &b"caf\xe9"[..],
    )
}

async fn get_query(
    Query(params): Query<BTreeMap<String, String>>,
) -> Json<BTreeMap<String, String>> {
    Json(params)
}

/// Reply with the request body and its content type.
async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.into_response();
    match headers.get(header::CONTENT_TYPE) {
        Some(content_type) => {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, content_type.clone());
        }
        None => {
            response.headers_mut().remove(header::CONTENT_TYPE);
        }
    }
    response
}

async fn upload_info(mut multipart: Multipart) -> Result<Json<UploadInfo>, StatusCode> {
    let field = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
        .ok_or(StatusCode::BAD_REQUEST)?;
    let name = field.name().unwrap_or_default().to_string();
    let file_name = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(Json(UploadInfo {
        field: name,
        file_name,
        content_type,
        size: data.len(),
    }))
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

async fn bearer_protected_str(headers: HeaderMap) -> Result<&'static str, StatusCode> {
    match authorization(&headers) {
        Some(auth) if auth == format!("Bearer {BEARER_TOKEN}") => Ok("you have made it through"),
        _ => Err(StatusCode::FORBIDDEN),
    }
}

async fn basic_protected_str(headers: HeaderMap) -> Result<&'static str, StatusCode> {
    let encoded = authorization(&headers)
        .and_then(|auth| auth.strip_prefix("Basic "))
        .ok_or(StatusCode::FORBIDDEN)?;
    let decoded = STANDARD
        .decode(encoded)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    if decoded == format!("{BASIC_USER}:{BASIC_PASSWORD}").as_bytes() {
        Ok("you have made it through")
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

async fn list_pets() -> Json<Vec<Pet>> {
    Json(vec![Pet::named("foo"), Pet::named("bar")])
}

async fn create_pet(Json(input): Json<Pet>) -> Json<Pet> {
    Json(input)
}

async fn create_pet_from_form(Form(input): Form<Pet>) -> Json<Pet> {
    Json(input)
}

async fn get_pet() -> Json<Pet> {
    Json(Pet::named("foo"))
}

async fn update_pet(Json(input): Json<Pet>) -> Json<Pet> {
    Json(input)
}

async fn delete_pet() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn missing_pet() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "No such pet")
}

async fn slow_pet() -> Json<Pet> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(Pet::named("slow"))
}

/// Reply with the content of the `photo` file field as text.
async fn set_pet_photo(mut multipart: Multipart) -> Result<String, StatusCode> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        if field.name() == Some("photo") {
            let data = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            return Ok(String::from_utf8_lossy(&data).into_owned());
        }
    }
    Err(StatusCode::BAD_REQUEST)
}
