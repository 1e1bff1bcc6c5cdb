//! In-memory stand-in for the slice of the WordPress REST API that
//! `wprest-core` talks to: JWT login, posts, pages, categories, tags and
//! media uploads.
//!
//! Tokens are random UUIDs issued per login. Every `/wp/v2` route requires
//! one. Error bodies use WordPress's `{code, message, data: {status}}` shape.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "correct horse";

/// In-memory site content. Ids are shared across all object types, as in
/// WordPress's `wp_posts` table.
#[derive(Debug)]
pub struct Site {
    next_id: u64,
    tokens: HashSet<String>,
    posts: BTreeMap<u64, Value>,
    pages: BTreeMap<u64, Value>,
    categories: BTreeMap<u64, Value>,
    tags: BTreeMap<u64, Value>,
    media: BTreeMap<u64, Value>,
}

impl Default for Site {
    fn default() -> Self {
        let mut site = Site {
            next_id: 1,
            tokens: HashSet::new(),
            posts: BTreeMap::new(),
            pages: BTreeMap::new(),
            categories: BTreeMap::new(),
            tags: BTreeMap::new(),
            media: BTreeMap::new(),
        };
        let id = site.allocate_id();
        site.categories.insert(id, term(id, "category", "Uncategorized", "uncategorized", ""));
        let id = site.allocate_id();
        site.pages.insert(
            id,
            json!({
                "id": id,
                "type": "page",
                "slug": "sample-page",
                "status": "publish",
                "title": {"rendered": "Sample Page"},
                "content": {"rendered": "<p>This is an example page.</p>\n", "protected": false},
            }),
        );
        site
    }
}

impl Site {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

pub type Db = Arc<RwLock<Site>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Site::default()));

    let api = Router::new()
        .route("/wp/v2/posts", get(list_posts).post(create_post))
        .route("/wp/v2/posts/{id}", post(update_post))
        .route("/wp/v2/pages", get(list_pages))
        .route("/wp/v2/categories", get(list_categories).post(create_category))
        .route("/wp/v2/tags", get(list_tags).post(create_tag))
        .route("/wp/v2/media", post(create_media))
        .route_layer(middleware::from_fn_with_state(db.clone(), require_token));

    Router::new()
        .route("/jwt-auth/v1/token", post(issue_token))
        .merge(api)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock WordPress API listening");
    }
    axum::serve(listener, app()).await
}

/// WordPress-style error response.
fn rest_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"code": code, "message": message, "data": {"status": status.as_u16()}})),
    )
        .into_response()
}

/// WordPress escapes term names on save.
fn escape_name(name: &str) -> String {
    name.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn term(id: u64, taxonomy: &str, name: &str, slug: &str, description: &str) -> Value {
    let mut value = json!({
        "id": id,
        "count": 0,
        "description": description,
        "name": name,
        "slug": slug,
        "taxonomy": taxonomy,
        "meta": [],
    });
    if taxonomy == "category" {
        value["parent"] = json!(0);
    }
    value
}

async fn require_token(State(db): State<Db>, request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);
    let authorized = match token {
        Some(token) => db.read().await.tokens.contains(&token),
        None => false,
    };
    if !authorized {
        debug!(path = %request.uri().path(), "rejecting request without a valid token");
        return rest_error(
            StatusCode::UNAUTHORIZED,
            "rest_not_logged_in",
            "You are not currently logged in.",
        );
    }
    next.run(request).await
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

async fn issue_token(State(db): State<Db>, Form(credentials): Form<Credentials>) -> Response {
    if credentials.username != USERNAME {
        return rest_error(
            StatusCode::FORBIDDEN,
            "[jwt_auth] invalid_username",
            "Unknown username. Check again or try your email address.",
        );
    }
    if credentials.password != PASSWORD {
        return rest_error(
            StatusCode::FORBIDDEN,
            "[jwt_auth] incorrect_password",
            "The password you entered for the username is incorrect.",
        );
    }
    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.insert(token.clone());
    Json(json!({
        "token": token,
        "user_email": "admin@example.com",
        "user_nicename": USERNAME,
        "user_display_name": USERNAME,
    }))
    .into_response()
}

/// Newest first, matching WordPress's default ordering.
fn newest_first(items: &BTreeMap<u64, Value>) -> Json<Vec<Value>> {
    Json(items.values().rev().cloned().collect())
}

async fn list_posts(State(db): State<Db>) -> Json<Vec<Value>> {
    newest_first(&db.read().await.posts)
}

async fn list_pages(State(db): State<Db>) -> Json<Vec<Value>> {
    newest_first(&db.read().await.pages)
}

#[derive(Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub categories: Option<Vec<u64>>,
    pub tags: Option<Vec<u64>>,
    pub featured_media: Option<u64>,
}

fn apply_post_input(post: &mut Value, input: PostInput) {
    if let Some(title) = input.title {
        post["slug"] = json!(slugify(&title));
        post["title"] = json!({"raw": title, "rendered": title});
    }
    if let Some(content) = input.content {
        post["content"] = json!({"raw": content, "rendered": content, "protected": false});
    }
    if let Some(status) = input.status {
        post["status"] = json!(status);
    }
    if let Some(categories) = input.categories {
        post["categories"] = json!(categories);
    }
    if let Some(tags) = input.tags {
        post["tags"] = json!(tags);
    }
    if let Some(featured_media) = input.featured_media {
        post["featured_media"] = json!(featured_media);
    }
}

async fn create_post(State(db): State<Db>, Json(input): Json<PostInput>) -> Response {
    let mut site = db.write().await;
    let id = site.allocate_id();
    let mut post = json!({
        "id": id,
        "type": "post",
        "slug": "",
        "status": "draft",
        "title": {"raw": "", "rendered": ""},
        "content": {"raw": "", "rendered": "", "protected": false},
        "categories": [1],
        "tags": [],
        "featured_media": 0,
    });
    apply_post_input(&mut post, input);
    site.posts.insert(id, post.clone());
    (StatusCode::CREATED, Json(post)).into_response()
}

/// Applies the update and answers `204 No Content`.
async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<PostInput>,
) -> Response {
    let mut site = db.write().await;
    let Some(post) = site.posts.get_mut(&id) else {
        return rest_error(StatusCode::NOT_FOUND, "rest_post_invalid_id", "Invalid post ID.");
    };
    apply_post_input(post, input);
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Deserialize)]
pub struct TermFilter {
    pub slug: Option<String>,
}

#[derive(Deserialize)]
pub struct TermInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Copy)]
enum Taxonomy {
    Category,
    Tag,
}

impl Taxonomy {
    fn name(self) -> &'static str {
        match self {
            Taxonomy::Category => "category",
            Taxonomy::Tag => "post_tag",
        }
    }

    fn terms(self, site: &Site) -> &BTreeMap<u64, Value> {
        match self {
            Taxonomy::Category => &site.categories,
            Taxonomy::Tag => &site.tags,
        }
    }

    fn terms_mut(self, site: &mut Site) -> &mut BTreeMap<u64, Value> {
        match self {
            Taxonomy::Category => &mut site.categories,
            Taxonomy::Tag => &mut site.tags,
        }
    }
}

async fn list_terms(db: &Db, taxonomy: Taxonomy, filter: TermFilter) -> Json<Vec<Value>> {
    let site = db.read().await;
    let terms = taxonomy
        .terms(&site)
        .values()
        .filter(|term| match &filter.slug {
            Some(slug) => term["slug"] == slug.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    Json(terms)
}

async fn create_term(db: &Db, taxonomy: Taxonomy, input: TermInput) -> Response {
    let Some(name) = input.name.filter(|name| !name.trim().is_empty()) else {
        return rest_error(
            StatusCode::BAD_REQUEST,
            "rest_missing_callback_param",
            "Missing parameter(s): name",
        );
    };
    let slug = input
        .slug
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| slugify(&name));
    let stored_name = escape_name(&name);

    let mut site = db.write().await;
    let existing = taxonomy
        .terms(&site)
        .values()
        .find(|term| term["slug"] == slug.as_str() || term["name"] == stored_name.as_str())
        .and_then(|term| term["id"].as_u64());
    if let Some(term_id) = existing {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "term_exists",
                "message": "A term with the name provided already exists with this parent.",
                "data": {"status": 400, "term_id": term_id},
            })),
        )
            .into_response();
    }

    let id = site.allocate_id();
    let value = term(id, taxonomy.name(), &stored_name, &slug, &input.description);
    taxonomy.terms_mut(&mut site).insert(id, value.clone());
    (StatusCode::CREATED, Json(value)).into_response()
}

async fn list_categories(State(db): State<Db>, Query(filter): Query<TermFilter>) -> Json<Vec<Value>> {
    list_terms(&db, Taxonomy::Category, filter).await
}

async fn create_category(State(db): State<Db>, Json(input): Json<TermInput>) -> Response {
    create_term(&db, Taxonomy::Category, input).await
}

async fn list_tags(State(db): State<Db>, Query(filter): Query<TermFilter>) -> Json<Vec<Value>> {
    list_terms(&db, Taxonomy::Tag, filter).await
}

async fn create_tag(State(db): State<Db>, Json(input): Json<TermInput>) -> Response {
    create_term(&db, Taxonomy::Tag, input).await
}

/// Pull `filename=...` out of a `Content-Disposition` header value.
fn disposition_filename(value: &str) -> Option<&str> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .filter(|name| !name.is_empty())
}

async fn create_media(State(db): State<Db>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(filename) = headers
        .get(header::CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(disposition_filename)
        .map(str::to_string)
    else {
        return rest_error(
            StatusCode::BAD_REQUEST,
            "rest_upload_no_content_disposition",
            "No Content-Disposition supplied.",
        );
    };
    if body.is_empty() {
        return rest_error(StatusCode::BAD_REQUEST, "rest_upload_no_data", "No data supplied.");
    }
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let media_type = if mime_type.starts_with("image/") { "image" } else { "file" };

    let mut site = db.write().await;
    let id = site.allocate_id();
    let media = json!({
        "id": id,
        "type": "attachment",
        "slug": slugify(&filename),
        "title": {"rendered": filename},
        "media_type": media_type,
        "mime_type": mime_type,
        "source_url": format!("http://localhost/wp-content/uploads/{filename}"),
        "media_details": {"filesize": body.len()},
    });
    site.media.insert(id, media.clone());
    (StatusCode::CREATED, Json(media)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_name_matches_wordpress() {
        assert_eq!(escape_name("A & B"), "A &amp; B");
        assert_eq!(escape_name("<b>\"it's\"</b>"), "&lt;b&gt;&quot;it&#039;s&quot;&lt;/b&gt;");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Rust & Go: Systems!"), "rust-go-systems");
        assert_eq!(slugify("photo.jpg"), "photo-jpg");
    }

    #[test]
    fn disposition_filename_variants() {
        assert_eq!(disposition_filename("form-data; filename=photo.jpg"), Some("photo.jpg"));
        assert_eq!(disposition_filename("attachment; filename=\"a b.png\""), Some("a b.png"));
        assert_eq!(disposition_filename("form-data"), None);
    }

    #[test]
    fn default_site_is_seeded() {
        let site = Site::default();
        assert_eq!(site.categories[&1]["slug"], "uncategorized");
        assert_eq!(site.pages.len(), 1);
        assert_eq!(site.next_id, 3);
    }

    #[test]
    fn category_terms_have_parent() {
        assert_eq!(term(5, "category", "News", "news", "")["parent"], 0);
        assert!(term(6, "post_tag", "News", "news", "").get("parent").is_none());
    }
}
