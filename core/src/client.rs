//! Authenticated client for the WordPress REST API.
//!
//! # Design
//! `WpClient` holds the base URL, the bearer token obtained at construction
//! and a `Transport`. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`; the public operation methods glue the two together around
//! one `Transport::execute` call. Apart from the find-or-create slug locks,
//! nothing on the client changes after construction.

use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::escape::escape_html;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::slug_lock::SlugLocks;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Category, Post, Tag};

const AUTHENTICATE_PATH: &str = "jwt-auth/v1/token";
const POSTS_PATH: &str = "wp/v2/posts";
const POST_PATH: &str = "wp/v2/posts/{id}";
const PAGES_PATH: &str = "wp/v2/pages";
const CATEGORIES_PATH: &str = "wp/v2/categories";
const TAGS_PATH: &str = "wp/v2/tags";
const MEDIA_PATH: &str = "wp/v2/media";

/// Build the credential exchange request for `config`.
///
/// Credentials are sent as an `application/x-www-form-urlencoded` body.
pub fn build_authenticate(config: &Config) -> HttpRequest {
    let body = format!(
        "username={}&password={}",
        urlencoding::encode(&config.username),
        urlencoding::encode(&config.password)
    );
    HttpRequest::new(HttpMethod::Post, join_url(config.base_url(), AUTHENTICATE_PATH))
        .with_header("content-type", "application/x-www-form-urlencoded")
        .with_body(body.into_bytes())
}

/// Extract the bearer token from the credential exchange response.
pub fn parse_authenticate(response: HttpResponse) -> Result<String, ApiError> {
    if !response.is_success() {
        let message = remote_message(&response.body).unwrap_or(response.body);
        return Err(ApiError::Authentication {
            status: Some(response.status),
            message,
        });
    }
    let body: Value = serde_json::from_str(&response.body).map_err(|e| ApiError::Authentication {
        status: Some(response.status),
        message: format!("token response is not JSON: {e}"),
    })?;
    body.get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Authentication {
            status: Some(response.status),
            message: "response carried no token".to_string(),
        })
}

/// Client for one WordPress site, authenticated as one account.
///
/// Obtain one with [`WpClient::connect`] (blocking HTTP via `ureq`) or
/// [`WpClient::with_transport`]. Both fail with `ApiError::Authentication`
/// when the credentials are rejected, so a `WpClient` always carries a token.
///
/// The token is never refreshed; once the server starts rejecting it every
/// operation returns `ApiError::UnexpectedStatus` with status 401 or 403.
pub struct WpClient<T = UreqTransport> {
    base_url: String,
    token: String,
    transport: T,
    slug_locks: SlugLocks,
}

impl WpClient<UreqTransport> {
    /// Authenticate against `config.endpoint` over HTTP.
    pub fn connect(config: &Config) -> Result<Self, ApiError> {
        Self::with_transport(config, UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> WpClient<T> {
    /// Authenticate through `transport` and keep it for later calls.
    pub fn with_transport(config: &Config, transport: T) -> Result<Self, ApiError> {
        let request = build_authenticate(config);
        let response = transport.execute(&request)?;
        let token = parse_authenticate(response).inspect_err(|e| {
            warn!(endpoint = %config.base_url(), username = %config.username, error = %e, "authentication failed");
        })?;
        info!(endpoint = %config.base_url(), username = %config.username, "authenticated");

        Ok(Self {
            base_url: config.base_url().to_string(),
            token,
            transport,
            slug_locks: SlugLocks::default(),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn list_posts(&self) -> Result<Vec<Value>, ApiError> {
        self.parse_list(self.send(&self.build_list_posts())?)
    }

    pub fn list_pages(&self) -> Result<Vec<Value>, ApiError> {
        self.parse_list(self.send(&self.build_list_pages())?)
    }

    pub fn list_categories(&self) -> Result<Vec<Value>, ApiError> {
        self.parse_list(self.send(&self.build_list_categories())?)
    }

    pub fn list_tags(&self) -> Result<Vec<Value>, ApiError> {
        self.parse_list(self.send(&self.build_list_tags())?)
    }

    /// Upload the file at `path` as a media item named `filename`.
    pub fn create_media(&self, filename: &str, path: impl AsRef<Path>) -> Result<Value, ApiError> {
        let request = self.build_create_media(filename, path)?;
        self.parse_create_media(self.send(&request)?)
    }

    pub fn create_post(&self, post: &Post) -> Result<Value, ApiError> {
        let request = self.build_create_post(post)?;
        self.parse_create_post(self.send(&request)?)
    }

    /// Send `post` to its resource URL. The post must carry an id.
    ///
    /// Succeeds only on `204 No Content`; the decoded body is returned when
    /// the server sends one anyway.
    pub fn update_post(&self, post: &Post) -> Result<Option<Value>, ApiError> {
        let request = self.build_update_post(post)?;
        self.parse_update_post(self.send(&request)?)
    }

    pub fn create_category(&self, category: &Category) -> Result<Category, ApiError> {
        let request = self.build_create_category(category)?;
        self.parse_create_category(self.send(&request)?)
    }

    /// Return the remote category with the same slug and name, creating it
    /// when there is none.
    ///
    /// Remote names are stored HTML-escaped, so the local name is escaped
    /// before comparing. Calls for the same slug on this client are
    /// serialized; concurrent callers on other clients may still create
    /// duplicates.
    pub fn find_category_or_create(&self, category: &Category) -> Result<Category, ApiError> {
        self.find_term_or_create(category, |c| self.create_category(c))
    }

    pub fn create_tag(&self, tag: &Tag) -> Result<Tag, ApiError> {
        let request = self.build_create_tag(tag)?;
        self.parse_create_tag(self.send(&request)?)
    }

    /// Tag counterpart of [`WpClient::find_category_or_create`].
    pub fn find_tag_or_create(&self, tag: &Tag) -> Result<Tag, ApiError> {
        self.find_term_or_create(tag, |t| self.create_tag(t))
    }

    fn find_term_or_create<E: Term>(
        &self,
        term: &E,
        create: impl FnOnce(&E) -> Result<E, ApiError>,
    ) -> Result<E, ApiError> {
        let Some(slug) = term.slug() else {
            debug!(collection = E::COLLECTION, "no slug to look up, creating");
            return create(term);
        };

        self.slug_locks.with_lock(E::COLLECTION, slug, || {
            let matches = self.parse_list(self.send(&self.build_term_lookup(E::COLLECTION, slug))?)?;
            if let Some(first) = matches.first() {
                let remote_name = first.get("name").and_then(Value::as_str);
                let wanted = term.name().map(escape_html);
                if remote_name.is_some() && remote_name == wanted.as_deref() {
                    debug!(collection = E::COLLECTION, slug, "found existing term");
                    return E::build(first);
                }
                debug!(collection = E::COLLECTION, slug, ?remote_name, "slug taken by a differently named term");
            }
            create(term)
        })
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request)
    }
}

impl<T> WpClient<T> {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_posts(&self) -> HttpRequest {
        self.authorized(HttpMethod::Get, POSTS_PATH)
    }

    pub fn build_list_pages(&self) -> HttpRequest {
        self.authorized(HttpMethod::Get, PAGES_PATH)
    }

    pub fn build_list_categories(&self) -> HttpRequest {
        self.authorized(HttpMethod::Get, CATEGORIES_PATH)
    }

    pub fn build_list_tags(&self) -> HttpRequest {
        self.authorized(HttpMethod::Get, TAGS_PATH)
    }

    /// Read the file at `path` and build the raw-body upload request.
    ///
    /// The content type is guessed from the file extension, falling back to
    /// `application/octet-stream`.
    pub fn build_create_media(&self, filename: &str, path: impl AsRef<Path>) -> Result<HttpRequest, ApiError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        Ok(self
            .authorized(HttpMethod::Post, MEDIA_PATH)
            .with_header("content-disposition", format!("form-data; filename={filename}"))
            .with_header("content-type", mime.to_string())
            .with_body(bytes))
    }

    pub fn build_create_post(&self, post: &Post) -> Result<HttpRequest, ApiError> {
        self.json_request(POSTS_PATH, post)
    }

    pub fn build_update_post(&self, post: &Post) -> Result<HttpRequest, ApiError> {
        let id = post
            .id()
            .ok_or_else(|| ApiError::InvalidInput("cannot update a post without an id".to_string()))?;
        self.json_request(&POST_PATH.replacen("{id}", &id.to_string(), 1), post)
    }

    pub fn build_create_category(&self, category: &Category) -> Result<HttpRequest, ApiError> {
        self.json_request(CATEGORIES_PATH, category)
    }

    pub fn build_create_tag(&self, tag: &Tag) -> Result<HttpRequest, ApiError> {
        self.json_request(TAGS_PATH, tag)
    }

    /// Decode a `200 OK` list response.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Value>, ApiError> {
        check_status(&response, 200)?;
        decode_json(&response.body)
    }

    pub fn parse_create_media(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response, 201)?;
        decode_json(&response.body)
    }

    pub fn parse_create_post(&self, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(&response, 201)?;
        decode_json(&response.body)
    }

    pub fn parse_update_post(&self, response: HttpResponse) -> Result<Option<Value>, ApiError> {
        check_status(&response, 204)?;
        if response.body.trim().is_empty() {
            return Ok(None);
        }
        decode_json(&response.body).map(Some)
    }

    pub fn parse_create_category(&self, response: HttpResponse) -> Result<Category, ApiError> {
        check_status(&response, 201)?;
        Category::build(&decode_json(&response.body)?)
    }

    pub fn parse_create_tag(&self, response: HttpResponse) -> Result<Tag, ApiError> {
        check_status(&response, 201)?;
        Tag::build(&decode_json(&response.body)?)
    }

    fn build_term_lookup(&self, collection: &str, slug: &str) -> HttpRequest {
        self.authorized(HttpMethod::Get, collection).with_query("slug", slug)
    }

    fn authorized(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, join_url(&self.base_url, path))
            .with_header("authorization", format!("Bearer {}", self.token))
    }

    fn json_request(&self, path: &str, body: &impl Serialize) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self
            .authorized(HttpMethod::Post, path)
            .with_header("content-type", "application/json")
            .with_body(body))
    }
}

impl<T> fmt::Debug for WpClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WpClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Taxonomy entities that support find-or-create.
trait Term: Sized {
    const COLLECTION: &'static str;

    fn name(&self) -> Option<&str>;
    fn slug(&self) -> Option<&str>;
    fn build(value: &Value) -> Result<Self, ApiError>;
}

impl Term for Category {
    const COLLECTION: &'static str = CATEGORIES_PATH;

    fn name(&self) -> Option<&str> {
        Category::name(self)
    }

    fn slug(&self) -> Option<&str> {
        Category::slug(self)
    }

    fn build(value: &Value) -> Result<Self, ApiError> {
        Category::build(value)
    }
}

impl Term for Tag {
    const COLLECTION: &'static str = TAGS_PATH;

    fn name(&self) -> Option<&str> {
        Tag::name(self)
    }

    fn slug(&self) -> Option<&str> {
        Tag::slug(self)
    }

    fn build(value: &Value) -> Result<Self, ApiError> {
        Tag::build(value)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{base_url}/{path}")
}

/// Map any status other than `expected` to `UnexpectedStatus`.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    warn!(status = response.status, expected, "unexpected response status");
    Err(ApiError::UnexpectedStatus {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

/// The `message` field of a WordPress error envelope.
fn remote_message(body: &str) -> Option<String> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    envelope.get("message")?.as_str().map(str::to_string)
}
