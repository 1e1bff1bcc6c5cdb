//! Resource entities for the WordPress REST API.
//!
//! # Design
//! Each entity is the request body sent to the API and the result of
//! `build`, which maps a decoded response onto a fresh instance. Fields are
//! private with accessors. The wire names are pinned with serde attributes,
//! and unset fields are omitted from the serialized body, so the server
//! only sees what the caller set.
//!
//! `id` is assigned by the server. Entities built locally start without one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// A post as sent to `wp/v2/posts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Post {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    featured_media: Option<u64>,
}

impl Post {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = Some(content.into());
    }

    /// Publication status: `publish`, `draft`, `pending`, `private`, `future`.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn categories(&self) -> &[u64] {
        self.categories.as_deref().unwrap_or(&[])
    }

    /// Replaces the category ids. An empty list is still sent, which clears
    /// the post's categories on update.
    pub fn set_categories(&mut self, categories: Vec<u64>) {
        self.categories = Some(categories);
    }

    pub fn tags(&self) -> &[u64] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn set_tags(&mut self, tags: Vec<u64>) {
        self.tags = Some(tags);
    }

    pub fn featured_media(&self) -> Option<u64> {
        self.featured_media
    }

    pub fn set_featured_media(&mut self, media_id: u64) {
        self.featured_media = Some(media_id);
    }

    /// Serialize to the JSON request body.
    pub fn to_json(&self) -> Result<Value, ApiError> {
        serde_json::to_value(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Build a post from a decoded `wp/v2/posts` response object.
    ///
    /// `id`, `title` and `status` are required. `title` and `content` may be
    /// plain strings or the server's `{"raw": ..., "rendered": ...}` objects;
    /// `raw` wins when both are present.
    pub fn build(value: &Value) -> Result<Self, ApiError> {
        let record: PostRecord = decode(value, "post")?;
        let title = record.title.into_text().ok_or_else(|| {
            ApiError::MalformedResponse("post title has neither raw nor rendered text".to_string())
        })?;
        Ok(Self {
            id: Some(record.id),
            title: Some(title),
            content: record.content.and_then(RenderedText::into_text),
            status: Some(record.status),
            categories: Some(record.categories),
            tags: Some(record.tags),
            featured_media: record.featured_media.filter(|id| *id != 0),
        })
    }
}

/// A category as sent to `wp/v2/categories`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = Some(slug.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn to_json(&self) -> Result<Value, ApiError> {
        serde_json::to_value(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Build a category from a decoded response object. Requires `id`,
    /// `name`, `slug` and `description`.
    pub fn build(value: &Value) -> Result<Self, ApiError> {
        let record: TermRecord = decode(value, "category")?;
        Ok(Self {
            id: Some(record.id),
            name: Some(record.name),
            slug: Some(record.slug),
            description: Some(record.description),
        })
    }
}

/// A tag as sent to `wp/v2/tags`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tag {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<Value>,
}

impl Tag {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            slug: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = Some(slug.into());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Registered term meta. Sent as-is; the server rejects unknown keys.
    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    pub fn set_meta(&mut self, meta: Value) {
        self.meta = Some(meta);
    }

    pub fn to_json(&self) -> Result<Value, ApiError> {
        serde_json::to_value(self).map_err(|e| ApiError::Serialization(e.to_string()))
    }

    /// Build a tag from a decoded response object. Requires `id`, `name`,
    /// `slug` and `description`; `meta` is not carried over.
    pub fn build(value: &Value) -> Result<Self, ApiError> {
        let record: TermRecord = decode(value, "tag")?;
        Ok(Self {
            id: Some(record.id),
            name: Some(record.name),
            slug: Some(record.slug),
            description: Some(record.description),
            meta: None,
        })
    }
}

/// Shape shared by category and tag responses.
#[derive(Deserialize)]
struct TermRecord {
    id: u64,
    name: String,
    slug: String,
    description: String,
}

#[derive(Deserialize)]
struct PostRecord {
    id: u64,
    title: RenderedText,
    #[serde(default)]
    content: Option<RenderedText>,
    status: String,
    #[serde(default)]
    categories: Vec<u64>,
    #[serde(default)]
    tags: Vec<u64>,
    #[serde(default)]
    featured_media: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RenderedText {
    Plain(String),
    Object {
        #[serde(default)]
        raw: Option<String>,
        #[serde(default)]
        rendered: Option<String>,
    },
}

impl RenderedText {
    fn into_text(self) -> Option<String> {
        match self {
            RenderedText::Plain(text) => Some(text),
            RenderedText::Object { raw, rendered } => raw.or(rendered),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value, what: &str) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::MalformedResponse(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tag_build_then_serialize_keeps_fields() {
        let response = json!({
            "id": 12,
            "count": 3,
            "name": "Rust &amp; Go",
            "slug": "rust-go",
            "description": "Systems languages",
            "taxonomy": "post_tag",
            "meta": []
        });
        let tag = Tag::build(&response).unwrap();
        assert_eq!(
            tag.to_json().unwrap(),
            json!({
                "id": 12,
                "name": "Rust &amp; Go",
                "slug": "rust-go",
                "description": "Systems languages"
            })
        );
    }

    #[test]
    fn category_build_then_serialize_keeps_fields() {
        let response = json!({"id": 1, "name": "News", "slug": "news", "description": "", "parent": 0});
        let category = Category::build(&response).unwrap();
        assert_eq!(category.id(), Some(1));
        assert_eq!(
            category.to_json().unwrap(),
            json!({"id": 1, "name": "News", "slug": "news", "description": ""})
        );
    }

    #[test]
    fn tag_build_missing_slug_fails() {
        let err = Tag::build(&json!({"id": 4, "name": "x", "description": ""})).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(msg) if msg.contains("slug")));
    }

    #[test]
    fn category_build_rejects_non_object() {
        let err = Category::build(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[test]
    fn new_tag_serializes_only_set_fields() {
        let mut tag = Tag::new("Release", "release");
        assert_eq!(tag.to_json().unwrap(), json!({"name": "Release", "slug": "release"}));

        tag.set_meta(json!({"color": "red"}));
        tag.set_description("Shipping news");
        assert_eq!(
            tag.to_json().unwrap(),
            json!({
                "name": "Release",
                "slug": "release",
                "description": "Shipping news",
                "meta": {"color": "red"}
            })
        );
    }

    #[test]
    fn empty_post_serializes_to_empty_object() {
        assert_eq!(Post::new().to_json().unwrap(), json!({}));
    }

    #[test]
    fn post_setters_feed_serialization() {
        let mut post = Post::new();
        post.set_title("Hello");
        post.set_content("<p>Body</p>");
        post.set_status("draft");
        post.set_categories(vec![1, 5]);
        post.set_tags(Vec::new());
        post.set_featured_media(77);
        assert_eq!(
            post.to_json().unwrap(),
            json!({
                "title": "Hello",
                "content": "<p>Body</p>",
                "status": "draft",
                "categories": [1, 5],
                "tags": [],
                "featured_media": 77
            })
        );
        assert_eq!(post.categories(), &[1, 5]);
        assert!(post.tags().is_empty());
    }

    #[test]
    fn post_build_reads_rendered_objects() {
        let response = json!({
            "id": 42,
            "status": "publish",
            "title": {"rendered": "Hello &#8211; world"},
            "content": {"rendered": "<p>Body</p>\n", "protected": false},
            "categories": [1],
            "tags": [3, 4],
            "featured_media": 0
        });
        let post = Post::build(&response).unwrap();
        assert_eq!(post.id(), Some(42));
        assert_eq!(post.title(), Some("Hello &#8211; world"));
        assert_eq!(post.content(), Some("<p>Body</p>\n"));
        assert_eq!(post.status(), Some("publish"));
        assert_eq!(post.tags(), &[3, 4]);
        assert_eq!(post.featured_media(), None);
    }

    #[test]
    fn post_build_prefers_raw_title() {
        let response = json!({
            "id": 7,
            "status": "draft",
            "title": {"raw": "A & B", "rendered": "A &amp; B"}
        });
        let post = Post::build(&response).unwrap();
        assert_eq!(post.title(), Some("A & B"));
        assert!(post.content().is_none());
    }

    #[test]
    fn post_build_requires_id() {
        let err = Post::build(&json!({"status": "draft", "title": "x"})).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(msg) if msg.contains("id")));
    }
}
