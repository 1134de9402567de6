//! Blog posts written from the admin panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bagworks_core::BlogPostId;

use super::{ValidationError, require_text};
use crate::store::Record;

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    /// URL slug, derived from the title when not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Unpublished posts are only visible to admins.
    #[serde(default = "default_published")]
    pub published: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_published() -> bool {
    true
}

impl Record for BlogPost {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Payload for creating a blog post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    #[serde(default)]
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
    pub author: Option<String>,
    pub published: Option<bool>,
}

impl NewBlogPost {
    /// Validate the payload and build the stored post.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the title is blank.
    pub fn into_post(
        self,
        id: BlogPostId,
        now: DateTime<Utc>,
    ) -> Result<BlogPost, ValidationError> {
        let title = require_text("title", &self.title)?;
        let slug = self
            .slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&title));

        Ok(BlogPost {
            id,
            title,
            slug: Some(slug),
            excerpt: self.excerpt,
            content: self.content,
            image: self.image,
            author: self.author,
            published: self.published.unwrap_or(true),
            created_at: now,
            updated_at: None,
        })
    }
}

/// Partial update for a blog post. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub author: Option<String>,
    pub published: Option<bool>,
}

impl BlogPostUpdate {
    /// Check the provided fields before touching storage.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank title.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        Ok(())
    }

    /// Overwrite the provided fields and stamp `updatedAt`.
    pub fn apply(self, post: &mut BlogPost, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title.trim().to_string();
        }
        if let Some(slug) = self.slug {
            post.slug = Some(slugify(&slug));
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(image) = self.image {
            post.image = Some(image);
        }
        if let Some(author) = self.author {
            post.author = Some(author);
        }
        if let Some(published) = self.published {
            post.published = published;
        }
        post.updated_at = Some(now);
    }
}

/// Lower-case ASCII slug with single dashes between words.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
