use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::block::Block;

/// Publication state of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Section of the site a page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageCategory {
    #[default]
    General,
    Academics,
    Admissions,
    StudentLife,
    Athletics,
    About,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub meta_keywords: Vec<String>,
}

/// A page document, read and written wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: PageCategory,
    #[serde(default)]
    pub status: PageStatus,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub seo: Seo,
    /// Whether the slug was chosen explicitly and must no longer follow the
    /// title. Stored pages load locked.
    #[serde(skip, default = "slug_locked_on_load")]
    slug_locked: bool,
}

fn slug_locked_on_load() -> bool {
    true
}

/// Equality covers the stored document only, not the editing state of the
/// slug.
impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.slug == other.slug
            && self.description == other.description
            && self.category == other.category
            && self.status == other.status
            && self.blocks == other.blocks
            && self.seo == other.seo
    }
}

impl Page {
    /// A new draft page whose slug follows its title.
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: None,
            slug: slugify(&title),
            title,
            description: String::new(),
            category: PageCategory::default(),
            status: PageStatus::default(),
            blocks: Vec::new(),
            seo: Seo::default(),
            slug_locked: false,
        }
    }

    /// Change the title, re-deriving the slug unless it has been set by hand.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if !self.slug_locked() {
            self.slug = slugify(&self.title);
        }
    }

    /// Set the slug explicitly; it no longer follows the title.
    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.slug_locked = true;
    }

    pub fn slug_locked(&self) -> bool {
        self.slug_locked && !self.slug.is_empty()
    }
}

/// Derive a URL slug: lowercase, runs of anything but `[a-z0-9]` become one
/// `-`, no leading or trailing `-`.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));
    re.replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}
