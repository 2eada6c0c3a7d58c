use crate::models::{Page, slugify};
use relative_path::{RelativePath, RelativePathBuf};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("Page not found: {0}")]
    NotFound(String),
    #[error("Page already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid slug: {0:?}")]
    InvalidSlug(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid pages directory: {0}")]
    InvalidPagesDir(String),
}

/// Whole-document storage of pages, keyed by slug. Last writer wins.
pub trait PageRepository {
    fn get(&self, slug: &str) -> Result<Page, IoError>;
    /// Store `page`, replacing any page with the same slug.
    fn put(&self, page: &Page) -> Result<(), IoError>;
    /// Store a page that must not exist yet.
    fn create(&self, page: &Page) -> Result<(), IoError>;
    /// Slugs of all stored pages, sorted.
    fn list(&self) -> Result<Vec<String>, IoError>;
}

/// Pages as pretty-printed `<slug>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct FilePageStore {
    root: PathBuf,
}

impl FilePageStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        validate_pages_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn page_path(&self, slug: &str) -> Result<RelativePathBuf, IoError> {
        if slug.is_empty() || slugify(slug) != slug {
            return Err(IoError::InvalidSlug(slug.to_string()));
        }
        Ok(RelativePathBuf::from(format!("{slug}.json")))
    }
}

impl PageRepository for FilePageStore {
    fn get(&self, slug: &str) -> Result<Page, IoError> {
        let path = self.page_path(slug)?;
        match read_page_file(&path, &self.root) {
            Err(IoError::NotFound(_)) => Err(IoError::NotFound(slug.to_string())),
            other => other,
        }
    }

    fn put(&self, page: &Page) -> Result<(), IoError> {
        let path = self.page_path(&page.slug)?;
        write_page_file(&path, &self.root, page)
    }

    fn create(&self, page: &Page) -> Result<(), IoError> {
        let path = self.page_path(&page.slug)?;
        if path.to_path(&self.root).exists() {
            return Err(IoError::AlreadyExists(page.slug.clone()));
        }
        write_page_file(&path, &self.root, page)
    }

    fn list(&self) -> Result<Vec<String>, IoError> {
        let mut slugs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_file()
                && path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            {
                slugs.push(stem.to_string());
            }
        }
        slugs.sort();
        Ok(slugs)
    }
}

/// Read a page document
pub fn read_page_file(relative_path: &RelativePath, pages_root: &Path) -> Result<Page, IoError> {
    let absolute_path = relative_path.to_path(pages_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(relative_path.to_string()));
    }
    let content = fs::read_to_string(&absolute_path)?;
    serde_json::from_str(&content).map_err(|source| IoError::Json {
        path: absolute_path,
        source,
    })
}

/// Write a page document as pretty-printed JSON
pub fn write_page_file(
    relative_path: &RelativePath,
    pages_root: &Path,
    page: &Page,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(pages_root);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut json = serde_json::to_string_pretty(page).map_err(|source| IoError::Json {
        path: absolute_path.clone(),
        source,
    })?;
    json.push('\n');
    fs::write(&absolute_path, json)?;
    Ok(())
}

pub fn validate_pages_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidPagesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageStatus;
    use crate::tests::{create_test_pages_dir, fixture_page};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_then_get_round_trips_nested_blocks() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        let mut page = Page::new("Open Evening");
        page.blocks = fixture_page();
        page.status = PageStatus::Published;

        store.put(&page).unwrap();
        let loaded = store.get("open-evening").unwrap();

        assert_eq!(loaded, page);
        assert!(loaded.slug_locked());
        assert!(dir.path().join("open-evening.json").exists());
    }

    #[test]
    fn test_put_overwrites_last_writer_wins() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        let mut page = Page::new("News");
        store.put(&page).unwrap();
        page.description = "Latest".to_string();
        store.put(&page).unwrap();

        assert_eq!(store.get("news").unwrap().description, "Latest");
    }

    #[test]
    fn test_create_refuses_existing_page() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        let page = Page::new("Contact");
        store.create(&page).unwrap();

        assert!(matches!(
            store.create(&page),
            Err(IoError::AlreadyExists(slug)) if slug == "contact"
        ));
    }

    #[test]
    fn test_get_missing_page() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("nowhere"), Err(IoError::NotFound(slug)) if slug == "nowhere"));
    }

    #[test]
    fn test_rejects_path_like_slugs() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("../etc"), Err(IoError::InvalidSlug(_))));
        assert!(matches!(store.get(""), Err(IoError::InvalidSlug(_))));
    }

    #[test]
    fn test_list_only_json_pages() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        store.put(&Page::new("Zebra Club")).unwrap();
        store.put(&Page::new("Art")).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        assert_eq!(store.list().unwrap(), vec!["art", "zebra-club"]);
    }

    #[test]
    fn test_corrupt_page_reports_json_error() {
        let dir = create_test_pages_dir();
        let store = FilePageStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        assert!(matches!(store.get("broken"), Err(IoError::Json { .. })));
    }

    #[test]
    fn test_invalid_pages_dir() {
        let result = FilePageStore::open("/this/path/does/not/exist");
        assert!(matches!(result, Err(IoError::InvalidPagesDir(_))));
    }
}
