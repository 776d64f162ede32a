//! Site discovery and per-site store files.
//!
//! Each construction site keeps its own store in the data directory, named
//! `<site_name>_site.json`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SiteError, StoreError};
use crate::store::SiteStore;

const SITE_SUFFIX: &str = "_site";

/// A site with its name and store file path.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Site {
    /// Create a site handle with the given display name.
    pub fn new(display_name: &str, data_dir: &Path) -> Self {
        let name = sanitize_site_name(display_name);
        let file_path = data_dir.join(format!("{}{}.json", name, SITE_SUFFIX));

        Site {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Recognise a site from an existing store file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        if file_path.extension()?.to_str()? != "json" {
            return None;
        }
        let file_name = file_path.file_stem()?.to_str()?;
        let name = file_name.strip_suffix(SITE_SUFFIX)?;
        if name.is_empty() {
            return None;
        }
        let display_name = name.replace('_', " ");

        Some(Site {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    /// Create the store file for this site if it doesn't exist.
    pub fn create_if_not_exists(&self) -> Result<(), SiteError> {
        if !self.file_path.exists() {
            SiteStore::default().save(&self.file_path)?;
        }
        Ok(())
    }

    /// Load this site's store.
    pub fn load_store(&self) -> Result<SiteStore, StoreError> {
        SiteStore::load(&self.file_path)
    }
}

/// Convert a display name to a safe file-name stem.
/// Lowercases and collapses every run of non-alphanumerics into one underscore.
pub fn sanitize_site_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all site stores in the data directory, sorted by display name.
pub fn discover_sites(data_dir: &Path) -> Result<Vec<Site>, std::io::Error> {
    let mut sites = Vec::new();

    if !data_dir.exists() {
        return Ok(sites);
    }

    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_file() {
            if let Some(site) = Site::from_file(path) {
                sites.push(site);
            }
        }
    }

    sites.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(sites)
}

/// Create a new, empty site store.
pub fn create_site(display_name: &str, data_dir: &Path) -> Result<Site, SiteError> {
    if sanitize_site_name(display_name).is_empty() {
        return Err(SiteError::EmptyName);
    }

    let site = Site::new(display_name, data_dir);
    if site.file_path.exists() {
        return Err(SiteError::AlreadyExists(display_name.to_string()));
    }

    site.create_if_not_exists()?;
    log::info!("created site store {}", site.file_path.display());
    Ok(site)
}

/// Find the most recently modified site store.
pub fn most_recent_site(data_dir: &Path) -> Result<Option<Site>, std::io::Error> {
    let mut most_recent: Option<(Site, std::time::SystemTime)> = None;

    for site in discover_sites(data_dir)? {
        let Ok(modified) = fs::metadata(&site.file_path).and_then(|m| m.modified()) else {
            continue;
        };
        let newer = most_recent
            .as_ref()
            .map_or(true, |(_, current)| modified > *current);
        if newer {
            most_recent = Some((site, modified));
        }
    }

    Ok(most_recent.map(|(site, _)| site))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_site_name() {
        assert_eq!(sanitize_site_name("Tower A"), "tower_a");
        assert_eq!(sanitize_site_name("Bridge-Deck_2"), "bridge_deck_2");
        assert_eq!(sanitize_site_name("Block #7 (East)"), "block_7_east");
        assert_eq!(sanitize_site_name("  Multiple   Spaces  "), "multiple_spaces");
        assert_eq!(sanitize_site_name("!!!"), "");
    }

    #[test]
    fn test_from_file() {
        let site = Site::from_file(PathBuf::from("/data/tower_a_site.json")).unwrap();
        assert_eq!(site.name, "tower_a");
        assert_eq!(site.display_name, "tower a");
        assert!(Site::from_file(PathBuf::from("/data/config.toml")).is_none());
        assert!(Site::from_file(PathBuf::from("/data/_site.json")).is_none());
        assert!(Site::from_file(PathBuf::from("/data/tower_a_site.json.tmp")).is_none());
    }

    #[test]
    fn test_create_and_discover() {
        let dir = std::env::temp_dir().join(format!("sitedash-sites-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let b = create_site("Bridge Deck", &dir).unwrap();
        create_site("Annex", &dir).unwrap();
        assert!(matches!(create_site("Bridge Deck", &dir), Err(SiteError::AlreadyExists(_))));
        assert!(matches!(create_site("  ", &dir), Err(SiteError::EmptyName)));

        let names: Vec<String> = discover_sites(&dir).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["annex", "bridge_deck"]);
        assert!(most_recent_site(&dir).unwrap().is_some());
        assert_eq!(b.load_store().unwrap(), SiteStore::default());

        fs::remove_dir_all(&dir).unwrap();
    }
}
