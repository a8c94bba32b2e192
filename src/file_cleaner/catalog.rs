use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::ScanError;
use crate::config::BoosterConfig;

const EMBEDDED_CATALOG: &str = include_str!("../../rules/temp_catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub paths: Vec<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub platforms: Option<Vec<String>>,
    #[serde(default)]
    pub min_age_days: Option<i64>,
    #[serde(default)]
    pub min_size_kb: Option<u64>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub excludes: Option<Vec<String>>,
}

impl CategoryRule {
    fn applies_to(&self, os: &str) -> bool {
        match &self.platforms {
            Some(platforms) => platforms.iter().any(|p| p.eq_ignore_ascii_case(os)),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub categories: Vec<CategoryRule>,
}

/// Per-root filters, normalized once so the walk only compares lowercase strings.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    min_age_days: Option<i64>,
    min_size_bytes: Option<u64>,
    extensions: Option<Vec<String>>,
    excludes: Vec<String>,
}

impl EntryFilter {
    fn from_rule(rule: &CategoryRule) -> Self {
        EntryFilter {
            min_age_days: rule.min_age_days.filter(|days| *days > 0),
            min_size_bytes: rule.min_size_kb.map(|kb| kb * 1024),
            extensions: rule.extensions.as_ref().map(|exts| {
                exts.iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect()
            }),
            excludes: rule
                .excludes
                .as_ref()
                .map(|v| v.iter().map(|s| normalize_for_match(s)).collect())
                .unwrap_or_default(),
        }
    }

    /// Decide whether a regular file belongs in the scan result.
    pub fn accepts(&self, path: &Path, size: u64, modified: Option<DateTime<Utc>>) -> bool {
        if let Some(min) = self.min_size_bytes {
            if size < min {
                return false;
            }
        }

        if let Some(exts) = &self.extensions {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !exts.iter().any(|allowed| *allowed == ext) {
                return false;
            }
        }

        if !self.excludes.is_empty() {
            let normalized = normalize_for_match(&path.to_string_lossy());
            if self.excludes.iter().any(|ex| normalized.contains(ex.as_str())) {
                return false;
            }
        }

        if let Some(days) = self.min_age_days {
            // Unknown mtime never satisfies an age requirement
            let Some(modified) = modified else {
                return false;
            };
            if (Utc::now() - modified).num_days() < days {
                return false;
            }
        }

        true
    }
}

fn normalize_for_match(input: &str) -> String {
    input.replace('\\', "/").to_lowercase()
}

/// A concrete directory to walk, with the category it reports under.
#[derive(Debug, Clone)]
pub struct CatalogRoot {
    pub category: String,
    pub path: PathBuf,
    pub max_depth: usize,
    pub filter: EntryFilter,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, ScanError> {
        serde_json::from_str(raw)
            .map_err(|e| ScanError::Catalog(format!("failed to parse temp catalog: {}", e)))
    }

    pub fn embedded() -> Result<Self, ScanError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// The override file when configured, the embedded catalog otherwise.
    pub fn load(config: &BoosterConfig) -> Result<Self, ScanError> {
        match &config.catalog_override {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    ScanError::Catalog(format!("cannot read {}: {}", path.display(), e))
                })?;
                log::debug!("using catalog override {}", path.display());
                Self::from_json(&raw)
            }
            None => Self::embedded(),
        }
    }

    pub fn resolve_roots(&self, config: &BoosterConfig) -> Vec<CatalogRoot> {
        self.resolve_roots_for(env::consts::OS, config)
    }

    fn resolve_roots_for(&self, os: &str, config: &BoosterConfig) -> Vec<CatalogRoot> {
        let mut seen = HashSet::new();
        let mut roots = Vec::new();

        for rule in self.categories.iter().filter(|r| r.applies_to(os)) {
            let filter = EntryFilter::from_rule(rule);
            let max_depth = config.walk_depth(rule.max_depth);
            for template in &rule.paths {
                let Some(path) = expand_path(template) else {
                    log::debug!("dropping unresolvable catalog path {}", template);
                    continue;
                };
                if !seen.insert(path.clone()) {
                    continue;
                }
                roots.push(CatalogRoot {
                    category: rule.name.clone(),
                    path,
                    max_depth,
                    filter: filter.clone(),
                });
            }
        }

        roots
    }
}

/// Expand a catalog path template into an absolute path.
///
/// Supported anchors: `~`, `{temp}`, `{cache}`, `{data_local}`, `{data}`,
/// `{downloads}`, `$VAR` and `%VAR%`. Returns `None` when the anchor has no
/// value on this machine.
pub fn expand_path(template: &str) -> Option<PathBuf> {
    let template = template.trim();
    if template.is_empty() {
        return None;
    }

    let (anchor, rest) = if template == "~" || template.starts_with("~/") {
        (dirs::home_dir()?, &template[1..])
    } else if let Some(stripped) = template.strip_prefix('{') {
        let end = stripped.find('}')?;
        let base = match &stripped[..end] {
            "temp" => Some(env::temp_dir()),
            "home" => dirs::home_dir(),
            "cache" => dirs::cache_dir(),
            "data_local" => dirs::data_local_dir(),
            "data" => dirs::data_dir(),
            "downloads" => dirs::download_dir(),
            _ => None,
        }?;
        (base, &stripped[end + 1..])
    } else if let Some(stripped) = template.strip_prefix('%') {
        let end = stripped.find('%')?;
        (env_dir(&stripped[..end])?, &stripped[end + 1..])
    } else if let Some(stripped) = template.strip_prefix('$') {
        let end = stripped.find(['/', '\\']).unwrap_or(stripped.len());
        (env_dir(&stripped[..end])?, &stripped[end..])
    } else {
        let path = PathBuf::from(template);
        return path.is_absolute().then_some(path);
    };

    let mut expanded = anchor;
    for part in rest.split(['/', '\\']).filter(|p| !p.is_empty()) {
        expanded.push(part);
    }
    Some(expanded)
}

fn env_dir(name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
