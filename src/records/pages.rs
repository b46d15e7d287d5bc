//! Merging saved search-result pages into one issue list.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::MappingError;

/// One page of a tracker search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub start_at: Option<u64>,
    #[serde(default)]
    pub max_results: Option<u64>,
}

impl SearchPage {
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        let content = std::fs::read_to_string(path).map_err(|source| MappingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| MappingError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Concatenate pages in order.
///
/// Stops at the first empty page, or once `limit` issues are collected; the
/// result never exceeds `limit`.
pub fn collect_issues(pages: Vec<SearchPage>, limit: Option<usize>) -> Vec<Value> {
    let mut issues = Vec::new();
    for (index, page) in pages.into_iter().enumerate() {
        if page.issues.is_empty() {
            debug!(page = index, "empty page ends the result set");
            break;
        }
        debug!(
            page = index,
            issues = page.issues.len(),
            start_at = ?page.start_at,
            total = ?page.total,
            "merging page"
        );
        issues.extend(page.issues);
        if limit.is_some_and(|limit| issues.len() >= limit) {
            break;
        }
    }
    if let Some(limit) = limit {
        issues.truncate(limit);
    }
    issues
}

/// Expand input arguments into page files, sorted within each glob.
///
/// Arguments without glob metacharacters are returned as-is so a missing file
/// surfaces as a read error later.
pub fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }
        let mut matched: Vec<PathBuf> = glob::glob(input)?
            .filter_map(|entry| entry.ok())
            .collect();
        if matched.is_empty() {
            anyhow::bail!("No input files match '{}'", input);
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}

/// Load and merge every page named by `inputs`.
pub fn load_issues(inputs: &[String], limit: Option<usize>) -> anyhow::Result<Vec<Value>> {
    let pages = expand_inputs(inputs)?
        .iter()
        .map(|path| SearchPage::load(path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collect_issues(pages, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn page(keys: &[&str]) -> SearchPage {
        SearchPage {
            issues: keys.iter().map(|k| json!({ "key": k })).collect(),
            ..Default::default()
        }
    }

    fn keys(issues: &[Value]) -> Vec<String> {
        issues
            .iter()
            .map(|i| i["key"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn concatenates_pages_in_order() {
        let issues = collect_issues(vec![page(&["A-1", "A-2"]), page(&["A-3"])], None);
        assert_eq!(keys(&issues), vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn empty_page_ends_collection() {
        let issues = collect_issues(vec![page(&["A-1"]), page(&[]), page(&["A-9"])], None);
        assert_eq!(keys(&issues), vec!["A-1"]);
    }

    #[test]
    fn limit_truncates_and_stops_early() {
        let issues = collect_issues(
            vec![page(&["A-1", "A-2"]), page(&["A-3", "A-4"]), page(&["A-5"])],
            Some(3),
        );
        assert_eq!(keys(&issues), vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn page_parses_camel_case_metadata() {
        let page: SearchPage = serde_json::from_value(json!({
            "startAt": 100,
            "maxResults": 100,
            "total": 230,
            "issues": [{ "key": "A-101" }]
        }))
        .unwrap();
        assert_eq!(page.start_at, Some(100));
        assert_eq!(page.max_results, Some(100));
        assert_eq!(page.total, Some(230));
        assert_eq!(page.issues.len(), 1);
    }

    #[test]
    fn load_issues_expands_globs_in_sorted_order() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("page-2.json"),
            r#"{"issues": [{"key": "A-3"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("page-1.json"),
            r#"{"issues": [{"key": "A-1"}, {"key": "A-2"}]}"#,
        )
        .unwrap();

        let pattern = dir.path().join("page-*.json").to_string_lossy().to_string();
        let issues = load_issues(&[pattern], None).unwrap();
        assert_eq!(keys(&issues), vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        let dir = tempdir().unwrap();
        let pattern = dir.path().join("nothing-*.json").to_string_lossy().to_string();
        let err = load_issues(&[pattern], None).unwrap_err();
        assert!(err.to_string().contains("No input files match"));
    }

    #[test]
    fn missing_plain_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json").to_string_lossy().to_string();
        let err = load_issues(&[path], None).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
