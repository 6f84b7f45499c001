//! Mermaid rendering and one-line summaries of a fetched file sample.

use std::collections::{HashMap, HashSet};
use crate::walker::FetchedFiles;

const MAX_NODES: usize = 10;
const MAX_LABEL_CHARS: usize = 30;
const MAX_NODE_ID_CHARS: usize = 20;

/// Renders a `graph TD` diagram linking a repository root to up to ten files
///
/// Paths are taken in lexicographic order, so the output only depends on
/// the set of paths.
pub fn render_mermaid<'a>(paths: impl IntoIterator<Item = &'a str>) -> String {
    let mut paths: Vec<&str> = paths.into_iter().collect();
    paths.sort_unstable();
    paths.dedup();

    let mut lines = vec!["graph TD".to_string(), "    Repository[\"Repository\"]".to_string()];
    let mut used_ids = HashSet::new();

    for path in paths.into_iter().take(MAX_NODES) {
        let name = path.rsplit('/').next().unwrap_or(path);
        let id = unique_id(node_id(name), &mut used_ids);
        lines.push(format!("    Repository --> {}[\"{}\"]", id, node_label(name)));
    }

    lines.join("\n")
}

fn node_label(name: &str) -> String {
    let label: String = name.chars().filter(|c| !matches!(c, '[' | ']' | '(' | ')' | '"' | '\'')).collect();
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        label
    }
}

fn node_id(name: &str) -> String {
    let id: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | '(' | ')'))
        .map(|c| if matches!(c, '.' | '-' | ' ') { '_' } else { c })
        .take(MAX_NODE_ID_CHARS)
        .collect();
    if id.is_empty() {
        "node".to_string()
    } else {
        id
    }
}

fn unique_id(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Extension of a path's basename, or `other` when it has none
pub fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => "other",
    }
}

/// Extension counts, most frequent first; ties keep first-seen order
pub fn extension_counts(files: &FetchedFiles) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for path in files.paths() {
        let ext = extension_of(path);
        let count = counts.entry(ext).or_insert(0);
        if *count == 0 {
            order.push(ext);
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize)> = order.into_iter().map(|ext| (ext.to_string(), counts[ext])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// One-line description such as `Analyzed 12 files (8 py files, 3 md files, 1 other files).`
pub fn analysis_summary(files: &FetchedFiles) -> String {
    let types = extension_counts(files)
        .into_iter()
        .take(3)
        .map(|(ext, count)| format!("{} {} files", count, ext))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Analyzed {} files ({}). Architecture diagram generated from repository structure.",
        files.len(),
        types
    )
}
