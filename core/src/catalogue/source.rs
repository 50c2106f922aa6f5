use crate::determinism::hashing::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Closed set of rule source formats, fixed at discovery time. Execution
/// matches exhaustively on this tag instead of re-sniffing file presence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleFormat {
    Pattern,
    Dsl,
    Hybrid,
}

/// One discovered rule, pinned to its file(s). Immutable once discovered;
/// rediscovery replaces the whole set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSource {
    pub id: String,
    pub pack: String,
    pub format: RuleFormat,
    pub pattern_path: Option<PathBuf>,
    pub dsl_path: Option<PathBuf>,
    pub root_priority: usize,
    /// sha256 over the concatenated source bytes (pattern file first).
    pub body_hash: String,
}

impl RuleSource {
    /// The file carrying the rule's primary metadata.
    pub fn primary_path(&self) -> &Path {
        match self.format {
            RuleFormat::Pattern => self.pattern_path.as_deref().unwrap_or(Path::new("")),
            RuleFormat::Dsl | RuleFormat::Hybrid => self
                .dsl_path
                .as_deref()
                .or(self.pattern_path.as_deref())
                .unwrap_or(Path::new("")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything discovery found: sources in root-priority order (duplicates
/// across roots included) plus every file that was skipped and why.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiscoveryReport {
    pub sources: Vec<RuleSource>,
    pub skipped: Vec<SkippedFile>,
}

const PATTERN_SUFFIX: &str = ".patterns.json";
const DSL_SUFFIX: &str = ".dsl.json";

#[derive(Default)]
struct FilePair {
    pattern: Option<PathBuf>,
    dsl: Option<PathBuf>,
}

/// Walk every root, pair same-named pattern/DSL files per pack directory,
/// and classify each pair. Total: a malformed or unreadable file is skipped
/// and reported, never aborts discovery.
pub fn discover(roots: &[PathBuf]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for (priority, root) in roots.iter().enumerate() {
        let mut pairs: BTreeMap<(PathBuf, String), FilePair> = BTreeMap::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    warn!(root = %root.display(), "unreadable entry during rule discovery: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            let pack_dir = path.parent().unwrap_or(root).to_path_buf();
            if let Some(stem) = name.strip_suffix(PATTERN_SUFFIX) {
                pairs
                    .entry((pack_dir, stem.to_string()))
                    .or_default()
                    .pattern = Some(path.to_path_buf());
            } else if let Some(stem) = name.strip_suffix(DSL_SUFFIX) {
                pairs.entry((pack_dir, stem.to_string())).or_default().dsl =
                    Some(path.to_path_buf());
            }
        }

        for ((pack_dir, _stem), pair) in pairs {
            classify(priority, &pack_dir, pair, &mut report);
        }
    }

    report
}

fn classify(priority: usize, pack_dir: &Path, pair: FilePair, report: &mut DiscoveryReport) {
    let mut pattern = None;
    if let Some(path) = pair.pattern {
        match read_json(&path) {
            Ok(loaded) => pattern = Some((path, loaded)),
            Err(reason) => skip(report, path, reason),
        }
    }
    let mut dsl = None;
    if let Some(path) = pair.dsl {
        match read_json(&path) {
            Ok(loaded) => dsl = Some((path, loaded)),
            Err(reason) => skip(report, path, reason),
        }
    }

    let pack_name = pack_dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    let dsl_id = dsl
        .as_ref()
        .and_then(|(_, (_, v))| v.get("id").and_then(Value::as_str))
        .map(str::to_string);
    let dsl_delegate = dsl
        .as_ref()
        .map(|(_, (_, v))| v.get("python").and_then(Value::as_str).is_some())
        .unwrap_or(false);
    let dsl_pack = dsl
        .as_ref()
        .and_then(|(_, (_, v))| v.get("pack").and_then(Value::as_str))
        .map(str::to_string);
    let pattern_id = pattern
        .as_ref()
        .and_then(|(_, (_, v))| v.get("id").and_then(Value::as_str))
        .map(str::to_string);

    // A DSL file without an id cannot stand as primary metadata.
    if dsl.is_some() && dsl_id.is_none() {
        let (path, _) = dsl.take().unwrap();
        skip(report, path, "dsl file declares no id".to_string());
    }
    // A lone pattern file is primary and must carry its own id. Paired with
    // an id-bearing DSL file it only contributes patterns.
    if pattern.is_some() && pattern_id.is_none() && dsl.is_none() {
        let (path, _) = pattern.take().unwrap();
        skip(report, path, "pattern file declares no id".to_string());
    }

    let (id, format) = match (&pattern, &dsl) {
        (Some(_), Some(_)) => (dsl_id.unwrap(), RuleFormat::Hybrid),
        (None, Some(_)) if dsl_delegate => (dsl_id.unwrap(), RuleFormat::Hybrid),
        (None, Some(_)) => (dsl_id.unwrap(), RuleFormat::Dsl),
        (Some(_), None) => (pattern_id.unwrap(), RuleFormat::Pattern),
        (None, None) => return,
    };

    let mut body = Vec::new();
    if let Some((_, (bytes, _))) = &pattern {
        body.extend_from_slice(bytes);
    }
    if let Some((_, (bytes, _))) = &dsl {
        body.extend_from_slice(bytes);
    }

    report.sources.push(RuleSource {
        id,
        pack: dsl_pack.unwrap_or(pack_name),
        format,
        pattern_path: pattern.map(|(path, _)| path),
        dsl_path: dsl.map(|(path, _)| path),
        root_priority: priority,
        body_hash: sha256_hex(&body),
    });
}

fn read_json(path: &Path) -> Result<(Vec<u8>, Value), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("unreadable: {e}"))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid json: {e}"))?;
    if !value.is_object() {
        return Err("top level is not an object".to_string());
    }
    Ok((bytes, value))
}

fn skip(report: &mut DiscoveryReport, path: PathBuf, reason: String) {
    warn!(path = %path.display(), reason = %reason, "skipping rule file");
    report.skipped.push(SkippedFile { path, reason });
}
