//! Import Root Resolution
//!
//! Infers the directory a schema file's `import "...";` declarations resolve
//! against, so it can be handed to the compiler as an include path.
//!
//! Strategy:
//! 1. Extract the direct imports of the file (no recursive following).
//! 2. Collect the file's directory and its ancestors, nearest first, bounded by
//!    `max_levels`.
//! 3. Score each candidate by `(resolved imports, structure bonus)`.
//! 4. Keep the first candidate with the strictly highest score.
//! 5. Fall back to the file's own directory when there is no evidence.
//!
//! ```text
//! /repo/protos/new/api/model/v1/model.proto
//!   import "api/common/common.proto";
//! -> /repo/protos/new
//! ```

use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::config::ResolverConfig;
use crate::error::{ExplorerError, Result};

/// Default number of ancestor directories scanned
pub const DEFAULT_MAX_LEVELS: usize = 16;

/// Default schema source suffix
pub const DEFAULT_EXTENSION: &str = "proto";

fn import_regex() -> &'static Regex {
    static IMPORT_RE: OnceLock<Regex> = OnceLock::new();
    IMPORT_RE.get_or_init(|| {
        Regex::new(r#"^\s*import\s+(?:(?:public|weak)\s+)?"([^"]+)"\s*;"#)
            .expect("import pattern is valid")
    })
}

/// Score of a candidate root, compared lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CandidateScore {
    /// Distinct imports that exist under the candidate
    pub resolved_imports: usize,
    /// 1 when the file's first relative segment is a real subdirectory
    pub structure_bonus: u8,
}

impl CandidateScore {
    /// No import resolved and no structural signal
    pub fn is_empty(&self) -> bool {
        self.resolved_imports == 0 && self.structure_bonus == 0
    }
}

/// A scored candidate root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub path: PathBuf,
    pub score: CandidateScore,
}

/// Heuristic import-root resolver
#[derive(Debug, Clone)]
pub struct RootResolver {
    max_levels: usize,
    extension: String,
}

impl Default for RootResolver {
    fn default() -> Self {
        Self {
            max_levels: DEFAULT_MAX_LEVELS,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl RootResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            max_levels: config.max_levels,
            extension: config.extension.trim_start_matches('.').to_string(),
        }
    }

    /// Override the number of ancestors considered (at least one)
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Infer the import root for `schema_file`.
    ///
    /// Fails with `NotFound` when the file is missing and `InvalidExtension`
    /// when it lacks the schema suffix.
    pub fn resolve(&self, schema_file: impl AsRef<Path>) -> Result<PathBuf> {
        let file = self.validate(schema_file.as_ref())?;
        let parent = parent_dir(&file);

        let imports = extract_imports(&file)?;
        if imports.is_empty() {
            tracing::debug!(file = %file.display(), "no imports, using containing directory");
            return Ok(parent);
        }

        let best = self
            .score_candidates(&file, &imports)
            .into_iter()
            .fold(None::<ScoredCandidate>, |best, candidate| match best {
                Some(current) if candidate.score <= current.score => Some(current),
                _ => Some(candidate),
            });

        let root = match best {
            Some(best) if !best.score.is_empty() => best.path,
            _ => {
                tracing::debug!(file = %file.display(), "no candidate resolved any import");
                parent
            }
        };

        tracing::debug!(file = %file.display(), root = %root.display(), "resolved import root");
        Ok(root)
    }

    /// Score every existing candidate directory, nearest first
    pub fn score_candidates(&self, file: &Path, imports: &[String]) -> Vec<ScoredCandidate> {
        let distinct: BTreeSet<&str> = imports.iter().map(String::as_str).collect();

        self.candidate_roots(file)
            .into_iter()
            .filter(|candidate| candidate.is_dir())
            .map(|candidate| {
                let score = score_candidate(&candidate, file, &distinct);
                tracing::debug!(
                    candidate = %candidate.display(),
                    resolved = score.resolved_imports,
                    bonus = score.structure_bonus,
                    "scored candidate root"
                );
                ScoredCandidate { path: candidate, score }
            })
            .collect()
    }

    /// The file's directory followed by its ancestors, bounded by `max_levels`
    pub fn candidate_roots(&self, file: &Path) -> Vec<PathBuf> {
        let limit = self.max_levels.max(1);
        let mut candidates = Vec::new();
        let mut current = file.parent();

        while let Some(dir) = current {
            candidates.push(dir.to_path_buf());
            if candidates.len() >= limit {
                break;
            }
            current = dir.parent();
        }

        candidates
    }

    fn validate(&self, schema_file: &Path) -> Result<PathBuf> {
        if !schema_file.exists() {
            return Err(ExplorerError::NotFound {
                path: schema_file.to_path_buf(),
            });
        }

        let file = fs::canonicalize(schema_file)?;
        let has_extension = file
            .extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false);

        if !has_extension {
            return Err(ExplorerError::InvalidExtension {
                path: file,
                expected: self.extension.clone(),
            });
        }

        Ok(file)
    }
}

/// Resolve with the default settings
pub fn resolve_root(schema_file: impl AsRef<Path>) -> Result<PathBuf> {
    RootResolver::default().resolve(schema_file)
}

/// Import paths declared by a schema file, in declaration order.
///
/// The file is decoded as UTF-8, falling back to Latin-1.
pub fn extract_imports(file: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(file)?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(file = %file.display(), "not valid UTF-8, decoding as Latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    Ok(parse_imports(&text))
}

/// Import paths found in schema source text
pub fn parse_imports(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| import_regex().captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

fn score_candidate(candidate: &Path, file: &Path, imports: &BTreeSet<&str>) -> CandidateScore {
    let resolved_imports = imports
        .iter()
        .filter(|import| candidate.join(import).exists())
        .count();

    // /a/b/new/api/model/v1/model.proto with candidate /a/b: /a/b/new must be a directory
    let structure_bonus = match file.strip_prefix(candidate) {
        Ok(relative) => {
            let mut parts = relative.components().filter(|c| matches!(c, Component::Normal(_)));
            match (parts.next(), parts.next()) {
                (Some(first), Some(_)) if candidate.join(first).is_dir() => 1,
                _ => 0,
            }
        }
        Err(_) => 0,
    };

    CandidateScore {
        resolved_imports,
        structure_bonus,
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
}
