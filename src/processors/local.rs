use crate::error::{ProcessorError, Result};
use crate::github::LanguageStats;
use crate::processors::signal::{
    build_tree_summary, format_file_block, sanitize_text, LOCAL_MAX_FILE_BYTES, LOCAL_MAX_KEY_FILES,
};
use crate::processors::{RepoReadResult, RepoReader, TreeItem};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into
const SKIP_DIRS: &[&str] = &[
    ".git", ".hg", ".svn", "node_modules", "__pycache__",
    ".venv", "venv", "env", ".env", "dist", "build",
    ".idea", ".vscode", ".mypy_cache", ".pytest_cache",
    "coverage", ".coverage", "htmlcov",
];

/// Lowercase basenames read as key files
const KEY_FILENAMES: &[&str] = &[
    "readme.md", "readme.txt", "readme.rst", "readme",
    "package.json", "pyproject.toml", "setup.py", "setup.cfg",
    "requirements.txt", "cargo.toml", "go.mod", "pom.xml",
    "build.gradle", "composer.json", "gemfile", "makefile",
    "dockerfile", "docker-compose.yml", "docker-compose.yaml",
    ".env.example", "tsconfig.json", "angular.json", "next.config.js",
    "vite.config.js", "vite.config.ts", "webpack.config.js",
];

/// Extension to language, used to build a histogram for local directories
const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("go", "Go"),
    ("py", "Python"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("mjs", "JavaScript"),
    ("cjs", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("scala", "Scala"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("hpp", "C++"),
    ("cs", "C#"),
    ("swift", "Swift"),
    ("dart", "Dart"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("vue", "Vue"),
    ("svelte", "Svelte"),
    ("sh", "Shell"),
    ("bash", "Shell"),
];

/// Reads a directory on disk without touching the network
pub struct LocalReader {
    root: PathBuf,
}

impl LocalReader {
    /// Creates a reader rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl RepoReader for LocalReader {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn read(&self) -> Result<RepoReadResult> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || read_local_repo(&root))
            .await
            .map_err(|e| ProcessorError::new(&format!("Local scan aborted: {}", e)))?
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().map_or(false, |name| SKIP_DIRS.contains(&name))
}

fn is_key_file(name: &str) -> bool {
    KEY_FILENAMES.contains(&name.to_lowercase().as_str())
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn read_prefix(path: &Path, limit: usize) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(limit.min(8 * 1024));
    File::open(path)?.take(limit as u64).read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Walks `root` depth-first, files before subdirectories, and collects key files.
///
/// Symlinked directories are never entered. A symlinked file is kept only when its target
/// resolves inside the root.
pub fn read_local_repo(root: &Path) -> Result<RepoReadResult> {
    if !root.is_dir() {
        return Err(ProcessorError::NotFound(format!("{} is not a directory", root.display())));
    }
    let canonical_root = fs::canonicalize(root)?;

    let mut tree = Vec::new();
    let mut key_files = BTreeMap::new();
    let mut selected_files = Vec::new();

    let walker = WalkDir::new(&canonical_root)
        .follow_links(false)
        .sort_by(|a, b| {
            let a_dir = a.file_type().is_dir();
            let b_dir = b.file_type().is_dir();
            a_dir.cmp(&b_dir).then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let Some(rel) = relative_path(&canonical_root, entry.path()) else {
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            tree.push(TreeItem::tree(rel));
            continue;
        }
        if file_type.is_symlink() {
            match fs::canonicalize(entry.path()) {
                Ok(target) if target.starts_with(&canonical_root) && target.is_file() => {}
                Ok(_) => {
                    debug!("Ignoring symlink {} pointing outside the root or to a directory", rel);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping broken symlink {}: {}", rel, e);
                    continue;
                }
            }
        } else if !file_type.is_file() {
            continue;
        }

        let size = fs::metadata(entry.path()).ok().map(|m| m.len());
        tree.push(TreeItem::blob(rel.clone(), size));

        let name = entry.file_name().to_string_lossy();
        if is_key_file(&name) && key_files.len() < LOCAL_MAX_KEY_FILES {
            match read_prefix(entry.path(), LOCAL_MAX_FILE_BYTES) {
                Ok(content) => {
                    key_files.insert(rel.clone(), sanitize_text(&content));
                    selected_files.push(rel);
                }
                Err(e) => warn!("Could not read {}: {}", rel, e),
            }
        }
    }

    let files_text = selected_files
        .iter()
        .filter_map(|path| key_files.get(path).map(|content| format_file_block(path, content)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(RepoReadResult {
        tree_text: sanitize_text(&build_tree_summary(&tree)),
        tree,
        files_text,
        selected_files,
        key_files,
    })
}

/// Byte counts per language derived from file extensions, largest first
pub fn language_histogram(tree: &[TreeItem]) -> LanguageStats {
    let mut totals: HashMap<&'static str, u64> = HashMap::new();
    for item in tree.iter().filter(|item| item.is_blob()) {
        let Some((_, ext)) = item.path.rsplit('/').next().and_then(|name| name.rsplit_once('.')) else {
            continue;
        };
        let ext = ext.to_lowercase();
        if let Some((_, language)) = LANGUAGE_EXTENSIONS.iter().find(|(e, _)| *e == ext) {
            *totals.entry(*language).or_insert(0) += item.size.unwrap_or(0);
        }
    }

    let mut stats: LanguageStats = totals
        .into_iter()
        .map(|(language, bytes)| (language.to_string(), bytes))
        .collect();
    stats.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    stats
}
