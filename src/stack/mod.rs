//! Technology stack inference from a language histogram, a tree listing and manifests.
//!
//! Detection is pure: the same input always yields the same [`StackReport`].

use crate::processors::TreeItem;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Module for rendering a stack report in the terminal
pub mod printer;

pub use printer::{print_stack, render_stack};

/// Languages at or below this share of the total byte count are left out
const LANGUAGE_SHARE_THRESHOLD: f64 = 0.03;

/// Everything the detector looks at
#[derive(Debug, Clone, Copy)]
pub struct StackInput<'a> {
    /// Language name to byte count
    pub languages: &'a [(String, u64)],
    /// Full tree listing
    pub tree: &'a [TreeItem],
    /// Manifest contents keyed by path
    pub key_files: &'a BTreeMap<String, String>,
}

/// Detected technologies grouped by category; each list is free of duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackReport {
    /// Languages with a meaningful share of the code
    pub languages: Vec<String>,
    /// Runtimes such as Node.js
    pub runtimes: Vec<String>,
    /// Frontend frameworks
    pub frontend: Vec<String>,
    /// Backend frameworks
    pub backend: Vec<String>,
    /// Databases, drivers and ORMs
    pub databases: Vec<String>,
    /// Build, test and lint tooling
    pub tooling: Vec<String>,
    /// Deployment and CI
    pub infra: Vec<String>,
    /// Package managers
    pub package_managers: Vec<String>,
}

/// Report category a detection rule feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// [`StackReport::runtimes`]
    Runtime,
    /// [`StackReport::frontend`]
    Frontend,
    /// [`StackReport::backend`]
    Backend,
    /// [`StackReport::databases`]
    Database,
    /// [`StackReport::tooling`]
    Tooling,
    /// [`StackReport::infra`]
    Infra,
    /// [`StackReport::package_managers`]
    PackageManager,
}

impl StackReport {
    /// Whether nothing at all was detected
    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
            && self.runtimes.is_empty()
            && self.frontend.is_empty()
            && self.backend.is_empty()
            && self.databases.is_empty()
            && self.tooling.is_empty()
            && self.infra.is_empty()
            && self.package_managers.is_empty()
    }

    fn list_mut(&mut self, category: Category) -> &mut Vec<String> {
        match category {
            Category::Runtime => &mut self.runtimes,
            Category::Frontend => &mut self.frontend,
            Category::Backend => &mut self.backend,
            Category::Database => &mut self.databases,
            Category::Tooling => &mut self.tooling,
            Category::Infra => &mut self.infra,
            Category::PackageManager => &mut self.package_managers,
        }
    }

    /// Appends `tag` unless it is already listed
    pub fn add(&mut self, category: Category, tag: &str) {
        let list = self.list_mut(category);
        if !list.iter().any(|existing| existing == tag) {
            list.push(tag.to_string());
        }
    }
}

enum PathMatch {
    Exact(&'static str),
    Prefix(&'static str),
}

/// Tree path rules, matched against lowercase paths
const INFRA_RULES: &[(PathMatch, &str)] = &[
    (PathMatch::Exact("dockerfile"), "Docker"),
    (PathMatch::Exact("vercel.json"), "Vercel"),
    (PathMatch::Exact("netlify.toml"), "Netlify"),
    (PathMatch::Prefix(".github/workflows"), "GitHub Actions"),
];

/// npm package name to the tag it implies
const DEPENDENCY_RULES: &[(&str, Category, &str)] = &[
    ("react", Category::Frontend, "React"),
    ("next", Category::Frontend, "Next.js"),
    ("vue", Category::Frontend, "Vue"),
    ("svelte", Category::Frontend, "Svelte"),
    ("@angular/core", Category::Frontend, "Angular"),
    ("tailwindcss", Category::Frontend, "Tailwind CSS"),
    ("express", Category::Backend, "Express"),
    ("fastify", Category::Backend, "Fastify"),
    ("koa", Category::Backend, "Koa"),
    ("@nestjs/core", Category::Backend, "NestJS"),
    ("prisma", Category::Database, "Prisma"),
    ("mongoose", Category::Database, "MongoDB"),
    ("pg", Category::Database, "PostgreSQL"),
    ("mysql2", Category::Database, "MySQL"),
    ("redis", Category::Database, "Redis"),
    ("jest", Category::Tooling, "Jest"),
    ("vite", Category::Tooling, "Vite"),
    ("eslint", Category::Tooling, "ESLint"),
    ("typescript", Category::Tooling, "TypeScript"),
    ("webpack", Category::Tooling, "Webpack"),
];

impl PathMatch {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatch::Exact(expected) => path == *expected,
            PathMatch::Prefix(prefix) => path.starts_with(prefix),
        }
    }
}

fn significant_languages(languages: &[(String, u64)]) -> Vec<String> {
    let total: u64 = languages.iter().map(|(_, bytes)| *bytes).sum();
    if total == 0 {
        return Vec::new();
    }
    let mut seen = BTreeSet::new();
    languages
        .iter()
        .filter(|(_, bytes)| *bytes as f64 / total as f64 > LANGUAGE_SHARE_THRESHOLD)
        .filter(|(name, _)| seen.insert(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Names listed under `dependencies` and `devDependencies`
fn npm_dependencies(manifest: &str) -> Option<BTreeSet<String>> {
    let value: Value = match serde_json::from_str(manifest) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not parse package.json, skipping dependency detection: {}", e);
            return None;
        }
    };

    let mut names = BTreeSet::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(deps) = value.get(section).and_then(Value::as_object) {
            names.extend(deps.keys().cloned());
        }
    }
    Some(names)
}

/// Infers the technology stack
pub fn detect_stack(input: &StackInput<'_>) -> StackReport {
    let mut report = StackReport {
        languages: significant_languages(input.languages),
        ..StackReport::default()
    };

    let paths: Vec<String> = input.tree.iter().map(|item| item.path.to_lowercase()).collect();
    for (rule, tag) in INFRA_RULES {
        if paths.iter().any(|path| rule.matches(path)) {
            report.add(Category::Infra, tag);
        }
    }

    if let Some(manifest) = input.key_files.get("package.json") {
        report.add(Category::Runtime, "Node.js");
        report.add(Category::PackageManager, "npm");

        if let Some(deps) = npm_dependencies(manifest) {
            for (name, category, tag) in DEPENDENCY_RULES {
                if deps.contains(*name) {
                    report.add(*category, tag);
                }
            }
        }
    }

    report
}
