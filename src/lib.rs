#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! explainthisrepo - explain a GitHub repository or a local project in plain English
//!
//! The library reads a repository (through the GitHub REST API or from disk), picks a
//! bounded set of high-signal files, and turns them into either a prompt for a language
//! model or a structured technology-stack report.
//!
//! ## Usage
//! ```rust,ignore
//! use explainthisrepo::{create_reader, detect_stack, parse_target, Config, StackInput};
//!
//! async fn example() -> explainthisrepo::Result<()> {
//!     let config = Config::load()?;
//!     let target = parse_target("rust-lang/rustlings")?;
//!     let digest = create_reader(&target, &config)?.read().await?;
//!
//!     let report = detect_stack(&StackInput {
//!         languages: &[],
//!         tree: &digest.tree,
//!         key_files: &digest.key_files,
//!     });
//!     println!("{:?}", report);
//!     Ok(())
//! }
//! ```

/// Configuration loaded from the config file and the environment
pub mod config;
/// `--doctor` diagnostics
pub mod doctor;
/// Error handling types and utilities
pub mod error;
/// GitHub REST client with retry and rate-limit handling
pub mod github;
/// Language-model client
pub mod llm;
/// Logging configuration and utilities
pub mod logging;
/// Repository readers and signal-file selection
pub mod processors;
/// Prompt templates
pub mod prompts;
/// Technology stack detection and rendering
pub mod stack;
/// Utilities (target parsing, retry helpers)
pub mod utils;

pub use config::Config;
pub use error::{ProcessorError, Result};
pub use github::{GitHubClient, LanguageStats, RepoMetadata};
pub use llm::GeminiClient;
pub use processors::{create_reader, RepoReadResult, RepoReader, TreeItem};
pub use stack::{detect_stack, StackInput, StackReport};
pub use utils::{parse_target, RepoTarget};
