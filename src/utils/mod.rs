pub mod retry;
pub mod path;

pub use retry::{with_retry, RetryPolicy};
pub use path::{normalize_user_input_path, parse_target, resolve_repo_target, RepoTarget};
