use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Writes the explanation to `output_path`, creating parent directories as needed
pub async fn save_output_file(content: &str, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(output_path).await?;
    file.write_all(content.trim_end().as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await?;
    info!("Wrote {} bytes to {}", content.len(), output_path.display());
    Ok(())
}

/// Sets up the spinner style shared by every long-running step
pub fn setup_progress_style(pb: &ProgressBar) {
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
}

/// Creates a ticking spinner with `message`
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    setup_progress_style(&pb);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
