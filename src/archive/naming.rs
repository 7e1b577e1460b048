//! Output file naming for topic archives.

use std::path::{Path, PathBuf};

use crate::config::FILE_STEM_MAX;

/// Lowercase a topic title, turning spaces into underscores and dropping commas.
///
/// Path separators are flattened too so a title can never escape the output directory.
pub fn slugify(title: &str) -> String {
    title
        .replace(' ', "_")
        .replace(',', "")
        .replace(['/', '\\'], "_")
        .to_lowercase()
}

/// `{topic_id}_{slug}` cut to [`FILE_STEM_MAX`] characters.
pub fn file_stem(topic_id: i32, title: &str) -> String {
    format!("{}_{}", topic_id, slugify(title))
        .chars()
        .take(FILE_STEM_MAX)
        .collect()
}

/// Full path of the `.log` file for a topic inside `output_dir`.
pub fn log_path(output_dir: &Path, topic_id: i32, title: &str) -> PathBuf {
    output_dir.join(format!("{}.log", file_stem(topic_id, title)))
}
