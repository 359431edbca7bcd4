use base64::{engine::general_purpose, Engine as _};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

pub fn format_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size < KIB {
        format!("{bytes} B")
    } else if size < MIB {
        format!("{:.1} KB", size / KIB)
    } else {
        format!("{:.1} MB", size / MIB)
    }
}

/// Rounded percentage saved; negative when the output grew.
pub fn savings_percent(original: u64, optimized: u64) -> i64 {
    if original == 0 {
        return 0;
    }
    ((original as f64 - optimized as f64) / original as f64 * 100.0).round() as i64
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

pub fn markdown_image(alt: &str, url: &str) -> String {
    format!("![{alt}]({url})")
}

/// Picks `dir/stem.ext`, or `dir/stem-N.ext` with the smallest free `N` when the
/// name is already on disk or in `claimed`.
pub fn output_path(dir: &Path, stem: &str, extension: &str, claimed: &HashSet<PathBuf>) -> PathBuf {
    let is_free = |path: &PathBuf| !claimed.contains(path) && !path.exists();

    let candidate = dir.join(format!("{stem}.{extension}"));
    if is_free(&candidate) {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.{extension}")))
        .find(is_free)
        .unwrap_or(candidate)
}
