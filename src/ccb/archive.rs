use crate::errors::{PayError, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// 从ZIP文件中提取指定文件
///
/// An entry matches when its full name, or the part after the last `/`,
/// equals `target_name` ignoring ASCII case. The first match is written to
/// `output_dir/target_name`.
pub fn extract_specific_file(
    zip_path: impl AsRef<Path>,
    target_name: &str,
    output_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let zip_path = zip_path.as_ref();
    let file = File::open(zip_path).map_err(|e| {
        PayError::NotFound(format!("cannot open archive {}: {e}", zip_path.display()))
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        PayError::NotFound(format!("cannot open archive {}: {e}", zip_path.display()))
    })?;

    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !matches_entry(entry.name(), target_name) {
            continue;
        }

        let output_path = output_dir.join(target_name);
        let mut out = BufWriter::new(File::create(&output_path)?);
        io::copy(&mut entry, &mut out)?;
        out.flush()?;
        info!(file = target_name, "extracted archive member");
        return Ok(output_path);
    }

    Err(PayError::NotFound(format!(
        "{target_name} not found in {}",
        zip_path.display()
    )))
}

fn matches_entry(entry_name: &str, target_name: &str) -> bool {
    let base_name = entry_name.rsplit('/').next().unwrap_or(entry_name);
    entry_name.eq_ignore_ascii_case(target_name) || base_name.eq_ignore_ascii_case(target_name)
}
