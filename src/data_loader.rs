use std::path::{Path, PathBuf};

use glob::glob;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::error::FusionError;
use crate::io::object_from_json;
use crate::types::DataFrame;

fn json_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    match rp {
        Ok(p) if p.extension().is_some_and(|ext| ext == "json") => Some(p),
        Ok(_) => None,
        Err(e) => {
            log::warn!("skipping unreadable path: {}", e);
            None
        }
    }
}

/// Sorted paths of the frame files in `root_folder`.
pub fn frame_paths(root_folder: &Path) -> Result<Vec<PathBuf>, FusionError> {
    let pattern = format!(
        "{}/*.json",
        glob::Pattern::escape(&root_folder.to_string_lossy())
    );
    let paths = glob(&pattern)
        .map_err(|e| FusionError::InvalidConfig(format!("bad frame pattern: {}", e)))?;
    let mut sorted_path: Vec<PathBuf> = paths.filter_map(json_filter).collect();
    sorted_path.sort();
    Ok(sorted_path)
}

/// Loads every `*.json` frame of a sequence folder, ordered by file name.
///
/// Files are parsed in parallel. Each file holds one [`DataFrame`] whose
/// `matches` link the previous file's keypoints to its own.
pub fn load_sequence(root_folder: &Path) -> Result<Vec<DataFrame>, FusionError> {
    if !root_folder.is_dir() {
        return Err(FusionError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", root_folder.display()),
        )));
    }
    let sorted_path = frame_paths(root_folder)?;
    if sorted_path.is_empty() {
        return Err(FusionError::EmptySequence(
            root_folder.display().to_string(),
        ));
    }
    log::trace!("loading {} frames", sorted_path.len());
    sorted_path
        .par_iter()
        .progress_count(sorted_path.len() as u64)
        .map(|path| object_from_json::<DataFrame>(path))
        .collect()
}
