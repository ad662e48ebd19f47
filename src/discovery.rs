//! Finding TEXTMAP files on disk.
//!
//! A path given on the command line is taken as-is when it is a file;
//! directories are walked recursively for `TEXTMAP` lumps and `.textmap` /
//! `.udmf` files.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Whether a file name looks like a UDMF text map.
pub fn is_textmap(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name.eq_ignore_ascii_case("TEXTMAP") {
        return true;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("textmap") || ext.eq_ignore_ascii_case("udmf"))
}

/// Scan a directory for text map files, sorted by path.
pub fn scan_directory(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && is_textmap(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    found.sort();
    found
}

/// Expand files and directories into the list of text maps to process.
///
/// Explicit files are kept whatever their name; duplicates are dropped.
pub fn scan_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for path in paths {
        let found = if path.is_dir() {
            scan_directory(path)
        } else {
            vec![path.clone()]
        };

        for file in found {
            if !result.contains(&file) {
                result.push(file);
            }
        }
    }

    result
}
