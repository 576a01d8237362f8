use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const INVALID_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILE_NAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Regular files directly inside `dir` whose extension matches, ignoring case, sorted by name.
pub fn find_candidate_files(dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
