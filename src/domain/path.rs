//! Object path helpers
//!
//! Paths are `/`-separated strings relative to a storage root. Folder paths
//! carry a trailing delimiter, the root folder path is empty.

/// Path delimiter used by all storages
pub const DELIMITER: char = '/';

/// Join path segments, dropping empty ones and duplicated delimiters
pub fn join_path(base: &str, relative: &str) -> String {
    [base, relative]
        .iter()
        .map(|s| s.trim_matches(DELIMITER))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Ensure a folder path ends with the delimiter (the empty root stays empty)
pub fn add_delimiter(path: &str) -> String {
    if path.is_empty() || path.ends_with(DELIMITER) {
        path.to_string()
    } else {
        format!("{}{}", path, DELIMITER)
    }
}

/// Last segment of a path, ignoring a trailing delimiter
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(DELIMITER);
    match trimmed.rfind(DELIMITER) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Strip a root folder path from a full path, leaving it relative
pub fn trim_root<'a>(path: &'a str, root: &str) -> &'a str {
    path.strip_prefix(root)
        .unwrap_or(path)
        .trim_start_matches(DELIMITER)
}

/// Path of a sub-folder relative to a parent folder path
pub fn sub_folder_path(parent: &str, relative: &str) -> String {
    let path = add_delimiter(&join_path(parent, relative));
    if path == "/" {
        String::new()
    } else {
        path
    }
}
