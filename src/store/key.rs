//! Storage key of a directory's metadata document.

/// Resolve the key of `file_name` inside `directory_prefix`.
///
/// The root directory has an empty prefix, so its document lives at
/// `file_name` itself. Any other prefix is joined with exactly one `/`.
pub fn resolve_key(directory_prefix: &str, file_name: &str) -> String {
    if directory_prefix.is_empty() {
        return file_name.to_string();
    }
    let prefix = directory_prefix.trim_end_matches('/');
    format!("{}/{}", prefix, file_name)
}
