//! Receipt file rules shared by the upload flow.

/// Extensions a receipt may carry. Matching is case-sensitive: the store
/// only serves lowercase receipt names.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Receipt data recorded between a successful upload and the form submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReceipt {
    /// Opaque key the store minted for the in-progress bill.
    pub key: String,
    pub file_url: String,
    pub file_name: String,
}

/// Extract the trailing file name from a path-like input value.
///
/// Browsers hand back either a fakepath with backslashes or a bare name;
/// both separators are handled. When the value yields nothing usable the
/// caller's fallback (the file's own name) wins.
pub fn file_name_from_path(value: &str, fallback: &str) -> String {
    let trailing = value.rsplit(['\\', '/']).next().unwrap_or("");
    if trailing.is_empty() {
        fallback.to_string()
    } else {
        trailing.to_string()
    }
}

/// True iff the name's final extension is in [`ALLOWED_EXTENSIONS`].
pub fn has_allowed_extension(file_name: &str) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ALLOWED_EXTENSIONS.contains(&ext),
        _ => false,
    }
}
