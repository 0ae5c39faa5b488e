//! File-name helpers for uploaded images.
//!
//! Uploaded files arrive with a client-supplied name. The trailing extension
//! becomes the image's file type and the remaining stem seeds the staging file
//! name. Neither helper touches the filesystem.

/// Strip any directory components a client may have sent with the name.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}

/// Lower-cased trailing extension of an uploaded file name.
///
/// A name without a dot yields the empty string; callers that build paths
/// from the type must treat that as invalid.
///
/// # Examples
///
/// ```
/// use picfolio_common::paths::file_type_of;
///
/// assert_eq!(file_type_of("sunset.JPG"), "jpg");
/// assert_eq!(file_type_of("archive.tar.gz"), "gz");
/// assert_eq!(file_type_of("README"), "");
/// ```
pub fn file_type_of(file_name: &str) -> String {
    match base_name(file_name).rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// File name without its trailing extension.
///
/// # Examples
///
/// ```
/// use picfolio_common::paths::file_stem_of;
///
/// assert_eq!(file_stem_of("my photo.final.jpg"), "my photo.final");
/// assert_eq!(file_stem_of("README"), "README");
/// ```
pub fn file_stem_of(file_name: &str) -> &str {
    let name = base_name(file_name);
    match name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => name,
    }
}
