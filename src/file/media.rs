//! Accepted upload formats.

use std::path::Path;

/// Maximum upload size in bytes (5 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Accepted extensions and the MIME type each one maps to.
pub const ALLOWED_FORMATS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
];

/// Lowercased extension of a file name.
fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Strip parameters (`; charset=...`) and normalize case.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Resolve the stored content type of an upload.
///
/// The file extension must be in [`ALLOWED_FORMATS`] and the declared type
/// must agree with it. An empty or `application/octet-stream` declaration is
/// replaced by the type guessed from the extension. Returns `None` when the
/// upload is not acceptable.
pub fn resolve_content_type(declared: &str, file_name: &str) -> Option<&'static str> {
    let ext = extension(file_name)?;
    let (_, canonical) = ALLOWED_FORMATS.iter().find(|(e, _)| *e == ext)?;

    let declared = essence(declared);
    if declared.is_empty() || declared == "application/octet-stream" {
        return Some(*canonical);
    }

    let agrees = declared == *canonical
        || mime_guess::from_ext(&ext)
            .iter()
            .any(|guess| guess.essence_str() == declared);
    agrees.then_some(*canonical)
}
