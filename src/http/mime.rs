use std::path::Path;

use mime::Mime;

/// Maps a file's extension to the `Content-Type` sent with it.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html") | Some("htm") => mime::TEXT_HTML,
        Some("css") => mime::TEXT_CSS,
        Some("js") => mime::APPLICATION_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("txt") => mime::TEXT_PLAIN,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
