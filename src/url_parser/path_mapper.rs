use std::path::PathBuf;

use crate::url_parser::NormalizedUrl;

const INDEX_FILE: &str = "index.html";

/// Maps a URL to the relative file path its rendered HTML is stored at.
///
/// The URL path is used with the leading `/` removed. Directory-like paths
/// (trailing `/`) get `index.html` appended, extension-less paths get
/// `/index.html` appended, everything else is used as-is. The query string
/// is ignored, so URLs differing only in their query share a file.
///
/// Empty, `.` and `..` segments are skipped so the result never escapes the
/// output root. The site root maps to `index.html`.
pub fn map_url_to_path(url: &NormalizedUrl) -> PathBuf {
    let path = url.path().trim_start_matches('/');

    let mut relative: PathBuf = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect();

    if path.is_empty() || path.ends_with('/') || path_extension(path).is_empty() {
        relative.push(INDEX_FILE);
    }

    relative
}

/// Returns the extension of the last path segment, including the dot.
///
/// Leading dots of the segment are not treated as an extension separator, so
/// `/.well-known` has no extension while `/a/b.tar.gz` yields `.gz`.
pub fn path_extension(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or("");
    let stem_start = segment.len() - segment.trim_start_matches('.').len();
    match segment[stem_start..].rfind('.') {
        Some(idx) => &segment[stem_start + idx..],
        None => "",
    }
}
