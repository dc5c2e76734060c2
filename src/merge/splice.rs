//! Splicing appended content into an upstream file's text

/// Prefixes that mark a source map reference comment
const SOURCE_MAP_MARKERS: [&str; 3] = ["//# sourceMappingURL=", "//@ sourceMappingURL=", "/*# sourceMappingURL="];

/// Byte offset of the trailing source map reference line, if any.
///
/// Only the last non-blank line is considered.
pub fn source_map_offset(content: &str) -> Option<usize> {
    let trimmed = content.trim_end();
    let line_start = trimmed.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let last_line = trimmed[line_start..].trim_start();

    SOURCE_MAP_MARKERS
        .iter()
        .any(|marker| last_line.starts_with(marker))
        .then_some(line_start)
}

/// Insert `appended` into `content` before the trailing source map reference,
/// or at the end when there is none. `separator` goes between the upstream
/// text and the appended text.
pub fn insert_before_source_map(content: &str, separator: &str, appended: &str) -> String {
    let mut out = String::with_capacity(content.len() + separator.len() + appended.len() + 1);
    match source_map_offset(content) {
        Some(offset) => {
            out.push_str(&content[..offset]);
            out.push_str(separator);
            out.push_str(appended);
            out.push('\n');
            out.push_str(&content[offset..]);
        }
        None => {
            out.push_str(content);
            out.push_str(separator);
            out.push_str(appended);
        }
    }
    out
}
