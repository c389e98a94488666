//! Byte-safe string helpers shared by the archive and download code.

/// Characters that are unsafe in file names or quoted header values.
const UNSAFE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Clean a user-supplied display name so it can be used as a file name.
///
/// The input is trimmed, then every character in `< > : " / \ | ? *` and
/// every control character in U+0000..=U+001F is replaced with `_`. If
/// nothing is left, `fallback` is returned instead.
///
/// # Examples
///
/// ```
/// use sharetar::util::sanitize_name;
///
/// assert_eq!(sanitize_name("  q3/report?.pdf ", "file"), "q3_report_.pdf");
/// assert_eq!(sanitize_name("   ", "file"), "file");
/// ```
pub fn sanitize_name(input: &str, fallback: &str) -> String {
    let replaced: String = input
        .trim()
        .chars()
        .map(|ch| {
            if UNSAFE_NAME_CHARS.contains(&ch) || (ch as u32) < 0x20 {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Truncate `value` so that its UTF-8 encoding fits in `max_bytes`.
///
/// Truncation happens on code point boundaries only, so the result is always
/// a byte-for-byte prefix of the input.
pub fn truncate_to_byte_budget(value: &str, max_bytes: usize) -> String {
    let mut end = 0;
    for ch in value.chars() {
        let next = end + ch.len_utf8();
        if next > max_bytes {
            break;
        }
        end = next;
    }
    value[..end].to_string()
}

/// Build a `Content-Disposition` value for an attachment download.
///
/// Produces `attachment; filename="<ascii>"; filename*=UTF-8''<encoded>`
/// where the plain parameter is an ASCII-only fallback for old clients and
/// the extended parameter carries the percent-encoded UTF-8 name.
pub fn build_attachment_disposition(file_name: &str) -> String {
    let ascii_fallback: String = file_name
        .chars()
        .map(|ch| {
            if ch.is_ascii() && !ch.is_ascii_control() && ch != '"' && ch != '\\' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback,
        urlencoding::encode(file_name)
    )
}
