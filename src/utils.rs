// src/utils.rs

use crate::constants;
use regex::Regex;
use std::{ffi::OsStr, path::Path, sync::LazyLock};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// 把任意文本变成可用作单个路径分量的名字
pub fn safe_basename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() {
        return "unknown".to_string();
    }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, "-").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name.trim_start_matches('.').to_string();
    if name.is_empty() {
        return "unnamed".to_string();
    }
    safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string()
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    &s[..i]
}

/// 按显示宽度截断，中文算两格
pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// 补零到 `total` 的十进制位数，例如 total=12 时 3 -> "03"
pub fn zero_pad(value: &str, total: usize) -> String {
    let width = total.to_string().len();
    format!("{:0>width$}", value, width = width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_basename() {
        assert_eq!(safe_basename("a\\b/c:d*e?f\"g<h>i|j"), "a-b-c-d-e-f-g-h-i-j");
        assert_eq!(safe_basename("  a  b   c "), "a b c");
        assert_eq!(safe_basename("..hidden"), "hidden");
        // 方括号保留
        assert_eq!(safe_basename("标题 [av1]"), "标题 [av1]");
        assert_eq!(safe_basename("CON"), "_CON");
        assert_eq!(safe_basename(""), "unknown");
        assert_eq!(safe_basename("..."), "unnamed");

        let long = "长".repeat(100);
        let truncated = safe_basename(&long);
        assert!(truncated.len() <= constants::MAX_FILENAME_BYTES);
        assert!(truncated.chars().all(|c| c == '长'));
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad("3", 12), "03");
        assert_eq!(zero_pad("3", 9), "3");
        assert_eq!(zero_pad("7", 100), "007");
        assert_eq!(zero_pad("12", 12), "12");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 20), "short");
        assert_eq!(truncate_text("https://www.youtube.com/watch?v=abcdef", 20), "https://www.youtu...");
    }
}
