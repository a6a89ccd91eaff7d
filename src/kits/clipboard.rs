// src/kits/clipboard.rs

use crate::error::{AppError, AppResult};
use arboard::Clipboard;
use itertools::Itertools;
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static YOUTUBE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:(?:www|m)\.)?(?:youtube\.com/watch\?v=|youtu\.be/)[\w-]{11}").unwrap()
});
static BILIBILI_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(?:(?:www|m)\.)?(?:bilibili\.com/video/(?:av\d+|bv[\da-z]{10})|b23\.tv/[\da-z]+)")
        .unwrap()
});

/// `youtube` / `bilibili` 使用内置规则，其余按正则处理。结果去重并保持出现顺序
pub fn find_urls(pattern: &str, text: &str) -> AppResult<Vec<String>> {
    let custom;
    let re: &Regex = match pattern {
        "youtube" => &YOUTUBE_URL_RE,
        "bilibili" => &BILIBILI_URL_RE,
        _ => {
            custom = Regex::new(pattern)?;
            &custom
        }
    };
    Ok(re.find_iter(text).map(|m| m.as_str().to_string()).unique().collect())
}

/// 从剪贴板找出 URL，再把它们按行写回剪贴板
pub fn urls_from_clipboard(pattern: &str) -> AppResult<Vec<String>> {
    let mut clipboard = Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
    let text = clipboard.get_text().map_err(|e| AppError::Clipboard(e.to_string()))?;
    let urls = find_urls(pattern, &text)?;
    debug!("剪贴板中找到 {} 个 URL", urls.len());
    clipboard
        .set_text(urls.join("\n"))
        .map_err(|e| AppError::Clipboard(e.to_string()))?;
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset_urls() {
        let text = "see https://www.youtube.com/watch?v=dQw4w9WgXcQ and https://youtu.be/dQw4w9WgXcQ, \
                    also https://www.bilibili.com/video/BV17x411w7KC/ and https://www.bilibili.com/video/av170001";
        assert_eq!(
            find_urls("youtube", text).unwrap(),
            vec!["https://www.youtube.com/watch?v=dQw4w9WgXcQ", "https://youtu.be/dQw4w9WgXcQ"]
        );
        assert_eq!(
            find_urls("bilibili", text).unwrap(),
            vec!["https://www.bilibili.com/video/BV17x411w7KC", "https://www.bilibili.com/video/av170001"]
        );
    }

    #[test]
    fn test_find_custom_pattern() {
        let text = "https://a.com/1 https://a.com/2 https://a.com/1";
        assert_eq!(find_urls(r"https://a\.com/\d", text).unwrap(), vec!["https://a.com/1", "https://a.com/2"]);
        assert!(matches!(find_urls("(", text), Err(AppError::Regex(_))));
    }
}
