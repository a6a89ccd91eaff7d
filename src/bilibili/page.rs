// src/bilibili/page.rs

use super::models::{InitialState, PlayInfo};
use crate::error::{AppError, AppResult};
use regex::Regex;
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use url::Url;

static INITIAL_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.+?\});?\s*(?:\(function|</script>)").unwrap()
});
static PLAYINFO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)window\.__playinfo__\s*=\s*(\{.+?\})\s*</script>").unwrap());
static PART_QUERY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]p=(\d+)").unwrap());
static PART_INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/index_(\d+)").unwrap());
static AUTHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static CANONICAL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).unwrap());

fn capture_json<T: DeserializeOwned>(re: &Regex, body: &str, what: &str) -> AppResult<Option<T>> {
    let Some(raw) = re.captures(body).and_then(|c| c.get(1)) else {
        return Ok(None);
    };
    serde_json::from_str(raw.as_str())
        .map(Some)
        .map_err(|e| AppError::Scrape(format!("{} 解析失败: {}", what, e)))
}

pub fn initial_state(body: &str) -> AppResult<InitialState> {
    capture_json(&INITIAL_STATE_RE, body, "__INITIAL_STATE__")?
        .ok_or_else(|| AppError::Scrape("页面中没有 __INITIAL_STATE__".to_string()))
}

/// 页面内嵌的播放信息，未登录或番剧页面可能没有
pub fn playinfo(body: &str) -> AppResult<Option<PlayInfo>> {
    capture_json(&PLAYINFO_RE, body, "__playinfo__")
}

/// 由 URL 决定分P序号，缺省为 1
pub fn part_number(url: &str) -> usize {
    PART_QUERY_RE
        .captures(url)
        .or_else(|| PART_INDEX_RE.captures(url))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

/// 把 URL 的查询串换成 `p=<part>`
pub fn with_part(url: &str, part: u32) -> AppResult<String> {
    let mut url = Url::parse(url)?;
    url.query_pairs_mut().clear().append_pair("p", &part.to_string());
    Ok(url.into())
}

/// `<meta name="author" content="...">`
pub fn meta_author(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    doc.select(&AUTHOR_SELECTOR)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `<link rel="canonical" href="...">`
pub fn canonical_href(body: &str) -> Option<String> {
    let doc = Html::parse_document(body);
    doc.select(&CANONICAL_SELECTOR)
        .next()
        .and_then(|e| e.value().attr("href"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
<meta name="author" content="某UP主">
<link rel="canonical" href="https://www.bilibili.com/video/av170001/">
<script>window.__playinfo__={"code":0,"data":{"quality":80,"dash":{"video":[],"audio":[]}}}</script>
<script>window.__INITIAL_STATE__={"videoData":{"aid":170001,"title":"T;x","pages":[]}};(function(){var s;}());</script>
</head><body></body></html>"#;

    #[test]
    fn test_scrape_page() {
        assert_eq!(meta_author(PAGE).as_deref(), Some("某UP主"));
        assert_eq!(
            canonical_href(PAGE).as_deref(),
            Some("https://www.bilibili.com/video/av170001/")
        );
        let state = initial_state(PAGE).unwrap();
        assert_eq!(state.video_data.title, "T;x");
        let info = playinfo(PAGE).unwrap().unwrap();
        assert_eq!(info.data.unwrap().quality, Some(80));
    }

    #[test]
    fn test_missing_parts() {
        assert!(meta_author("<html></html>").is_none());
        assert!(playinfo("<html></html>").unwrap().is_none());
        assert!(matches!(initial_state("<html></html>"), Err(AppError::Scrape(_))));
    }

    #[test]
    fn test_part_number() {
        assert_eq!(part_number("https://www.bilibili.com/video/av1?p=3"), 3);
        assert_eq!(part_number("https://www.bilibili.com/video/av1/index_2.html"), 2);
        assert_eq!(part_number("https://www.bilibili.com/video/av1"), 1);
    }

    #[test]
    fn test_with_part() {
        assert_eq!(
            with_part("https://www.bilibili.com/video/av1", 2).unwrap(),
            "https://www.bilibili.com/video/av1?p=2"
        );
        assert_eq!(
            with_part("https://www.bilibili.com/video/av1?p=1", 3).unwrap(),
            "https://www.bilibili.com/video/av1?p=3"
        );
        assert!(matches!(with_part("not a url", 1), Err(AppError::Url(_))));
    }
}
