// src/bilibili/vid.rs

use regex::Regex;
use std::{fmt, sync::LazyLock};

static AV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)av(\d+)").unwrap());
static BV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)bv([\da-z]{10})").unwrap());
// 从页面 URL 中取号时要求前面是路径分隔符
static URL_AV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/av(\d+)").unwrap());
static URL_BV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/bv(\w{10})").unwrap());

/// B站视频号：av 号（纯数字）或 BV 号（10 位字母数字）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoId {
    Av(u64),
    Bv(String),
}

impl VideoId {
    /// 在任意文本中搜寻视频号，av 号优先，找到第一个即返回
    pub fn find_in(text: &str) -> Option<Self> {
        Self::search(text, &AV_RE, &BV_RE)
    }

    /// 从视频页面 URL 的路径部分取号
    pub fn from_url(url: &str) -> Option<Self> {
        Self::search(url, &URL_AV_RE, &URL_BV_RE)
    }

    /// 命令行输入：全数字视为 av 号，否则在文本中搜寻
    pub fn parse_input(input: &str) -> Option<Self> {
        let input = input.trim();
        match input.parse::<u64>() {
            Ok(n) => Some(Self::from(n)),
            Err(_) => Self::find_in(input),
        }
    }

    fn search(text: &str, av: &Regex, bv: &Regex) -> Option<Self> {
        if let Some(n) = av
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            return Some(Self::Av(n));
        }
        bv.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| Self::Bv(m.as_str().to_string()))
    }

    pub fn is_bv(&self) -> bool {
        matches!(self, Self::Bv(_))
    }
}

impl From<u64> for VideoId {
    fn from(n: u64) -> Self {
        Self::Av(n)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Av(n) => write!(f, "av{}", n),
            Self::Bv(code) => write!(f, "BV{}", code),
        }
    }
}
