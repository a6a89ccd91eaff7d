// src/bilibili/cookies.rs

use crate::error::{AppError, AppResult};
use anyhow::Context;
use itertools::Itertools;
use log::debug;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// cookies 的三种来源，使用前统一转成一整串 `k=v; k2=v2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    Map(BTreeMap<String, String>),
    JarFile(PathBuf),
    Raw(String),
}

impl CookieSource {
    /// 命令行/配置里给的字符串：是已存在的文件就当作 cookies 文件，否则原样使用
    pub fn from_arg(arg: &str) -> Self {
        let path = Path::new(arg);
        if path.is_file() {
            Self::JarFile(path.to_path_buf())
        } else {
            Self::Raw(arg.to_string())
        }
    }

    pub fn to_header(&self) -> AppResult<String> {
        match self {
            Self::Map(map) => Ok(join_cookies(map)),
            Self::JarFile(path) => Ok(join_cookies(&load_cookie_jar(path)?)),
            Self::Raw(raw) => Ok(raw.trim().to_string()),
        }
    }
}

impl From<BTreeMap<String, String>> for CookieSource {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Map(map)
    }
}

pub fn join_cookies(map: &BTreeMap<String, String>) -> String {
    map.iter().map(|(k, v)| format!("{}={}", k, v)).join("; ")
}

/// 读取浏览器导出的 Netscape/Mozilla 格式 cookies 文件
pub fn load_cookie_jar(path: &Path) -> AppResult<BTreeMap<String, String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("读取 cookies 文件 '{}' 失败", path.display()))?;
    parse_cookie_jar(&content)
}

pub fn parse_cookie_jar(content: &str) -> AppResult<BTreeMap<String, String>> {
    let mut cookies = BTreeMap::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            return Err(AppError::CookieJar(format!(
                "第 {} 行字段数不足 ({} < 7)",
                lineno + 1,
                fields.len()
            )));
        }
        cookies.insert(fields[5].to_string(), fields[6].to_string());
    }
    debug!("从 cookies 文件中读取到 {} 项", cookies.len());
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JAR: &str = "# Netscape HTTP Cookie File\n\
        .bilibili.com\tTRUE\t/\tFALSE\t1700000000\tbuvid3\tXYZ\n\
        #HttpOnly_.bilibili.com\tTRUE\t/\tTRUE\t1700000000\tSESSDATA\tabc%2C123\n\
        \n";

    #[test]
    fn test_parse_cookie_jar() {
        let cookies = parse_cookie_jar(JAR).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["SESSDATA"], "abc%2C123");
        assert_eq!(join_cookies(&cookies), "SESSDATA=abc%2C123; buvid3=XYZ");
    }

    #[test]
    fn test_parse_cookie_jar_rejects_broken_line() {
        assert!(matches!(
            parse_cookie_jar("foo\tbar\n"),
            Err(AppError::CookieJar(_))
        ));
    }

    #[test]
    fn test_sources_normalize_to_header() {
        let map = BTreeMap::from([("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]);
        assert_eq!(CookieSource::from(map).to_header().unwrap(), "a=1; b=2");

        let raw = CookieSource::from_arg("SESSDATA=abc; bili_jct=def");
        assert_eq!(raw, CookieSource::Raw("SESSDATA=abc; bili_jct=def".into()));
        assert_eq!(raw.to_header().unwrap(), "SESSDATA=abc; bili_jct=def");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(JAR.as_bytes()).unwrap();
        let jar = CookieSource::from_arg(file.path().to_str().unwrap());
        assert!(matches!(jar, CookieSource::JarFile(_)));
        assert_eq!(jar.to_header().unwrap(), "SESSDATA=abc%2C123; buvid3=XYZ");
    }
}
