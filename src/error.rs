// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("无法解析来自 '{url}' 的API响应: {source}")]
    ApiParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("B站接口返回错误 (code {code}): {message}")]
    Api { code: i64, message: String },
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("正则表达式错误: {0}")]
    Regex(#[from] regex::Error),
    #[error("页面解析失败: {0}")]
    Scrape(String),
    #[error("Cookie 文件解析失败: {0}")]
    CookieJar(String),
    #[error("视频合并失败: {0}")]
    Merge(String),
    #[error("剪贴板不可用: {0}")]
    Clipboard(String),
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
