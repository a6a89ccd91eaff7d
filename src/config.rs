// src/config.rs

pub mod file;

use self::file::load_or_create_external_config;
use crate::{cli::Cli, constants, error::AppResult};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BilibiliConfig {
    /// cookies 文件路径或整串 cookie，命令行参数优先
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub bilibili: BilibiliConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        // 不自动重试，不限制总耗时（大文件下载可能很久）
        let network_config = NetworkConfig {
            connect_timeout_secs: Some(10),
            timeout_secs: None,
            max_retries: Some(0),
        };

        Self {
            network: network_config,
            bilibili: BilibiliConfig::default(),
        }
    }
}

/// B站相关的几个服务地址，测试时可以整体替换成 mock 服务器
#[derive(Debug, Clone)]
pub struct BilibiliEndpoints {
    pub web_base: String,
    pub api_base: String,
    pub comment_base: String,
}

impl Default for BilibiliEndpoints {
    fn default() -> Self {
        Self {
            web_base: constants::bilibili::WEB_BASE.to_string(),
            api_base: constants::bilibili::API_BASE.to_string(),
            comment_base: constants::bilibili::COMMENT_BASE.to_string(),
        }
    }
}

impl BilibiliEndpoints {
    /// 所有端点都指向同一个地址
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            web_base: base.clone(),
            api_base: base.clone(),
            comment_base: base,
        }
    }

    pub fn video_url(&self, vid: &str) -> String {
        format!("{}{}{}", self.web_base, constants::bilibili::VIDEO_PATH, vid)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    pub cookies: Option<String>,
    pub endpoints: BilibiliEndpoints,
    pub ffmpeg: PathBuf,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        let network = external_config.network;
        let bili = external_config.bilibili;
        let defaults = BilibiliEndpoints::default();

        Ok(Self {
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(network.connect_timeout_secs.unwrap_or(10)),
            timeout: network.timeout_secs.map(Duration::from_secs),
            max_retries: network.max_retries.unwrap_or(0),
            cookies: args.command.cookies().map(str::to_string).or(bili.cookies),
            endpoints: BilibiliEndpoints {
                web_base: bili.web_base.unwrap_or(defaults.web_base),
                api_base: bili.api_base.unwrap_or(defaults.api_base),
                comment_base: bili.comment_base.unwrap_or(defaults.comment_base),
            },
            ffmpeg: bili.ffmpeg.unwrap_or_else(|| PathBuf::from("ffmpeg")),
        })
    }
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Some(Duration::from_secs(15)),
            max_retries: 0,
            cookies: None,
            endpoints: BilibiliEndpoints::default(),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}
