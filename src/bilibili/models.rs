// src/bilibili/models.rs

use serde::Deserialize;

/// 页面中 `window.__INITIAL_STATE__` 的必要部分
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialState {
    pub video_data: VideoData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoData {
    pub aid: u64,
    pub title: String,
    #[serde(default)]
    pub pages: Vec<PageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    pub cid: u64,
    #[serde(default)]
    pub part: String,
}

/// `window.__playinfo__` 与 playurl 接口的响应格式相同
#[derive(Debug, Clone, Deserialize)]
pub struct PlayInfo {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<PlayData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayData {
    #[serde(default)]
    pub quality: Option<u32>,
    #[serde(default)]
    pub dash: Option<Dash>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dash {
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub video: Vec<DashTrack>,
    #[serde(default)]
    pub audio: Option<Vec<DashTrack>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashTrack {
    pub id: u32,
    #[serde(rename = "baseUrl", alias = "base_url")]
    pub base_url: String,
    #[serde(default)]
    pub codecs: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bandwidth: Option<u64>,
}
