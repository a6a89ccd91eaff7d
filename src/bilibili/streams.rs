// src/bilibili/streams.rs

use log::debug;
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Flv,
    Mp4,
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Flv => write!(f, "FLV"),
            Container::Mp4 => write!(f, "MP4"),
        }
    }
}

/// 一种画质/封装格式。`quality` 即B站的 qn 数字，越大画质越高。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub id: String,
    pub quality: u32,
    pub audio_quality: u32,
    pub container: Container,
    pub resolution: String,
    pub desc: String,
}

impl StreamDescriptor {
    pub fn new(
        id: &str,
        quality: u32,
        audio_quality: u32,
        container: Container,
        resolution: &str,
        desc: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            quality,
            audio_quality,
            container,
            resolution: resolution.to_string(),
            desc: desc.to_string(),
        }
    }

    pub fn dash_key(&self) -> String {
        format!("dash-{}", self.id)
    }
}

/// 已知画质的有序表，高画质在前
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTable {
    pub types: Vec<StreamDescriptor>,
}

impl StreamTable {
    pub fn upstream() -> Self {
        use Container::*;
        Self {
            types: vec![
                StreamDescriptor::new("flv_p60", 116, 30280, Flv, "1080p", "高清 1080P60"),
                StreamDescriptor::new("hdflv2", 112, 30280, Flv, "1080p", "高清 1080P+"),
                StreamDescriptor::new("flv", 80, 30280, Flv, "1080p", "高清 1080P"),
                StreamDescriptor::new("flv720_p60", 74, 30280, Flv, "720p", "高清 720P60"),
                StreamDescriptor::new("flv720", 64, 30280, Flv, "720p", "高清 720P"),
                StreamDescriptor::new("hdmp4", 48, 30280, Mp4, "720p", "高清 720P (MP4)"),
                StreamDescriptor::new("flv480", 32, 30280, Flv, "480p", "清晰 480P"),
                StreamDescriptor::new("flv360", 16, 30216, Flv, "360p", "流畅 360P"),
                StreamDescriptor::new("mp4", 0, 30216, Mp4, "", ""),
            ],
        }
    }

    pub fn by_quality(&self, quality: u32) -> Option<&StreamDescriptor> {
        self.types.iter().find(|t| t.quality == quality)
    }

    pub fn by_id(&self, id: &str) -> Option<&StreamDescriptor> {
        self.types.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.types.iter().position(|t| t.id == id)
    }

    /// 所有画质统一使用同一档音质
    pub fn set_audio_quality(&mut self, audio_quality: u32) {
        for t in &mut self.types {
            t.audio_quality = audio_quality;
        }
    }
}

/// 解析得到的一路 DASH 流：视频轨 + 配对的音频轨
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashStream {
    pub descriptor: StreamDescriptor,
    pub video_url: String,
    pub audio_url: Option<String>,
    pub codecs: String,
    pub size: Option<u64>,
}

/// `dash-<format id>` -> 流
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSet {
    streams: BTreeMap<String, DashStream>,
}

impl StreamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stream: DashStream) -> bool {
        let key = stream.descriptor.dash_key();
        if self.streams.contains_key(&key) {
            return false;
        }
        self.streams.insert(key, stream);
        true
    }

    pub fn get(&self, key: &str) -> Option<&DashStream> {
        self.streams.get(key)
    }

    pub fn contains_quality(&self, quality: u32) -> bool {
        self.streams.values().any(|s| s.descriptor.quality == quality)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.streams.keys()
    }

    /// 按画质从高到低
    pub fn sorted(&self) -> Vec<(&String, &DashStream)> {
        let mut items: Vec<_> = self.streams.iter().collect();
        items.sort_by(|a, b| b.1.descriptor.quality.cmp(&a.1.descriptor.quality));
        items
    }

    pub fn best(&self) -> Option<(&String, &DashStream)> {
        self.sorted().into_iter().next()
    }

    /// 删掉超过最高画质的流，以及画质恰好等于 `exclude` 的流。返回删除的个数。
    pub fn filter(&mut self, qn_max: u32, exclude: Option<u32>) -> usize {
        let before = self.streams.len();
        self.streams.retain(|key, stream| {
            let q = stream.descriptor.quality;
            let keep = q <= qn_max && exclude != Some(q);
            if !keep {
                debug!("删除不需要的流 '{}' (qn={})", key, q);
            }
            keep
        });
        before - self.streams.len()
    }
}
