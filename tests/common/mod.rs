// tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use mykit::{
    AppContext,
    client::RobustClient,
    config::{AppConfig, BilibiliEndpoints},
    error::AppResult,
    media::MediaMerger,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// 不调用 ffmpeg，把输入文件按顺序拼接到输出，并记录每次调用
#[derive(Default)]
pub struct RecordingMerger {
    pub calls: Mutex<Vec<(&'static str, Vec<PathBuf>, PathBuf)>>,
}

impl RecordingMerger {
    fn record(&self, kind: &'static str, inputs: &[PathBuf], output: &Path) -> AppResult<()> {
        let mut data = Vec::new();
        for input in inputs {
            data.extend(fs::read(input)?);
        }
        fs::write(output, data)?;
        self.calls
            .lock()
            .unwrap()
            .push((kind, inputs.to_vec(), output.to_path_buf()));
        Ok(())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(|(k, _, _)| *k).collect()
    }
}

#[async_trait]
impl MediaMerger for RecordingMerger {
    async fn merge_tracks(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()> {
        self.record("merge", inputs, output)
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()> {
        self.record("concat", inputs, output)
    }
}

pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        endpoints: BilibiliEndpoints::single(base_url),
        ..AppConfig::default()
    }
}

pub fn test_client(base_url: &str) -> Arc<RobustClient> {
    Arc::new(RobustClient::new(&test_config(base_url)).unwrap())
}

pub fn test_context(base_url: &str, merger: Arc<RecordingMerger>) -> AppContext {
    AppContext::with_config(test_config(base_url), merger).unwrap()
}

/// 一个两P视频的页面，内嵌 1080P 与 720P 两路流
pub fn video_page(base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head>
<meta name="author" content="某UP主">
<link rel="canonical" href="https://www.bilibili.com/video/av170001/">
<script>window.__playinfo__={{"code":0,"message":"0","data":{{"quality":80,"dash":{{"duration":100,
"video":[{{"id":80,"baseUrl":"{base}/media/80.m4s","codecs":"avc1.640032","height":1080,"bandwidth":8000}},
{{"id":64,"baseUrl":"{base}/media/64.m4s","codecs":"avc1.640028","height":720,"bandwidth":4000}}],
"audio":[{{"id":30280,"baseUrl":"{base}/media/a30280.m4s","codecs":"mp4a.40.2","bandwidth":3000}},
{{"id":30232,"baseUrl":"{base}/media/a30232.m4s","codecs":"mp4a.40.2","bandwidth":2000}}]}}}}}}</script>
<script>window.__INITIAL_STATE__={{"videoData":{{"aid":170001,"bvid":"BV17x411w7KC","title":"测试视频",
"pages":[{{"cid":1001,"page":1,"part":"上"}},{{"cid":1002,"page":2,"part":"下"}}]}}}};(function(){{var s;}}());</script>
</head><body></body></html>"#,
        base = base_url
    )
}

/// playurl 接口：4K 与 1080P60 两路流，以及一路重复的 1080P
pub fn playurl_body(base_url: &str) -> String {
    format!(
        r#"{{"code":0,"message":"0","data":{{"quality":120,"dash":{{"duration":100,
"video":[{{"id":120,"baseUrl":"{base}/media/120.m4s","codecs":"hev1","height":2160,"bandwidth":20000}},
{{"id":116,"baseUrl":"{base}/media/116.m4s","codecs":"avc1.640032","height":1080,"bandwidth":12000}},
{{"id":80,"baseUrl":"{base}/media/80-dup.m4s","codecs":"avc1.640032","height":1080,"bandwidth":8000}}],
"audio":[{{"id":30280,"baseUrl":"{base}/media/a30280.m4s","bandwidth":3000}},
{{"id":30232,"baseUrl":"{base}/media/a30232.m4s","bandwidth":2000}}]}}}}}}"#,
        base = base_url
    )
}
