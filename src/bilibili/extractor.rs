// src/bilibili/extractor.rs

use super::{
    cookies::CookieSource,
    models::{Dash, DashTrack, PlayInfo},
    page,
    patch::ExtractorProfile,
    streams::{DashStream, StreamSet},
    vid::VideoId,
};
use crate::{
    client::RobustClient,
    config::BilibiliEndpoints,
    constants::bilibili::PLAYURL_PATH,
    error::{AppError, AppResult},
    media::MediaMerger,
    ui,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use regex::Regex;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

static CANONICAL_AV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(av\d+)/").unwrap());

#[derive(Debug, Clone, Default)]
pub struct ExtractorOptions {
    pub cookies: Option<CookieSource>,
    pub qn_max: u32,
    pub qn_exclude: Option<u32>,
}

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub title: String,
    pub aid: u64,
    pub cid: u64,
    pub part: usize,
    pub part_count: usize,
    /// 是否打印了多P提示
    pub notice_shown: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FetchParams {
    pub output_dir: PathBuf,
    pub format: Option<String>,
    pub caption: bool,
    pub info_only: bool,
}

pub struct BilibiliExtractor {
    client: Arc<RobustClient>,
    endpoints: BilibiliEndpoints,
    merger: Arc<dyn MediaMerger>,
    pub profile: ExtractorProfile,
    cookie: Option<String>,
    qn_max: u32,
    qn_exclude: Option<u32>,
    url: String,
    /// (url, 页面 HTML)，只在 url 变化时重新获取
    document: Option<(String, String)>,
    pub streams: StreamSet,
}

impl BilibiliExtractor {
    pub fn new(
        client: Arc<RobustClient>,
        endpoints: BilibiliEndpoints,
        merger: Arc<dyn MediaMerger>,
        options: ExtractorOptions,
    ) -> AppResult<Self> {
        let cookie = options.cookies.as_ref().map(CookieSource::to_header).transpose()?;
        Ok(Self {
            client,
            endpoints,
            merger,
            profile: ExtractorProfile::patched(),
            cookie,
            qn_max: options.qn_max,
            qn_exclude: options.qn_exclude,
            url: String::new(),
            document: None,
            streams: StreamSet::new(),
        })
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn set_audio_quality(&mut self, audio_quality: u32) {
        self.profile.stream_table.set_audio_quality(audio_quality);
    }

    fn referer(&self) -> String {
        format!("{}/", self.endpoints.web_base)
    }

    /// 当前 URL 的页面 HTML，同一 URL 只请求一次
    pub async fn refresh_document(&mut self) -> AppResult<&str> {
        let stale = self.document.as_ref().is_none_or(|(url, _)| *url != self.url);
        if stale {
            debug!("获取页面: {}", self.url);
            let body = self
                .client
                .get_text(&self.url, Some(&self.referer()), self.cookie.as_deref())
                .await?;
            self.document = Some((self.url.clone(), body));
        }
        Ok(self.document.as_ref().map(|(_, body)| body.as_str()).unwrap_or_default())
    }

    pub fn resolve_vid(&self) -> Option<VideoId> {
        VideoId::from_url(&self.url)
    }

    /// `[av号]`，BV 号则为 `[BV号][av号]`
    pub async fn vid_label(&mut self) -> AppResult<String> {
        let vid = self
            .resolve_vid()
            .ok_or_else(|| AppError::Scrape(format!("无法从 URL 识别视频号: {}", self.url)))?;
        let mut label = format!("[{}]", vid);
        if vid.is_bv() {
            let body = self.refresh_document().await?;
            let avid = page::canonical_href(body)
                .and_then(|href| {
                    CANONICAL_AV_RE
                        .captures(&href)
                        .and_then(|c| c.get(1))
                        .map(|m| m.as_str().to_string())
                })
                .ok_or_else(|| AppError::Scrape("页面 canonical 链接中没有 av 号".to_string()))?;
            label.push_str(&format!("[{}]", avid));
        }
        Ok(label)
    }

    pub async fn author(&mut self) -> AppResult<String> {
        let body = self.refresh_document().await?;
        page::meta_author(body).ok_or_else(|| AppError::Scrape("页面中没有 UP 主信息".to_string()))
    }

    /// `[UP主]`
    pub async fn author_label(&mut self) -> AppResult<String> {
        Ok(format!("[{}]", self.author().await?))
    }

    /// 按画质上限和排除项删除流
    pub fn filter_streams(&mut self) -> usize {
        let removed = self.streams.filter(self.qn_max, self.qn_exclude);
        debug!("画质过滤 (上限 {}, 排除 {:?}) 删除了 {} 个流", self.qn_max, self.qn_exclude, removed);
        removed
    }

    /// 解析 URL 对应的视频：标题、分P、全部可用流
    pub async fn prepare(&mut self, url: &str, playlist: bool) -> AppResult<VideoInfo> {
        self.set_url(url);
        self.streams = StreamSet::new();
        let body = self.refresh_document().await?.to_string();
        let state = page::initial_state(&body)?;
        let video = state.video_data;

        let mut title = video.title.clone();
        if self.profile.title_style.with_labels {
            let labels = format!("{}{}", self.vid_label().await?, self.author_label().await?);
            title = format!("{} {}", title, labels);
        }

        let p = page::part_number(url);
        let pn = video.pages.len();
        let page_info = p.checked_sub(1).and_then(|i| video.pages.get(i));
        let mut notice_shown = false;
        if pn > 1 {
            let part = page_info.map(|pg| pg.part.as_str()).unwrap_or_default();
            title = self.profile.title_style.part_title(&title, p, part);
            if !playlist {
                self.profile.multipart_notice.emit();
                notice_shown = true;
            }
        }
        let cid = page_info
            .map(|pg| pg.cid)
            .ok_or_else(|| AppError::UserInputError(format!("分P {} 不存在 (共 {} P)", p, pn)))?;

        let playinfo = page::playinfo(&body)?;
        let current_quality = playinfo.as_ref().and_then(|i| i.data.as_ref()).and_then(|d| d.quality);
        if let Some(dash) = playinfo.and_then(|i| i.data).and_then(|d| d.dash) {
            self.add_dash(&dash);
        }

        let mut api_error = None;
        for qn in self.profile.alt_formats.candidates.clone() {
            if !self.profile.alt_formats.should_query(qn, current_quality) {
                continue;
            }
            let api_url = format!(
                "{}{}?avid={}&cid={}&qn={}&type=&otype=json&fnver=0&fnval=16",
                self.endpoints.api_base, PLAYURL_PATH, video.aid, cid, qn
            );
            let info: PlayInfo = self
                .client
                .get_json(&api_url, Some(&self.referer()), self.cookie.as_deref())
                .await?;
            if info.code != 0 {
                warn!("playurl qn={} 返回 code {}: {}", qn, info.code, info.message);
                api_error = Some(AppError::Api { code: info.code, message: info.message });
                continue;
            }
            if let Some(dash) = info.data.and_then(|d| d.dash) {
                self.add_dash(&dash);
            }
        }

        if self.streams.is_empty() {
            if let Some(e) = api_error {
                return Err(e);
            }
        }
        if self.profile.filter_hook {
            self.filter_streams();
        }
        info!("解析完成: '{}' (av{}, cid {}), {} 个流", title, video.aid, cid, self.streams.len());

        Ok(VideoInfo { title, aid: video.aid, cid, part: p, part_count: pn, notice_shown })
    }

    fn add_dash(&mut self, dash: &Dash) {
        let audio = dash.audio.as_deref().unwrap_or_default();
        for track in &dash.video {
            let table = &self.profile.stream_table;
            let descriptor = table.by_quality(track.id).or_else(|| {
                let q = self.profile.ladder.quality_for(track.height.unwrap_or(0), track.id);
                table.by_quality(q)
            });
            let Some(descriptor) = descriptor.cloned() else {
                debug!("未知画质 qn={}，忽略", track.id);
                continue;
            };
            let audio_track = pick_audio(audio, descriptor.audio_quality);
            let size = match (track.bandwidth, audio_track.and_then(|a| a.bandwidth)) {
                (Some(v), a) if dash.duration > 0 => Some((v + a.unwrap_or(0)) * dash.duration / 8),
                _ => None,
            };
            let inserted = self.streams.insert(DashStream {
                descriptor,
                video_url: track.base_url.clone(),
                audio_url: audio_track.map(|a| a.base_url.clone()),
                codecs: track.codecs.clone(),
                size,
            });
            if inserted {
                debug!("加入流 qn={} ({})", track.id, track.codecs);
            }
        }
    }

    /// 打印全部可用流
    pub fn print_info(&self, info: &VideoInfo) {
        ui::print_sub_header(&info.title);
        for (key, stream) in self.streams.sorted() {
            let size = stream
                .size
                .map(|s| format!("{:.1} MiB", s as f64 / 1024.0 / 1024.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "    - format:  {}\n      container: {}\n      quality: {} ({})\n      size:    {}\n      # download-with: --format {}",
                key, stream.descriptor.container, stream.descriptor.desc, stream.descriptor.quality, size, key
            );
        }
    }

    pub async fn download_by_url(&mut self, url: &str, params: &FetchParams, playlist: bool) -> AppResult<Option<PathBuf>> {
        let info = self.prepare(url, playlist).await?;
        if params.info_only {
            self.print_info(&info);
            return Ok(None);
        }
        self.fetch(&info, params).await.map(Some)
    }

    /// 逐个下载全部分P
    pub async fn download_playlist_by_url(&mut self, url: &str, params: &FetchParams) -> AppResult<Vec<PathBuf>> {
        self.set_url(url);
        let part_count = page::initial_state(self.refresh_document().await?)?.video_data.pages.len();
        let mut outputs = Vec::new();
        for p in 1..=part_count.max(1) {
            let part_url = page::with_part(url, p as u32)?;
            if let Some(path) = self.download_by_url(&part_url, params, true).await? {
                outputs.push(path);
            }
        }
        Ok(outputs)
    }

    async fn fetch(&self, info: &VideoInfo, params: &FetchParams) -> AppResult<PathBuf> {
        let (key, stream) = match params.format.as_deref() {
            Some(key) => self
                .streams
                .get(key)
                .map(|s| (key.to_string(), s))
                .ok_or_else(|| AppError::UserInputError(format!("没有格式 '{}'，可用: {:?}", key, self.streams.keys().collect::<Vec<_>>())))?,
            None => self
                .streams
                .best()
                .map(|(k, s)| (k.clone(), s))
                .ok_or_else(|| AppError::UserInputError("没有可下载的流 (画质过滤后为空?)".to_string()))?,
        };

        fs::create_dir_all(&params.output_dir)?;
        let name = self.profile.filename.legitimize(&info.title);
        let output = params.output_dir.join(format!("{}.mp4", name));

        if params.caption {
            let caption_path = params.output_dir.join(format!("{}.cmt.xml", name));
            self.fetch_caption(info.cid, &caption_path).await?;
        }

        if output.exists() {
            ui::info(&format!("文件已存在，跳过: {}", output.display()));
            return Ok(output);
        }

        ui::info(&format!("下载 {} ({}) -> {}", key, stream.descriptor.desc, output.display()));
        let temp_dir = tempfile::Builder::new().prefix("bili_dl_").tempdir()?;
        let mut tracks = vec![temp_dir.path().join("video.m4s")];
        self.fetch_to_file(&stream.video_url, &tracks[0], "video").await?;
        if let Some(audio_url) = &stream.audio_url {
            let audio_path = temp_dir.path().join("audio.m4s");
            self.fetch_to_file(audio_url, &audio_path, "audio").await?;
            tracks.push(audio_path);
        }
        self.merger.merge_tracks(&tracks, &output).await?;
        ui::ok(&format!("完成: {}", output.display()));
        Ok(output)
    }

    async fn fetch_caption(&self, cid: u64, path: &Path) -> AppResult<()> {
        let url = format!("{}/{}.xml", self.endpoints.comment_base, cid);
        let xml = self.client.get_text(&url, Some(&self.referer()), self.cookie.as_deref()).await?;
        fs::write(path, xml)?;
        debug!("弹幕已保存: {}", path.display());
        Ok(())
    }

    async fn fetch_to_file(&self, url: &str, path: &Path, label: &str) -> AppResult<()> {
        let res = self.client.get(url, Some(&self.referer()), self.cookie.as_deref()).await?;
        let pbar = new_bytes_progress_bar(res.content_length(), label);
        let mut file = File::create(path)?;
        let mut stream = res.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            pbar.inc(chunk.len() as u64);
        }
        file.flush()?;
        pbar.finish_and_clear();
        Ok(())
    }
}

/// 优先取与画质表中音质一致的音轨，否则取最好的
fn pick_audio(audio: &[DashTrack], audio_quality: u32) -> Option<&DashTrack> {
    audio
        .iter()
        .find(|a| a.id == audio_quality)
        .or_else(|| audio.iter().max_by_key(|a| a.id))
}

fn new_bytes_progress_bar(total: Option<u64>, label: &str) -> ProgressBar {
    let pbar = match total {
        Some(len) => ProgressBar::new(len),
        None => ProgressBar::new_spinner(),
    };
    let style = ProgressStyle::with_template(
        "{prefix:>6} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    )
    .map(|s| s.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    pbar.set_style(style);
    pbar.set_prefix(label.to_string());
    pbar
}
