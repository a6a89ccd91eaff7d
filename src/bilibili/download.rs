// src/bilibili/download.rs

use super::{
    cookies::CookieSource,
    extractor::{BilibiliExtractor, ExtractorOptions, FetchParams},
    page,
    vid::VideoId,
};
use crate::{
    AppContext,
    constants::bilibili::MODERATE_AUDIO_QN,
    error::{AppError, AppResult},
    ui::Drawer,
};
use log::info;
use std::{io::Write, path::PathBuf};

/// `bili.dl` 的全部选项
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub cookies: Option<CookieSource>,
    pub output_dir: PathBuf,
    pub parts: Vec<u32>,
    pub qn_max: u32,
    pub qn_exclude: Option<u32>,
    pub moderate_audio: bool,
    pub format: Option<String>,
    pub info_only: bool,
    pub playlist: bool,
    pub caption: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    Playlist,
    Selective,
}

impl DownloadOptions {
    /// `info_only` 不是单独的模式，它随每次获取一起传下去
    pub fn mode(&self) -> DownloadMode {
        if self.playlist {
            DownloadMode::Playlist
        } else {
            DownloadMode::Selective
        }
    }

    fn fetch_params(&self) -> FetchParams {
        FetchParams {
            output_dir: self.output_dir.clone(),
            format: self.format.clone(),
            caption: self.caption,
            info_only: self.info_only,
        }
    }
}

/// 按 `-p` 给出的分P序号生成 URL 列表，没有给出时只有原 URL
pub fn part_urls(url: &str, parts: &[u32]) -> AppResult<Vec<String>> {
    if parts.is_empty() {
        return Ok(vec![url.to_string()]);
    }
    parts.iter().map(|p| page::with_part(url, *p)).collect()
}

pub async fn download<W: Write>(
    ctx: &AppContext,
    target: &str,
    options: &DownloadOptions,
    drawer: &mut Drawer<W>,
) -> AppResult<Vec<PathBuf>> {
    let vid = VideoId::parse_input(target)
        .ok_or_else(|| AppError::UserInputError(format!("无法识别视频号: '{}'", target)))?;
    let url = ctx.config.endpoints.video_url(&vid.to_string());
    info!("下载 {} ({:?} 模式) -> {}", url, options.mode(), options.output_dir.display());

    let mut extractor = BilibiliExtractor::new(
        ctx.http_client.clone(),
        ctx.config.endpoints.clone(),
        ctx.merger.clone(),
        ExtractorOptions {
            cookies: options.cookies.clone(),
            qn_max: options.qn_max,
            qn_exclude: options.qn_exclude,
        },
    )?;
    if options.moderate_audio {
        extractor.set_audio_quality(MODERATE_AUDIO_QN);
    }

    let params = options.fetch_params();
    let mut outputs = Vec::new();
    match options.mode() {
        DownloadMode::Playlist => {
            banner(drawer, &url, options);
            outputs = extractor.download_playlist_by_url(&url, &params).await?;
        }
        DownloadMode::Selective => {
            for part_url in part_urls(&url, &options.parts)? {
                banner(drawer, &part_url, options);
                if let Some(path) = extractor.download_by_url(&part_url, &params, false).await? {
                    outputs.push(path);
                }
            }
        }
    }
    drawer.hl();
    Ok(outputs)
}

fn banner<W: Write>(drawer: &mut Drawer<W>, url: &str, options: &DownloadOptions) {
    drawer.hl();
    drawer.print(&format!("{} -> {}", url, options.output_dir.display()));
}
