// src/bilibili/cache.rs

//! 整理 B 站客户端的离线缓存：每个视频一个以 av 号命名的目录，其中每个分P一个子目录，
//! 子目录内有 `entry.json`、`danmaku.xml` 和 `<type_tag>/` 下的原始分片。

use super::{cookies::CookieSource, page};
use crate::{
    client::RobustClient,
    config::BilibiliEndpoints,
    constants::bilibili::{DANMAKU_XML, ENTRY_JSON, UPLOADER_PLACEHOLDER},
    error::{AppError, AppResult},
    media::MediaMerger,
    ui, utils,
};
use anyhow::Context;
use itertools::Itertools;
use log::{debug, info, warn};
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// JSON 里有时是数字有时是字符串的字段
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(u64),
    Str(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    type_tag: String,
    page_data: Option<RawPageData>,
    ep: Option<RawEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPageData {
    #[serde(default)]
    part: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEpisode {
    #[serde(default)]
    index_title: String,
    av_id: Scalar,
    index: Scalar,
}

/// 分P元数据，按 `entry.json` 的形状区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMeta {
    RegularUpload { title: String, type_tag: String, part: String },
    SeriesEpisode { title: String, type_tag: String, index_title: String, av_id: String, index: String },
}

impl EntryMeta {
    /// 既没有 `page_data` 也没有 `ep` 时返回 None
    pub fn parse(json: &str) -> AppResult<Option<Self>> {
        let raw: RawEntry = serde_json::from_str(json)?;
        let meta = if let Some(page_data) = raw.page_data {
            Some(EntryMeta::RegularUpload { title: raw.title, type_tag: raw.type_tag, part: page_data.part })
        } else {
            raw.ep.map(|ep| EntryMeta::SeriesEpisode {
                title: raw.title,
                type_tag: raw.type_tag,
                index_title: ep.index_title,
                av_id: ep.av_id.to_string(),
                index: ep.index.to_string(),
            })
        };
        Ok(meta)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub outputs: Vec<PathBuf>,
    /// 没有元数据或无法识别而跳过的分P
    pub skipped: Vec<String>,
}

pub struct CacheEntry {
    folder: PathBuf,
    work_dir: PathBuf,
    id: String,
    part_list: Vec<String>,
    cookie: Option<String>,
    uploader: Option<String>,
    client: Arc<RobustClient>,
    endpoints: BilibiliEndpoints,
    merger: Arc<dyn MediaMerger>,
}

impl CacheEntry {
    pub fn new(
        folder: &Path,
        cookies: Option<&CookieSource>,
        client: Arc<RobustClient>,
        endpoints: BilibiliEndpoints,
        merger: Arc<dyn MediaMerger>,
    ) -> AppResult<Self> {
        let real = dunce::canonicalize(folder)
            .with_context(|| format!("缓存目录 '{}' 不存在或无法访问", folder.display()))?;
        let work_dir = real.parent().map(Path::to_path_buf).unwrap_or_else(|| real.clone());
        let id = real
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::UserInputError(format!("无效的缓存目录: {}", folder.display())))?;

        let part_list = fs::read_dir(&real)?
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .sorted_by_key(|name| (name.parse::<u64>().unwrap_or(u64::MAX), name.clone()))
            .collect();

        let cookie = cookies.map(CookieSource::to_header).transpose()?;

        Ok(Self {
            folder: real,
            work_dir,
            id,
            part_list,
            cookie,
            uploader: None,
            client,
            endpoints,
            merger,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn part_sum(&self) -> usize {
        self.part_list.len()
    }

    /// 从视频页面取 UP 主名字。页面返回错误状态或没有作者信息时为 "NA"
    pub async fn uploader(&mut self) -> AppResult<String> {
        if let Some(name) = &self.uploader {
            return Ok(name.clone());
        }
        let url = format!("{}/video/av{}/", self.endpoints.web_base, self.id);
        let referer = format!("{}/", self.endpoints.web_base);
        let name = match self.client.get_text(&url, Some(&referer), self.cookie.as_deref()).await {
            Ok(body) => page::meta_author(&body),
            Err(AppError::Network(e)) if e.status().is_some() => {
                warn!("获取 UP 主失败 ({}): {}", url, e);
                None
            }
            Err(e) => return Err(e),
        };
        let name = name.unwrap_or_else(|| UPLOADER_PLACEHOLDER.to_string());
        self.uploader = Some(name.clone());
        Ok(name)
    }

    pub async fn extract_all(&mut self) -> AppResult<ExtractReport> {
        ui::plain(&format!("+ {}", self.folder.display()));
        let mut report = ExtractReport::default();
        for part in self.part_list.clone() {
            let meta_path = self.folder.join(&part).join(ENTRY_JSON);
            let json = match fs::read_to_string(&meta_path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    ui::plain(&format!("  + {}: NO JSON META FOUND", part));
                    info!("分P '{}' 没有 {}，跳过", part, ENTRY_JSON);
                    report.skipped.push(part);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let output = match EntryMeta::parse(&json)? {
                Some(EntryMeta::RegularUpload { title, type_tag, part: part_title }) => {
                    self.extract_upload(&part, &title, &type_tag, &part_title).await?
                }
                Some(EntryMeta::SeriesEpisode { title, type_tag, index_title, av_id, index }) => {
                    self.extract_episode(&part, &title, &type_tag, &index_title, &av_id, &index).await?
                }
                None => {
                    warn!("分P '{}' 的元数据既不是投稿也不是剧集，跳过", part);
                    ui::plain(&format!("  + {}: UNKNOWN META", part));
                    report.skipped.push(part);
                    continue;
                }
            };
            ui::plain(&format!("  + {}: {}", part, output.display()));
            report.outputs.push(output);
        }
        Ok(report)
    }

    async fn extract_upload(&mut self, part: &str, title: &str, type_tag: &str, part_title: &str) -> AppResult<PathBuf> {
        let files = self.fragments(part, type_tag)?;
        let uploader = self.uploader().await?;
        let mut name = format!("{} [av{}][{}]", utils::safe_basename(title), self.id, utils::safe_basename(&uploader));
        if self.part_sum() >= 2 {
            name.push_str(&format!("{}-{}.mp4", part, utils::safe_basename(part_title)));
        } else {
            name.push_str(".mp4");
        }
        let output = self.work_dir.join(name);

        let m4s = with_extension(&files, "m4s");
        let blv = with_extension(&files, "blv");
        if !m4s.is_empty() {
            self.merger.merge_tracks(&m4s, &output).await?;
        } else if !blv.is_empty() {
            self.merger.concat(&blv, &output).await?;
        } else {
            ui::warn(&format!("{}: NO MEDIA STREAM FOUND", part));
        }
        self.copy_danmaku(part, &output)?;
        Ok(output)
    }

    async fn extract_episode(
        &mut self,
        part: &str,
        title: &str,
        type_tag: &str,
        index_title: &str,
        av_id: &str,
        index: &str,
    ) -> AppResult<PathBuf> {
        let blv = with_extension(&self.fragments(part, type_tag)?, "blv");
        let output_dir = self
            .work_dir
            .join(format!("{} [av{}][{}]", utils::safe_basename(title), av_id, self.id));
        fs::create_dir_all(&output_dir)?;
        let output = output_dir.join(format!(
            "{}. {}.mp4",
            utils::zero_pad(index, self.part_sum()),
            utils::safe_basename(index_title)
        ));
        if blv.is_empty() {
            ui::warn(&format!("{}: NO MEDIA STREAM FOUND", part));
        } else {
            self.merger.concat(&blv, &output).await?;
        }
        self.copy_danmaku(part, &output)?;
        Ok(output)
    }

    /// `<part>/<type_tag>/` 下的全部文件，按名字排序
    fn fragments(&self, part: &str, type_tag: &str) -> AppResult<Vec<PathBuf>> {
        let dir = self.folder.join(part).join(type_tag);
        if !dir.is_dir() {
            debug!("分片目录不存在: {}", dir.display());
            return Ok(Vec::new());
        }
        let files = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .sorted_by_key(|p| fragment_order(p))
            .collect();
        Ok(files)
    }

    fn copy_danmaku(&self, part: &str, output: &Path) -> AppResult<()> {
        let src = self.folder.join(part).join(DANMAKU_XML);
        if !src.is_file() {
            warn!("分P '{}' 没有弹幕文件", part);
            return Ok(());
        }
        let dest = output.with_extension("xml");
        fs::copy(&src, &dest).with_context(|| format!("复制弹幕到 '{}' 失败", dest.display()))?;
        Ok(())
    }
}

/// 按文件名中的数字排序（`0.blv`, `1.blv`, ..., `10.blv`），其余按名字
fn fragment_order(path: &Path) -> (u64, String) {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    (stem.parse().unwrap_or(u64::MAX), stem)
}

fn with_extension(files: &[PathBuf], ext: &str) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|f| f.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)))
        .cloned()
        .collect()
}
