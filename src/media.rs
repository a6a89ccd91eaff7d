// src/media.rs

use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use log::{debug, error};
use std::{
    ffi::OsString,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;

/// 把下载得到的原始分片合成为可播放文件
#[async_trait]
pub trait MediaMerger: Send + Sync {
    /// 视频轨 + 音频轨 (m4s) 封装到一个文件
    async fn merge_tracks(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()>;
    /// 多段 (blv/flv) 首尾相接
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()>;
}

pub struct FfmpegMerger {
    ffmpeg: PathBuf,
}

impl FfmpegMerger {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    async fn run(&self, args: Vec<OsString>) -> AppResult<()> {
        debug!("执行: {} {:?}", self.ffmpeg.display(), args);
        // 终端的 Ctrl+C 发给整个进程组，ffmpeg 自己会收到；这里只保证 future 被丢弃时子进程不残留
        let output = Command::new(&self.ffmpeg)
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    AppError::Merge(format!("未找到 ffmpeg: {}", self.ffmpeg.display()))
                }
                _ => AppError::Io(e),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg 执行失败: status={}, stderr={}", output.status, stderr);
            return Err(AppError::Merge(format!("ffmpeg 退出状态 {}: {}", output.status, stderr.trim())));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaMerger for FfmpegMerger {
    async fn merge_tracks(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()> {
        let mut args: Vec<OsString> = Vec::new();
        for input in inputs {
            args.push("-i".into());
            args.push(input.clone().into_os_string());
        }
        args.extend(["-c".into(), "copy".into(), output.as_os_str().to_owned()]);
        self.run(args).await
    }

    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> AppResult<()> {
        let list_dir = tempfile::Builder::new().prefix("concat_").tempdir()?;
        let list_path = list_dir.path().join("list.txt");
        write_concat_list(&list_path, inputs)?;
        let args: Vec<OsString> = vec![
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_path.into_os_string(),
            "-c".into(),
            "copy".into(),
            output.as_os_str().to_owned(),
        ];
        self.run(args).await
    }
}

/// ffmpeg concat 分离器的列表文件
fn write_concat_list(path: &Path, inputs: &[PathBuf]) -> AppResult<()> {
    let mut file = fs::File::create(path)?;
    for input in inputs {
        let abs = dunce::canonicalize(input).unwrap_or_else(|_| input.clone());
        let escaped = abs.to_string_lossy().replace('\'', r"'\''");
        writeln!(file, "file '{}'", escaped)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_concat_list_escapes_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        let inputs = vec![PathBuf::from("/nonexistent/0.blv"), PathBuf::from("/nonexistent/it's.blv")];
        write_concat_list(&list, &inputs).unwrap();
        let content = fs::read_to_string(&list).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["file '/nonexistent/0.blv'", r"file '/nonexistent/it'\''s.blv'"]);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_is_merge_error() {
        let merger = FfmpegMerger::new("/nonexistent/ffmpeg-binary");
        let dir = tempfile::tempdir().unwrap();
        let result = merger.merge_tracks(&[], &dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(AppError::Merge(_))));
    }
}
