// src/bilibili/rename.rs

//! 把 jijidown 下载的文件名整理成 `序号. 标题 [av号].mp4`

use crate::{error::AppResult, ui};
use log::debug;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

static FLV_MP4_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.[Ff]lv\.mp4$").unwrap());
static AV_ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.)?(.*?)\(Av(\d+).*?\)").unwrap());
static PART_NUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.").unwrap());

/// 只计算新名字，不动文件
pub fn normalize_name(name: &str, part_num: bool) -> String {
    let mut new_name = FLV_MP4_RE.replace(name, ".mp4").into_owned();
    new_name = AV_ANNOTATION_RE.replace(&new_name, "${1} ${2} [av${3}]").into_owned();
    if !part_num {
        new_name = PART_NUM_RE.replace(&new_name, "").into_owned();
    }
    if let Some(stem) = new_name.strip_suffix(".ass") {
        new_name = format!("{}.bilibili-danmaku-ass", stem);
    } else if new_name.ends_with("lv.mp4") {
        // `.flv.mp4` 的变体，例如 `xxx_flv.mp4`
        let cut = new_name.char_indices().rev().nth(7).map(|(i, _)| i).unwrap_or(0);
        new_name = format!("{}.mp4", &new_name[..cut]);
    }
    new_name.trim().to_string()
}

/// 重命名单个文件或目录下的每一项；路径不存在时只报告，返回空列表
pub fn normalize(path: &Path, part_num: bool) -> AppResult<Vec<(PathBuf, PathBuf)>> {
    let targets: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else if path.is_dir() {
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .collect();
        entries.sort();
        entries
    } else {
        ui::plain(&format!("Not exist: {}", path.display()));
        return Ok(Vec::new());
    };

    let mut renamed = Vec::with_capacity(targets.len());
    for target in targets {
        let Some(name) = target.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let parent = target.parent().map(Path::to_path_buf).unwrap_or_default();
        let new_name = normalize_name(&name, part_num);
        ui::plain(&format!("{}:", parent.display()));
        ui::plain(&format!("{} -> {}", name, new_name));
        if new_name == name || new_name.is_empty() {
            continue;
        }
        let new_path = parent.join(&new_name);
        debug!("重命名 '{}' -> '{}'", target.display(), new_path.display());
        fs::rename(&target, &new_path)?;
        renamed.push((target, new_path));
    }
    Ok(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_with_part_num() {
        assert_eq!(normalize_name("5.MyShow(Av12345_p1).flv.mp4", true), "5. MyShow [av12345].mp4");
        assert_eq!(normalize_name("MyShow(Av12345).flv.mp4", true), "MyShow [av12345].mp4");
    }

    #[test]
    fn test_normalize_name_without_part_num() {
        assert_eq!(normalize_name("5.MyShow(Av12345_p1).flv.mp4", false), "MyShow [av12345].mp4");
    }

    #[test]
    fn test_normalize_suffixes() {
        assert_eq!(normalize_name("1.Song(Av1).ass", true), "1. Song [av1].bilibili-danmaku-ass");
        assert_eq!(normalize_name("clip_hdflv.mp4", true), "clip_h.mp4");
        assert_eq!(normalize_name("plain.mp4", true), "plain.mp4");
    }
}
