// src/bilibili/patch.rs

//! 下载器画质表、画质阶梯、标题和文件名规则的默认值，以及在其上施加的一组修改。
//!
//! 每个修改都要先找到自己的锚点（例如 id 为 `flv_p60` 的画质项）。找不到锚点时该修改什么
//! 也不做，对应行为保持默认值，只记一条警告，不视为错误。

use super::streams::{Container, StreamDescriptor, StreamTable};
use crate::constants::bilibili::{MULTIPART_NOTICE, MULTIPART_NOTICE_UPSTREAM};
use log::{debug, warn};
use std::fmt;

/// 由视频高度和 qn 推断画质档位：`height <= h && qn <= q` 的第一档，都不满足时取 `top`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityLadder {
    pub tiers: Vec<(u32, u32)>,
    pub top: u32,
}

impl QualityLadder {
    pub fn upstream() -> Self {
        Self {
            tiers: vec![(360, 16), (480, 32), (720, 64), (1080, 80)],
            top: 112,
        }
    }

    pub fn quality_for(&self, height: u32, qn: u32) -> u32 {
        self.tiers
            .iter()
            .find(|(h, q)| height <= *h && qn <= *q)
            .map(|(_, q)| *q)
            .unwrap_or(self.top)
    }
}

/// 分P视频提示信息的输出渠道
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeChannel {
    /// 经由日志输出
    Log(String),
    /// 直接写 stderr
    Stderr(String),
}

impl NoticeChannel {
    pub fn emit(&self) {
        match self {
            NoticeChannel::Log(msg) => warn!("{}", msg),
            NoticeChannel::Stderr(msg) => eprintln!("{}", msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartTitleFormat {
    /// `标题 (P2. 子标题)`
    Parenthesized,
    /// `标题 P2. 子标题`
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleStyle {
    /// 标题后追加 `[av号][BV号][UP主]`
    pub with_labels: bool,
    pub part_format: PartTitleFormat,
}

impl TitleStyle {
    pub fn upstream() -> Self {
        Self { with_labels: false, part_format: PartTitleFormat::Parenthesized }
    }

    pub fn part_title(&self, title: &str, p: usize, part: &str) -> String {
        match self.part_format {
            PartTitleFormat::Parenthesized => format!("{} (P{}. {})", title, p, part),
            PartTitleFormat::Plain => format!("{} P{}. {}", title, p, part),
        }
    }
}

/// 通过 playurl 接口补充其他画质时要尝试的 qn 列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltFormatPolicy {
    pub candidates: Vec<u32>,
    /// 只尝试低于当前已得到画质的档位
    pub respect_current_quality: bool,
}

impl AltFormatPolicy {
    pub fn upstream() -> Self {
        Self { candidates: vec![112, 80, 64, 32, 16], respect_current_quality: true }
    }

    pub fn should_query(&self, qn: u32, current_quality: Option<u32>) -> bool {
        if !self.respect_current_quality {
            return true;
        }
        current_quality.is_none_or(|current| qn < current)
    }
}

/// 生成文件名时的字符替换和长度限制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameRules {
    pub brackets_to_parens: bool,
    pub max_len: usize,
}

impl FilenameRules {
    pub fn upstream() -> Self {
        Self { brackets_to_parens: true, max_len: 80 }
    }

    pub fn legitimize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\0' => {}
                '/' | '|' | ':' | '*' | '?' | '\\' | '+' | '<' | '>' => out.push('-'),
                '"' => out.push('\''),
                '\t' => out.push(' '),
                '[' if self.brackets_to_parens => out.push('('),
                ']' if self.brackets_to_parens => out.push(')'),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
        let out = out.strip_prefix('.').unwrap_or(&out);
        out.chars().take(self.max_len).collect()
    }
}

/// 下载器的可调部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorProfile {
    pub stream_table: StreamTable,
    pub ladder: QualityLadder,
    pub multipart_notice: NoticeChannel,
    pub title_style: TitleStyle,
    pub alt_formats: AltFormatPolicy,
    /// 解析流结束时按画质上限删除多余的流
    pub filter_hook: bool,
    pub filename: FilenameRules,
}

impl ExtractorProfile {
    pub fn upstream() -> Self {
        Self {
            stream_table: StreamTable::upstream(),
            ladder: QualityLadder::upstream(),
            multipart_notice: NoticeChannel::Log(MULTIPART_NOTICE_UPSTREAM.to_string()),
            title_style: TitleStyle::upstream(),
            alt_formats: AltFormatPolicy::upstream(),
            filter_hook: false,
            filename: FilenameRules::upstream(),
        }
    }

    /// 默认值加上全部修改
    pub fn patched() -> Self {
        let mut profile = Self::upstream();
        PatchSet::standard().apply(&mut profile);
        profile
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
    /// 在 1080P60 之前加入 4K 画质
    Add4kStream,
    /// 画质阶梯在 1080P 和顶档之间加入 1080P+
    ExtendQualityLadder,
    /// 分P提示改为直接写 stderr
    MultipartNoticeToStderr,
    /// 标题追加视频号和UP主标签，分P标题去掉括号
    LabelledTitle,
    /// 补充画质时总是尝试全部档位，并加入 1080P60
    ProbeAllQualities,
    /// 解析结束时调用画质过滤
    FilterHook,
    /// 文件名保留方括号
    KeepBrackets,
    /// 文件名最长 200 字符
    LongerFilenames,
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Patch {
    /// 施加修改。找不到锚点时返回 false，profile 保持原样。
    pub fn apply(&self, profile: &mut ExtractorProfile) -> bool {
        match self {
            Patch::Add4kStream => {
                let table = &mut profile.stream_table;
                if table.by_id("hdflv2_4k").is_some() {
                    return false;
                }
                let Some(pos) = table.position("flv_p60") else {
                    return false;
                };
                table.types.insert(
                    pos,
                    StreamDescriptor::new("hdflv2_4k", 120, 30280, Container::Flv, "2160p", "超清 4K"),
                );
                true
            }
            Patch::ExtendQualityLadder => {
                let ladder = &mut profile.ladder;
                if ladder.top != 112 || ladder.tiers.last() != Some(&(1080, 80)) {
                    return false;
                }
                ladder.tiers.push((1080, 112));
                ladder.top = 120;
                true
            }
            Patch::MultipartNoticeToStderr => {
                if profile.multipart_notice != NoticeChannel::Log(MULTIPART_NOTICE_UPSTREAM.to_string()) {
                    return false;
                }
                profile.multipart_notice = NoticeChannel::Stderr(MULTIPART_NOTICE.to_string());
                true
            }
            Patch::LabelledTitle => {
                if profile.title_style != TitleStyle::upstream() {
                    return false;
                }
                profile.title_style = TitleStyle { with_labels: true, part_format: PartTitleFormat::Plain };
                true
            }
            Patch::ProbeAllQualities => {
                if profile.alt_formats != AltFormatPolicy::upstream() {
                    return false;
                }
                profile.alt_formats.candidates.insert(0, 116);
                profile.alt_formats.respect_current_quality = false;
                true
            }
            Patch::FilterHook => {
                if profile.filter_hook {
                    return false;
                }
                profile.filter_hook = true;
                true
            }
            Patch::KeepBrackets => {
                if !profile.filename.brackets_to_parens {
                    return false;
                }
                profile.filename.brackets_to_parens = false;
                true
            }
            Patch::LongerFilenames => {
                if profile.filename.max_len != 80 {
                    return false;
                }
                profile.filename.max_len = 200;
                true
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: Vec<Patch>,
    pub skipped: Vec<Patch>,
}

#[derive(Debug, Clone)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    pub fn new(patches: Vec<Patch>) -> Self {
        Self { patches }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Patch::Add4kStream,
            Patch::ExtendQualityLadder,
            Patch::MultipartNoticeToStderr,
            Patch::LabelledTitle,
            Patch::ProbeAllQualities,
            Patch::FilterHook,
            Patch::KeepBrackets,
            Patch::LongerFilenames,
        ])
    }

    /// 按顺序施加；缺锚点的修改被跳过，不影响其余修改
    pub fn apply(&self, profile: &mut ExtractorProfile) -> PatchReport {
        let mut report = PatchReport::default();
        for patch in &self.patches {
            if patch.apply(profile) {
                debug!("已应用修改: {}", patch);
                report.applied.push(*patch);
            } else {
                warn!("未找到修改 '{}' 的锚点，保持默认行为", patch);
                report.skipped.push(*patch);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_patches_apply_to_upstream() {
        let mut profile = ExtractorProfile::upstream();
        let report = PatchSet::standard().apply(&mut profile);
        assert!(report.skipped.is_empty());
        assert_eq!(report.applied.len(), 8);

        assert_eq!(profile.stream_table.types[0].id, "hdflv2_4k");
        assert_eq!(profile.stream_table.types[1].id, "flv_p60");
        assert_eq!(profile.ladder.quality_for(1080, 112), 112);
        assert_eq!(profile.ladder.quality_for(2160, 120), 120);
        assert_eq!(profile.alt_formats.candidates, vec![116, 112, 80, 64, 32, 16]);
        assert!(profile.alt_formats.should_query(116, Some(80)));
        assert!(profile.filter_hook);
        assert_eq!(profile.filename, FilenameRules { brackets_to_parens: false, max_len: 200 });
        assert_eq!(profile, ExtractorProfile::patched());
    }

    #[test]
    fn test_missing_anchor_is_noop() {
        let mut profile = ExtractorProfile::upstream();
        profile.stream_table.types.retain(|t| t.id != "flv_p60");
        profile.ladder.tiers.pop();
        let table_before = profile.stream_table.clone();
        let ladder_before = profile.ladder.clone();

        let report = PatchSet::standard().apply(&mut profile);

        assert_eq!(report.skipped, vec![Patch::Add4kStream, Patch::ExtendQualityLadder]);
        assert_eq!(profile.stream_table, table_before);
        assert_eq!(profile.ladder, ladder_before);
        // 其余修改照常生效
        assert!(profile.filter_hook);
        assert_eq!(profile.title_style.part_format, PartTitleFormat::Plain);
    }

    #[test]
    fn test_patches_are_not_reapplied() {
        let mut profile = ExtractorProfile::patched();
        let report = PatchSet::standard().apply(&mut profile);
        assert!(report.applied.is_empty());
        assert_eq!(profile, ExtractorProfile::patched());
    }

    #[test]
    fn test_upstream_ladder_and_alt_policy() {
        let ladder = QualityLadder::upstream();
        assert_eq!(ladder.quality_for(360, 16), 16);
        assert_eq!(ladder.quality_for(720, 64), 64);
        assert_eq!(ladder.quality_for(1080, 112), 112);
        assert_eq!(ladder.quality_for(2160, 120), 112);

        let alt = AltFormatPolicy::upstream();
        assert!(alt.should_query(112, None));
        assert!(!alt.should_query(80, Some(80)));
        assert!(alt.should_query(64, Some(80)));
    }

    #[test]
    fn test_legitimize() {
        let upstream = FilenameRules::upstream();
        assert_eq!(upstream.legitimize("a/b|c [av1]"), "a-b-c (av1)");
        assert_eq!(upstream.legitimize(".hidden"), "hidden");
        assert_eq!(upstream.legitimize(&"x".repeat(100)).chars().count(), 80);

        let patched = ExtractorProfile::patched().filename;
        assert_eq!(patched.legitimize("标题 [av1][UP主]"), "标题 [av1][UP主]");
        assert_eq!(patched.legitimize(&"长".repeat(300)).chars().count(), 200);
    }

    #[test]
    fn test_part_title_formats() {
        let style = TitleStyle::upstream();
        assert_eq!(style.part_title("T", 2, "B"), "T (P2. B)");
        let style = ExtractorProfile::patched().title_style;
        assert_eq!(style.part_title("T", 2, "B"), "T P2. B");
    }
}
