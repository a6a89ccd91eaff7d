// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const DRAW_LINE_LEN: usize = 32;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const MAX_FILENAME_BYTES: usize = 200;
pub const SHELL_PROMPT: &str = ":# ";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub mod bilibili {
    pub const WEB_BASE: &str = "https://www.bilibili.com";
    pub const API_BASE: &str = "https://api.bilibili.com";
    pub const COMMENT_BASE: &str = "https://comment.bilibili.com";
    pub const VIDEO_PATH: &str = "/video/";
    pub const PLAYURL_PATH: &str = "/x/player/playurl";

    /// 默认最高画质: 1080P60
    pub const DEFAULT_QN_MAX: u32 = 116;
    /// 中档音质，约 128kbps
    pub const MODERATE_AUDIO_QN: u32 = 30232;
    pub const DEFAULT_OUTPUT_DIR: &str = ".";

    pub const MULTIPART_NOTICE: &str = "# multi-part video: use -p to download other part(s)";
    pub const MULTIPART_NOTICE_UPSTREAM: &str =
        "This is a multipart video. (use --playlist to download all parts.)";

    /// 缓存目录中每个分P的元数据与弹幕文件
    pub const ENTRY_JSON: &str = "entry.json";
    pub const DANMAKU_XML: &str = "danmaku.xml";
    pub const UPLOADER_PLACEHOLDER: &str = "NA";
}
