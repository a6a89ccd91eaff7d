// src/cli.rs

use crate::constants;
use clap::{Args, Parser, Subcommand, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// 定义日志输出级别
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mykit",
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// (隐藏参数) 设置日志文件的输出级别，用于调试
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// for test only
    #[command(name = "test")]
    Test,

    /// query in JSON file
    #[command(name = "json.query", visible_alias = "qj")]
    JsonQuery {
        /// JSON file to query
        file: PathBuf,
        /// query key
        key: String,
    },

    /// update <OLD> JSON file with <NEW>
    #[command(name = "json.update")]
    JsonUpdate {
        /// JSON file with old data
        old: PathBuf,
        /// JSON file with new data
        new: PathBuf,
    },

    /// line-oriented interactive command mode
    #[command(name = "cmd", visible_alias = "cli")]
    Cmd,

    /// find URLs from clipboard, and copy them back to clipboard
    #[command(name = "cb.url")]
    CbUrl {
        /// URL pattern, or website name (youtube, bilibili)
        pattern: String,
    },

    /// download bilibili video(s)
    #[command(name = "bili.dl")]
    BiliDownload(BiliDownloadArgs),

    /// merge and rename videos from bilibili app download cache
    #[command(name = "bili.cache")]
    BiliCache {
        /// video folder(s) inside the app cache, named by av number
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// cookies file (Netscape/Mozilla cookie-jar format)
        #[arg(short, long, value_name = "FILE")]
        cookies: Option<String>,
    },

    /// normalize file names made by jijidown
    #[command(name = "bili.rename", visible_alias = "jjd.ren")]
    BiliRename {
        /// file or folder
        path: PathBuf,
        /// drop the leading part number
        #[arg(short = 'P', long)]
        no_part_num: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct BiliDownloadArgs {
    /// av/BV number, video URL, or plain av number
    pub target: String,
    /// cookies file path or cookie string
    #[arg(short, long)]
    pub cookies: Option<String>,
    /// output folder
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from(constants::bilibili::DEFAULT_OUTPUT_DIR))]
    pub output: PathBuf,
    /// part number(s) to download
    #[arg(short, long, num_args = 1.., value_name = "N")]
    pub parts: Vec<u32>,
    /// max quality number, e.g. 116 for 1080P60, 80 for 1080P
    #[arg(short = 'q', long, default_value_t = constants::bilibili::DEFAULT_QN_MAX)]
    pub qn_max: u32,
    /// drop the stream of exactly this quality number
    #[arg(short = 'x', long)]
    pub qn_exclude: Option<u32>,
    /// keep best audio quality instead of the moderate (128kbps) one
    #[arg(long)]
    pub best_audio: bool,
    /// stream format key, e.g. dash-flv
    #[arg(short = 'F', long)]
    pub format: Option<String>,
    /// show stream info only, no download
    #[arg(short, long)]
    pub info: bool,
    /// download all parts
    #[arg(short = 'L', long, conflicts_with = "parts")]
    pub playlist: bool,
    /// do not download danmaku caption
    #[arg(long)]
    pub no_caption: bool,
}

impl Command {
    /// 命令行上给出的 cookies 参数（如果该子命令支持）
    pub fn cookies(&self) -> Option<&str> {
        match self {
            Command::BiliDownload(args) => args.cookies.as_deref(),
            Command::BiliCache { cookies, .. } => cookies.as_deref(),
            _ => None,
        }
    }
}
