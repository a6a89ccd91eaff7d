// src/lib.rs

pub mod bilibili;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod kits;
pub mod logger;
pub mod media;
pub mod ui;
pub mod utils;

use crate::{
    bilibili::{CacheEntry, CookieSource, DownloadOptions, rename},
    cli::{BiliDownloadArgs, Cli, Command},
    client::RobustClient,
    config::AppConfig,
    error::AppResult,
    kits::{
        clipboard, json,
        shell::{self, ShellAction},
    },
    media::{FfmpegMerger, MediaMerger},
    ui::{Drawer, symbols},
};
use colored::*;
use log::{debug, error, info};
use std::sync::Arc;

/// 需要网络的子命令共用的状态
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub merger: Arc<dyn MediaMerger>,
}

impl AppContext {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let config = AppConfig::new(args)?;
        debug!("加载的应用配置: {:?}", config);
        let merger = Arc::new(FfmpegMerger::new(config.ffmpeg.clone()));
        Self::with_config(config, merger)
    }

    pub fn with_config(config: AppConfig, merger: Arc<dyn MediaMerger>) -> AppResult<Self> {
        let config = Arc::new(config);
        let http_client = Arc::new(RobustClient::new(&config)?);
        Ok(Self { config, http_client, merger })
    }

    fn cookies(&self) -> Option<CookieSource> {
        self.config.cookies.as_deref().map(CookieSource::from_arg)
    }
}

/// 库的公共入口点，由 `main.rs` 调用
pub async fn run_from_cli(args: Arc<Cli>) -> AppResult<()> {
    debug!("CLI 参数: {:?}", args);
    match &args.command {
        Command::Cmd => run_shell(&args).await,
        _ => dispatch(&args).await,
    }
}

/// 执行单个子命令（交互模式本身除外）
async fn dispatch(args: &Cli) -> AppResult<()> {
    match &args.command {
        Command::Test => ui::plain("ok"),
        Command::Cmd => debug!("交互模式中忽略 cmd"),
        Command::JsonQuery { file, key } => {
            let value = json::query(file, key)?;
            ui::plain(&json::display_value(&value));
        }
        Command::JsonUpdate { old, new } => {
            let merged = json::update(old, new)?;
            info!("已将 '{}' 合并进 '{}'，共 {} 个键", new.display(), old.display(), merged.len());
        }
        Command::CbUrl { pattern } => {
            let urls = clipboard::urls_from_clipboard(pattern)?;
            for url in &urls {
                ui::plain(url);
            }
        }
        Command::BiliDownload(dl) => {
            let ctx = AppContext::new(args)?;
            run_download(&ctx, dl).await?;
        }
        Command::BiliCache { dirs, .. } => {
            let ctx = AppContext::new(args)?;
            let cookies = ctx.cookies();
            ui::print_header(&format!("整理客户端缓存 (共 {} 个视频目录)", dirs.len()));
            let mut merged = 0;
            for dir in dirs {
                let mut entry = CacheEntry::new(
                    dir,
                    cookies.as_ref(),
                    ctx.http_client.clone(),
                    ctx.config.endpoints.clone(),
                    ctx.merger.clone(),
                )?;
                let report = entry.extract_all().await?;
                merged += report.outputs.len();
            }
            ui::ok(&format!("缓存整理完成，共输出 {} 个文件。", merged));
        }
        Command::BiliRename { path, no_part_num } => {
            rename::normalize(path, !no_part_num)?;
        }
    }
    Ok(())
}

async fn run_download(ctx: &AppContext, dl: &BiliDownloadArgs) -> AppResult<()> {
    let options = DownloadOptions {
        cookies: ctx.cookies(),
        output_dir: dl.output.clone(),
        parts: dl.parts.clone(),
        qn_max: dl.qn_max,
        qn_exclude: dl.qn_exclude,
        moderate_audio: !dl.best_audio,
        format: dl.format.clone(),
        info_only: dl.info,
        playlist: dl.playlist,
        caption: !dl.no_caption,
    };
    let outputs = bilibili::download(ctx, &dl.target, &options, &mut Drawer::stderr()).await?;
    if !dl.info {
        ui::ok(&format!("下载完成，共 {} 个文件。", outputs.len()));
    }
    Ok(())
}

/// 行式交互模式：每行按 shell 规则切分后当作一条子命令执行
async fn run_shell(args: &Cli) -> AppResult<()> {
    ui::info(&format!("交互模式，输入 q 退出，按 {} 强制中断。", *symbols::CTRL_C));
    loop {
        let Some(line) = ui::prompt(constants::SHELL_PROMPT)? else {
            break;
        };
        ui::plain(&ui::single_line());
        match shell::parse_line(&line) {
            ShellAction::Quit => break,
            ShellAction::Empty | ShellAction::Ignored => {}
            ShellAction::Message(message) => ui::plain(message.trim_end()),
            ShellAction::Run(command) => {
                let cli = Cli { command: *command, log_level: args.log_level };
                if let Err(e) = dispatch(&cli).await {
                    error!("交互模式命令 '{}' 失败: {}", line, e);
                    eprintln!("{} {}", *symbols::ERROR, e.to_string().red());
                }
                ui::plain(&ui::single_line());
            }
        }
    }
    Ok(())
}
