// src/logger.rs

use crate::{cli::LogLevel, config::file::config_dir, constants};
use log::{LevelFilter, warn};
use std::{env, fs::File, path::PathBuf};

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// `~/.mykit/mykit.log`，取不到主目录时放到临时目录
fn log_file_path() -> PathBuf {
    match config_dir() {
        Ok(dir) => dir.join(constants::LOG_FILE_NAME),
        Err(_) => {
            eprintln!("警告: 无法获取用户主目录，日志将写入临时目录。");
            env::temp_dir().join(clap::crate_name!()).join(constants::LOG_FILE_NAME)
        }
    }
}

fn open_log_file() -> Option<File> {
    let path = log_file_path();
    if let Some(dir) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("警告: 无法创建日志目录 {:?}: {}", dir, e);
        }
    }

    match fern::log_file(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("警告: 无法打开日志文件 {:?} : {}。将尝试使用备用日志文件。", path, e);
            let fallback_path = env::temp_dir().join(format!(
                "{}-{}",
                clap::crate_name!(),
                constants::LOG_FALLBACK_FILE_NAME
            ));
            match fern::log_file(&fallback_path) {
                Ok(file) => {
                    warn!("日志将写入备用文件: {:?}", fallback_path);
                    Some(file)
                }
                Err(e_fb) => {
                    eprintln!("错误: 无法创建备用日志文件 {:?}: {}。日志将不会被记录。", fallback_path, e_fb);
                    None
                }
            }
        }
    }
}

/// 按 `--log-level` 初始化文件日志；`off` 时什么也不做
pub fn init(level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }
    let Some(file) = open_log_file() else {
        return;
    };

    let result = fern::Dispatch::new()
        .level(LevelFilter::from(level))
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file)
        .apply();

    if let Err(e) = result {
        eprintln!("警告: 日志系统初始化失败: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::Off);
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::Debug);
        assert!(LevelFilter::from(LogLevel::Warn) < LevelFilter::from(LogLevel::Info));
    }
}
