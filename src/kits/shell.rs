// src/kits/shell.rs

use crate::cli::{Cli, Command};
use clap::Parser;

/// 交互模式下一行输入的处理结果
#[derive(Debug)]
pub enum ShellAction {
    Quit,
    Empty,
    Run(Box<Command>),
    /// 在交互模式里再次进入交互模式
    Ignored,
    /// 解析失败（含 `--help` 输出），内容原样显示
    Message(String),
}

pub fn parse_line(line: &str) -> ShellAction {
    let line = line.trim();
    if line.is_empty() {
        return ShellAction::Empty;
    }
    if matches!(line, "q" | "quit" | "exit") {
        return ShellAction::Quit;
    }
    let Some(words) = shlex::split(line) else {
        return ShellAction::Message(format!("无法解析的输入: {}", line));
    };
    let argv = std::iter::once(clap::crate_name!().to_string()).chain(words);
    match Cli::try_parse_from(argv) {
        Ok(Cli { command: Command::Cmd, .. }) => ShellAction::Ignored,
        Ok(cli) => ShellAction::Run(Box::new(cli.command)),
        Err(e) => ShellAction::Message(e.render().to_string()),
    }
}
