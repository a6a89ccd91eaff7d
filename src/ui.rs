// src/ui.rs

use crate::constants;
use colored::*;
use std::{
    io::{self, Write},
    sync::LazyLock,
};

pub mod symbols {
    use super::*;

    pub static OK: LazyLock<ColoredString> = LazyLock::new(|| "[OK]".green());
    pub static ERROR: LazyLock<ColoredString> = LazyLock::new(|| "[X]".red());
    pub static INFO: LazyLock<ColoredString> = LazyLock::new(|| "[i]".cyan());
    pub static WARN: LazyLock<ColoredString> = LazyLock::new(|| "[!]".yellow());
    pub static CTRL_C: LazyLock<ColoredString> = LazyLock::new(|| "Ctrl+C".yellow());
}

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn plain(message: &str) {
    println!("{}", message);
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn warn(message: &str) {
    eprintln!("{} {}", *symbols::WARN, message.yellow());
}

pub fn ok(message: &str) {
    println!("{} {}", *symbols::OK, message);
}

pub fn single_line() -> String {
    "-".repeat(constants::DRAW_LINE_LEN)
}

/// 在给定的输出端上画分隔线和横幅，下载过程中写向 stderr，
/// 以免和被重定向的 stdout 混在一起。
pub struct Drawer<W: Write> {
    out: W,
}

impl Drawer<io::Stderr> {
    pub fn stderr() -> Self {
        Self { out: io::stderr() }
    }
}

impl<W: Write> Drawer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// 水平分隔线
    pub fn hl(&mut self) {
        let _ = writeln!(self.out, "{}", single_line());
    }

    pub fn print(&mut self, message: &str) {
        let _ = writeln!(self.out, "{}", message);
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    // 读到 EOF 时返回 None
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
