//! Human-readable status lines.
//! These go to stdout; logs go to stderr.

use crossterm::style::Stylize;
use std::fmt::Display;

pub fn info(msg: impl Display) {
	println!("{} {msg}", "[INFO]".blue());
}

pub fn success(msg: impl Display) {
	println!("{} {msg}", "[ OK ]".green());
}

pub fn warning(msg: impl Display) {
	println!("{} {msg}", "[WARN]".yellow());
}

pub fn error(msg: impl Display) {
	println!("{} {msg}", "[FAIL]".red().bold());
}

/// A section heading
pub fn heading(msg: impl Display) {
	println!("{}", format!("{msg}").bold());
}

/// An indented detail line under a status line
pub fn detail(msg: impl Display) {
	println!("       {}", format!("{msg}").dark_grey());
}

/// `1 error`, `2 warnings`
pub fn count(n: usize, noun: &str) -> String {
	if n == 1 {
		format!("{n} {noun}")
	} else {
		format!("{n} {noun}s")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts() {
		assert_eq!(count(0, "error"), "0 errors");
		assert_eq!(count(1, "warning"), "1 warning");
		assert_eq!(count(3, "file"), "3 files");
	}
}
