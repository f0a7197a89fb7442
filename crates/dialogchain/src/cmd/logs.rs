use anyhow::Result;
use std::{
	fs,
	path::{Path, PathBuf},
	time::{Duration, SystemTime},
};
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::status;

/// Keywords we count if none are given
pub const DEFAULT_KEYWORDS: [&str; 3] = ["ERROR", "WARN", "INFO"];

#[derive(Debug, Error)]
pub enum LogScanError {
	#[error("log directory `{}` not found", .path.display())]
	NotFound { path: PathBuf },

	#[error("error while walking log directory")]
	Walk(#[from] walkdir::Error),

	#[error("could not read `{}`", .path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
	pub dir: PathBuf,

	/// Only read files modified this long ago or later
	pub since: Duration,

	/// Case-sensitive strings to count lines for
	pub keywords: Vec<String>,
}

/// Keyword counts for one file
#[derive(Debug, PartialEq, Eq)]
pub struct FileCounts {
	pub path: PathBuf,

	/// One count per keyword, in keyword order
	pub counts: Vec<usize>,
}

#[derive(Debug)]
pub struct ScanReport {
	pub keywords: Vec<String>,
	pub files: Vec<FileCounts>,

	/// One total per keyword, in keyword order
	pub totals: Vec<usize>,
}

/// A lookback window of `hours` hours, saturating instead of overflowing
pub fn hours(hours: u64) -> Duration {
	Duration::from_secs(hours.saturating_mul(3600))
}

/// Count keyword lines in every recent `*.log` file under `options.dir`
pub fn scan(options: &ScanOptions, now: SystemTime) -> Result<ScanReport, LogScanError> {
	if !options.dir.is_dir() {
		return Err(LogScanError::NotFound {
			path: options.dir.clone(),
		});
	}

	let cutoff = now.checked_sub(options.since).unwrap_or(SystemTime::UNIX_EPOCH);
	let mut files = Vec::new();
	let mut totals = vec![0; options.keywords.len()];

	for entry in WalkDir::new(&options.dir).sort_by_file_name() {
		let entry = entry?;
		let path = entry.path();
		if !entry.file_type().is_file() || path.extension().map_or(true, |x| x != "log") {
			continue;
		}

		let modified = entry
			.metadata()?
			.modified()
			.map_err(|source| LogScanError::Read {
				path: path.to_owned(),
				source,
			})?;
		if modified < cutoff {
			trace!(message = "Skipping old log file", ?path);
			continue;
		}

		let counts = count_keywords(path, &options.keywords)?;
		for (t, c) in totals.iter_mut().zip(&counts) {
			*t += c;
		}
		files.push(FileCounts {
			path: path.to_owned(),
			counts,
		});
	}

	debug!(
		message = "Scanned logs",
		dir = ?options.dir,
		files = files.len()
	);

	return Ok(ScanReport {
		keywords: options.keywords.clone(),
		files,
		totals,
	});
}

fn count_keywords(path: &Path, keywords: &[String]) -> Result<Vec<usize>, LogScanError> {
	let bytes = fs::read(path).map_err(|source| LogScanError::Read {
		path: path.to_owned(),
		source,
	})?;
	let text = String::from_utf8_lossy(&bytes);

	let mut counts = vec![0; keywords.len()];
	for line in text.lines() {
		for (c, k) in counts.iter_mut().zip(keywords) {
			if line.contains(k.as_str()) {
				*c += 1;
			}
		}
	}
	return Ok(counts);
}

pub fn run(options: &ScanOptions) -> Result<()> {
	status::info(format!(
		"Scanning {} (last {}h)",
		options.dir.display(),
		options.since.as_secs() / 3600
	));

	let report = scan(options, SystemTime::now())?;
	if report.files.is_empty() {
		status::warning("No recent log files found");
		return Ok(());
	}

	for f in &report.files {
		let counts: Vec<String> = report
			.keywords
			.iter()
			.zip(&f.counts)
			.map(|(k, c)| format!("{k}: {c}"))
			.collect();
		println!("  {}  {}", f.path.display(), counts.join(", "));
	}

	println!();
	for (k, t) in report.keywords.iter().zip(&report.totals) {
		match k.as_str() {
			"ERROR" if *t > 0 => status::error(format!("{k}: {t}")),
			"WARN" if *t > 0 => status::warning(format!("{k}: {t}")),
			_ => status::info(format!("{k}: {t}")),
		}
	}

	return Ok(());
}

#[cfg(test)]
mod tests {
	use super::*;

	fn options(dir: &Path) -> ScanOptions {
		ScanOptions {
			dir: dir.to_owned(),
			since: Duration::from_secs(24 * 3600),
			keywords: DEFAULT_KEYWORDS.iter().map(|x| (*x).to_owned()).collect(),
		}
	}

	fn logs() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		fs::write(
			dir.path().join("app.log"),
			"INFO start\nERROR boom\nWARN slow\nERROR again\nerror lowercase\n",
		)
		.unwrap();
		fs::write(dir.path().join("notes.txt"), "ERROR not a log\n").unwrap();
		fs::create_dir(dir.path().join("workers")).unwrap();
		fs::write(dir.path().join("workers/w1.log"), "INFO a\nINFO b\n").unwrap();
		dir
	}

	#[test]
	fn counts_keywords() {
		let dir = logs();
		let r = scan(&options(dir.path()), SystemTime::now()).unwrap();

		assert_eq!(
			r.files,
			vec![
				FileCounts {
					path: dir.path().join("app.log"),
					counts: vec![2, 1, 1],
				},
				FileCounts {
					path: dir.path().join("workers/w1.log"),
					counts: vec![0, 0, 2],
				},
			]
		);
		assert_eq!(r.totals, vec![2, 1, 3]);
	}

	#[test]
	fn old_files_are_skipped() {
		let dir = logs();
		let later = SystemTime::now() + Duration::from_secs(48 * 3600);
		let r = scan(&options(dir.path()), later).unwrap();
		assert!(r.files.is_empty());
		assert_eq!(r.totals, vec![0, 0, 0]);
	}

	#[test]
	fn huge_windows_saturate() {
		assert_eq!(hours(24), Duration::from_secs(86_400));
		assert_eq!(hours(u64::MAX), Duration::from_secs(u64::MAX));

		let dir = logs();
		let mut o = options(dir.path());
		o.since = hours(u64::MAX);
		let r = scan(&o, SystemTime::now()).unwrap();
		assert_eq!(r.files.len(), 2);
	}

	#[test]
	fn missing_dir() {
		let dir = tempfile::tempdir().unwrap();
		let e = scan(&options(&dir.path().join("nope")), SystemTime::now()).unwrap_err();
		assert!(matches!(e, LogScanError::NotFound { .. }));
	}
}
