//! Platform detection.
//!
//! Each supported platform knows its package manager and how to install
//! the tools DialogChain uses. We never run a package manager ourselves,
//! we only tell the user what to run.

/// A platform we know how to give install hints for
pub trait Platform {
	/// A human-readable platform name
	fn name(&self) -> &'static str;

	/// The command-line package manager this platform uses, if any
	fn package_manager(&self) -> Option<&'static str>;

	/// A command that installs `tool` on this platform
	fn install_hint(&self, tool: &str) -> String;
}

const RUSTUP: &str = "curl --proto '=https' --tlsv1.2 -sSf https://sh.rustup.rs | sh";

pub struct Debian;

impl Platform for Debian {
	fn name(&self) -> &'static str {
		"Debian/Ubuntu"
	}

	fn package_manager(&self) -> Option<&'static str> {
		Some("apt-get")
	}

	fn install_hint(&self, tool: &str) -> String {
		let package = match tool {
			"cargo" => return RUSTUP.to_owned(),
			"docker" => "docker.io",
			"go" => "golang-go",
			"node" => "nodejs",
			"python3" => "python3 python3-pip python3-venv",
			x => x,
		};
		format!("sudo apt-get install -y {package}")
	}
}

pub struct MacOs;

impl Platform for MacOs {
	fn name(&self) -> &'static str {
		"macOS"
	}

	fn package_manager(&self) -> Option<&'static str> {
		Some("brew")
	}

	fn install_hint(&self, tool: &str) -> String {
		match tool {
			"cargo" => RUSTUP.to_owned(),
			"docker" => "brew install --cask docker".to_owned(),
			"python3" => "brew install python".to_owned(),
			x => format!("brew install {x}"),
		}
	}
}

/// Any platform we don't have specific hints for
pub struct Generic {
	pub os: &'static str,
}

impl Platform for Generic {
	fn name(&self) -> &'static str {
		self.os
	}

	fn package_manager(&self) -> Option<&'static str> {
		None
	}

	fn install_hint(&self, tool: &str) -> String {
		match tool {
			"cargo" => RUSTUP.to_owned(),
			x => format!("install `{x}` with your system's package manager"),
		}
	}
}

/// Pick the platform we're running on
pub fn detect_platform() -> Box<dyn Platform> {
	detect_platform_with(std::env::consts::OS, |cmd| which::which(cmd).is_ok())
}

/// Pick a platform given an OS name and a way to check for commands
pub fn detect_platform_with(os: &'static str, has_command: impl Fn(&str) -> bool) -> Box<dyn Platform> {
	match os {
		"linux" if has_command("apt-get") => Box::new(Debian),
		"macos" if has_command("brew") => Box::new(MacOs),
		_ => Box::new(Generic { os }),
	}
}
