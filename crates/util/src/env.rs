use serde::de::DeserializeOwned;
use smartstring::{LazyCompact, SmartString};
use std::{env::VarError, io::ErrorKind, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvLoadError {
	#[error("i/o error while reading .env")]
	IOError(#[from] std::io::Error),

	#[error("invalid environment variable")]
	VarError(#[from] VarError),

	#[error("line parse error: `{on_line}` at char {at_char}")]
	LineParse { on_line: String, at_char: usize },

	#[error("other dotenvy error")]
	Other(dotenvy::Error),

	#[error("missing value {0}")]
	MissingValue(SmartString<LazyCompact>),

	#[error("parse error: {0}")]
	OtherParseError(String),
}

pub enum LoadedEnv<T> {
	/// We loaded config from `.env` and env vars
	FoundFile { config: T, path: PathBuf },

	/// We could not find `.env` and only loaded env vars
	OnlyVars(T),
}

impl<T> LoadedEnv<T> {
	pub fn get_config(&self) -> &T {
		match self {
			Self::FoundFile { config, .. } => config,
			Self::OnlyVars(config) => config,
		}
	}

	pub fn into_config(self) -> T {
		match self {
			Self::FoundFile { config, .. } => config,
			Self::OnlyVars(config) => config,
		}
	}
}

/// Load the configuration type `T` from the current environment,
/// including the `.env` if it exists.
pub fn load_env<T: DeserializeOwned>() -> Result<LoadedEnv<T>, EnvLoadError> {
	let env_path = match dotenvy::dotenv() {
		Ok(path) => Some(path),

		Err(dotenvy::Error::Io(err)) => match err.kind() {
			ErrorKind::NotFound => None,
			_ => return Err(EnvLoadError::IOError(err)),
		},

		Err(dotenvy::Error::EnvVar(err)) => {
			return Err(EnvLoadError::VarError(err));
		}

		Err(dotenvy::Error::LineParse(on_line, at_char)) => {
			return Err(EnvLoadError::LineParse { on_line, at_char });
		}

		Err(err) => {
			return Err(EnvLoadError::Other(err));
		}
	};

	let config = parse_env(std::env::vars())?;
	if let Some(path) = env_path {
		return Ok(LoadedEnv::FoundFile { path, config });
	} else {
		return Ok(LoadedEnv::OnlyVars(config));
	}
}

/// Deserialize `T` from an explicit set of variables.
/// [`load_env`] uses this with the process environment.
pub fn parse_env<T, I>(vars: I) -> Result<T, EnvLoadError>
where
	T: DeserializeOwned,
	I: IntoIterator<Item = (String, String)>,
{
	match envy::from_iter::<_, T>(vars) {
		Ok(config) => return Ok(config),

		Err(envy::Error::MissingValue(value)) => {
			return Err(EnvLoadError::MissingValue(value.into()))
		}

		Err(envy::Error::Custom(message)) => {
			return Err(EnvLoadError::OtherParseError(message));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Deserialize)]
	struct TestConfig {
		test_name: String,
		#[serde(default)]
		test_count: usize,
	}

	fn vars(v: &[(&str, &str)]) -> Vec<(String, String)> {
		v.iter()
			.map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
			.collect()
	}

	#[test]
	fn parses_vars() {
		let c: TestConfig =
			parse_env(vars(&[("TEST_NAME", "demo"), ("TEST_COUNT", "3")])).unwrap();
		assert_eq!(c.test_name, "demo");
		assert_eq!(c.test_count, 3);
	}

	#[test]
	fn missing_value() {
		let e = parse_env::<TestConfig, _>(vars(&[("TEST_COUNT", "3")])).unwrap_err();
		assert!(matches!(e, EnvLoadError::MissingValue(v) if v.as_str() == "test_name"));
	}

	#[test]
	fn bad_value() {
		let e = parse_env::<TestConfig, _>(vars(&[("TEST_NAME", "x"), ("TEST_COUNT", "many")]))
			.unwrap_err();
		assert!(matches!(e, EnvLoadError::OtherParseError(_)));
	}
}
