//! Object name utilities
use thiserror::Error;

/// The ways a name may be invalid
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
	/// This name is empty
	#[error("name cannot be empty")]
	Empty,

	/// This name is entirely whitespace
	#[error("name cannot be entirely whitespace")]
	IsWhitespace,

	/// This name has leading or trailing whitespace
	#[error("name cannot have leading or trailing whitespace")]
	TrimWhitespace,

	/// This name can't be used as a single path component
	#[error("name cannot contain path separators or be `.` or `..`")]
	NotAPathComponent,

	/// This name has a character that identifiers can't contain
	#[error("name cannot contain `{c}`, use letters, digits, `_` and `-`")]
	BadCharacter { c: char },
}

/// Check the given name for errors.
pub fn check_name(name: &str) -> Result<(), NameError> {
	if name.is_empty() {
		return Err(NameError::Empty);
	}

	let trimmed = name.trim();
	if trimmed.is_empty() {
		return Err(NameError::IsWhitespace);
	}

	if trimmed.len() != name.len() {
		return Err(NameError::TrimWhitespace);
	}

	return Ok(());
}

/// Check a name that will become a directory name.
/// This is [`check_name`] with a few extra rules.
pub fn check_dir_name(name: &str) -> Result<(), NameError> {
	check_name(name)?;

	if name == "." || name == ".." || name.contains(['/', '\\']) {
		return Err(NameError::NotAPathComponent);
	}

	return Ok(());
}

/// Check a name that will be used as an identifier
/// (a compose service, a Go module path, a directory).
/// Only ASCII letters, digits, `_` and `-` are allowed.
pub fn check_ident_name(name: &str) -> Result<(), NameError> {
	check_dir_name(name)?;

	if let Some(c) = name
		.chars()
		.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
	{
		return Err(NameError::BadCharacter { c });
	}

	return Ok(());
}
