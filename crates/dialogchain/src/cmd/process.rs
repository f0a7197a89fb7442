//! A native processor.
//!
//! Processors read one JSON object from stdin and write one JSON object
//! to stdout. This one adds `processed_at` and `processor` and keeps
//! every other field.

use serde_json::{json, Map, Value};
use std::io::Read;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProcessError {
	#[error("could not read input")]
	Read(#[from] std::io::Error),

	#[error("invalid JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("input must be a JSON object")]
	NotAnObject,

	#[error("could not format timestamp")]
	Time(#[from] time::error::Format),
}

/// Process one input document
pub fn process(input: &str, id: &str, now: OffsetDateTime) -> Result<Map<String, Value>, ProcessError> {
	let mut data = match serde_json::from_str(input)? {
		Value::Object(map) => map,
		_ => return Err(ProcessError::NotAnObject),
	};

	data.insert("processed_at".to_owned(), Value::String(now.format(&Rfc3339)?));
	data.insert("processor".to_owned(), Value::String(id.to_owned()));
	return Ok(data);
}

/// Run as a processor on stdin and stdout.
/// Returns `false` if processing failed.
pub fn run(id: &str) -> bool {
	let result = {
		let mut input = String::new();
		std::io::stdin()
			.read_to_string(&mut input)
			.map_err(ProcessError::from)
			.and_then(|_| process(&input, id, OffsetDateTime::now_utc()))
	};

	match result {
		Ok(data) => {
			println!("{}", Value::Object(data));
			return true;
		}
		Err(err) => {
			debug!(message = "Processing failed", processor = id, error = %err);
			println!("{}", json!({ "error": err.to_string() }));
			return false;
		}
	}
}
