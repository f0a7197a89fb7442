//! A small YAML writer with fixed quoting rules.
//!
//! `serde_yaml` picks its own quoting, but documents exported from the
//! editor follow a fixed rule: strings are always double-quoted, arrays
//! are written inline as `[...]`, and numbers, booleans and nulls are bare.

use serde_json::{Map, Value};
use std::fmt::Write;

/// Writes YAML text into a string
#[derive(Debug, Default)]
pub struct YamlWriter {
	out: String,
}

impl YamlWriter {
	pub fn new() -> Self {
		Self { out: String::new() }
	}

	/// The text written so far
	pub fn finish(self) -> String {
		self.out
	}

	/// Write `key: value` at `indent` spaces.
	/// Objects become nested mappings.
	pub fn write_entry(&mut self, indent: usize, key: &str, value: &Value) {
		self.write_prefix(indent, key);
		match value {
			Value::Object(map) if !map.is_empty() => {
				self.out.push('\n');
				self.write_map(indent + 2, map);
			}
			v => {
				self.out.push(' ');
				self.out.push_str(&inline(v));
				self.out.push('\n');
			}
		}
	}

	/// Write every entry of `map` at `indent` spaces
	pub fn write_map(&mut self, indent: usize, map: &Map<String, Value>) {
		for (k, v) in map {
			self.write_entry(indent, k, v);
		}
	}

	/// Write `key:` with nothing after it, for a block that follows
	pub fn write_key(&mut self, indent: usize, key: &str) {
		self.write_prefix(indent, key);
		self.out.push('\n');
	}

	/// Start a list item at `indent` spaces, with its first entry on
	/// the same line as the dash. Write the item's other entries
	/// with [`Self::write_entry`] at `indent + 2`.
	pub fn write_item_entry(&mut self, indent: usize, key: &str, value: &Value) {
		let _ = write!(self.out, "{:indent$}- ", "");
		self.write_entry(indent + 2, key, value);
	}

	/// Write `key: []` for an empty list
	pub fn write_empty_list(&mut self, indent: usize, key: &str) {
		self.write_prefix(indent, key);
		self.out.push_str(" []\n");
	}

	fn write_prefix(&mut self, indent: usize, key: &str) {
		let _ = write!(self.out, "{:indent$}{}:", "", key_text(key));
	}
}

/// A key, quoted only if it has to be.
/// Keys that would read back as numbers, booleans or null are quoted.
fn key_text(key: &str) -> String {
	let plain = !key.is_empty()
		&& key
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
		&& matches!(
			serde_yaml::from_str::<serde_yaml::Value>(key),
			Ok(serde_yaml::Value::String(_))
		);
	if plain {
		key.to_owned()
	} else {
		quote(key)
	}
}

/// A double-quoted string.
/// JSON string escapes are valid in YAML double-quoted scalars.
pub fn quote(s: &str) -> String {
	serde_json::Value::String(s.to_owned()).to_string()
}

/// A value written on one line
pub fn inline(value: &Value) -> String {
	match value {
		Value::Null => "null".to_owned(),
		Value::Bool(b) => b.to_string(),
		Value::Number(n) => n.to_string(),
		Value::String(s) => quote(s),
		Value::Array(a) => {
			let items: Vec<String> = a.iter().map(inline).collect();
			format!("[{}]", items.join(", "))
		}
		Value::Object(map) => {
			let items: Vec<String> = map
				.iter()
				.map(|(k, v)| format!("{}: {}", quote(k), inline(v)))
				.collect();
			format!("{{{}}}", items.join(", "))
		}
	}
}
