//! `{{placeholder}}` text templates.
//!
//! Every placeholder a template may use is a [`Placeholder`], and each
//! one reads exactly one field of [`TemplateParams`]. Rendering fails
//! on anything it doesn't recognize instead of leaving markers behind.

use std::fmt::Display;
use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// An error we encounter while rendering a template
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
	/// This template uses a placeholder we don't know
	#[error("unknown placeholder `{name}` at byte {offset}")]
	UnknownPlaceholder { name: String, offset: usize },

	/// This template uses a placeholder we have no value for
	#[error("no value for placeholder `{placeholder}`")]
	MissingParameter { placeholder: Placeholder },

	/// A `{{` has no matching `}}`
	#[error("unterminated placeholder at byte {offset}")]
	Unterminated { offset: usize },
}

/// A value that may be substituted into a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
	/// The project's name, verbatim
	ProjectName,

	/// The project's name, as a title
	ProjectTitle,

	/// The id of the processor a file is generated for
	ProcessorId,

	/// The processor id, as a title
	ProcessorTitle,

	/// The project template's description
	Description,

	/// Extra docker-compose services
	Services,
}

impl Placeholder {
	pub const ALL: [Placeholder; 6] = [
		Self::ProjectName,
		Self::ProjectTitle,
		Self::ProcessorId,
		Self::ProcessorTitle,
		Self::Description,
		Self::Services,
	];

	/// The name of this placeholder inside `{{ }}`
	pub fn name(&self) -> &'static str {
		match self {
			Self::ProjectName => "project_name",
			Self::ProjectTitle => "project_title",
			Self::ProcessorId => "processor_id",
			Self::ProcessorTitle => "processor_title",
			Self::Description => "description",
			Self::Services => "services",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|p| p.name() == name)
	}
}

impl Display for Placeholder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Values for a template's placeholders
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
	pub project_name: Option<String>,
	pub project_title: Option<String>,
	pub processor_id: Option<String>,
	pub processor_title: Option<String>,
	pub description: Option<String>,
	pub services: Option<String>,
}

impl TemplateParams {
	/// Parameters for files that belong to a whole project
	pub fn project(name: &str, description: &str) -> Self {
		Self {
			project_name: Some(name.to_owned()),
			project_title: Some(title_case(name)),
			description: Some(description.to_owned()),
			..Default::default()
		}
	}

	/// These parameters, extended for a file that belongs to one processor
	pub fn with_processor(&self, id: &str) -> Self {
		Self {
			processor_id: Some(id.to_owned()),
			processor_title: Some(title_case(id)),
			..self.clone()
		}
	}

	pub fn with_services(mut self, services: String) -> Self {
		self.services = Some(services);
		self
	}

	/// The value of `placeholder`, if we have one
	pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
		match placeholder {
			Placeholder::ProjectName => self.project_name.as_deref(),
			Placeholder::ProjectTitle => self.project_title.as_deref(),
			Placeholder::ProcessorId => self.processor_id.as_deref(),
			Placeholder::ProcessorTitle => self.processor_title.as_deref(),
			Placeholder::Description => self.description.as_deref(),
			Placeholder::Services => self.services.as_deref(),
		}
	}
}

/// Turn `snake_case` into `Title Case`
pub fn title_case(s: &str) -> String {
	s.split(['_', ' '])
		.filter(|w| !w.is_empty())
		.map(|w| {
			let mut c = w.chars();
			match c.next() {
				Some(first) => first.to_uppercase().chain(c.flat_map(char::to_lowercase)).collect(),
				None => String::new(),
			}
		})
		.collect::<Vec<String>>()
		.join(" ")
}

/// Every placeholder used in `template`, in order of appearance
pub fn placeholders(template: &str) -> Result<Vec<Placeholder>, RenderError> {
	let mut out = Vec::new();
	scan(template, |p| {
		out.push(p);
		Ok(())
	})?;
	return Ok(out);
}

/// Substitute every placeholder in `template`
pub fn render(template: &str, params: &TemplateParams) -> Result<String, RenderError> {
	let mut out = String::with_capacity(template.len());
	let mut rest = template;
	let mut offset = 0;

	while let Some(start) = rest.find(OPEN) {
		out.push_str(&rest[..start]);

		let after = &rest[start + OPEN.len()..];
		let end = after.find(CLOSE).ok_or(RenderError::Unterminated {
			offset: offset + start,
		})?;

		let p = parse_placeholder(&after[..end], offset + start)?;
		let value = params
			.get(p)
			.ok_or(RenderError::MissingParameter { placeholder: p })?;
		out.push_str(value);

		let consumed = start + OPEN.len() + end + CLOSE.len();
		rest = &rest[consumed..];
		offset += consumed;
	}

	out.push_str(rest);
	return Ok(out);
}

fn scan(
	template: &str,
	mut on_placeholder: impl FnMut(Placeholder) -> Result<(), RenderError>,
) -> Result<(), RenderError> {
	let mut offset = 0;
	while let Some(start) = template[offset..].find(OPEN) {
		let start = offset + start;
		let after = &template[start + OPEN.len()..];
		let end = after
			.find(CLOSE)
			.ok_or(RenderError::Unterminated { offset: start })?;

		on_placeholder(parse_placeholder(&after[..end], start)?)?;
		offset = start + OPEN.len() + end + CLOSE.len();
	}
	return Ok(());
}

fn parse_placeholder(inner: &str, offset: usize) -> Result<Placeholder, RenderError> {
	let name = inner.trim();
	Placeholder::from_name(name).ok_or_else(|| RenderError::UnknownPlaceholder {
		name: name.to_owned(),
		offset,
	})
}
