//! Project generation

use dialogchain_pipeline::schema::ProcessorType;
use dialogchain_util::names::{check_ident_name, check_name, NameError};
use std::{
	fs::{self, OpenOptions},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::{
	files,
	project::{ProjectTemplate, DEFAULT_TEMPLATE},
	template::{render, RenderError, TemplateParams},
};

/// The name of a project's pipeline document
pub const PIPELINE_FILE: &str = "pipeline.yaml";

/// Directories every project has
pub const PROJECT_DIRS: [&str; 9] = [
	"processors",
	"scripts",
	"configs",
	"logs",
	"cache",
	"models",
	"data",
	"tests",
	"docs",
];

/// An error we encounter while generating a project
#[derive(Debug, Error)]
pub enum ScaffoldError {
	#[error("invalid project name")]
	InvalidName(#[from] NameError),

	#[error("unknown template `{name}`")]
	UnknownTemplate { name: String },

	/// The target already exists. It was not modified.
	#[error("`{}` already exists", .path.display())]
	AlreadyExists { path: PathBuf },

	#[error("could not write `{}`", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("could not render `{file}`")]
	Render {
		file: String,
		#[source]
		source: RenderError,
	},

	#[error("no compose definition for service `{name}`")]
	UnknownService { name: String },

	#[error("could not serialize pipeline")]
	Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
	/// The project's name. This is also the name of its directory.
	pub name: String,

	/// The name of a built-in template
	pub template: String,

	/// The directory to create the project in
	pub parent_dir: PathBuf,
}

impl ScaffoldOptions {
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_owned(),
			template: DEFAULT_TEMPLATE.to_owned(),
			parent_dir: PathBuf::from("."),
		}
	}
}

/// What we generated
#[derive(Debug)]
pub struct ScaffoldReport {
	/// The new project's directory
	pub root: PathBuf,

	/// Directories we created, relative to `root`
	pub directories: Vec<PathBuf>,

	/// Files we wrote, relative to `root`
	pub files: Vec<PathBuf>,
}

pub struct Scaffolder {
	options: ScaffoldOptions,
}

impl Scaffolder {
	pub fn new(options: ScaffoldOptions) -> Self {
		Self { options }
	}

	/// Generate a project from the built-in template named in our options
	pub fn create(&self) -> Result<ScaffoldReport, ScaffoldError> {
		let template = ProjectTemplate::builtin(&self.options.template)?.ok_or_else(|| {
			ScaffoldError::UnknownTemplate {
				name: self.options.template.clone(),
			}
		})?;

		self.create_from(&template)
	}

	/// Generate a project from `template`.
	///
	/// Fails with [`ScaffoldError::AlreadyExists`] if the project directory
	/// exists. If anything fails after the directory was created, the
	/// directory is removed.
	pub fn create_from(&self, template: &ProjectTemplate) -> Result<ScaffoldReport, ScaffoldError> {
		check_ident_name(&self.options.name)?;
		let root = self.options.parent_dir.join(&self.options.name);

		match fs::create_dir(&root) {
			Ok(()) => {}
			Err(err) if err.kind() == ErrorKind::AlreadyExists => {
				return Err(ScaffoldError::AlreadyExists { path: root });
			}
			Err(source) => return Err(ScaffoldError::Io { path: root, source }),
		}

		debug!(
			message = "Creating project",
			name = self.options.name,
			template = template.name,
			?root
		);

		let mut writer = ProjectWriter::new(root.clone());
		if let Err(err) = writer.populate(&self.options.name, template) {
			warn!(
				message = "Project generation failed, removing partial project",
				?root,
				error = %err
			);

			if let Err(e) = fs::remove_dir_all(&root) {
				warn!(message = "Could not remove partial project", ?root, error = %e);
			}

			return Err(err);
		}

		info!(
			message = "Created project",
			name = self.options.name,
			files = writer.files.len()
		);

		return Ok(ScaffoldReport {
			root,
			directories: writer.directories,
			files: writer.files,
		});
	}
}

/// Write a basic `pipeline.yaml` into an existing directory.
/// Fails with [`ScaffoldError::AlreadyExists`] if it already has one.
pub fn init(dir: &Path, name: &str) -> Result<PathBuf, ScaffoldError> {
	check_name(name)?;
	let template = ProjectTemplate::builtin(DEFAULT_TEMPLATE)?.ok_or_else(|| {
		ScaffoldError::UnknownTemplate {
			name: DEFAULT_TEMPLATE.to_owned(),
		}
	})?;
	let yaml = template.pipeline(name)?.to_yaml()?;

	let path = dir.join(PIPELINE_FILE);
	let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
		Ok(f) => f,
		Err(err) if err.kind() == ErrorKind::AlreadyExists => {
			return Err(ScaffoldError::AlreadyExists { path });
		}
		Err(source) => return Err(ScaffoldError::Io { path, source }),
	};

	file.write_all(yaml.as_bytes())
		.map_err(|source| ScaffoldError::Io {
			path: path.clone(),
			source,
		})?;

	info!(message = "Initialized pipeline", ?path);
	return Ok(path);
}

//
// MARK: Writer
//

/// Writes files into a project directory and remembers what it wrote
struct ProjectWriter {
	root: PathBuf,
	directories: Vec<PathBuf>,
	files: Vec<PathBuf>,
}

impl ProjectWriter {
	fn new(root: PathBuf) -> Self {
		Self {
			root,
			directories: Vec::new(),
			files: Vec::new(),
		}
	}

	fn dir(&mut self, rel: &str) -> Result<(), ScaffoldError> {
		let path = self.root.join(rel);
		fs::create_dir_all(&path).map_err(|source| ScaffoldError::Io { path, source })?;
		self.directories.push(PathBuf::from(rel));
		return Ok(());
	}

	fn file(&mut self, rel: &str, contents: &str, executable: bool) -> Result<(), ScaffoldError> {
		let path = self.root.join(rel);
		trace!(message = "Writing file", ?path);

		fs::write(&path, contents).map_err(|source| ScaffoldError::Io {
			path: path.clone(),
			source,
		})?;

		if executable {
			make_executable(&path).map_err(|source| ScaffoldError::Io { path, source })?;
		}

		self.files.push(PathBuf::from(rel));
		return Ok(());
	}

	fn populate(&mut self, name: &str, template: &ProjectTemplate) -> Result<(), ScaffoldError> {
		for d in PROJECT_DIRS {
			self.dir(d)?;
		}

		let pipeline = template.pipeline(name)?.to_yaml()?;
		self.file(PIPELINE_FILE, &pipeline, false)?;

		let params = TemplateParams::project(name, &template.description);
		self.processors(&params, template)?;

		let params = params.with_services(compose_services(&template.services)?);
		for (rel, text, executable) in [
			("Dockerfile", files::DOCKERFILE, false),
			("docker-compose.yml", files::DOCKER_COMPOSE, false),
			(".gitignore", files::GITIGNORE, false),
			("scripts/dev.sh", files::DEV_SCRIPT, true),
			("README.md", files::README, false),
			("configs/development.yaml", files::DEVELOPMENT_SETTINGS, false),
			("configs/production.yaml", files::PRODUCTION_SETTINGS, false),
		] {
			self.file(rel, &render_file(rel, text, &params)?, executable)?;
		}

		let mut requirements = template.python_packages.join("\n");
		requirements.push('\n');
		self.file("requirements.txt", &requirements, false)?;

		let env: String = template
			.environment
			.iter()
			.map(|(k, v)| format!("{k}={v}\n"))
			.collect();
		self.file(".env.example", &env, false)?;

		return Ok(());
	}

	/// Write a stub for every processor we know how to stub
	fn processors(
		&mut self,
		params: &TemplateParams,
		template: &ProjectTemplate,
	) -> Result<(), ScaffoldError> {
		for p in &template.processors {
			let params = params.with_processor(&p.id);

			match p.processor_type {
				ProcessorType::Python => {
					let rel = format!("processors/{}.py", p.id);
					let text = render_file(&rel, files::PYTHON_PROCESSOR, &params)?;
					self.file(&rel, &text, true)?;
				}

				ProcessorType::Go => {
					let dir = format!("processors/{}", p.id);
					self.dir(&dir)?;

					let rel = format!("{dir}/main.go");
					let text = render_file(&rel, files::GO_PROCESSOR, &params)?;
					self.file(&rel, &text, false)?;

					let rel = format!("{dir}/go.mod");
					let text = render_file(&rel, files::GO_MOD, &params)?;
					self.file(&rel, &text, false)?;
				}

				ProcessorType::RustWasm => {
					let dir = format!("processors/{}_wasm", p.id);
					self.dir(&dir)?;

					let rel = format!("{dir}/README.md");
					let text = render_file(&rel, files::WASM_README, &params)?;
					self.file(&rel, &text, false)?;
				}

				_ => {
					debug!(
						message = "No stub for processor type",
						processor = p.id,
						processor_type = %p.processor_type
					);
				}
			}
		}

		return Ok(());
	}
}

fn render_file(file: &str, text: &str, params: &TemplateParams) -> Result<String, ScaffoldError> {
	render(text, params).map_err(|source| ScaffoldError::Render {
		file: file.to_owned(),
		source,
	})
}

/// The part of `docker-compose.yml` after the project's own service
fn compose_services(services: &[String]) -> Result<String, ScaffoldError> {
	if services.is_empty() {
		return Ok(String::new());
	}

	let mut out = String::from("    depends_on:\n");
	for s in services {
		out.push_str(&format!("      - {s}\n"));
	}

	for s in services {
		let def = files::compose_service(s)
			.ok_or_else(|| ScaffoldError::UnknownService { name: s.clone() })?;
		out.push('\n');
		out.push_str(def);
	}

	return Ok(out);
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
	use std::os::unix::fs::PermissionsExt;
	let mut perms = fs::metadata(path)?.permissions();
	perms.set_mode(0o755);
	fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use dialogchain_pipeline::{plan::plan_file, validate::validate_file};

	fn options(parent: &Path, name: &str, template: &str) -> ScaffoldOptions {
		ScaffoldOptions {
			name: name.to_owned(),
			template: template.to_owned(),
			parent_dir: parent.to_owned(),
		}
	}

	#[test]
	fn basic_project() {
		let dir = tempfile::tempdir().unwrap();
		let report = Scaffolder::new(options(dir.path(), "demo", "basic"))
			.create()
			.unwrap();

		let root = dir.path().join("demo");
		assert_eq!(report.root, root);
		for d in PROJECT_DIRS {
			assert!(root.join(d).is_dir(), "missing directory {d}");
		}

		for f in [
			"pipeline.yaml",
			"processors/main_processor.py",
			"Dockerfile",
			"docker-compose.yml",
			".gitignore",
			"requirements.txt",
			"scripts/dev.sh",
			"README.md",
			"configs/development.yaml",
			"configs/production.yaml",
			".env.example",
		] {
			assert!(root.join(f).is_file(), "missing file {f}");
			assert!(report.files.contains(&PathBuf::from(f)));
		}

		let stub = fs::read_to_string(root.join("processors/main_processor.py")).unwrap();
		assert!(stub.contains("PROCESSOR_ID = \"main_processor\""));
		assert!(stub.contains("Main Processor Processor"));

		let compose = fs::read_to_string(root.join("docker-compose.yml")).unwrap();
		assert!(compose.contains("  demo:\n"));
		assert!(compose.contains("      - redis\n"));
		assert!(compose.contains("image: redis:7-alpine"));

		let report = validate_file(&root.join("pipeline.yaml")).unwrap();
		assert_eq!(report.config.name, "demo");
		assert_eq!(report.order(), vec!["main_processor"]);
	}

	#[cfg(unix)]
	#[test]
	fn scripts_are_executable() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		Scaffolder::new(options(dir.path(), "demo", "basic"))
			.create()
			.unwrap();

		for f in ["scripts/dev.sh", "processors/main_processor.py"] {
			let mode = fs::metadata(dir.path().join("demo").join(f))
				.unwrap()
				.permissions()
				.mode();
			assert_eq!(mode & 0o111, 0o111, "{f} is not executable");
		}
	}

	#[test]
	fn every_template_validates() {
		for name in ProjectTemplate::builtin_names() {
			let dir = tempfile::tempdir().unwrap();
			Scaffolder::new(options(dir.path(), "proj", name))
				.create()
				.unwrap();

			let r = validate_file(&dir.path().join("proj/pipeline.yaml")).unwrap();
			assert!(r.warnings.is_empty(), "{name}: {:?}", r.warnings);
		}
	}

	#[test]
	fn stubs_follow_processor_types() {
		let dir = tempfile::tempdir().unwrap();
		Scaffolder::new(options(dir.path(), "sec", "security"))
			.create()
			.unwrap();
		let root = dir.path().join("sec");
		assert!(root.join("processors/object_detection.py").is_file());
		assert!(root.join("processors/threat_analysis/main.go").is_file());

		let main_go = fs::read_to_string(root.join("processors/threat_analysis/main.go")).unwrap();
		assert!(main_go.contains("const processorID = \"threat_analysis\""));
		assert!(main_go.contains("if data == nil {"));
		assert!(main_go.contains("input must be a JSON object"));

		let go_mod = fs::read_to_string(root.join("processors/threat_analysis/go.mod")).unwrap();
		assert!(go_mod.starts_with("module sec/processors/threat_analysis\n"));

		let dir = tempfile::tempdir().unwrap();
		Scaffolder::new(options(dir.path(), "things", "iot"))
			.create()
			.unwrap();
		let root = dir.path().join("things");
		assert!(root.join("processors/data_validation_wasm/README.md").is_file());
		assert!(root.join("processors/anomaly_detection.py").is_file());
	}

	/// Run a generated python stub, if `python3` is installed
	fn run_python(script: &Path, input: &str) -> Option<(bool, serde_json::Value)> {
		use std::process::{Command, Stdio};

		let mut child = match Command::new("python3")
			.arg(script)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.spawn()
		{
			Ok(x) => x,
			Err(err) if err.kind() == ErrorKind::NotFound => return None,
			Err(err) => panic!("could not run python3: {err}"),
		};

		child
			.stdin
			.take()
			.unwrap()
			.write_all(input.as_bytes())
			.unwrap();
		let out = child.wait_with_output().unwrap();
		Some((
			out.status.success(),
			serde_json::from_slice(&out.stdout).unwrap(),
		))
	}

	#[test]
	fn generated_python_stub_runs() {
		let dir = tempfile::tempdir().unwrap();
		Scaffolder::new(options(dir.path(), "demo", "basic"))
			.create()
			.unwrap();
		let script = dir.path().join("demo/processors/main_processor.py");

		let Some((ok, out)) = run_python(&script, r#"{"message":"hi"}"#) else {
			return;
		};
		assert!(ok);
		assert_eq!(out["message"], "hi");
		assert_eq!(out["processor"], "main_processor");
		assert!(out["processed_at"].is_string());

		for bad in ["null", "[1]", "{not json"] {
			let (ok, out) = run_python(&script, bad).unwrap();
			assert!(!ok, "{bad}");
			assert!(out["error"].is_string(), "{bad}: {out}");
		}
	}

	#[test]
	fn create_twice() {
		let dir = tempfile::tempdir().unwrap();
		let s = Scaffolder::new(options(dir.path(), "demo", "basic"));
		s.create().unwrap();

		let root = dir.path().join("demo");
		fs::write(root.join("pipeline.yaml"), "edited").unwrap();
		fs::write(root.join("notes.txt"), "mine").unwrap();

		match s.create() {
			Err(ScaffoldError::AlreadyExists { path }) => assert_eq!(path, root),
			x => panic!("expected AlreadyExists, got {x:?}"),
		}

		assert_eq!(
			fs::read_to_string(root.join("pipeline.yaml")).unwrap(),
			"edited"
		);
		assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "mine");
		assert!(root.join("scripts/dev.sh").is_file());
	}

	#[test]
	fn bad_options() {
		let dir = tempfile::tempdir().unwrap();

		let e = Scaffolder::new(options(dir.path(), "a/b", "basic"))
			.create()
			.unwrap_err();
		assert!(matches!(
			e,
			ScaffoldError::InvalidName(NameError::NotAPathComponent)
		));

		for name in ["my app", "#demo"] {
			let e = Scaffolder::new(options(dir.path(), name, "basic"))
				.create()
				.unwrap_err();
			assert!(matches!(
				e,
				ScaffoldError::InvalidName(NameError::BadCharacter { .. })
			));
			assert!(!dir.path().join(name).exists());
		}

		let e = Scaffolder::new(options(dir.path(), "demo", "nope"))
			.create()
			.unwrap_err();
		assert!(matches!(e, ScaffoldError::UnknownTemplate { .. }));
		assert!(!dir.path().join("demo").exists());
	}

	#[test]
	fn failure_removes_partial_project() {
		let dir = tempfile::tempdir().unwrap();
		let mut template = ProjectTemplate::builtin("basic").unwrap().unwrap();
		template.services.push("mystery".to_owned());

		let e = Scaffolder::new(options(dir.path(), "demo", "basic"))
			.create_from(&template)
			.unwrap_err();
		assert!(matches!(e, ScaffoldError::UnknownService { .. }));
		assert!(!dir.path().join("demo").exists());
	}

	#[test]
	fn environment_overrides() {
		let dir = tempfile::tempdir().unwrap();
		Scaffolder::new(options(dir.path(), "demo", "basic"))
			.create()
			.unwrap();
		let pipeline = dir.path().join("demo/pipeline.yaml");

		let dev = plan_file(&pipeline, "development").unwrap();
		assert_eq!(dev.settings.performance.max_concurrent, 4);
		assert_eq!(dev.settings.monitoring.log_level, "DEBUG");
		assert!(!dev.settings.security.require_auth);
		assert_eq!(dev.settings.security.rate_limit, Some(1000));

		let prod = plan_file(&pipeline, "production").unwrap();
		assert_eq!(prod.settings.performance.max_concurrent, 50);
		assert_eq!(prod.settings.monitoring.log_level, "WARN");
		assert!(prod.settings.security.require_auth);
		assert_eq!(prod.settings.security.rate_limit, Some(100));
		assert_eq!(
			prod.settings.security.allowed_origins,
			vec!["https://demo.example.com"]
		);
	}

	#[test]
	fn init_writes_pipeline_once() {
		let dir = tempfile::tempdir().unwrap();
		let path = init(dir.path(), "here").unwrap();
		assert_eq!(path, dir.path().join(PIPELINE_FILE));
		assert_eq!(validate_file(&path).unwrap().config.name, "here");

		let e = init(dir.path(), "again").unwrap_err();
		assert!(matches!(e, ScaffoldError::AlreadyExists { .. }));
		assert_eq!(validate_file(&path).unwrap().config.name, "here");
	}
}
