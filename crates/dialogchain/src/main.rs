use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::DialogChainConfig;
use dialogchain_pipeline::plan::DEFAULT_ENVIRONMENT;
use dialogchain_scaffold::project::DEFAULT_TEMPLATE;
use dialogchain_util::{load_env, LoadedEnv};
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing::{debug, info};
use url::Url;

mod cmd;
mod config;
mod status;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Create a new project from a template
	Create {
		name: String,

		#[arg(long, short, default_value = DEFAULT_TEMPLATE)]
		template: String,

		/// The directory to create the project in
		#[arg(long, default_value = ".")]
		dir: PathBuf,
	},

	/// Write a pipeline.yaml into the current directory
	Init {
		/// The pipeline's name. Defaults to the directory's name.
		#[arg(long)]
		name: Option<String>,
	},

	/// Check a pipeline file
	Validate { file: PathBuf },

	/// Validate a pipeline and show its execution plan
	Dev {
		file: PathBuf,

		#[arg(default_value = DEFAULT_ENVIRONMENT)]
		env: String,
	},

	/// Convert a visual editor export into a pipeline file
	Export {
		graph: PathBuf,

		/// Where to write the pipeline. Defaults to stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},

	/// List project templates
	Templates,

	/// List example pipelines, or print one
	Examples { name: Option<String> },

	/// Check the local environment
	Doctor,

	/// Send test traffic to a pipeline endpoint
	Bench {
		#[arg(long)]
		endpoint: Option<Url>,

		#[arg(long)]
		requests: Option<usize>,

		#[arg(long)]
		concurrency: Option<usize>,

		/// Message size in bytes
		#[arg(long)]
		payload_size: Option<usize>,
	},

	/// Count keywords in recent log files
	Logs {
		#[arg(long)]
		dir: Option<PathBuf>,

		#[arg(long)]
		since_hours: Option<u64>,

		/// Count lines containing this string. May be repeated.
		#[arg(long = "keyword", short)]
		keywords: Vec<String>,
	},

	/// Run the native processor on stdin
	Process {
		#[arg(long)]
		id: String,
	},
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Args::parse();

	let config_res = match load_env::<DialogChainConfig>() {
		Ok(x) => x,
		Err(err) => {
			status::error(format!("Error while loading .env: {err}"));
			return ExitCode::FAILURE;
		}
	};

	tracing_subscriber::fmt()
		.with_env_filter(config_res.get_config().dialogchain_loglevel.get_config())
		.without_time()
		.with_ansi(true)
		.with_writer(std::io::stderr)
		.init();

	// Do this now, logging wasn't available earlier
	match &config_res {
		LoadedEnv::FoundFile { config, path } => {
			debug!(message = "Loaded config from .env", ?path, ?config);
		}
		LoadedEnv::OnlyVars(config) => {
			debug!(
				message = "No `.env` found, loaded config from environment",
				?config
			);
		}
	};
	let config = config_res.into_config();

	match run(cli.command, &config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			status::error(&err);
			for cause in err.chain().skip(1) {
				status::detail(cause);
			}
			ExitCode::FAILURE
		}
	}
}

async fn run(command: Commands, config: &DialogChainConfig) -> Result<()> {
	info!(message = "Running command", ?command);

	match command {
		Commands::Create {
			name,
			template,
			dir,
		} => cmd::create::create(&name, &template, dir),

		Commands::Init { name } => {
			let dir = std::env::current_dir().context("could not get current directory")?;
			cmd::create::run_init(&dir, name)
		}

		Commands::Validate { file } => cmd::validate::run(&file),
		Commands::Dev { file, env } => cmd::dev::run(&file, &env),
		Commands::Export { graph, output } => cmd::export::run(&graph, output.as_deref()),
		Commands::Templates => cmd::create::list_templates(),
		Commands::Examples { name } => cmd::create::examples(name.as_deref()),
		Commands::Doctor => cmd::doctor::run(config),

		Commands::Bench {
			endpoint,
			requests,
			concurrency,
			payload_size,
		} => {
			let endpoint = match endpoint {
				Some(x) => x,
				None => Url::parse(&config.dialogchain_bench_endpoint)
					.context("invalid DIALOGCHAIN_BENCH_ENDPOINT")?,
			};

			cmd::bench::run(cmd::bench::BenchOptions {
				endpoint,
				requests: requests.unwrap_or(config.dialogchain_bench_requests),
				concurrency: concurrency.unwrap_or(config.dialogchain_bench_concurrency),
				payload_size: payload_size.unwrap_or(config.dialogchain_bench_payload_size),
				timeout: Duration::from_millis(config.dialogchain_bench_timeout_ms),
			})
			.await
		}

		Commands::Logs {
			dir,
			since_hours,
			keywords,
		} => {
			let keywords = if keywords.is_empty() {
				cmd::logs::DEFAULT_KEYWORDS
					.iter()
					.map(|x| (*x).to_owned())
					.collect()
			} else {
				keywords
			};

			cmd::logs::run(&cmd::logs::ScanOptions {
				dir: dir.unwrap_or_else(|| config.dialogchain_log_dir.clone()),
				since: cmd::logs::hours(since_hours.unwrap_or(config.dialogchain_log_since_hours)),
				keywords,
			})
		}

		// The processor contract has its own error output
		Commands::Process { id } => {
			if !cmd::process::run(&id) {
				std::process::exit(1);
			}
			Ok(())
		}
	}
}
