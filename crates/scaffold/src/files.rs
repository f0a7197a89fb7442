//! Text templates for generated project files

pub const PYTHON_PROCESSOR: &str = include_str!("../files/processor.py");
pub const GO_PROCESSOR: &str = include_str!("../files/main.go");
pub const GO_MOD: &str = include_str!("../files/go.mod");
pub const WASM_README: &str = include_str!("../files/wasm_readme.md");
pub const DOCKERFILE: &str = include_str!("../files/Dockerfile");
pub const DOCKER_COMPOSE: &str = include_str!("../files/docker-compose.yml");
pub const DEV_SCRIPT: &str = include_str!("../files/dev.sh");
pub const GITIGNORE: &str = include_str!("../files/gitignore");
pub const README: &str = include_str!("../files/README.md");
pub const DEVELOPMENT_SETTINGS: &str = include_str!("../files/development.yaml");
pub const PRODUCTION_SETTINGS: &str = include_str!("../files/production.yaml");

/// Every file template, with a name for error messages
pub const ALL: [(&str, &str); 11] = [
	("processor.py", PYTHON_PROCESSOR),
	("main.go", GO_PROCESSOR),
	("go.mod", GO_MOD),
	("wasm_readme.md", WASM_README),
	("Dockerfile", DOCKERFILE),
	("docker-compose.yml", DOCKER_COMPOSE),
	("dev.sh", DEV_SCRIPT),
	("gitignore", GITIGNORE),
	("README.md", README),
	("development.yaml", DEVELOPMENT_SETTINGS),
	("production.yaml", PRODUCTION_SETTINGS),
];

/// A docker-compose service definition for a known service name
pub fn compose_service(name: &str) -> Option<&'static str> {
	Some(match name {
		"redis" => concat!(
			"  redis:\n",
			"    image: redis:7-alpine\n",
			"    ports:\n",
			"      - \"6379:6379\"\n",
		),

		"mqtt" => concat!(
			"  mqtt:\n",
			"    image: eclipse-mosquitto:2\n",
			"    ports:\n",
			"      - \"1883:1883\"\n",
		),

		"postgres" => concat!(
			"  postgres:\n",
			"    image: postgres:16-alpine\n",
			"    environment:\n",
			"      - POSTGRES_USER=iot\n",
			"      - POSTGRES_PASSWORD=password\n",
			"      - POSTGRES_DB=iot\n",
			"    ports:\n",
			"      - \"5432:5432\"\n",
		),

		_ => return None,
	})
}
