use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "Config";
pub const ENV_PREFIX: &str = "AUDIO_DUPER";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source_paths: Vec<String>,
    pub destination: String,
    #[serde(default = "default_index_dir")]
    pub index_dir: String,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
    #[serde(default = "default_fpcalc_path")]
    pub fpcalc_path: String,
    #[serde(default)]
    pub report_path: Option<String>,
}

fn default_index_dir() -> String {
    "./index".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_fpcalc_path() -> String {
    "fpcalc".to_string()
}

impl AppConfig {
    /// Source roots as paths, with nested roots collapsed into their parents.
    pub fn source_roots(&self) -> Vec<PathBuf> {
        non_overlapping_directories(self.source_paths.clone())
            .into_iter()
            .map(PathBuf::from)
            .collect()
    }

    pub fn with_overrides(mut self, sources: Vec<String>, destination: Option<String>) -> Self {
        if !sources.is_empty() {
            self.source_paths = sources;
        }
        if let Some(destination) = destination {
            self.destination = destination;
        }
        self
    }
}

/// Reads `Config.toml` (or `config_path` when given) and `AUDIO_DUPER_*`
/// environment variables, the latter taking precedence.
pub fn load_configuration(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file_source = match config_path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name(DEFAULT_CONFIG_NAME).required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("source_paths")
                .with_list_parse_key("ignore_patterns")
                .with_list_parse_key("extensions"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
/// Survivors keep the position of their first appearance.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);

        if result
            .iter()
            .any(|res_dir| dir_path.starts_with(Path::new(res_dir)))
        {
            continue;
        }

        match result
            .iter()
            .position(|res_dir| Path::new(res_dir).starts_with(dir_path))
        {
            Some(first) => {
                // the parent takes the slot of its first nested root
                result[first] = dir.clone();
                let mut index = first + 1;
                while index < result.len() {
                    if Path::new(&result[index]).starts_with(dir_path) {
                        result.remove(index);
                    } else {
                        index += 1;
                    }
                }
            }
            None => result.push(dir),
        }
    }

    result
}
