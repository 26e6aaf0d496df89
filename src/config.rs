//! Configuration management for mbuild.
use regex::Regex;
use serde::Deserialize;
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use crate::error::ConfigError;

/// Component names that would collide with generated composite targets.
pub const RESERVED_COMPONENT_NAMES: &[&str] = &["all"];

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "mbuild.yaml";

/// Manifest used when no configuration file is available.
pub const EMBEDDED_CONFIG: &str = include_str!("../mbuild.yaml");

/// Represents the structure of the configuration file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Configuration version.
    pub version: String,
    /// Project name, used as the prefix of every output binary.
    pub project: String,
    /// Directory that receives build artefacts.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Command that removes the build artefacts.
    pub clean: Vec<String>,
    /// Compiler invocation shared by every component.
    pub compiler: ToolConfig,
    /// Linter invocation shared by every component.
    pub linter: ToolConfig,
    /// Command that generates the documentation.
    pub docs: Vec<String>,
    /// Preprocessor definitions passed as `-D` to both compiler and linter.
    #[serde(default)]
    pub defines: Vec<String>,
    /// Sources compiled into every component.
    #[serde(default)]
    pub common_sources: Vec<String>,
    /// Per-profile flags.
    pub profiles: Profiles,
    /// Components in registration order.
    pub components: Vec<ComponentConfig>,
    /// Optional self-rebuild settings.
    pub rebuild: Option<RebuildConfig>,
    /// Root directory from which relative paths are resolved.
    #[serde(skip)]
    pub project_dir: Option<PathBuf>,
}

/// An external tool and its fixed flags.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolConfig {
    /// Executable name or path.
    pub program: String,
    /// Flags placed right after the program.
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Flags for the develop and release profiles.
#[derive(Debug, Deserialize, Clone)]
pub struct Profiles {
    /// Develop profile.
    pub dev: ProfileConfig,
    /// Release profile.
    pub rel: ProfileConfig,
}

/// Flags added for one profile.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProfileConfig {
    /// Extra compiler flags.
    #[serde(default)]
    pub compiler_flags: Vec<String>,
    /// Extra linter flags.
    #[serde(default)]
    pub linter_flags: Vec<String>,
}

/// One buildable program of the project.
#[derive(Debug, Deserialize, Clone)]
pub struct ComponentConfig {
    /// Component name, e.g. `server`.
    pub name: String,
    /// Sources specific to this component.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Include directories passed as `-I`.
    #[serde(default)]
    pub includes: Vec<String>,
}

/// Settings for rebuilding the running binary from its source.
#[derive(Debug, Deserialize, Clone)]
pub struct RebuildConfig {
    /// Source whose modification time is compared against the binary.
    pub source: PathBuf,
    /// Compile command. `{binary}` and `{source}` are substituted. There is
    /// no default: the command replaces the running binary, so it has to be
    /// spelled out.
    pub command: Vec<String>,
}

impl RebuildConfig {
    /// Resolves the source path against the project directory.
    pub fn source_path(&self, base: &Path) -> PathBuf {
        if self.source.is_absolute() {
            self.source.clone()
        } else {
            base.join(&self.source)
        }
    }
}

fn default_build_dir() -> String {
    "./build".into()
}

impl Config {
    /// Parses a configuration from YAML text, expanding `${VAR}` references.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content)?;
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.project.trim().is_empty() {
            return Err(ConfigError::Invalid("project name cannot be empty".into()));
        }

        if self.components.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one component is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for component in &self.components {
            if component.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "component names cannot be empty".into(),
                ));
            }
            if RESERVED_COMPONENT_NAMES.contains(&component.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "component name '{}' is reserved",
                    component.name
                )));
            }
            if !seen.insert(component.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "component '{}' is declared more than once",
                    component.name
                )));
            }
        }

        if let Some(rebuild) = &self.rebuild
            && rebuild.command.is_empty()
        {
            return Err(ConfigError::Invalid("rebuild command cannot be empty".into()));
        }

        Ok(())
    }
}

/// Expands `${VAR}` references from the environment.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    });

    let mut missing = None;
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ConfigError::MissingEnvVar(var_name)),
        None => Ok(result.into_owned()),
    }
}

/// Loads the project configuration.
///
/// An explicit path must exist. Without one, `mbuild.yaml` in the working
/// directory is used if present, and the embedded manifest otherwise.
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let config_path = match config_path {
        Some(path) => Some(PathBuf::from(path)),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
    };

    let Some(config_path) = config_path else {
        let mut config = Config::from_yaml_str(EMBEDDED_CONFIG)?;
        config.project_dir = Some(env::current_dir()?);
        return Ok(config);
    };

    let content = fs::read_to_string(&config_path).map_err(|e| {
        ConfigError::Read(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, config_path.display()),
        ))
    })?;

    let mut config = Config::from_yaml_str(&content)?;

    let base_path = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    config.project_dir = Some(base_path);
    Ok(config)
}
