use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    str::FromStr,
};
use toml::{value::Table, Value};

use crate::error::{Error, Result};

/// The name of the configuration file looked up at the content root.
pub const CONFIG_FILE: &str = "stanza.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Configuration for the content tree itself.
    pub content: ContentConfig,
    /// Configuration for the content checks.
    pub lint: LintConfig,
    /// Configuration for the build stage.
    pub build: BuildConfig,

    /// Any remaining configuration, including renderer tables.
    rest: Value,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let mut buffer = String::new();
        File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?
            .read_to_string(&mut buffer)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Config::from_str(&buffer)
    }

    /// Load `stanza.toml` from `root`, or fall back to the default configuration.
    pub fn load_or_default(root: impl AsRef<Path>) -> Result<Config> {
        let location = root.as_ref().join(CONFIG_FILE);

        if location.exists() {
            Config::load(location)
        } else {
            Ok(Config::default())
        }
    }

    /// Deserialize an arbitrary top-level table that is not owned by the core configuration.
    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let value = self
            .rest
            .get(key)
            .cloned()
            .with_context(|| format!("Configuration has no `{key}` table"))?;

        value
            .try_into()
            .with_context(|| format!("Failed to deserialize `{key}` table"))
    }

    /// Renderer configuration tables keyed by renderer name (`[output.<name>]`).
    pub fn outputs(&self) -> Result<BTreeMap<String, OutputConfig>> {
        match self.rest.get("output") {
            Some(output) => output
                .clone()
                .try_into()
                .with_context(|| "Failed to deserialize `output` tables"),
            None => Ok(BTreeMap::new()),
        }
    }

    /// The absolute location of the catalog for a content root.
    pub fn source_dir(&self, root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(&self.content.source)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content: ContentConfig::default(),
            lint: LintConfig::default(),
            build: BuildConfig::default(),
            rest: Value::Table(Table::default()),
        }
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let raw = Value::deserialize(deserializer)?;
        let Value::Table(mut table) = raw else {
            return Err(D::Error::custom("stanza.toml must always be a toml table"));
        };

        fn take<T, E>(table: &mut Table, key: &str) -> Result<T, E>
        where
            T: DeserializeOwned + Default,
            E: Error,
        {
            table
                .remove(key)
                .map(|value| value.try_into().map_err(E::custom))
                .transpose()
                .map(Option::unwrap_or_default)
        }

        let content = take::<_, D::Error>(&mut table, "content")?;
        let lint = take::<_, D::Error>(&mut table, "lint")?;
        let build = take::<_, D::Error>(&mut table, "build")?;

        let config = Config {
            content,
            lint,
            build,
            rest: Value::Table(table),
        };

        Ok(config)
    }
}

impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::Error;

        let mut table = match &self.rest {
            Value::Table(table) => table.clone(),
            _ => Table::default(),
        };

        table.insert(
            String::from("content"),
            Value::try_from(&self.content).map_err(S::Error::custom)?,
        );
        table.insert(
            String::from("lint"),
            Value::try_from(&self.lint).map_err(S::Error::custom)?,
        );
        table.insert(
            String::from("build"),
            Value::try_from(&self.build).map_err(S::Error::custom)?,
        );

        Value::Table(table).serialize(serializer)
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        toml::from_str(source).with_context(|| "Attempted to parse invalid configuration file")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContentConfig {
    /// Optional title for the whole catalog.
    pub title: Option<String>,
    /// Optional description of the catalog.
    pub description: Option<String>,
    /// Relative path from the root to the directory holding the courses.
    pub source: PathBuf,
    /// File name of course and section index documents.
    pub readme: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            source: PathBuf::from("."),
            readme: String::from("README.md"),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct LintConfig {
    /// Names of checks that will not run.
    pub disabled: Vec<String>,
    /// Allowed code fence language tags. Any tag is accepted when empty.
    pub languages: Vec<String>,
    /// Treat warnings as a failed lint.
    pub deny_warnings: bool,
}

impl LintConfig {
    pub fn is_enabled(&self, check: &str) -> bool {
        !self.disabled.iter().any(|disabled| disabled == check)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Directory, relative to the root, where renderers write their output.
    pub build_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// External command receiving the render context as JSON on stdin.
    pub command: Option<String>,
    /// Include lesson bodies in the JSON manifest.
    pub include_bodies: bool,
}
