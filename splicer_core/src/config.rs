use crate::mutator::MutatorKind;
use serde::Deserialize;
use std::path::PathBuf;

/// Options that change how the dispatcher mutates.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct MutationOptions {
    /// Fold every mutated input into printable ASCII.
    #[serde(default)]
    pub only_ascii: bool,
    /// Restrict the dispatcher to these built-in strategies, given by
    /// report name (see [`MutatorKind::name`]).
    #[serde(default)]
    pub mutators: Option<Vec<MutatorKind>>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_runs")]
    pub runs: u64,
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Where novel inputs are written; nothing is written when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub print_sequences: bool,
}

pub fn default_seed() -> u64 {
    0
}
pub fn default_runs() -> u64 {
    10_000
}
pub fn default_max_len() -> usize {
    4096
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            runs: default_runs(),
            max_len: default_max_len(),
            output_dir: None,
            print_sequences: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct DictionarySettings {
    /// AFL-style `.dict` files loaded into the manual dictionary.
    #[serde(default)]
    pub manual_paths: Vec<PathBuf>,
    /// JSON file the persistent dictionary is loaded from and saved to.
    #[serde(default)]
    pub persistent_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct CorpusSettings {
    #[serde(default)]
    pub initial_seed_paths: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct SplicerConfig {
    #[serde(default)]
    pub mutation: MutationOptions,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub dictionary: DictionarySettings,
    #[serde(default)]
    pub corpus: CorpusSettings,
}

impl SplicerConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: SplicerConfig = toml::from_str(content)?;
        if config.session.max_len == 0 {
            return Err(anyhow::anyhow!("session.max-len must be greater than zero"));
        }
        if config.mutation.mutators.as_ref().is_some_and(Vec::is_empty) {
            return Err(anyhow::anyhow!("mutation.mutators must not be empty"));
        }
        Ok(config)
    }
}
