//! Configuration of batch fixture generation.

use crate::{generate::DEFAULT_FIXTURE_COUNT, kind::FixtureKind, sample};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for generating fixture files for several kinds in one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Directory the fixture files are written to.
    pub output_dir: PathBuf,
    /// Number of records to generate for each kind.
    pub count: usize,
    /// Seed for the random engine. A seed is derived from the clock when
    /// this is [`None`].
    pub seed: Option<u64>,
    /// The kinds to generate fixture files for.
    pub kinds: Vec<FixtureKind>,
}

impl GenerationConfig {
    /// Creates a configuration for generating every kind into the given
    /// directory.
    pub fn for_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Returns the configured seed, or a seed derived from the clock if none
    /// is configured.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(sample::seed_from_clock)
    }

    /// Returns the path of the fixture file for the given kind.
    pub fn output_path(&self, kind: FixtureKind) -> PathBuf {
        kind.append_filename(&self.output_dir)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("fixtures"),
            count: DEFAULT_FIXTURE_COUNT,
            seed: None,
            kinds: FixtureKind::all().to_vec(),
        }
    }
}
