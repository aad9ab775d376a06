//! Generation of fixture files.

use crate::{
    config::GenerationConfig,
    io::{binary::FixtureWriter, util::create_file_and_required_directories},
    kind::FixtureKind,
    sample::{FixtureRng, create_fixture_rng, sample_record},
};
use anyhow::{Context, Result};
use std::{
    io::{BufWriter, Write},
    path::Path,
};

/// Number of records generated when no count is given.
pub const DEFAULT_FIXTURE_COUNT: usize = 100;

/// Returns the number of fixtures to generate for the given requested count.
/// A negative request gives no fixtures.
pub fn fixture_count_from_request(requested: i64) -> usize {
    usize::try_from(requested.max(0)).unwrap_or(usize::MAX)
}

/// Draws `count` records of the given kind from `rng` and appends them to
/// the writer in generation order.
pub fn generate_fixtures<W: Write>(
    count: usize,
    rng: &mut FixtureRng,
    writer: &mut FixtureWriter<W>,
) -> Result<()> {
    let kind = writer.kind();
    for _ in 0..count {
        let record = sample_record(kind, rng);
        writer.write_record(&record)?;
    }
    Ok(())
}

/// Generates a fixture file with `count` records of the given kind at the
/// given path, truncating any existing file and creating missing parent
/// directories.
///
/// Records are buffered and the file is only flushed once every record has
/// been written.
pub fn generate_fixture_file(
    kind: FixtureKind,
    count: usize,
    rng: &mut FixtureRng,
    output_path: impl AsRef<Path>,
) -> Result<()> {
    let output_path = output_path.as_ref();
    with_timing_info_logging!(
        "Generating {} {} fixtures in {}", count, kind, output_path.display(); {
        let file = create_file_and_required_directories(output_path)
            .with_context(|| format!("Could not create {}", output_path.display()))?;

        let mut writer = FixtureWriter::new(kind, BufWriter::new(file));
        generate_fixtures(count, rng, &mut writer)?;
        writer
            .finish()
            .with_context(|| format!("Could not write {}", output_path.display()))?;
    });
    Ok(())
}

/// Generates one fixture file per configured kind, all driven by a single
/// random engine.
///
/// Returns the seed that was used.
pub fn generate_all(config: &GenerationConfig) -> Result<u64> {
    let seed = config.resolve_seed();
    log::info!(
        "Generating {} kinds of fixtures in {} with seed {}",
        config.kinds.len(),
        config.output_dir.display(),
        seed
    );

    let mut rng = create_fixture_rng(seed);
    for &kind in &config.kinds {
        generate_fixture_file(kind, config.count, &mut rng, config.output_path(kind))?;
    }
    Ok(seed)
}
