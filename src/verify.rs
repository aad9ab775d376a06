//! Verification of fixture files.
//!
//! A fixture file is verified by reading every record, recomputing its
//! outputs from its recorded inputs and comparing the two element by element.
//! Each record is assigned the tightest tolerance tier it satisfies. Some
//! kinds additionally have properties that every record must satisfy.

use crate::{
    io::binary::{FixtureReader, open_fixture_file},
    kind::FixtureKind,
    record::FixtureRecord,
};
use anyhow::{Context, Result, bail};
use approx::relative_eq;
use nalgebra::Matrix4;
use std::{fs, io::Read, path::Path};

/// Tolerances for comparing recorded and recomputed elements, from tightest
/// to loosest.
pub const TOLERANCE_TIERS: [f64; 3] = [1e-12, 1e-10, 1e-8];

/// Matrices with an absolute determinant at or below this are not checked for
/// inverting correctly.
pub const MIN_CHECKED_DETERMINANT: f64 = 1e-6;

const INVERSE_CHECK_RELATIVE_TOLERANCE: f64 = 1e-6;

const UNIT_LENGTH_TOLERANCE: f64 = 1e-9;

/// Outcome of verifying the records of one fixture stream.
#[derive(Clone, Debug, PartialEq)]
pub struct VerificationReport {
    pub kind: FixtureKind,
    pub n_records: usize,
    /// Number of records whose tightest satisfied tolerance is the
    /// corresponding entry in [`TOLERANCE_TIERS`].
    pub n_within_tier: [usize; TOLERANCE_TIERS.len()],
    /// Indices of records that satisfied no tolerance tier.
    pub failed_records: Vec<usize>,
    pub property_violations: Vec<PropertyViolation>,
}

/// A record that does not satisfy a property required for its kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyViolation {
    pub record_idx: usize,
    pub description: String,
}

impl VerificationReport {
    fn new(kind: FixtureKind) -> Self {
        Self {
            kind,
            n_records: 0,
            n_within_tier: [0; TOLERANCE_TIERS.len()],
            failed_records: Vec::new(),
            property_violations: Vec::new(),
        }
    }

    /// Whether every record matched within some tier and satisfied every
    /// property.
    pub fn is_success(&self) -> bool {
        self.failed_records.is_empty() && self.property_violations.is_empty()
    }

    /// Logs a summary of the report.
    pub fn log_summary(&self) {
        log::info!("Verified {} {} records", self.n_records, self.kind);
        for (tolerance, n_records) in TOLERANCE_TIERS.iter().zip(self.n_within_tier) {
            log::info!("  {} within {:e}", n_records, tolerance);
        }
        if !self.failed_records.is_empty() {
            log::warn!(
                "  {} records outside every tolerance: {:?}",
                self.failed_records.len(),
                self.failed_records
            );
        }
        for violation in &self.property_violations {
            log::warn!(
                "  Record {}: {}",
                violation.record_idx,
                violation.description
            );
        }
    }
}

/// Verifies every record of the given kind read from the given source.
pub fn verify_fixtures<R: Read>(reader: FixtureReader<R>) -> Result<VerificationReport> {
    let mut report = VerificationReport::new(reader.kind());

    for (record_idx, record) in reader.enumerate() {
        let record = record?;

        match tightest_tolerance_tier(&record, &record.recomputed()) {
            Some(tier) => report.n_within_tier[tier] += 1,
            None => report.failed_records.push(record_idx),
        }

        if let Err(description) = check_properties(&record) {
            report.property_violations.push(PropertyViolation {
                record_idx,
                description,
            });
        }

        report.n_records += 1;
    }

    Ok(report)
}

/// Verifies the fixture file of the given kind at the given path.
///
/// # Errors
/// Returns an error if the file cannot be read or if its size is not a
/// multiple of the record size of the kind.
pub fn verify_fixture_file(
    kind: FixtureKind,
    file_path: impl AsRef<Path>,
) -> Result<VerificationReport> {
    let file_path = file_path.as_ref();

    let file_size = fs::metadata(file_path)
        .with_context(|| format!("Could not read metadata of {}", file_path.display()))?
        .len();
    let record_size = kind.record_size() as u64;
    if file_size % record_size != 0 {
        bail!(
            "Size of {} ({} bytes) is not a multiple of the {} record size ({} bytes)",
            file_path.display(),
            file_size,
            kind,
            record_size
        );
    }

    with_debug_logging!("Verifying {} fixtures in {}", kind, file_path.display(); {
        verify_fixtures(open_fixture_file(kind, file_path)?)
    })
}

/// Returns the index of the tightest tier in [`TOLERANCE_TIERS`] within which
/// every element of the two records agrees, or [`None`] if some element
/// differs by more than the loosest tolerance.
pub fn tightest_tolerance_tier(recorded: &FixtureRecord, expected: &FixtureRecord) -> Option<usize> {
    let recorded = flattened_elements(recorded);
    let expected = flattened_elements(expected);
    if recorded.len() != expected.len() {
        return None;
    }
    TOLERANCE_TIERS.iter().position(|&tolerance| {
        recorded
            .iter()
            .zip(&expected)
            .all(|(&a, &b)| elements_match(a, b, tolerance))
    })
}

/// Two elements match if they are equal within the tolerance in both absolute
/// and relative terms, or if both are NaN.
fn elements_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a.is_nan() && b.is_nan()) || relative_eq!(a, b, epsilon = tolerance, max_relative = tolerance)
}

fn flattened_elements(record: &FixtureRecord) -> Vec<f64> {
    record
        .field_values()
        .iter()
        .flat_map(|value| value.elements().iter().copied())
        .collect()
}

fn check_properties(record: &FixtureRecord) -> Result<(), String> {
    match record {
        FixtureRecord::Inverse(fixture) => {
            check_inverse_gives_identity(&fixture.original, &fixture.inverse)
        }
        FixtureRecord::LookAt(fixture) => {
            let length = fixture.up.norm();
            if (length - 1.0).abs() > UNIT_LENGTH_TOLERANCE {
                return Err(format!("up vector has length {length}, expected 1"));
            }
            Ok(())
        }
        FixtureRecord::Perspective(fixture) => {
            check_far_beyond_near(fixture.z_near, fixture.z_far)
        }
        FixtureRecord::Frustum(fixture) => check_far_beyond_near(fixture.z_near, fixture.z_far),
        _ => Ok(()),
    }
}

/// The tolerance scales with the condition number of the matrix, which is
/// bounded by the product of the norms of the matrix and its inverse.
fn check_inverse_gives_identity(
    original: &Matrix4<f64>,
    inverse: &Matrix4<f64>,
) -> Result<(), String> {
    if original.determinant().abs() <= MIN_CHECKED_DETERMINANT {
        return Ok(());
    }
    let condition_bound = (original.norm() * inverse.norm()).max(1.0);
    let max_deviation = (inverse * original - Matrix4::identity()).amax();
    if max_deviation.is_nan() || max_deviation > INVERSE_CHECK_RELATIVE_TOLERANCE * condition_bound
    {
        return Err(format!(
            "inverse times original deviates from identity by {max_deviation:e}"
        ));
    }
    Ok(())
}

fn check_far_beyond_near(z_near: f64, z_far: f64) -> Result<(), String> {
    if z_far > z_near {
        Ok(())
    } else {
        Err(format!("far distance {z_far} does not exceed near distance {z_near}"))
    }
}
