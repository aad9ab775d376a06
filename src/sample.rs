//! Random sampling of fixture inputs.
//!
//! Every scalar is drawn from a uniform distribution over a fixed range that
//! depends on the role of the parameter. Within one record, parameters are
//! drawn in the order they are listed in the record, and matrix entries are
//! drawn column by column.

use crate::{
    kind::FixtureKind,
    record::{
        FixtureRecord, FrustumFixture, InverseFixture, LookAtFixture, MultiplyFixture,
        OrthoFixture, PerspectiveFixture, ProjectFixture, RotateFixture, ScaleFixture,
        TranslateFixture, UnprojectFixture,
    },
    reference,
};
use nalgebra::{Matrix4, Vector3, Vector4};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::{
    f64::consts::{FRAC_PI_4, PI},
    ops::{Range, RangeInclusive},
    time::{SystemTime, UNIX_EPOCH},
};

/// The pseudo-random engine used for drawing fixture inputs.
pub type FixtureRng = Pcg64Mcg;

/// Range of matrix entries, vector components, clip-plane bounds and angles.
pub const ENTRY_RANGE: RangeInclusive<f64> = -64.0..=64.0;

/// Range of the vertical field of view in radians.
pub const FOVY_RANGE: Range<f64> = FRAC_PI_4..PI;

/// Range of the aspect ratio of perspective projections.
pub const ASPECT_RANGE: RangeInclusive<f64> = 0.1..=2.0;

/// Range of the near-plane distance of perspective projections, and of the
/// extra depth added to it to obtain the far-plane distance.
pub const DEPTH_RANGE: RangeInclusive<f64> = 0.01..=64.0;

/// Range of each integer viewport component.
pub const VIEWPORT_RANGE: RangeInclusive<u32> = 100..=4000;

/// Range of window depth for points to unproject.
pub const WINDOW_DEPTH_RANGE: RangeInclusive<f64> = 0.0..=1.0;

/// Creates a fixture random engine from the given seed.
pub fn create_fixture_rng(seed: u64) -> FixtureRng {
    FixtureRng::seed_from_u64(seed)
}

/// Derives a seed from the current wall-clock time, so that repeated runs
/// produce different fixtures.
pub fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos() as u64)
}

/// Draws random inputs for a fixture of the given kind and computes the
/// reference outputs.
pub fn sample_record(kind: FixtureKind, rng: &mut FixtureRng) -> FixtureRecord {
    match kind {
        FixtureKind::Inverse => InverseFixture::new(sample_matrix(rng)).into(),
        FixtureKind::Multiply => {
            let a = sample_matrix(rng);
            let b = sample_matrix(rng);
            MultiplyFixture::new(a, b).into()
        }
        FixtureKind::LookAt => {
            let camera = CameraParams::sample(rng);
            LookAtFixture::new(camera.eye, camera.center, camera.up).into()
        }
        FixtureKind::Ortho => {
            let left = sample_entry(rng);
            let right = sample_entry(rng);
            let bottom = sample_entry(rng);
            let top = sample_entry(rng);
            let z_near = sample_entry(rng);
            let z_far = sample_entry(rng);
            OrthoFixture::new(left, right, bottom, top, z_near, z_far).into()
        }
        FixtureKind::Perspective => {
            let lens = LensParams::sample(rng);
            PerspectiveFixture::new(lens.fovy, lens.aspect, lens.z_near, lens.z_far).into()
        }
        FixtureKind::Project => {
            let (view, projection, viewport) = sample_view_projection_and_viewport(rng);
            let point = sample_vector3(rng);
            ProjectFixture::new(point, view, projection, viewport).into()
        }
        FixtureKind::Rotate => {
            let base = sample_matrix(rng);
            let axis = sample_vector3(rng);
            let angle = sample_entry(rng);
            RotateFixture::new(base, angle, axis).into()
        }
        FixtureKind::Translate => {
            let base = sample_matrix(rng);
            let offset = sample_vector3(rng);
            TranslateFixture::new(base, offset).into()
        }
        FixtureKind::Scale => {
            let base = sample_matrix(rng);
            let factors = sample_vector3(rng);
            ScaleFixture::new(base, factors).into()
        }
        FixtureKind::Frustum => {
            let left = sample_entry(rng);
            let right = sample_entry(rng);
            let bottom = sample_entry(rng);
            let top = sample_entry(rng);
            let (z_near, z_far) = sample_near_and_far(rng);
            FrustumFixture::new(left, right, bottom, top, z_near, z_far).into()
        }
        FixtureKind::Unproject => {
            let (view, projection, viewport) = sample_view_projection_and_viewport(rng);
            let window = Vector3::new(
                rng.random_range(viewport.x..=viewport.x + viewport.z),
                rng.random_range(viewport.y..=viewport.y + viewport.w),
                rng.random_range(WINDOW_DEPTH_RANGE),
            );
            UnprojectFixture::new(window, view, projection, viewport).into()
        }
    }
}

/// Observer placement for a look-at view. The up vector is normalized.
#[derive(Clone, Debug)]
struct CameraParams {
    eye: Vector3<f64>,
    center: Vector3<f64>,
    up: Vector3<f64>,
}

#[derive(Clone, Debug)]
struct LensParams {
    fovy: f64,
    aspect: f64,
    z_near: f64,
    z_far: f64,
}

impl CameraParams {
    fn sample(rng: &mut FixtureRng) -> Self {
        let eye = sample_vector3(rng);
        let center = sample_vector3(rng);
        let up = sample_vector3(rng).normalize();
        Self { eye, center, up }
    }

    fn view(&self) -> Matrix4<f64> {
        reference::look_at(&self.eye, &self.center, &self.up)
    }
}

impl LensParams {
    fn sample(rng: &mut FixtureRng) -> Self {
        let fovy = rng.random_range(FOVY_RANGE);
        let aspect = rng.random_range(ASPECT_RANGE);
        let (z_near, z_far) = sample_near_and_far(rng);
        Self {
            fovy,
            aspect,
            z_near,
            z_far,
        }
    }

    fn projection(&self) -> Matrix4<f64> {
        reference::perspective(self.fovy, self.aspect, self.z_near, self.z_far)
    }
}

fn sample_view_projection_and_viewport(
    rng: &mut FixtureRng,
) -> (Matrix4<f64>, Matrix4<f64>, Vector4<f64>) {
    let view = CameraParams::sample(rng).view();
    let projection = LensParams::sample(rng).projection();
    let viewport = sample_viewport(rng);
    (view, projection, viewport)
}

/// The far distance is the near distance plus an independent positive draw,
/// so it always exceeds the near distance.
fn sample_near_and_far(rng: &mut FixtureRng) -> (f64, f64) {
    let z_near = rng.random_range(DEPTH_RANGE);
    let z_far = z_near + rng.random_range(DEPTH_RANGE);
    (z_near, z_far)
}

fn sample_viewport(rng: &mut FixtureRng) -> Vector4<f64> {
    let mut viewport = Vector4::zeros();
    for component in viewport.iter_mut() {
        *component = f64::from(rng.random_range(VIEWPORT_RANGE));
    }
    viewport
}

fn sample_entry(rng: &mut FixtureRng) -> f64 {
    rng.random_range(ENTRY_RANGE)
}

fn sample_vector3(rng: &mut FixtureRng) -> Vector3<f64> {
    let x = sample_entry(rng);
    let y = sample_entry(rng);
    let z = sample_entry(rng);
    Vector3::new(x, y, z)
}

fn sample_matrix(rng: &mut FixtureRng) -> Matrix4<f64> {
    // `from_fn` visits the elements in column-major order
    Matrix4::from_fn(|_, _| sample_entry(rng))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const N_SAMPLES: usize = 200;

    fn sample_records(kind: FixtureKind) -> Vec<FixtureRecord> {
        let mut rng = create_fixture_rng(42);
        (0..N_SAMPLES)
            .map(|_| sample_record(kind, &mut rng))
            .collect()
    }

    #[test]
    fn sampling_with_same_seed_is_reproducible() {
        for kind in FixtureKind::all() {
            let mut rng_a = create_fixture_rng(7);
            let mut rng_b = create_fixture_rng(7);
            for _ in 0..10 {
                let a = sample_record(kind, &mut rng_a);
                let b = sample_record(kind, &mut rng_b);
                assert_eq!(a.field_values(), b.field_values());
            }
        }
    }

    #[test]
    fn sampled_records_have_the_requested_kind() {
        let mut rng = create_fixture_rng(0);
        for kind in FixtureKind::all() {
            assert_eq!(sample_record(kind, &mut rng).kind(), kind);
        }
    }

    #[test]
    fn sampled_matrix_entries_lie_in_entry_range() {
        for record in sample_records(FixtureKind::Multiply) {
            let FixtureRecord::Multiply(fixture) = record else {
                unreachable!()
            };
            for entry in fixture.a.iter().chain(fixture.b.iter()) {
                assert!(ENTRY_RANGE.contains(entry));
            }
        }
    }

    #[test]
    fn sampled_look_at_up_vectors_have_unit_length() {
        for record in sample_records(FixtureKind::LookAt) {
            let FixtureRecord::LookAt(fixture) = record else {
                unreachable!()
            };
            assert_abs_diff_eq!(fixture.up.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn sampled_perspective_parameters_lie_in_their_ranges() {
        for record in sample_records(FixtureKind::Perspective) {
            let FixtureRecord::Perspective(fixture) = record else {
                unreachable!()
            };
            assert!(FOVY_RANGE.contains(&fixture.fovy));
            assert!(ASPECT_RANGE.contains(&fixture.aspect));
            assert!(DEPTH_RANGE.contains(&fixture.z_near));
            assert!(fixture.z_far > fixture.z_near);
        }
    }

    #[test]
    fn sampled_frustum_far_plane_lies_beyond_near_plane() {
        for record in sample_records(FixtureKind::Frustum) {
            let FixtureRecord::Frustum(fixture) = record else {
                unreachable!()
            };
            assert!(fixture.z_near > 0.0);
            assert!(fixture.z_far > fixture.z_near);
        }
    }

    #[test]
    fn sampled_viewports_are_integral_and_in_range() {
        for record in sample_records(FixtureKind::Project) {
            let FixtureRecord::Project(fixture) = record else {
                unreachable!()
            };
            for component in fixture.viewport.iter() {
                assert_eq!(component.fract(), 0.0);
                assert!((100.0..=4000.0).contains(component));
            }
        }
    }

    #[test]
    fn sampled_unproject_window_points_lie_inside_viewport() {
        for record in sample_records(FixtureKind::Unproject) {
            let FixtureRecord::Unproject(fixture) = record else {
                unreachable!()
            };
            let viewport = fixture.viewport;
            assert!(fixture.window.x >= viewport.x);
            assert!(fixture.window.x <= viewport.x + viewport.z);
            assert!(fixture.window.y >= viewport.y);
            assert!(fixture.window.y <= viewport.y + viewport.w);
            assert!(WINDOW_DEPTH_RANGE.contains(&fixture.window.z));
        }
    }

    #[test]
    fn sampled_rotation_axes_are_kept_unnormalized() {
        let n_unit_axes = sample_records(FixtureKind::Rotate)
            .into_iter()
            .filter(|record| match record {
                FixtureRecord::Rotate(fixture) => (fixture.axis.norm() - 1.0).abs() < 1e-9,
                _ => unreachable!(),
            })
            .count();
        assert_eq!(n_unit_axes, 0);
    }
}
