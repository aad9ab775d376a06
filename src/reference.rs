//! Reference evaluation of the geometric operations.
//!
//! All transforms follow the right-handed OpenGL conventions: the camera looks
//! down the negative z-axis and normalized device coordinates span -1 to 1 in
//! all three dimensions. Everything is computed in double precision.
//!
//! None of the functions validate their input. Singular matrices, zero-length
//! vectors and empty view volumes produce non-finite elements in the result
//! rather than errors, since the results are meant to be recorded as they are.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

/// Computes the inverse of the given matrix.
///
/// If the matrix is exactly singular, every element of the result is NaN.
/// Nearly singular matrices give whatever the cofactor expansion produces.
pub fn inverse(matrix: &Matrix4<f64>) -> Matrix4<f64> {
    matrix
        .try_inverse()
        .unwrap_or_else(|| Matrix4::from_element(f64::NAN))
}

/// Computes the matrix product `a * b`.
pub fn multiply(a: &Matrix4<f64>, b: &Matrix4<f64>) -> Matrix4<f64> {
    a * b
}

/// Creates a right-handed view matrix for an observer at `eye` looking
/// towards `center`, with `up` giving the approximate upward direction.
///
/// The view direction and the side vector are normalized, and the upward
/// direction is recomputed to be orthogonal to both.
pub fn look_at(eye: &Vector3<f64>, center: &Vector3<f64>, up: &Vector3<f64>) -> Matrix4<f64> {
    let forward = (center - eye).normalize();
    let side = forward.cross(up).normalize();
    let up = side.cross(&forward);

    Matrix4::new(
        side.x,
        side.y,
        side.z,
        -side.dot(eye),
        up.x,
        up.y,
        up.z,
        -up.dot(eye),
        -forward.x,
        -forward.y,
        -forward.z,
        forward.dot(eye),
        0.0,
        0.0,
        0.0,
        1.0,
    )
}

/// Creates an orthographic projection mapping the given view box to the
/// cube from -1 to 1 along each axis.
///
/// No ordering of the bounds is assumed.
pub fn orthographic(
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    z_near: f64,
    z_far: f64,
) -> Matrix4<f64> {
    let mut matrix = orthographic_2d(left, right, bottom, top);
    matrix.m33 = -2.0 / (z_far - z_near);
    matrix.m34 = -(z_far + z_near) / (z_far - z_near);
    matrix
}

/// Creates an orthographic projection for 2D drawing, which leaves out the
/// near and far planes and simply negates z.
pub fn orthographic_2d(left: f64, right: f64, bottom: f64, top: f64) -> Matrix4<f64> {
    let mut matrix = Matrix4::identity();
    matrix.m11 = 2.0 / (right - left);
    matrix.m22 = 2.0 / (top - bottom);
    matrix.m33 = -1.0;
    matrix.m14 = -(right + left) / (right - left);
    matrix.m24 = -(top + bottom) / (top - bottom);
    matrix
}

/// Creates a symmetric perspective projection.
///
/// # Note
/// `fovy` is the vertical field of view in radians and `aspect` the ratio of
/// width to height of the view plane.
pub fn perspective(fovy: f64, aspect: f64, z_near: f64, z_far: f64) -> Matrix4<f64> {
    let tan_half_fovy = (fovy / 2.0).tan();

    let mut matrix = Matrix4::zeros();
    matrix.m11 = 1.0 / (aspect * tan_half_fovy);
    matrix.m22 = 1.0 / tan_half_fovy;
    matrix.m33 = -(z_far + z_near) / (z_far - z_near);
    matrix.m43 = -1.0;
    matrix.m34 = -(2.0 * z_far * z_near) / (z_far - z_near);
    matrix
}

/// Creates a perspective projection for the (possibly off-center) view
/// frustum whose near plane spans the given bounds.
pub fn frustum(
    left: f64,
    right: f64,
    bottom: f64,
    top: f64,
    z_near: f64,
    z_far: f64,
) -> Matrix4<f64> {
    let mut matrix = Matrix4::zeros();
    matrix.m11 = (2.0 * z_near) / (right - left);
    matrix.m22 = (2.0 * z_near) / (top - bottom);
    matrix.m13 = (right + left) / (right - left);
    matrix.m23 = (top + bottom) / (top - bottom);
    matrix.m33 = -(z_far + z_near) / (z_far - z_near);
    matrix.m43 = -1.0;
    matrix.m34 = -(2.0 * z_far * z_near) / (z_far - z_near);
    matrix
}

/// Maps the given point to window coordinates.
///
/// The point is transformed by `view` and then `projection`, divided by the
/// homogeneous coordinate and finally mapped from normalized device
/// coordinates to the viewport `(x, y, width, height)`. The depth is mapped
/// from [-1, 1] to [0, 1]. Window y grows with NDC y.
pub fn project(
    point: &Vector3<f64>,
    view: &Matrix4<f64>,
    projection: &Matrix4<f64>,
    viewport: &Vector4<f64>,
) -> Vector3<f64> {
    let homogeneous = Vector4::new(point.x, point.y, point.z, 1.0);
    let clip = projection * (view * homogeneous);
    let ndc = clip / clip.w;
    let window = (ndc * 0.5).add_scalar(0.5);

    Vector3::new(
        window.x * viewport.z + viewport.x,
        window.y * viewport.w + viewport.y,
        window.z,
    )
}

/// Maps the given window coordinates back to the space the view matrix
/// transforms from. This is the inverse of [`project`].
pub fn unproject(
    window: &Vector3<f64>,
    view: &Matrix4<f64>,
    projection: &Matrix4<f64>,
    viewport: &Vector4<f64>,
) -> Vector3<f64> {
    let inverse = inverse(&(projection * view));

    let normalized = Vector4::new(
        (window.x - viewport.x) / viewport.z,
        (window.y - viewport.y) / viewport.w,
        window.z,
        1.0,
    );
    let ndc = (normalized * 2.0).add_scalar(-1.0);

    let object = inverse * ndc;
    object.xyz() / object.w
}

/// Post-multiplies `matrix` by a rotation of `angle` radians about `axis`.
///
/// The axis does not need to have unit length, it is normalized here. The
/// translation column of `matrix` is left unchanged.
pub fn rotate(matrix: &Matrix4<f64>, angle: f64, axis: &Vector3<f64>) -> Matrix4<f64> {
    let (sin, cos) = angle.sin_cos();
    let axis = axis.normalize();
    let temp = axis * (1.0 - cos);

    let rotation = Matrix3::new(
        cos + temp.x * axis.x,
        temp.y * axis.x - sin * axis.z,
        temp.z * axis.x + sin * axis.y,
        temp.x * axis.y + sin * axis.z,
        cos + temp.y * axis.y,
        temp.z * axis.y - sin * axis.x,
        temp.x * axis.z - sin * axis.y,
        temp.y * axis.z + sin * axis.x,
        cos + temp.z * axis.z,
    );

    let mut rotated = *matrix;
    for k in 0..3 {
        let column = matrix.column(0) * rotation[(0, k)]
            + matrix.column(1) * rotation[(1, k)]
            + matrix.column(2) * rotation[(2, k)];
        rotated.set_column(k, &column);
    }
    rotated
}

/// Post-multiplies `matrix` by a translation by `offset`.
pub fn translate(matrix: &Matrix4<f64>, offset: &Vector3<f64>) -> Matrix4<f64> {
    let mut translated = *matrix;
    let column = matrix.column(0) * offset.x
        + matrix.column(1) * offset.y
        + matrix.column(2) * offset.z
        + matrix.column(3);
    translated.set_column(3, &column);
    translated
}

/// Post-multiplies `matrix` by a nonuniform scaling with the given factors.
pub fn scale(matrix: &Matrix4<f64>, factors: &Vector3<f64>) -> Matrix4<f64> {
    let mut scaled = *matrix;
    for k in 0..3 {
        scaled.set_column(k, &(matrix.column(k) * factors[k]));
    }
    scaled
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::{matrix, vector};
    use proptest::prelude::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    prop_compose! {
        fn entry_strategy()(value in -64.0..64.0) -> f64 {
            value
        }
    }

    prop_compose! {
        fn matrix_strategy()(
            elements in proptest::array::uniform16(entry_strategy())
        ) -> Matrix4<f64> {
            Matrix4::from_column_slice(&elements)
        }
    }

    prop_compose! {
        fn vector_strategy()(
            x in entry_strategy(),
            y in entry_strategy(),
            z in entry_strategy(),
        ) -> Vector3<f64> {
            vector![x, y, z]
        }
    }

    #[test]
    fn orthographic_matches_closed_form_for_literal_bounds() {
        let matrix = orthographic(-10.0, 10.0, -5.0, 5.0, 1.0, 100.0);

        assert_eq!(matrix.m11, 0.1);
        assert_eq!(matrix.m22, 0.2);
        assert_eq!(matrix.m33, -2.0 / 99.0);
        assert_eq!(matrix.m44, 1.0);
        assert_eq!(matrix.m14, 0.0);
        assert_eq!(matrix.m24, 0.0);
        assert_eq!(matrix.m34, -101.0 / 99.0);
        assert_eq!(matrix.m12, 0.0);
        assert_eq!(matrix.m43, 0.0);
    }

    #[test]
    fn orthographic_2d_negates_depth() {
        let matrix = orthographic_2d(-10.0, 30.0, 0.0, 20.0);

        assert_eq!(
            matrix,
            matrix![
                0.05, 0.0, 0.0, -0.5;
                0.0, 0.1, 0.0, -1.0;
                0.0, 0.0, -1.0, 0.0;
                0.0, 0.0, 0.0, 1.0
            ]
        );
    }

    #[test]
    fn orthographic_with_equal_bounds_gives_non_finite_elements() {
        let matrix = orthographic(3.0, 3.0, -1.0, 1.0, 0.0, 1.0);
        assert!(!matrix.m11.is_finite());
        assert!(!matrix.m14.is_finite());
        assert!(matrix.m22.is_finite());
    }

    #[test]
    fn perspective_maps_near_and_far_planes_to_ndc_bounds() {
        let z_near = 0.5;
        let z_far = 40.0;
        let matrix = perspective(FRAC_PI_2, 1.5, z_near, z_far);

        let near = matrix * vector![0.0, 0.0, -z_near, 1.0];
        let far = matrix * vector![0.0, 0.0, -z_far, 1.0];

        assert_abs_diff_eq!(near.z / near.w, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(far.z / far.w, 1.0, epsilon = 1e-12);
        assert_eq!(matrix.m43, -1.0);
        assert_eq!(matrix.m44, 0.0);
    }

    #[test]
    fn perspective_with_right_angle_fov_has_unit_vertical_scale() {
        let matrix = perspective(FRAC_PI_2, 2.0, 1.0, 10.0);
        assert_abs_diff_eq!(matrix.m22, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(matrix.m11, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn symmetric_frustum_equals_perspective() {
        let fovy: f64 = 1.2;
        let aspect = 1.6;
        let z_near = 0.3;
        let z_far = 50.0;
        let top = z_near * (fovy / 2.0).tan();
        let right = top * aspect;

        assert_relative_eq!(
            frustum(-right, right, -top, top, z_near, z_far),
            perspective(fovy, aspect, z_near, z_far),
            max_relative = 1e-12
        );
    }

    #[test]
    fn look_at_maps_eye_to_origin_and_center_to_negative_z() {
        let eye = vector![1.0, 2.0, 3.0];
        let center = vector![4.0, -2.0, 3.0];
        let up = vector![0.0, 0.0, 1.0];
        let view = look_at(&eye, &center, &up);

        let eye_in_view = view * vector![eye.x, eye.y, eye.z, 1.0];
        let center_in_view = view * vector![center.x, center.y, center.z, 1.0];

        assert_abs_diff_eq!(eye_in_view, vector![0.0, 0.0, 0.0, 1.0], epsilon = 1e-12);
        assert_abs_diff_eq!(center_in_view, vector![0.0, 0.0, -5.0, 1.0], epsilon = 1e-12);
    }

    #[test]
    fn look_at_with_zero_up_vector_gives_nan() {
        let view = look_at(&Vector3::zeros(), &vector![0.0, 0.0, -1.0], &Vector3::zeros());
        assert!(view.m11.is_nan());
    }

    #[test]
    fn project_maps_view_center_to_viewport_center() {
        let view = look_at(
            &vector![0.0, 0.0, 5.0],
            &Vector3::zeros(),
            &vector![0.0, 1.0, 0.0],
        );
        let projection = perspective(FRAC_PI_2, 1.0, 1.0, 10.0);
        let viewport = vector![100.0, 200.0, 800.0, 600.0];

        let projected = project(&Vector3::zeros(), &view, &projection, &viewport);

        assert_abs_diff_eq!(projected.x, 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(projected.y, 500.0, epsilon = 1e-9);
        assert!(projected.z > 0.0 && projected.z < 1.0);
    }

    #[test]
    fn project_does_not_flip_window_y() {
        let projection = orthographic(-1.0, 1.0, -1.0, 1.0, -1.0, 1.0);
        let viewport = vector![0.0, 0.0, 200.0, 100.0];

        let projected = project(
            &vector![1.0, 1.0, 0.0],
            &Matrix4::identity(),
            &projection,
            &viewport,
        );

        assert_abs_diff_eq!(projected, vector![200.0, 100.0, 0.5], epsilon = 1e-12);
    }

    #[test]
    fn inverting_singular_matrix_gives_nan() {
        let inverted = inverse(&Matrix4::zeros());
        assert!(inverted.iter().all(|element| element.is_nan()));
    }

    #[test]
    fn rotating_identity_about_z_by_quarter_turn_works() {
        let rotated = rotate(&Matrix4::identity(), FRAC_PI_2, &vector![0.0, 0.0, 3.0]);

        assert_abs_diff_eq!(
            rotated * vector![1.0, 0.0, 0.0, 1.0],
            vector![0.0, 1.0, 0.0, 1.0],
            epsilon = 1e-15
        );
    }

    #[test]
    fn rotating_about_zero_axis_gives_nan() {
        let rotated = rotate(&Matrix4::identity(), PI, &Vector3::zeros());
        assert!(rotated.m11.is_nan());
        assert_eq!(rotated.column(3), Matrix4::<f64>::identity().column(3));
    }

    #[test]
    fn translating_identity_sets_translation_column() {
        let translated = translate(&Matrix4::identity(), &vector![1.0, -2.0, 3.0]);
        assert_eq!(
            translated,
            matrix![
                1.0, 0.0, 0.0, 1.0;
                0.0, 1.0, 0.0, -2.0;
                0.0, 0.0, 1.0, 3.0;
                0.0, 0.0, 0.0, 1.0
            ]
        );
    }

    #[test]
    fn scaling_identity_gives_diagonal_matrix() {
        let scaled = scale(&Matrix4::identity(), &vector![2.0, 3.0, -4.0]);
        assert_eq!(
            scaled,
            Matrix4::from_diagonal(&vector![2.0, 3.0, -4.0, 1.0])
        );
    }

    proptest! {
        #[test]
        fn inverse_of_well_conditioned_matrix_gives_identity_product(
            matrix in matrix_strategy(),
        ) {
            prop_assume!(matrix.determinant().abs() > 1e3);
            let product = matrix * inverse(&matrix);
            prop_assert!(approx::abs_diff_eq!(product, Matrix4::identity(), epsilon = 1e-6));
        }

        #[test]
        fn rotation_ignores_axis_length(
            matrix in matrix_strategy(),
            axis in vector_strategy(),
            angle in -64.0..64.0,
            factor in 0.1..10.0,
        ) {
            prop_assume!(axis.norm() > 1e-3);
            prop_assert!(approx::relative_eq!(
                rotate(&matrix, angle, &axis),
                rotate(&matrix, angle, &(axis * factor)),
                epsilon = 1e-9,
                max_relative = 1e-9
            ));
        }

        #[test]
        fn rotation_matches_product_with_rotated_identity(
            matrix in matrix_strategy(),
            axis in vector_strategy(),
            angle in -64.0..64.0,
        ) {
            prop_assume!(axis.norm() > 1e-3);
            let rotation = rotate(&Matrix4::identity(), angle, &axis);
            prop_assert!(approx::abs_diff_eq!(
                rotate(&matrix, angle, &axis),
                matrix * rotation,
                epsilon = 1e-9
            ));
        }

        #[test]
        fn translation_and_scaling_match_products(
            matrix in matrix_strategy(),
            vector in vector_strategy(),
        ) {
            let translation = translate(&Matrix4::identity(), &vector);
            let scaling = scale(&Matrix4::identity(), &vector);
            prop_assert!(approx::abs_diff_eq!(
                translate(&matrix, &vector),
                matrix * translation,
                epsilon = 1e-9
            ));
            prop_assert!(approx::abs_diff_eq!(
                scale(&matrix, &vector),
                matrix * scaling,
                epsilon = 1e-9
            ));
        }

        #[test]
        fn unprojecting_projected_point_recovers_point(
            eye in vector_strategy(),
            offset in vector_strategy(),
            depth in 2.0..20.0,
            fovy in 0.8..2.5,
            aspect in 0.1..2.0,
        ) {
            prop_assume!(offset.norm() > 1e-2);
            let center = eye + offset;
            let up = offset.cross(&vector![0.3, -0.7, 0.2]);
            prop_assume!(up.norm() > 1e-2);

            let view = look_at(&eye, &center, &up.normalize());
            let projection = perspective(fovy, aspect, 1.0, 40.0);
            let viewport = vector![100.0, 50.0, 1920.0, 1080.0];
            let point = eye + offset.normalize() * depth;

            let window = project(&point, &view, &projection, &viewport);
            let recovered = unproject(&window, &view, &projection, &viewport);

            prop_assert!(approx::abs_diff_eq!(recovered, point, epsilon = 1e-6));
        }
    }
}
