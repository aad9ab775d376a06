//! Typed fixture records.
//!
//! Each fixture kind has a record type holding the sampled inputs together
//! with the reference outputs computed from them. Records are flattened into
//! the field values of their kind's [`FixtureSchema`](crate::schema::FixtureSchema)
//! for serialization and rebuilt from them when read back.

use crate::{
    kind::FixtureKind,
    reference,
    schema::{FieldType, FieldValue},
};
use anyhow::{Result, anyhow, bail};
use nalgebra::{Matrix4, Vector3, Vector4};
use std::slice;

/// A fixture record of one specific kind.
pub trait Fixture: Sized {
    /// Appends the field values of the record in schema order.
    fn push_field_values(&self, values: &mut Vec<FieldValue>);

    /// Rebuilds a record from field values in schema order.
    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self>;

    /// Returns a copy of the record whose outputs have been recomputed from
    /// its recorded inputs.
    fn recomputed(&self) -> Self;
}

/// Sequential access to the field values of one record.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    values: slice::Iter<'a, FieldValue>,
}

/// Matrix inversion.
#[derive(Clone, Debug, PartialEq)]
pub struct InverseFixture {
    pub original: Matrix4<f64>,
    pub inverse: Matrix4<f64>,
}

/// Matrix multiplication in both orders.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiplyFixture {
    pub a: Matrix4<f64>,
    pub b: Matrix4<f64>,
    pub a_times_b: Matrix4<f64>,
    pub b_times_a: Matrix4<f64>,
}

/// View matrix construction. `up` is stored normalized.
#[derive(Clone, Debug, PartialEq)]
pub struct LookAtFixture {
    pub eye: Vector3<f64>,
    pub center: Vector3<f64>,
    pub up: Vector3<f64>,
    pub view: Matrix4<f64>,
}

/// Orthographic projection, with and without explicit near and far planes.
#[derive(Clone, Debug, PartialEq)]
pub struct OrthoFixture {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub ortho: Matrix4<f64>,
    pub ortho_2d: Matrix4<f64>,
}

/// Symmetric perspective projection.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveFixture {
    pub fovy: f64,
    pub aspect: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub perspective: Matrix4<f64>,
}

/// Projection of a point to window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectFixture {
    pub point: Vector3<f64>,
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
    pub viewport: Vector4<f64>,
    pub projected: Vector3<f64>,
}

/// Rotation about an arbitrary axis. `axis` is stored as sampled, without
/// normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct RotateFixture {
    pub base: Matrix4<f64>,
    pub angle: f64,
    pub axis: Vector3<f64>,
    pub rotated: Matrix4<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranslateFixture {
    pub base: Matrix4<f64>,
    pub offset: Vector3<f64>,
    pub translated: Matrix4<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleFixture {
    pub base: Matrix4<f64>,
    pub factors: Vector3<f64>,
    pub scaled: Matrix4<f64>,
}

/// General perspective projection from near-plane bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct FrustumFixture {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub frustum: Matrix4<f64>,
}

/// Mapping of window coordinates back through the view and projection.
#[derive(Clone, Debug, PartialEq)]
pub struct UnprojectFixture {
    pub window: Vector3<f64>,
    pub view: Matrix4<f64>,
    pub projection: Matrix4<f64>,
    pub viewport: Vector4<f64>,
    pub unprojected: Vector3<f64>,
}

macro_rules! define_fixture_record {
    ($($kind:ident => $fixture:ident),* $(,)?) => {
        /// A fixture record of any kind.
        #[derive(Clone, Debug, PartialEq)]
        pub enum FixtureRecord {
            $($kind($fixture)),*
        }

        impl FixtureRecord {
            /// Returns the kind of the record.
            pub fn kind(&self) -> FixtureKind {
                match self {
                    $(Self::$kind(_) => FixtureKind::$kind),*
                }
            }

            /// Returns the field values of the record in schema order.
            pub fn field_values(&self) -> Vec<FieldValue> {
                let mut values = Vec::with_capacity(self.kind().schema().n_fields());
                match self {
                    $(Self::$kind(fixture) => fixture.push_field_values(&mut values)),*
                }
                values
            }

            /// Rebuilds a record of the given kind from its field values.
            ///
            /// # Errors
            /// Returns an error if the number or types of the values do not
            /// match the schema of the kind.
            pub fn from_field_values(kind: FixtureKind, values: &[FieldValue]) -> Result<Self> {
                let mut fields = FieldCursor::new(values);
                let record = match kind {
                    $(FixtureKind::$kind => Self::$kind($fixture::from_fields(&mut fields)?)),*
                };
                fields.finish()?;
                Ok(record)
            }

            /// Returns a copy of the record whose outputs have been recomputed
            /// from its recorded inputs.
            pub fn recomputed(&self) -> Self {
                match self {
                    $(Self::$kind(fixture) => Self::$kind(fixture.recomputed())),*
                }
            }
        }

        $(
            impl From<$fixture> for FixtureRecord {
                fn from(fixture: $fixture) -> Self {
                    Self::$kind(fixture)
                }
            }
        )*
    };
}

define_fixture_record! {
    Inverse => InverseFixture,
    Multiply => MultiplyFixture,
    LookAt => LookAtFixture,
    Ortho => OrthoFixture,
    Perspective => PerspectiveFixture,
    Project => ProjectFixture,
    Rotate => RotateFixture,
    Translate => TranslateFixture,
    Scale => ScaleFixture,
    Frustum => FrustumFixture,
    Unproject => UnprojectFixture,
}

impl<'a> FieldCursor<'a> {
    pub fn new(values: &'a [FieldValue]) -> Self {
        Self {
            values: values.iter(),
        }
    }

    pub fn scalar(&mut self) -> Result<f64> {
        match self.next(FieldType::Scalar)? {
            FieldValue::Scalar(value) => Ok(*value),
            _ => unreachable!(),
        }
    }

    pub fn vector3(&mut self) -> Result<Vector3<f64>> {
        match self.next(FieldType::Vector3)? {
            FieldValue::Vector3(vector) => Ok(*vector),
            _ => unreachable!(),
        }
    }

    pub fn vector4(&mut self) -> Result<Vector4<f64>> {
        match self.next(FieldType::Vector4)? {
            FieldValue::Vector4(vector) => Ok(*vector),
            _ => unreachable!(),
        }
    }

    pub fn matrix4(&mut self) -> Result<Matrix4<f64>> {
        match self.next(FieldType::Matrix4)? {
            FieldValue::Matrix4(matrix) => Ok(*matrix),
            _ => unreachable!(),
        }
    }

    /// Ensures that every field value has been consumed.
    pub fn finish(mut self) -> Result<()> {
        let n_remaining = self.values.by_ref().count();
        if n_remaining > 0 {
            bail!("{} unexpected trailing field value(s)", n_remaining);
        }
        Ok(())
    }

    fn next(&mut self, expected: FieldType) -> Result<&'a FieldValue> {
        let value = self
            .values
            .next()
            .ok_or_else(|| anyhow!("Missing {:?} field value", expected))?;
        if value.field_type() != expected {
            bail!(
                "Expected {:?} field value, found {:?}",
                expected,
                value.field_type()
            );
        }
        Ok(value)
    }
}

impl InverseFixture {
    pub fn new(original: Matrix4<f64>) -> Self {
        let inverse = reference::inverse(&original);
        Self { original, inverse }
    }
}

impl Fixture for InverseFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Matrix4(self.original),
            FieldValue::Matrix4(self.inverse),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            original: fields.matrix4()?,
            inverse: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.original)
    }
}

impl MultiplyFixture {
    pub fn new(a: Matrix4<f64>, b: Matrix4<f64>) -> Self {
        let a_times_b = reference::multiply(&a, &b);
        let b_times_a = reference::multiply(&b, &a);
        Self {
            a,
            b,
            a_times_b,
            b_times_a,
        }
    }
}

impl Fixture for MultiplyFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Matrix4(self.a),
            FieldValue::Matrix4(self.b),
            FieldValue::Matrix4(self.a_times_b),
            FieldValue::Matrix4(self.b_times_a),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            a: fields.matrix4()?,
            b: fields.matrix4()?,
            a_times_b: fields.matrix4()?,
            b_times_a: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.a, self.b)
    }
}

impl LookAtFixture {
    /// Creates a look-at fixture. The up vector is recorded as given, so it
    /// should already be normalized.
    pub fn new(eye: Vector3<f64>, center: Vector3<f64>, up: Vector3<f64>) -> Self {
        let view = reference::look_at(&eye, &center, &up);
        Self {
            eye,
            center,
            up,
            view,
        }
    }
}

impl Fixture for LookAtFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Vector3(self.eye),
            FieldValue::Vector3(self.center),
            FieldValue::Vector3(self.up),
            FieldValue::Matrix4(self.view),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            eye: fields.vector3()?,
            center: fields.vector3()?,
            up: fields.vector3()?,
            view: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.eye, self.center, self.up)
    }
}

impl OrthoFixture {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64, z_near: f64, z_far: f64) -> Self {
        let ortho = reference::orthographic(left, right, bottom, top, z_near, z_far);
        let ortho_2d = reference::orthographic_2d(left, right, bottom, top);
        Self {
            left,
            right,
            bottom,
            top,
            z_near,
            z_far,
            ortho,
            ortho_2d,
        }
    }
}

impl Fixture for OrthoFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Scalar(self.left),
            FieldValue::Scalar(self.right),
            FieldValue::Scalar(self.bottom),
            FieldValue::Scalar(self.top),
            FieldValue::Scalar(self.z_near),
            FieldValue::Scalar(self.z_far),
            FieldValue::Matrix4(self.ortho),
            FieldValue::Matrix4(self.ortho_2d),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            left: fields.scalar()?,
            right: fields.scalar()?,
            bottom: fields.scalar()?,
            top: fields.scalar()?,
            z_near: fields.scalar()?,
            z_far: fields.scalar()?,
            ortho: fields.matrix4()?,
            ortho_2d: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.z_near,
            self.z_far,
        )
    }
}

impl PerspectiveFixture {
    pub fn new(fovy: f64, aspect: f64, z_near: f64, z_far: f64) -> Self {
        let perspective = reference::perspective(fovy, aspect, z_near, z_far);
        Self {
            fovy,
            aspect,
            z_near,
            z_far,
            perspective,
        }
    }
}

impl Fixture for PerspectiveFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Scalar(self.fovy),
            FieldValue::Scalar(self.aspect),
            FieldValue::Scalar(self.z_near),
            FieldValue::Scalar(self.z_far),
            FieldValue::Matrix4(self.perspective),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            fovy: fields.scalar()?,
            aspect: fields.scalar()?,
            z_near: fields.scalar()?,
            z_far: fields.scalar()?,
            perspective: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.fovy, self.aspect, self.z_near, self.z_far)
    }
}

impl ProjectFixture {
    pub fn new(
        point: Vector3<f64>,
        view: Matrix4<f64>,
        projection: Matrix4<f64>,
        viewport: Vector4<f64>,
    ) -> Self {
        let projected = reference::project(&point, &view, &projection, &viewport);
        Self {
            point,
            view,
            projection,
            viewport,
            projected,
        }
    }
}

impl Fixture for ProjectFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Vector3(self.point),
            FieldValue::Matrix4(self.view),
            FieldValue::Matrix4(self.projection),
            FieldValue::Vector4(self.viewport),
            FieldValue::Vector3(self.projected),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            point: fields.vector3()?,
            view: fields.matrix4()?,
            projection: fields.matrix4()?,
            viewport: fields.vector4()?,
            projected: fields.vector3()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.point, self.view, self.projection, self.viewport)
    }
}

impl RotateFixture {
    pub fn new(base: Matrix4<f64>, angle: f64, axis: Vector3<f64>) -> Self {
        let rotated = reference::rotate(&base, angle, &axis);
        Self {
            base,
            angle,
            axis,
            rotated,
        }
    }
}

impl Fixture for RotateFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Matrix4(self.base),
            FieldValue::Scalar(self.angle),
            FieldValue::Vector3(self.axis),
            FieldValue::Matrix4(self.rotated),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            base: fields.matrix4()?,
            angle: fields.scalar()?,
            axis: fields.vector3()?,
            rotated: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.base, self.angle, self.axis)
    }
}

impl TranslateFixture {
    pub fn new(base: Matrix4<f64>, offset: Vector3<f64>) -> Self {
        let translated = reference::translate(&base, &offset);
        Self {
            base,
            offset,
            translated,
        }
    }
}

impl Fixture for TranslateFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Matrix4(self.base),
            FieldValue::Vector3(self.offset),
            FieldValue::Matrix4(self.translated),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            base: fields.matrix4()?,
            offset: fields.vector3()?,
            translated: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.base, self.offset)
    }
}

impl ScaleFixture {
    pub fn new(base: Matrix4<f64>, factors: Vector3<f64>) -> Self {
        let scaled = reference::scale(&base, &factors);
        Self {
            base,
            factors,
            scaled,
        }
    }
}

impl Fixture for ScaleFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Matrix4(self.base),
            FieldValue::Vector3(self.factors),
            FieldValue::Matrix4(self.scaled),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            base: fields.matrix4()?,
            factors: fields.vector3()?,
            scaled: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.base, self.factors)
    }
}

impl FrustumFixture {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64, z_near: f64, z_far: f64) -> Self {
        let frustum = reference::frustum(left, right, bottom, top, z_near, z_far);
        Self {
            left,
            right,
            bottom,
            top,
            z_near,
            z_far,
            frustum,
        }
    }
}

impl Fixture for FrustumFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Scalar(self.left),
            FieldValue::Scalar(self.right),
            FieldValue::Scalar(self.bottom),
            FieldValue::Scalar(self.top),
            FieldValue::Scalar(self.z_near),
            FieldValue::Scalar(self.z_far),
            FieldValue::Matrix4(self.frustum),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            left: fields.scalar()?,
            right: fields.scalar()?,
            bottom: fields.scalar()?,
            top: fields.scalar()?,
            z_near: fields.scalar()?,
            z_far: fields.scalar()?,
            frustum: fields.matrix4()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.z_near,
            self.z_far,
        )
    }
}

impl UnprojectFixture {
    pub fn new(
        window: Vector3<f64>,
        view: Matrix4<f64>,
        projection: Matrix4<f64>,
        viewport: Vector4<f64>,
    ) -> Self {
        let unprojected = reference::unproject(&window, &view, &projection, &viewport);
        Self {
            window,
            view,
            projection,
            viewport,
            unprojected,
        }
    }
}

impl Fixture for UnprojectFixture {
    fn push_field_values(&self, values: &mut Vec<FieldValue>) {
        values.extend([
            FieldValue::Vector3(self.window),
            FieldValue::Matrix4(self.view),
            FieldValue::Matrix4(self.projection),
            FieldValue::Vector4(self.viewport),
            FieldValue::Vector3(self.unprojected),
        ]);
    }

    fn from_fields(fields: &mut FieldCursor<'_>) -> Result<Self> {
        Ok(Self {
            window: fields.vector3()?,
            view: fields.matrix4()?,
            projection: fields.matrix4()?,
            viewport: fields.vector4()?,
            unprojected: fields.vector3()?,
        })
    }

    fn recomputed(&self) -> Self {
        Self::new(self.window, self.view, self.projection, self.viewport)
    }
}
