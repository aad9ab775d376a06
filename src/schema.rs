//! Binary layout of fixture records.
//!
//! A fixture file is a plain concatenation of fixed-size records with no
//! header, delimiter or length prefix. Every field is made of 8-byte IEEE-754
//! doubles in native byte order, and matrices are stored column by column.
//! The schema of a kind is the single source of truth for the layout and is
//! shared by the writer, the reader and the verifier.

use nalgebra::{Matrix4, Vector3, Vector4};
use std::{mem, slice};

/// The type of a single field in a fixture record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    Scalar,
    Vector3,
    Vector4,
    Matrix4,
}

/// A named, typed field in a fixture record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
}

/// The ordered fields making up one fixture record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixtureSchema {
    fields: &'static [FieldSpec],
}

/// The value of a single fixture record field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Scalar(f64),
    Vector3(Vector3<f64>),
    Vector4(Vector4<f64>),
    Matrix4(Matrix4<f64>),
}

/// Size in bytes of one serialized element.
pub const ELEMENT_SIZE: usize = mem::size_of::<f64>();

impl FieldType {
    /// Returns the number of doubles in a field of this type.
    pub const fn n_elements(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3 => 3,
            Self::Vector4 => 4,
            Self::Matrix4 => 16,
        }
    }

    /// Returns the number of bytes in a serialized field of this type.
    pub const fn size(&self) -> usize {
        self.n_elements() * ELEMENT_SIZE
    }
}

impl FieldSpec {
    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, FieldType::Scalar)
    }

    pub const fn vector3(name: &'static str) -> Self {
        Self::new(name, FieldType::Vector3)
    }

    pub const fn vector4(name: &'static str) -> Self {
        Self::new(name, FieldType::Vector4)
    }

    pub const fn matrix4(name: &'static str) -> Self {
        Self::new(name, FieldType::Matrix4)
    }

    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }
}

impl FixtureSchema {
    /// Creates a schema with the given fields in serialization order.
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    /// The fields of the schema in serialization order.
    pub const fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub const fn n_fields(&self) -> usize {
        self.fields.len()
    }

    /// Returns the total number of doubles in one record.
    pub const fn n_elements(&self) -> usize {
        let mut n_elements = 0;
        let mut idx = 0;
        while idx < self.fields.len() {
            n_elements += self.fields[idx].field_type.n_elements();
            idx += 1;
        }
        n_elements
    }

    /// Returns the size in bytes of one record.
    pub const fn record_size(&self) -> usize {
        self.n_elements() * ELEMENT_SIZE
    }

    /// Splits the given flat record elements into typed field values.
    ///
    /// # Panics
    /// If `elements` does not hold exactly [`Self::n_elements`] values.
    pub fn decode(&self, elements: &[f64]) -> Vec<FieldValue> {
        assert_eq!(elements.len(), self.n_elements());

        let mut values = Vec::with_capacity(self.n_fields());
        let mut offset = 0;
        for field in self.fields {
            let n_elements = field.field_type.n_elements();
            let field_elements = &elements[offset..offset + n_elements];
            values.push(FieldValue::from_elements(field.field_type, field_elements));
            offset += n_elements;
        }
        values
    }
}

impl FieldValue {
    /// Creates a field value of the given type from its serialized elements.
    ///
    /// # Panics
    /// If the number of elements does not match the field type.
    pub fn from_elements(field_type: FieldType, elements: &[f64]) -> Self {
        assert_eq!(elements.len(), field_type.n_elements());
        match field_type {
            FieldType::Scalar => Self::Scalar(elements[0]),
            FieldType::Vector3 => Self::Vector3(Vector3::from_column_slice(elements)),
            FieldType::Vector4 => Self::Vector4(Vector4::from_column_slice(elements)),
            FieldType::Matrix4 => Self::Matrix4(Matrix4::from_column_slice(elements)),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Scalar(_) => FieldType::Scalar,
            Self::Vector3(_) => FieldType::Vector3,
            Self::Vector4(_) => FieldType::Vector4,
            Self::Matrix4(_) => FieldType::Matrix4,
        }
    }

    /// Returns the elements of the value in serialization order (column-major
    /// for matrices).
    pub fn elements(&self) -> &[f64] {
        match self {
            Self::Scalar(value) => slice::from_ref(value),
            Self::Vector3(vector) => vector.as_slice(),
            Self::Vector4(vector) => vector.as_slice(),
            Self::Matrix4(matrix) => matrix.as_slice(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::matrix;

    #[test]
    fn field_sizes_are_multiples_of_double_size() {
        assert_eq!(FieldType::Scalar.size(), 8);
        assert_eq!(FieldType::Vector3.size(), 24);
        assert_eq!(FieldType::Vector4.size(), 32);
        assert_eq!(FieldType::Matrix4.size(), 128);
    }

    #[test]
    fn matrix_elements_are_column_major() {
        let value = FieldValue::Matrix4(matrix![
            1.0, 2.0, 3.0, 4.0;
            5.0, 6.0, 7.0, 8.0;
            9.0, 10.0, 11.0, 12.0;
            13.0, 14.0, 15.0, 16.0
        ]);
        assert_eq!(
            value.elements(),
            &[
                1.0, 5.0, 9.0, 13.0, 2.0, 6.0, 10.0, 14.0, 3.0, 7.0, 11.0, 15.0, 4.0, 8.0, 12.0,
                16.0
            ]
        );
    }

    #[test]
    fn decoding_splits_elements_by_field() {
        const SCHEMA: FixtureSchema = FixtureSchema::new(&[
            FieldSpec::scalar("s"),
            FieldSpec::vector3("v"),
            FieldSpec::vector4("w"),
        ]);
        let elements = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

        let values = SCHEMA.decode(&elements);

        assert_eq!(
            values,
            vec![
                FieldValue::Scalar(1.0),
                FieldValue::Vector3(Vector3::new(2.0, 3.0, 4.0)),
                FieldValue::Vector4(Vector4::new(5.0, 6.0, 7.0, 8.0)),
            ]
        );
        assert_eq!(SCHEMA.record_size(), 64);
    }

    #[test]
    #[should_panic]
    fn decoding_wrong_number_of_elements_panics() {
        const SCHEMA: FixtureSchema = FixtureSchema::new(&[FieldSpec::vector3("v")]);
        SCHEMA.decode(&[1.0, 2.0]);
    }
}
