//! Kinds of fixtures.

use crate::schema::{FieldSpec, FixtureSchema};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// A geometric operation that fixtures can be generated for.
///
/// Each kind has its own parameter sampling, reference evaluation and fixed
/// record [`FixtureSchema`].
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixtureKind {
    Inverse,
    #[cfg_attr(feature = "cli", value(alias = "mult"))]
    Multiply,
    #[cfg_attr(feature = "cli", value(alias = "lookat"))]
    LookAt,
    Ortho,
    Perspective,
    Project,
    Rotate,
    Translate,
    Scale,
    Frustum,
    Unproject,
}

const INVERSE_SCHEMA: FixtureSchema =
    FixtureSchema::new(&[FieldSpec::matrix4("original"), FieldSpec::matrix4("inverse")]);

const MULTIPLY_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::matrix4("a"),
    FieldSpec::matrix4("b"),
    FieldSpec::matrix4("a_times_b"),
    FieldSpec::matrix4("b_times_a"),
]);

const LOOK_AT_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::vector3("eye"),
    FieldSpec::vector3("center"),
    FieldSpec::vector3("up"),
    FieldSpec::matrix4("view"),
]);

const ORTHO_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::scalar("left"),
    FieldSpec::scalar("right"),
    FieldSpec::scalar("bottom"),
    FieldSpec::scalar("top"),
    FieldSpec::scalar("z_near"),
    FieldSpec::scalar("z_far"),
    FieldSpec::matrix4("ortho"),
    FieldSpec::matrix4("ortho_2d"),
]);

const PERSPECTIVE_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::scalar("fovy"),
    FieldSpec::scalar("aspect"),
    FieldSpec::scalar("z_near"),
    FieldSpec::scalar("z_far"),
    FieldSpec::matrix4("perspective"),
]);

const PROJECT_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::vector3("point"),
    FieldSpec::matrix4("view"),
    FieldSpec::matrix4("projection"),
    FieldSpec::vector4("viewport"),
    FieldSpec::vector3("projected"),
]);

const ROTATE_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::matrix4("base"),
    FieldSpec::scalar("angle"),
    FieldSpec::vector3("axis"),
    FieldSpec::matrix4("rotated"),
]);

const TRANSLATE_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::matrix4("base"),
    FieldSpec::vector3("offset"),
    FieldSpec::matrix4("translated"),
]);

const SCALE_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::matrix4("base"),
    FieldSpec::vector3("factors"),
    FieldSpec::matrix4("scaled"),
]);

const FRUSTUM_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::scalar("left"),
    FieldSpec::scalar("right"),
    FieldSpec::scalar("bottom"),
    FieldSpec::scalar("top"),
    FieldSpec::scalar("z_near"),
    FieldSpec::scalar("z_far"),
    FieldSpec::matrix4("frustum"),
]);

const UNPROJECT_SCHEMA: FixtureSchema = FixtureSchema::new(&[
    FieldSpec::vector3("window"),
    FieldSpec::matrix4("view"),
    FieldSpec::matrix4("projection"),
    FieldSpec::vector4("viewport"),
    FieldSpec::vector3("unprojected"),
]);

impl FixtureKind {
    /// Returns an array with every fixture kind.
    pub const fn all() -> [Self; 11] {
        [
            Self::Inverse,
            Self::Multiply,
            Self::LookAt,
            Self::Ortho,
            Self::Perspective,
            Self::Project,
            Self::Rotate,
            Self::Translate,
            Self::Scale,
            Self::Frustum,
            Self::Unproject,
        ]
    }

    /// Returns the record layout shared by every fixture of this kind.
    pub const fn schema(&self) -> &'static FixtureSchema {
        match self {
            Self::Inverse => &INVERSE_SCHEMA,
            Self::Multiply => &MULTIPLY_SCHEMA,
            Self::LookAt => &LOOK_AT_SCHEMA,
            Self::Ortho => &ORTHO_SCHEMA,
            Self::Perspective => &PERSPECTIVE_SCHEMA,
            Self::Project => &PROJECT_SCHEMA,
            Self::Rotate => &ROTATE_SCHEMA,
            Self::Translate => &TRANSLATE_SCHEMA,
            Self::Scale => &SCALE_SCHEMA,
            Self::Frustum => &FRUSTUM_SCHEMA,
            Self::Unproject => &UNPROJECT_SCHEMA,
        }
    }

    /// Returns the size in bytes of one fixture record of this kind.
    pub const fn record_size(&self) -> usize {
        self.schema().record_size()
    }

    /// Short lowercase name used in fixture file names.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inverse => "inverse",
            Self::Multiply => "mult",
            Self::LookAt => "lookat",
            Self::Ortho => "ortho",
            Self::Perspective => "perspective",
            Self::Project => "project",
            Self::Rotate => "rotate",
            Self::Translate => "translate",
            Self::Scale => "scale",
            Self::Frustum => "frustum",
            Self::Unproject => "unproject",
        }
    }

    /// Returns the path of the fixture file for this kind inside the given
    /// directory.
    pub fn append_filename(&self, root: &Path) -> PathBuf {
        root.join(format!("glm-{}", self.name()))
            .with_extension("data")
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_sizes_match_documented_layouts() {
        assert_eq!(FixtureKind::Inverse.record_size(), 256);
        assert_eq!(FixtureKind::Multiply.record_size(), 512);
        assert_eq!(FixtureKind::LookAt.record_size(), 200);
        assert_eq!(FixtureKind::Ortho.record_size(), 304);
        assert_eq!(FixtureKind::Perspective.record_size(), 160);
        assert_eq!(FixtureKind::Project.record_size(), 336);
        assert_eq!(FixtureKind::Rotate.record_size(), 288);
        assert_eq!(FixtureKind::Translate.record_size(), 280);
        assert_eq!(FixtureKind::Scale.record_size(), 280);
        assert_eq!(FixtureKind::Frustum.record_size(), 176);
        assert_eq!(FixtureKind::Unproject.record_size(), 336);
    }

    #[test]
    fn fixture_file_names_follow_glm_convention() {
        let root = Path::new("fixtures");
        assert_eq!(
            FixtureKind::LookAt.append_filename(root),
            Path::new("fixtures/glm-lookat.data")
        );
        assert_eq!(
            FixtureKind::Multiply.append_filename(root),
            Path::new("fixtures/glm-mult.data")
        );
    }

    #[test]
    fn all_kinds_have_distinct_names() {
        let mut names: Vec<_> = FixtureKind::all().iter().map(FixtureKind::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FixtureKind::all().len());
    }
}
