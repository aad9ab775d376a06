//! Filesystem utilities.

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io,
    path::Path,
};

/// Creates the parent directories of the given file path if they do not
/// already exist.
pub fn create_parent_directories(file_path: impl AsRef<Path>) -> io::Result<()> {
    match file_path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Creates the file at the given path, truncating any existing file, as well
/// as any missing parent directories.
pub fn create_file_and_required_directories(file_path: impl AsRef<Path>) -> io::Result<File> {
    create_parent_directories(&file_path)?;
    File::create(file_path)
}

/// Reads and returns the content of the specified text file.
pub fn read_text_file(file_path: impl AsRef<Path>) -> io::Result<String> {
    fs::read_to_string(file_path)
}

/// Writes the given string as a text file with the specified path, regardless
/// of whether the file already exists.
pub fn write_text_file(text: &str, output_file_path: impl AsRef<Path>) -> io::Result<()> {
    create_parent_directories(&output_file_path)?;
    fs::write(output_file_path, text)
}

/// Reads the RON (Rusty Object Notation) file at the given path and
/// deserializes the contents into an object of type `T`.
pub fn parse_ron_file<T>(file_path: impl AsRef<Path>) -> Result<T>
where
    T: for<'de> serde::de::Deserialize<'de>,
{
    let file_path = file_path.as_ref();

    let text = read_text_file(file_path)
        .with_context(|| format!("Could not open {}", file_path.display()))?;

    ron::from_str::<T>(&text)
        .map_err(anyhow::Error::from)
        .with_context(|| format!("Invalid syntax in {}", file_path.display()))
}

/// Serializes the given value of type `T` to RON (Rusty Object Notation)
/// and writes it to the given path.
pub fn write_ron_file<T>(value: &T, output_file_path: impl AsRef<Path>) -> Result<()>
where
    T: serde::ser::Serialize,
{
    let output_file_path = output_file_path.as_ref();
    let text = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    write_text_file(&text, output_file_path)
        .with_context(|| format!("Could not write {}", output_file_path.display()))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn creating_file_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/out.data");
        create_file_and_required_directories(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn creating_file_without_extension_does_not_create_directory_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out");
        create_file_and_required_directories(&path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn writing_text_file_replaces_longer_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/notes.txt");
        write_text_file("a much longer first text", &path).unwrap();
        write_text_file("short", &path).unwrap();
        assert_eq!(read_text_file(&path).unwrap(), "short");
    }

    #[test]
    fn written_ron_file_parses_to_same_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.ron");
        let values = BTreeMap::from([("a".to_string(), 1_u32), ("b".to_string(), 2)]);

        write_ron_file(&values, &path).unwrap();
        let parsed: BTreeMap<String, u32> = parse_ron_file(&path).unwrap();

        assert_eq!(parsed, values);
    }

    #[test]
    fn parsing_missing_ron_file_fails_with_path_in_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.ron");
        let err = parse_ron_file::<BTreeMap<String, u32>>(&path).unwrap_err();
        assert!(err.to_string().contains("missing.ron"));
    }
}
