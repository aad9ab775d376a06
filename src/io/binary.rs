//! Reading and writing of binary fixture files.

use crate::{kind::FixtureKind, record::FixtureRecord};
use anyhow::{Context, Result, bail};
use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};

/// Appends fixture records of a single kind to a byte sink.
///
/// Every field is written as native-endian doubles in the order given by the
/// schema of the kind. Nothing else is written, so the output is a plain
/// concatenation of fixed-size records.
#[derive(Debug)]
pub struct FixtureWriter<W> {
    kind: FixtureKind,
    writer: W,
    n_records: usize,
}

/// Parses fixture records of a single kind from a byte source.
#[derive(Debug)]
pub struct FixtureReader<R> {
    kind: FixtureKind,
    reader: R,
    elements: Vec<f64>,
    n_records: usize,
}

impl<W: Write> FixtureWriter<W> {
    /// Creates a writer of records of the given kind.
    pub fn new(kind: FixtureKind, writer: W) -> Self {
        Self {
            kind,
            writer,
            n_records: 0,
        }
    }

    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// Returns the number of records written so far.
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Appends the given record.
    ///
    /// # Errors
    /// Returns an error if the record is of a different kind than the writer
    /// or if writing fails.
    pub fn write_record(&mut self, record: &FixtureRecord) -> Result<()> {
        if record.kind() != self.kind {
            bail!(
                "Tried to write {} record to {} fixture stream",
                record.kind(),
                self.kind
            );
        }
        for value in record.field_values() {
            self.writer
                .write_all(bytemuck::cast_slice(value.elements()))?;
        }
        self.n_records += 1;
        Ok(())
    }

    /// Flushes the underlying writer and returns it.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<R: Read> FixtureReader<R> {
    /// Creates a reader of records of the given kind.
    pub fn new(kind: FixtureKind, reader: R) -> Self {
        Self {
            kind,
            reader,
            elements: vec![0.0; kind.schema().n_elements()],
            n_records: 0,
        }
    }

    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// Returns the number of records read so far.
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Reads the next record, or returns [`None`] if the source is
    /// exhausted.
    ///
    /// # Errors
    /// Returns an error if reading fails or if the source ends partway
    /// through a record.
    pub fn read_record(&mut self) -> Result<Option<FixtureRecord>> {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.elements);
        let record_size = bytes.len();

        let n_read = read_until_full(&mut self.reader, bytes)?;
        if n_read == 0 {
            return Ok(None);
        }
        if n_read < record_size {
            bail!(
                "Truncated {} fixture: record {} has only {} of {} bytes",
                self.kind,
                self.n_records,
                n_read,
                record_size
            );
        }

        let values = self.kind.schema().decode(&self.elements);
        let record = FixtureRecord::from_field_values(self.kind, &values)?;
        self.n_records += 1;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for FixtureReader<R> {
    type Item = Result<FixtureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Opens the fixture file at the given path for buffered reading of records
/// of the given kind.
pub fn open_fixture_file(
    kind: FixtureKind,
    file_path: impl AsRef<Path>,
) -> Result<FixtureReader<BufReader<File>>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path)
        .with_context(|| format!("Could not open {}", file_path.display()))?;
    Ok(FixtureReader::new(kind, BufReader::new(file)))
}

/// Reads every record of the given kind from the fixture file at the given
/// path.
pub fn read_fixture_file(
    kind: FixtureKind,
    file_path: impl AsRef<Path>,
) -> Result<Vec<FixtureRecord>> {
    open_fixture_file(kind, file_path)?.collect()
}

/// Fills as much of the buffer as the source allows and returns the number of
/// bytes read, which is only smaller than the buffer at the end of the source.
fn read_until_full(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    let mut n_read = 0;
    while n_read < buffer.len() {
        match reader.read(&mut buffer[n_read..]) {
            Ok(0) => break,
            Ok(n) => n_read += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(n_read)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        record::{InverseFixture, PerspectiveFixture},
        sample::{create_fixture_rng, sample_record},
    };
    use nalgebra::Matrix4;

    fn write_records(kind: FixtureKind, records: &[FixtureRecord]) -> Vec<u8> {
        let mut writer = FixtureWriter::new(kind, Vec::new());
        for record in records {
            writer.write_record(record).unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn written_bytes_are_native_endian_doubles_in_field_order() {
        let record: FixtureRecord = PerspectiveFixture::new(1.0, 1.5, 0.5, 10.0).into();
        let bytes = write_records(FixtureKind::Perspective, &[record.clone()]);

        assert_eq!(bytes.len(), FixtureKind::Perspective.record_size());
        assert_eq!(&bytes[0..8], &1.0_f64.to_ne_bytes());
        assert_eq!(&bytes[8..16], &1.5_f64.to_ne_bytes());
        assert_eq!(&bytes[16..24], &0.5_f64.to_ne_bytes());
        assert_eq!(&bytes[24..32], &10.0_f64.to_ne_bytes());

        let FixtureRecord::Perspective(fixture) = record else {
            unreachable!()
        };
        // First column of the matrix follows the scalars
        assert_eq!(
            &bytes[32..40],
            &fixture.perspective[(0, 0)].to_ne_bytes()
        );
        assert_eq!(
            &bytes[40..48],
            &fixture.perspective[(1, 0)].to_ne_bytes()
        );
    }

    #[test]
    fn writer_counts_written_records() {
        let mut writer = FixtureWriter::new(FixtureKind::Inverse, Vec::new());
        let record: FixtureRecord = InverseFixture::new(Matrix4::identity()).into();
        writer.write_record(&record).unwrap();
        writer.write_record(&record).unwrap();
        assert_eq!(writer.n_records(), 2);
        assert_eq!(writer.finish().unwrap().len(), 512);
    }

    #[test]
    fn writing_record_of_other_kind_fails() {
        let mut writer = FixtureWriter::new(FixtureKind::Multiply, Vec::new());
        let record: FixtureRecord = InverseFixture::new(Matrix4::identity()).into();
        assert!(writer.write_record(&record).is_err());
        assert!(writer.finish().unwrap().is_empty());
    }

    #[test]
    fn reader_returns_written_records_in_order() {
        let mut rng = create_fixture_rng(21);
        for kind in FixtureKind::all() {
            let records: Vec<_> = (0..5).map(|_| sample_record(kind, &mut rng)).collect();
            let bytes = write_records(kind, &records);

            let read: Vec<_> = FixtureReader::new(kind, bytes.as_slice())
                .collect::<Result<_>>()
                .unwrap();

            assert_eq!(read, records);
        }
    }

    #[test]
    fn reading_empty_source_gives_no_records() {
        let mut reader = FixtureReader::new(FixtureKind::LookAt, io::empty());
        assert!(reader.read_record().unwrap().is_none());
        assert_eq!(reader.n_records(), 0);
    }

    #[test]
    fn reading_truncated_record_fails() {
        let record: FixtureRecord = InverseFixture::new(Matrix4::identity()).into();
        let bytes = write_records(FixtureKind::Inverse, &[record.clone(), record]);
        let truncated = &bytes[..bytes.len() - 8];

        let mut reader = FixtureReader::new(FixtureKind::Inverse, truncated);
        assert!(reader.read_record().unwrap().is_some());
        assert!(reader.read_record().is_err());
    }
}
