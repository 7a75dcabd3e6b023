use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::params::header;
use crate::row::Row;

/// Append-only CSV log of one instrument.
///
/// Records are terminated with CRLF and quoted only where necessary, so
/// existing logs written by earlier acquisition tools can be continued.
pub struct CsvLog<W: Write = File> {
    path: PathBuf,
    writer: csv::Writer<W>,
}

impl CsvLog<File> {
    /// Open `path` for appending, creating it if absent.
    ///
    /// The returned flag tells whether the file did not exist yet and thus
    /// needs a header. Existence check and open are separate steps: a file
    /// created by someone else in between ends up with a missing or duplicate
    /// header.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<(Self, bool)> {
        let path = path.as_ref();
        let write_header = !path.exists();
        let file = if write_header {
            File::create(path)?
        } else {
            OpenOptions::new().append(true).open(path)?
        };
        log::debug!(
            "Opened log `{}` ({})",
            path.display(),
            if write_header { "created" } else { "appending" }
        );
        Ok((Self::with_path(file, path.to_path_buf()), write_header))
    }

    /// `open` followed by `write_header_if_needed`.
    pub fn open_with_header<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let (mut log, write_header) = Self::open(path)?;
        log.write_header_if_needed(write_header)?;
        Ok(log)
    }
}

impl<W: Write> CsvLog<W> {
    fn with_path(wtr: W, path: PathBuf) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(wtr);
        Self { path, writer }
    }

    pub fn write_header_if_needed(&mut self, write_header: bool) -> crate::Result<()> {
        if write_header {
            self.writer.write_record(&header())?;
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Append a row and flush it to the underlying file right away.
    pub fn append(&mut self, row: &Row) -> crate::Result<()> {
        self.writer.write_record(&row.to_record())?;
        self.writer.flush()?;
        log::debug!("Appended row at {} to `{}`", row.timestamp(), self.path.display());
        Ok(())
    }

    pub fn close(mut self) -> crate::Result<W> {
        self.writer.flush()?;
        log::debug!("Closing log `{}`", self.path.display());
        self.writer
            .into_inner()
            .map_err(|err| crate::Error::Io(err.into_error()))
    }
}
