//! Day-partitioned JSON log files with a size ceiling.
//!
//! Daily partitioning and retention belong to
//! [`tracing_appender::rolling::RollingFileAppender`]: records go to
//! `<prefix>.<YYYY-MM-DD>` (UTC date) and, when the day rolls over, only the
//! newest `max_files` files of the stream are kept.
//!
//! The appender has no size trigger, so the sink adds one. Once the active
//! file grows past `max_bytes` its content is moved into
//! `<prefix>.<YYYY-MM-DD>.<n>.gz` (`.<n>` without compression) and the active
//! file is truncated. Archives share the prefix and count towards
//! `max_files`.

use std::io::{self, Write};
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use chrono::{NaiveDate, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

use super::writer::report;
use super::{LogRecord, LogSink, SinkFilter};

const GZ_SUFFIX: &str = ".gz";

/// Rotation and retention parameters for one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingFileConfig {
    prefix: String,
    max_bytes: u64,
    max_files: usize,
    compress: bool,
}

impl RollingFileConfig {
    /// Default ceiling per file (20 MiB).
    pub const DEFAULT_MAX_BYTES: u64 = 20 * 1024 * 1024;
    /// Default number of files kept per stream.
    pub const DEFAULT_MAX_FILES: usize = 14;

    /// Configuration with default limits for files named `<prefix>.<date>`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            max_bytes: Self::DEFAULT_MAX_BYTES,
            max_files: Self::DEFAULT_MAX_FILES,
            compress: true,
        }
    }

    /// Size ceiling that triggers archival of the active file.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Files of this stream to keep, the active one included.
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Whether archives are gzip-compressed.
    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// File name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Retention count; a stream always keeps at least its active file.
    #[must_use]
    pub fn max_files(&self) -> usize {
        self.max_files.max(1)
    }

    /// Name of the file receiving records on `date`.
    ///
    /// # Examples
    /// ```
    /// use auth_backend::logging::RollingFileConfig;
    /// use chrono::NaiveDate;
    ///
    /// let config = RollingFileConfig::new("error");
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
    /// assert_eq!(config.active_name(date), "error.2024-03-09");
    /// assert_eq!(config.archive_name(date, 2), "error.2024-03-09.2.gz");
    /// ```
    #[must_use]
    pub fn active_name(&self, date: NaiveDate) -> String {
        format!("{}.{}", self.prefix, date.format("%Y-%m-%d"))
    }

    /// Name of the `index`th size archive taken on `date`.
    #[must_use]
    pub fn archive_name(&self, date: NaiveDate, index: u32) -> String {
        let name = format!("{}.{index}", self.active_name(date));
        if self.compress { name + GZ_SUFFIX } else { name }
    }

    fn archive_index(&self, date: NaiveDate, name: &str) -> Option<u32> {
        let rest = name
            .strip_prefix(self.active_name(date).as_str())?
            .strip_prefix('.')?;
        rest.strip_suffix(GZ_SUFFIX).unwrap_or(rest).parse().ok()
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveFile {
    date: NaiveDate,
    written: u64,
}

/// Durable JSON-lines sink: daily files from `tracing-appender` plus a size
/// ceiling with optional gzip.
pub struct RollingFileSink {
    name: String,
    dir: Dir,
    config: RollingFileConfig,
    filter: SinkFilter,
    appender: RollingFileAppender,
    active: Option<ActiveFile>,
}

impl RollingFileSink {
    /// Open (creating if needed) `directory` and write files into it.
    ///
    /// # Errors
    /// Returns the I/O error raised while creating or opening the directory
    /// or the day's file.
    pub fn create(
        directory: &Path,
        config: RollingFileConfig,
        filter: SinkFilter,
    ) -> io::Result<Self> {
        Dir::create_ambient_dir_all(directory, ambient_authority())?;
        let dir = Dir::open_ambient_dir(directory, ambient_authority())?;
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(config.prefix())
            .max_log_files(config.max_files())
            .build(directory)
            .map_err(|error| io::Error::other(error.to_string()))?;
        Ok(Self {
            name: format!("file:{}", config.prefix),
            dir,
            config,
            filter,
            appender,
            active: None,
        })
    }

    /// Name of the file last written to, if any.
    #[must_use]
    pub fn active_file(&self) -> Option<String> {
        self.active
            .map(|active| self.config.active_name(active.date))
    }

    /// Bytes now in the day's file, counting from disk on the first write of
    /// a day so a restart resumes where the previous process stopped.
    fn track(&mut self, date: NaiveDate, len: u64) -> u64 {
        if let Some(active) = self.active.as_mut().filter(|active| active.date == date) {
            active.written += len;
            return active.written;
        }
        let written = self
            .dir
            .metadata(self.config.active_name(date))
            .map_or(len, |metadata| metadata.len());
        self.active = Some(ActiveFile { date, written });
        written
    }

    fn next_archive_index(&self, date: NaiveDate) -> io::Result<u32> {
        let mut highest = 0;
        for entry in self.dir.entries()? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            if let Some(index) = name
                .to_str()
                .and_then(|name| self.config.archive_index(date, name))
            {
                highest = highest.max(index);
            }
        }
        Ok(highest + 1)
    }

    /// Move the day's file into the next archive and truncate it.
    fn archive(&mut self, date: NaiveDate) -> io::Result<()> {
        self.appender.flush()?;
        let active = self.config.active_name(date);
        let archive = self
            .config
            .archive_name(date, self.next_archive_index(date)?);

        let mut source = self.dir.open(&active)?;
        let mut target = self.dir.create(&archive)?;
        if self.config.compress {
            let mut encoder = GzEncoder::new(target, Compression::default());
            io::copy(&mut source, &mut encoder)?;
            target = encoder.finish()?;
        } else {
            io::copy(&mut source, &mut target)?;
        }
        target.sync_all()?;

        self.dir
            .open_with(&active, OpenOptions::new().write(true))?
            .set_len(0)?;
        if let Some(active) = self.active.as_mut() {
            active.written = 0;
        }
        Ok(())
    }
}

impl LogSink for RollingFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> SinkFilter {
        self.filter
    }

    fn write(&mut self, record: &LogRecord) -> io::Result<()> {
        let mut line = serde_json::to_vec(&record.to_json())?;
        line.push(b'\n');
        self.appender.write_all(&line)?;

        let date = Utc::now().date_naive();
        if self.track(date, line.len() as u64) > self.config.max_bytes {
            // The record is already durable; a failed archive is retried on
            // the next write.
            if let Err(error) = self.archive(date) {
                report(&self.name, "archive", &error);
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.appender.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let result = self.flush();
        self.active = None;
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::sync::Arc;

    use super::*;
    use crate::logging::{Fields, LogLevel, fields};
    use crate::test_support::cap_fs;
    use chrono::Local;
    use flate2::read::GzDecoder;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(
            LogLevel::Error,
            message.to_owned(),
            None,
            Fields::new(),
            fields([("stack", json!("at handler"))]),
            Arc::new(Fields::new()),
            Local::now(),
        )
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[fixture]
    fn temp() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn dir(temp: &TempDir) -> Dir {
        Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("dir opens")
    }

    fn sink(temp: &TempDir, config: RollingFileConfig) -> RollingFileSink {
        RollingFileSink::create(temp.path(), config, SinkFilter::Only(LogLevel::Error))
            .expect("sink opens")
    }

    fn gunzip(temp: &TempDir, name: &str) -> String {
        let mut decoded = String::new();
        GzDecoder::new(dir(temp).open(name).expect("open archive"))
            .read_to_string(&mut decoded)
            .expect("gunzip");
        decoded
    }

    #[rstest]
    #[case("error.2024-03-09.1.gz", Some(1))]
    #[case("error.2024-03-09.12", Some(12))]
    #[case("error.2024-03-09", None)]
    #[case("error.2024-03-08.1.gz", None)]
    #[case("combined.2024-03-09.1.gz", None)]
    #[case("error.2024-03-09.latest", None)]
    fn recognises_archive_names(#[case] name: &str, #[case] expected: Option<u32>) {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
        assert_eq!(RollingFileConfig::new("error").archive_index(date, name), expected);
    }

    #[rstest]
    fn retention_always_keeps_the_active_file() {
        assert_eq!(RollingFileConfig::new("error").with_max_files(0).max_files(), 1);
        assert_eq!(RollingFileConfig::new("error").with_max_files(3).max_files(), 3);
    }

    #[rstest]
    fn writes_json_lines_to_the_days_file(temp: TempDir) {
        let mut sink = sink(&temp, RollingFileConfig::new("error"));
        sink.write(&record("boom")).expect("write");
        sink.flush().expect("flush");

        let name = sink.active_file().expect("a file was written");
        assert_eq!(name, RollingFileConfig::new("error").active_name(today()));
        let lines = cap_fs::read_json_lines(temp.path(), &name).expect("json lines");
        assert_eq!(lines.len(), 1);
        let parsed: &Value = &lines[0];
        assert_eq!(parsed["message"], json!("boom"));
        assert_eq!(parsed["stack"], json!("at handler"));
        assert_eq!(parsed["level"], json!("error"));
    }

    #[rstest]
    fn size_ceiling_moves_content_into_compressed_archives(temp: TempDir) {
        let config = RollingFileConfig::new("error").with_max_bytes(64);
        let mut sink = sink(&temp, config.clone());
        for n in 0..3 {
            sink.write(&record(&format!("failure number {n}")))
                .expect("write");
        }
        sink.flush().expect("flush");

        let date = today();
        let mut expected = vec![
            config.active_name(date),
            config.archive_name(date, 1),
            config.archive_name(date, 2),
            config.archive_name(date, 3),
        ];
        expected.sort();
        assert_eq!(cap_fs::file_names(temp.path()).expect("names"), expected);
        assert!(gunzip(&temp, &config.archive_name(date, 1)).contains("failure number 0"));
        assert!(gunzip(&temp, &config.archive_name(date, 3)).contains("failure number 2"));
        assert_eq!(
            cap_fs::read_file_to_string(temp.path(), &config.active_name(date)).expect("read"),
            ""
        );
    }

    #[rstest]
    fn archives_stay_plain_without_compression(temp: TempDir) {
        let config = RollingFileConfig::new("error")
            .with_max_bytes(64)
            .with_compression(false);
        let mut sink = sink(&temp, config.clone());
        sink.write(&record("uncompressed")).expect("write");

        let archive = config.archive_name(today(), 1);
        assert!(!archive.ends_with(GZ_SUFFIX));
        assert!(
            cap_fs::read_file_to_string(temp.path(), &archive)
                .expect("read archive")
                .contains("uncompressed")
        );
    }

    #[rstest]
    fn archive_failure_keeps_the_record_in_the_active_file(temp: TempDir) {
        let config = RollingFileConfig::new("error").with_max_bytes(16);
        // A directory squatting on the first archive name makes archival fail.
        dir(&temp)
            .create_dir(config.archive_name(today(), 1))
            .expect("seed directory");
        let mut sink = sink(&temp, config.clone());

        sink.write(&record("must survive")).expect("write still succeeds");
        sink.flush().expect("flush");

        let lines = cap_fs::read_json_lines(temp.path(), &config.active_name(today()))
            .expect("json lines");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], json!("must survive"));
    }

    #[rstest]
    fn existing_archives_are_not_overwritten(temp: TempDir) {
        let config = RollingFileConfig::new("error").with_max_bytes(16);
        dir(&temp)
            .write(config.archive_name(today(), 1), b"older")
            .expect("seed");
        let mut sink = sink(&temp, config.clone());

        sink.write(&record("newer")).expect("write");

        assert_eq!(
            cap_fs::read_file_to_string(temp.path(), &config.archive_name(today(), 1))
                .expect("read"),
            "older"
        );
        assert!(gunzip(&temp, &config.archive_name(today(), 2)).contains("newer"));
    }

    #[rstest]
    fn size_already_on_disk_counts_after_restart(temp: TempDir) {
        let config = RollingFileConfig::new("error")
            .with_max_bytes(200)
            .with_compression(false);
        let seed = format!("{}\n", "x".repeat(180));
        dir(&temp)
            .write(config.active_name(today()), seed.as_bytes())
            .expect("seed");
        let mut sink = sink(&temp, config.clone());

        sink.write(&record("after restart")).expect("write");

        let archived = cap_fs::read_file_to_string(temp.path(), &config.archive_name(today(), 1))
            .expect("archive written");
        assert!(archived.starts_with(&seed));
        assert!(archived.contains("after restart"));
    }
}
