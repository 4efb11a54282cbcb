//! Track export API
//!
//! Exports a batch of tracks, one GPX file per track, sequentially. The first
//! failing track abandons the batch; files already written are kept, including
//! the partial file of the failing track.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use time::OffsetDateTime;

use super::filename::build_filename;
use super::gpx::GpxDocumentWriter;
use super::policy::{FilenamePolicy, FormattingPolicy, OutputSettings};
use crate::error::ExportError;
use crate::RecordSource;

/// Export progress and result listener.
///
/// Called from the export worker, implementations must not block it.
pub trait ExportObserver {
    /// A track export starts
    fn on_progress_init(&self, track_id: i64, points: usize, waypoints: usize);

    /// `n` more records were written
    fn on_progress_tick(&self, n: u64);

    /// The batch ended, successfully or not
    fn on_complete(&self, outcome: &ExportOutcome);
}

/// Observer ignoring everything
pub struct NoopObserver;

impl ExportObserver for NoopObserver {
    fn on_progress_init(&self, _track_id: i64, _points: usize, _waypoints: usize) {}

    fn on_progress_tick(&self, _n: u64) {}

    fn on_complete(&self, _outcome: &ExportOutcome) {}
}

/// Directory where the GPX of a track goes
pub trait DestinationResolver {
    fn directory_for(&self, start: OffsetDateTime) -> Result<PathBuf, String>;
}

/// Told about the files of an export directory, for external indexing
pub trait MediaRescanNotifier {
    fn notify(&self, files: &[PathBuf]);
}

/// Opens the stream a GPX document is written to
pub trait OutputSink {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>>;
}

/// Buffered files on the local file system
pub struct FileSink;

impl OutputSink for FileSink {
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

/// GPX written for a track
#[derive(Clone, Debug, PartialEq)]
pub struct TrackExport {
    pub track_id: i64,
    pub path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed on export the track {track_id}: {error}")]
pub struct TrackFailure {
    pub track_id: i64,
    #[source]
    pub error: ExportError,
}

/// Result of a batch
#[derive(Debug)]
pub struct ExportOutcome {
    /// Tracks exported before the batch ended
    pub exported: Vec<TrackExport>,
    pub failure: Option<TrackFailure>,
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<Vec<TrackExport>, TrackFailure> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.exported),
        }
    }
}

/// Non formatting options of an export
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    pub filename: FilenamePolicy,
    /// Copy the track media files next to the GPX
    pub export_media: bool,
    /// Record the export time on the source
    pub update_export_date: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: FilenamePolicy::NameDate,
            export_media: false,
            update_export_date: false,
        }
    }
}

impl From<&OutputSettings> for ExportOptions {
    fn from(settings: &OutputSettings) -> Self {
        Self {
            filename: settings.filename_policy(),
            export_media: settings.export_media,
            update_export_date: settings.update_export_date,
        }
    }
}

/// Sequential exporter of tracks into GPX files
pub struct ExportOrchestrator<S, D>
where
    S: RecordSource,
    D: DestinationResolver,
{
    source: S,
    destination: D,
    policy: FormattingPolicy,
    options: ExportOptions,
    observer: Box<dyn ExportObserver + Send>,
    rescan: Option<Box<dyn MediaRescanNotifier + Send>>,
    sink: Box<dyn OutputSink + Send>,
}

impl<S, D> ExportOrchestrator<S, D>
where
    S: RecordSource,
    D: DestinationResolver,
{
    pub fn new(source: S, destination: D, policy: FormattingPolicy) -> Self {
        Self {
            source,
            destination,
            policy,
            options: ExportOptions::default(),
            observer: Box::new(NoopObserver),
            rescan: None,
            sink: Box::new(FileSink),
        }
    }

    pub fn options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn observer(mut self, observer: Box<dyn ExportObserver + Send>) -> Self {
        self.observer = observer;
        self
    }

    pub fn rescan(mut self, notifier: Box<dyn MediaRescanNotifier + Send>) -> Self {
        self.rescan = Some(notifier);
        self
    }

    /// Where the documents are written, files by default
    pub fn sink(mut self, sink: Box<dyn OutputSink + Send>) -> Self {
        self.sink = sink;
        self
    }

    /// Give back the record source, eg.: to inspect it after a batch
    pub fn into_source(self) -> S {
        self.source
    }

    /// Export the tracks, in the given order, stopping on the first failure
    pub fn export_tracks(&mut self, track_ids: &[i64]) -> ExportOutcome {
        log::debug!("Exporting tracks {:?} with {:?}", track_ids, self.policy);

        let mut outcome = ExportOutcome {
            exported: vec![],
            failure: None,
        };

        for &track_id in track_ids {
            match self.export_track(track_id) {
                Ok(export) => {
                    log::info!("Track {} exported to {}", track_id, export.path.display());
                    outcome.exported.push(export);
                }
                Err(error) => {
                    log::error!("Export of track {} failed: {}", track_id, error);
                    outcome.failure = Some(TrackFailure { track_id, error });
                    break;
                }
            }
        }

        self.observer.on_complete(&outcome);

        outcome
    }

    fn export_track(&mut self, track_id: i64) -> Result<TrackExport, ExportError> {
        let meta = self
            .source
            .track_metadata(track_id)
            .map_err(ExportError::record_source)?
            .ok_or_else(|| {
                ExportError::record_source(format!("Track {} not found", track_id))
            })?;

        let directory = self
            .destination
            .directory_for(meta.start)
            .map_err(ExportError::storage)?;
        let path = directory.join(build_filename(&meta, self.options.filename));

        let points = self
            .source
            .track_points(track_id)
            .map_err(ExportError::record_source)?;
        let waypoints = self
            .source
            .waypoints(track_id)
            .map_err(ExportError::record_source)?;

        self.observer
            .on_progress_init(track_id, points.len(), waypoints.len());

        let out = self.sink.create(&path).map_err(|e| {
            ExportError::storage(format!(
                "Failed on create the file {}: {}",
                path.display(),
                e
            ))
        })?;

        GpxDocumentWriter::new(out, &self.policy, &*self.observer)
            .write_document(&meta, &points, &waypoints)?;

        if self.options.export_media {
            if let Some(media) = self.source.media_directory(track_id) {
                if let Err(e) = copy_dir_contents(&media, &directory) {
                    log::warn!(
                        "Failed on copy the media of track {} from {}: {}",
                        track_id,
                        media.display(),
                        e
                    );
                }
            }
        }

        if self.options.update_export_date {
            self.source
                .mark_exported(track_id, OffsetDateTime::now_utc())
                .map_err(ExportError::record_source)?;
        }

        if let Some(rescan) = &self.rescan {
            match list_files(&directory) {
                Ok(files) => rescan.notify(&files),
                Err(e) => log::warn!("Failed on list {}: {}", directory.display(), e),
            }
        }

        Ok(TrackExport { track_id, path })
    }
}

impl<S, D> ExportOrchestrator<S, D>
where
    S: RecordSource + Send + 'static,
    D: DestinationResolver + Send + 'static,
{
    /// Run the export on a background worker
    pub fn spawn(mut self, track_ids: Vec<i64>) -> ExportTask {
        let handle = thread::spawn(move || self.export_tracks(&track_ids));

        ExportTask { handle }
    }
}

/// Export running on a background worker
pub struct ExportTask {
    handle: JoinHandle<ExportOutcome>,
}

impl ExportTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait the end of the batch
    pub fn join(self) -> Result<ExportOutcome, String> {
        self.handle
            .join()
            .map_err(|_| "The export worker panicked".to_string())
    }
}

fn list_files(directory: &Path) -> Result<Vec<PathBuf>, io::Error> {
    let mut files = vec![];
    for entry in fs::read_dir(directory)? {
        files.push(entry?.path());
    }
    files.sort();

    Ok(files)
}

fn copy_dir_contents(from: &Path, to: &Path) -> Result<(), io::Error> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&target)?;
            copy_dir_contents(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }

    Ok(())
}
