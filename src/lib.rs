//! track2gpx - GPX 1.1 exporter of recorded tracks and waypoints

mod error;
mod generator;
pub mod sources;

pub use error::ExportError;
pub use generator::destination::{FlatDirectory, PerTrackDirectory};
pub use generator::encoder::{encode_track_point, encode_waypoint};
pub use generator::exporter::{
    DestinationResolver, ExportObserver, ExportOptions, ExportOrchestrator, ExportOutcome,
    ExportTask, FileSink, MediaRescanNotifier, NoopObserver, OutputSink, TrackExport,
    TrackFailure,
};
pub use generator::filename::build_filename;
pub use generator::gpx::{GpxDocumentWriter, WriterState};
pub use generator::policy::{
    AccuracyMode, CompassMode, FilenamePolicy, FormattingPolicy, OutputLabels, OutputSettings,
    HDOP_APPROXIMATION_FACTOR,
};
pub use generator::record::{Compass, TrackMetadata, TrackPointRecord, WaypointRecord};
pub use sources::RecordSource;
