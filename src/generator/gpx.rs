//! GPX document writer
//!
//! Streams one GPX 1.1 document to any [`Write`], record by record. The
//! document parts must be written in order:
//!
//! header, metadata, waypoints, track start, track points, track end, close.
//!
//! Calling a step out of order fails with [`io::ErrorKind::InvalidInput`].

use std::io::{self, Write};

use super::encoder::{cdata, encode_track_point, encode_waypoint};
use super::exporter::ExportObserver;
use super::policy::FormattingPolicy;
use super::record::{TrackMetadata, TrackPointRecord, WaypointRecord};

const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>";

const TAG_GPX: &str = concat!(
    "<gpx",
    " xmlns=\"http://www.topografix.com/GPX/1/1\"",
    " version=\"1.1\"",
    " creator=\"track2gpx\"",
    " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
    " xsi:schemaLocation=\"http://www.topografix.com/GPX/1/1",
    " http://www.topografix.com/GPX/1/1/gpx.xsd \">"
);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    NotStarted,
    HeaderWritten,
    /// Waypoints are written on this state too
    MetadataWritten,
    TrackOpen,
    WritingPoints,
    TrackClosed,
    DocumentClosed,
}

pub struct GpxDocumentWriter<'a, W>
where
    W: Write,
{
    out: W,
    policy: &'a FormattingPolicy,
    observer: &'a dyn ExportObserver,
    state: WriterState,
}

impl<'a, W> GpxDocumentWriter<'a, W>
where
    W: Write,
{
    pub fn new(out: W, policy: &'a FormattingPolicy, observer: &'a dyn ExportObserver) -> Self {
        Self {
            out,
            policy,
            observer,
            state: WriterState::NotStarted,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Write a whole document: metadata, waypoints and a single track
    /// segment with all the points, in the given order
    pub fn write_document(
        mut self,
        meta: &TrackMetadata,
        points: &[TrackPointRecord],
        waypoints: &[WaypointRecord],
    ) -> io::Result<W> {
        self.write_header()?;
        self.write_metadata(meta)?;
        self.write_waypoints(waypoints)?;
        self.open_track(meta)?;
        self.write_points(points)?;
        self.close_track()?;
        self.close()
    }

    pub fn write_header(&mut self) -> io::Result<()> {
        self.advance(WriterState::NotStarted, WriterState::HeaderWritten)?;

        write!(self.out, "{}\n{}\n", XML_HEADER, TAG_GPX)
    }

    /// `<metadata>` with the keywords and description, skipped when the
    /// track has none
    pub fn write_metadata(&mut self, meta: &TrackMetadata) -> io::Result<()> {
        self.advance(WriterState::HeaderWritten, WriterState::MetadataWritten)?;

        let tags = meta.tag_list();
        let description = meta.description();
        if tags.is_empty() && description.is_none() {
            return Ok(());
        }

        self.out.write_all(b"\t<metadata>\n")?;
        for tag in tags {
            writeln!(self.out, "\t\t<keywords>{}</keywords>", cdata(&tag))?;
        }
        if let Some(desc) = description {
            writeln!(self.out, "\t\t<desc>{}</desc>", cdata(desc))?;
        }
        self.out.write_all(b"\t</metadata>\n")
    }

    pub fn write_waypoints(&mut self, waypoints: &[WaypointRecord]) -> io::Result<()> {
        self.expect(WriterState::MetadataWritten)?;

        let mut progress = Progress::new(waypoints.len());
        for wpt in waypoints {
            self.out
                .write_all(encode_waypoint(wpt, self.policy).as_bytes())?;
            progress.written(self.observer);
        }

        Ok(())
    }

    /// `<trk>` header, up to the `<trkseg>` start
    pub fn open_track(&mut self, meta: &TrackMetadata) -> io::Result<()> {
        self.advance(WriterState::MetadataWritten, WriterState::TrackOpen)?;

        let name = match &meta.name {
            Some(name) if !name.trim().is_empty() => name.as_str(),
            _ => self.policy.labels.track_name.as_str(),
        };

        self.out.write_all(b"<trk>\n")?;
        writeln!(self.out, "<name>{}</name>", cdata(name))?;

        if let Some(tags) = meta.tags() {
            writeln!(self.out, "<extensions>\n<tags>{}</tags>\n</extensions>", cdata(tags))?;
        }

        if let Some(desc) = meta.description() {
            writeln!(self.out, "<desc>{}</desc>", cdata(desc))?;
        }

        if self.policy.fill_hdop {
            writeln!(
                self.out,
                "<cmt>{}</cmt>",
                cdata(&self.policy.labels.hdop_comment)
            )?;
        }

        self.out.write_all(b"<trkseg>\n")
    }

    pub fn write_points(&mut self, points: &[TrackPointRecord]) -> io::Result<()> {
        self.advance(WriterState::TrackOpen, WriterState::WritingPoints)?;

        let mut progress = Progress::new(points.len());
        for point in points {
            self.out
                .write_all(encode_track_point(point, self.policy).as_bytes())?;
            progress.written(self.observer);
        }

        Ok(())
    }

    pub fn close_track(&mut self) -> io::Result<()> {
        self.advance(WriterState::WritingPoints, WriterState::TrackClosed)?;

        self.out.write_all(b"</trkseg>\n</trk>\n")
    }

    /// End the document and flush the output
    pub fn close(mut self) -> io::Result<W> {
        self.advance(WriterState::TrackClosed, WriterState::DocumentClosed)?;

        self.out.write_all(b"</gpx>")?;
        self.out.flush()?;

        Ok(self.out)
    }

    fn expect(&self, expected: WriterState) -> io::Result<()> {
        if self.state != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "GPX writer is on state {:?}, expected {:?}",
                    self.state, expected
                ),
            ));
        }

        Ok(())
    }

    fn advance(&mut self, expected: WriterState, next: WriterState) -> io::Result<()> {
        self.expect(expected)?;
        self.state = next;

        Ok(())
    }
}

/// Progress of one record sequence, ticked every 1%
struct Progress {
    threshold: u64,
    written: u64,
}

impl Progress {
    fn new(total: usize) -> Self {
        let threshold = (total as u64 / 100).max(1);

        Self {
            threshold,
            written: 0,
        }
    }

    fn written(&mut self, observer: &dyn ExportObserver) {
        self.written += 1;
        if self.written % self.threshold == 0 {
            observer.on_progress_tick(self.threshold);
        }
    }
}
