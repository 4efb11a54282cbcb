//! GPX filename builder

use time::{macros::format_description, OffsetDateTime, UtcOffset};

use super::policy::FilenamePolicy;
use super::record::TrackMetadata;

pub const GPX_EXTENSION: &str = ".gpx";

/// Characters replaced by `_` on the track name
const FILENAME_BLACKLIST: [char; 11] = [' ', '\'', '"', '/', '\\', '*', '?', '~', '@', '<', '>'];

/// Build the GPX filename of a track, without path.
///
/// Made of the sanitized track name and/or the start date, depending on the
/// policy. Falls back to the date alone when the track has no usable name.
pub fn build_filename(meta: &TrackMetadata, policy: FilenamePolicy) -> String {
    let mut base = String::new();

    if policy != FilenamePolicy::Date {
        if let Some(name) = &meta.name {
            base.push_str(&sanitize(name));
        }
    }

    if base.is_empty() || policy != FilenamePolicy::Name {
        if !base.is_empty() {
            base.push('_');
        }
        base.push_str(&filename_date(meta.start));
    }

    base.push_str(GPX_EXTENSION);
    base
}

/// `:` becomes `;`, blacklisted chars become `_`
fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ':' => ';',
            c if FILENAME_BLACKLIST.contains(&c) => '_',
            c => c,
        })
        .collect()
}

/// Start date as `yyyy-MM-dd_HH-mm-ss`, UTC
pub fn filename_date(start: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");

    let start = start.to_offset(UtcOffset::UTC);
    match start.format(format) {
        Ok(s) => s,
        Err(_) => start.unix_timestamp().to_string(),
    }
}
