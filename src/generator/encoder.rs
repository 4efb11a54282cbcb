//! GPX fragments of track points and waypoints
//!
//! Pure functions: the same record and policy always give the same bytes.
//! Absent optional values are omitted, never a failure. Floats are written on
//! their shortest round trip decimal form and coordinates are never rounded.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, Event};
use quick_xml::Writer;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

use super::policy::{AccuracyMode, CompassMode, FormattingPolicy, HDOP_APPROXIMATION_FACTOR};
use super::record::{Compass, TrackPointRecord, WaypointRecord};

/// `<trkpt>` element of a track point, one line
pub fn encode_track_point(rec: &TrackPointRecord, policy: &FormattingPolicy) -> String {
    let mut out = position_start("trkpt", rec.coordinates.y(), rec.coordinates.x());
    out.push_str(&elevation_and_time(rec.elevation, rec.time));

    if let Some(hdop) = hdop(rec.accuracy, policy) {
        out.push_str(&hdop);
    }

    if let (CompassMode::Comment, Some(compass)) = (policy.compass, rec.compass) {
        out.push_str(&comment(&format!(
            "compass: {} compAccuracy: {}",
            decimal(compass.heading),
            compass.accuracy_or_zero() as i64
        )));
    }

    out.push_str("<extensions>");
    out.push_str(&format!(
        "<accuracy>{}</accuracy>",
        decimal(rec.accuracy.unwrap_or(0.0))
    ));
    if let Some(speed) = rec.speed {
        out.push_str(&format!("<speed>{}</speed>", decimal(speed)));
    }
    if let (CompassMode::Extension, Some(compass)) = (policy.compass, rec.compass) {
        out.push_str(&format!(
            "<compass>{}</compass><compass_accuracy>{}</compass_accuracy>",
            decimal(compass.heading),
            decimal(compass.accuracy_or_zero())
        ));
    }
    // Always written, there is no setting for it yet
    out.push_str(&format!(
        "<pressure_hpa>{:.1}</pressure_hpa>",
        rec.pressure.unwrap_or(0.0)
    ));
    out.push_str("</extensions>");

    out.push_str("</trkpt>\n");
    out
}

/// `<wpt>` element of a waypoint, followed by a blank line
pub fn encode_waypoint(rec: &WaypointRecord, policy: &FormattingPolicy) -> String {
    let mut out = position_start("wpt", rec.coordinates.y(), rec.coordinates.x());
    out.push_str(&elevation_and_time(rec.elevation, rec.time));

    let compass_comment = match (policy.compass, rec.compass) {
        (CompassMode::Comment, Some(compass)) => Some(compass),
        _ => None,
    };

    match (&policy.accuracy, rec.accuracy) {
        (AccuracyMode::NameSuffix, Some(accuracy)) => {
            out.push_str(&name(&format!(
                "{} ({}{})",
                rec.name,
                decimal(accuracy),
                policy.labels.meter_unit
            )));
            if let Some(compass) = compass_comment {
                out.push_str(&compass_comment_text(compass));
            }
        }
        (AccuracyMode::CommentTag, Some(accuracy)) => {
            out.push_str(&name(&rec.name));
            let mut text = format!(
                "{}: {}{}",
                policy.labels.accuracy,
                decimal(accuracy),
                policy.labels.meter_unit
            );
            if let Some(compass) = compass_comment {
                text.push_str(&format!(
                    " compass heading: {}deg, compass accuracy: {}",
                    decimal(compass.heading),
                    decimal(compass.accuracy_or_zero())
                ));
            }
            out.push_str(&comment(&text));
        }
        (AccuracyMode::Unrecognized(_), Some(_)) => {
            out.push_str(&name(&rec.name));
        }
        // No accuracy requested, or none recorded
        _ => {
            out.push_str(&name(&rec.name));
            if let Some(compass) = compass_comment {
                out.push_str(&compass_comment_text(compass));
            }
        }
    }

    if let Some(link) = &rec.link {
        out.push_str(&format!(
            "<link href=\"{}\"><text>{}</text></link>",
            form_urlencode(link),
            partial_escape(link.as_str())
        ));
    }

    if let Some(sat) = rec.satellites {
        out.push_str(&format!("<sat>{}</sat>", sat));
    }

    if let Some(hdop) = hdop(rec.accuracy, policy) {
        out.push_str(&hdop);
    }

    if let (CompassMode::Extension, Some(compass)) = (policy.compass, rec.compass) {
        out.push_str(&format!(
            "<extensions><compass>{}</compass><compass_accuracy>{}</compass_accuracy></extensions>",
            decimal(compass.heading),
            compass.accuracy_or_zero() as i64
        ));
    }

    out.push_str("</wpt>\n\n");
    out
}

fn position_start(tag: &str, lat: f64, lon: f64) -> String {
    format!("<{} lat=\"{}\" lon=\"{}\">", tag, decimal(lat), decimal(lon))
}

fn elevation_and_time(elevation: Option<f64>, time: OffsetDateTime) -> String {
    let mut out = String::new();
    if let Some(ele) = elevation {
        out.push_str(&format!("<ele>{}</ele>", decimal(ele)));
    }
    out.push_str(&format!("<time>{}</time>", gpx_time(time)));
    out
}

fn hdop(accuracy: Option<f64>, policy: &FormattingPolicy) -> Option<String> {
    match accuracy {
        Some(acc) if policy.fill_hdop => Some(format!(
            "<hdop>{}</hdop>",
            decimal(acc / HDOP_APPROXIMATION_FACTOR)
        )),
        _ => None,
    }
}

fn compass_comment_text(compass: Compass) -> String {
    comment(&format!(
        "compass: {} compass accuracy: {}",
        decimal(compass.heading),
        compass.accuracy_or_zero() as i64
    ))
}

fn name(text: &str) -> String {
    format!("<name>{}</name>", cdata(text))
}

fn comment(text: &str) -> String {
    format!("<cmt>{}</cmt>", cdata(text))
}

/// `xsd:decimal` form of a float: no exponent, at least one fraction digit
pub fn decimal(value: f64) -> String {
    let s = value.to_string();
    if s.contains('.') || !value.is_finite() {
        s
    } else {
        s + ".0"
    }
}

/// Point time as `yyyy-MM-ddTHH:mm:ssZ`
pub fn gpx_time(time: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

    let time = time.to_offset(UtcOffset::UTC);
    match time.format(format) {
        Ok(s) => s,
        Err(_) => time.unix_timestamp().to_string(),
    }
}

/// Wrap a free text on CDATA sections, a `]]>` inside splits it on two
pub fn cdata(text: &str) -> String {
    let mut writer = Writer::new(Vec::with_capacity(text.len() + 12));
    for section in BytesCData::escaped(text) {
        // Writing on a Vec doesn't fail
        let _ = writer.write_event(Event::CData(section));
    }

    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}

/// `application/x-www-form-urlencoded` encoding of an URL
fn form_urlencode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for b in text.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'-' | b'*' | b'_' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use time::macros::datetime;

    use super::*;

    fn point() -> TrackPointRecord {
        let mut rec = TrackPointRecord::basic(
            Point::new(-48.8702222, -26.31832),
            datetime!(2021-05-24 0:05:30 UTC),
        );
        rec.elevation = Some(12.5);
        rec.accuracy = Some(10.0);
        rec.speed = Some(1.25);
        rec.compass = Some(Compass::new(180.5, Some(3.0)));
        rec.pressure = Some(1013.2);
        rec
    }

    fn waypoint() -> WaypointRecord {
        let mut rec = WaypointRecord::basic(
            Point::new(-48.8619776, -26.3185919),
            datetime!(2021-05-24 0:06 UTC),
            "Bridge".to_string(),
        );
        rec.accuracy = Some(8.0);
        rec.compass = Some(Compass::new(90.0, Some(2.0)));
        rec
    }

    #[test]
    fn track_point_default_policy() {
        let policy = FormattingPolicy::new();

        assert_eq!(
            "<trkpt lat=\"-26.31832\" lon=\"-48.8702222\"><ele>12.5</ele>\
             <time>2021-05-24T00:05:30Z</time><extensions><accuracy>10.0</accuracy>\
             <speed>1.25</speed><pressure_hpa>1013.2</pressure_hpa></extensions></trkpt>\n",
            encode_track_point(&point(), &policy)
        );
    }

    #[test]
    fn track_point_optional_fields() {
        let policy = FormattingPolicy::new().fill_hdop(true);
        let rec = TrackPointRecord::basic(Point::new(2.5, 1.0), datetime!(2021-05-24 0:00 UTC));

        let out = encode_track_point(&rec, &policy);
        assert_eq!(
            "<trkpt lat=\"1.0\" lon=\"2.5\"><time>2021-05-24T00:00:00Z</time>\
             <extensions><accuracy>0.0</accuracy><pressure_hpa>0.0</pressure_hpa>\
             </extensions></trkpt>\n",
            out
        );
    }

    #[test]
    fn track_point_elevation_round_trip() {
        let mut rec = point();
        rec.elevation = Some(1234.5678901234567);

        let out = encode_track_point(&rec, &FormattingPolicy::new());
        let start = out.find("<ele>").unwrap() + 5;
        let end = out.find("</ele>").unwrap();
        assert_eq!(Some(1234.5678901234567), out[start..end].parse::<f64>().ok());
    }

    #[test]
    fn track_point_full_precision() {
        let rec = TrackPointRecord::basic(
            Point::new(-48.870222212345678, -26.318321234567891),
            datetime!(2021-05-24 0:00 UTC),
        );

        let out = encode_track_point(&rec, &FormattingPolicy::new());
        assert!(out.starts_with(&format!(
            "<trkpt lat=\"{}\" lon=\"{}\">",
            -26.318321234567891f64, -48.870222212345678f64
        )));
    }

    #[test]
    fn small_values_without_exponent() {
        let mut rec = TrackPointRecord::basic(
            Point::new(0.00003, 51.4779),
            datetime!(2021-05-24 0:00 UTC),
        );
        rec.elevation = Some(0.00001);
        rec.accuracy = Some(0.00004);
        rec.speed = Some(1e-7);

        let out = encode_track_point(&rec, &FormattingPolicy::new().fill_hdop(true));
        assert!(out.starts_with("<trkpt lat=\"51.4779\" lon=\"0.00003\"><ele>0.00001</ele>"));
        assert!(out.contains("<hdop>0.00001</hdop>"));
        assert!(out.contains("<accuracy>0.00004</accuracy><speed>0.0000001</speed>"));
        assert!(!out.contains("e-") && !out.contains("E-"));

        let mut wpt = WaypointRecord::basic(
            Point::new(-0.00002, 0.00005),
            datetime!(2021-05-24 0:00 UTC),
            "Origin".to_string(),
        );
        wpt.accuracy = Some(0.00008);
        let policy = FormattingPolicy::new().accuracy(AccuracyMode::NameSuffix);
        assert!(encode_waypoint(&wpt, &policy).starts_with(
            "<wpt lat=\"0.00005\" lon=\"-0.00002\"><time>2021-05-24T00:00:00Z</time>\
             <name><![CDATA[Origin (0.00008m)]]></name>"
        ));
    }

    #[test]
    fn decimal_form() {
        assert_eq!("10.0", decimal(10.0));
        assert_eq!("-3.0", decimal(-3.0));
        assert_eq!("0.25", decimal(0.25));
        assert_eq!("100000000000000000000.0", decimal(1e20));
        assert_eq!("0.00003", decimal(3e-5));
    }

    #[test]
    fn track_point_hdop() {
        let out = encode_track_point(&point(), &FormattingPolicy::new().fill_hdop(true));
        assert!(out.contains("<time>2021-05-24T00:05:30Z</time><hdop>2.5</hdop><extensions>"));

        let out = encode_track_point(&point(), &FormattingPolicy::new().fill_hdop(false));
        assert!(!out.contains("<hdop>"));
    }

    #[test]
    fn track_point_compass_comment() {
        let policy = FormattingPolicy::new().compass(CompassMode::Comment);

        let out = encode_track_point(&point(), &policy);
        assert!(out.contains("<cmt><![CDATA[compass: 180.5 compAccuracy: 3]]></cmt><extensions>"));
        assert!(!out.contains("<compass>"));
    }

    #[test]
    fn track_point_compass_extension() {
        let policy = FormattingPolicy::new().compass(CompassMode::Extension);

        let out = encode_track_point(&point(), &policy);
        assert!(out.contains(
            "<speed>1.25</speed><compass>180.5</compass>\
             <compass_accuracy>3.0</compass_accuracy><pressure_hpa>"
        ));
        assert_eq!(1, out.matches("<compass>").count());
        assert_eq!(1, out.matches("<compass_accuracy>").count());
        assert!(!out.contains("<cmt>"));

        let mut rec = point();
        rec.compass = None;
        let out = encode_track_point(&rec, &policy);
        assert!(!out.contains("compass"));
    }

    #[test]
    fn waypoint_no_accuracy_mode() {
        let policy = FormattingPolicy::new();

        assert_eq!(
            "<wpt lat=\"-26.3185919\" lon=\"-48.8619776\"><time>2021-05-24T00:06:00Z</time>\
             <name><![CDATA[Bridge]]></name></wpt>\n\n",
            encode_waypoint(&waypoint(), &policy)
        );

        let policy = policy.compass(CompassMode::Comment);
        assert!(encode_waypoint(&waypoint(), &policy).contains(
            "<name><![CDATA[Bridge]]></name>\
             <cmt><![CDATA[compass: 90.0 compass accuracy: 2]]></cmt></wpt>"
        ));
    }

    #[test]
    fn waypoint_name_suffix() {
        let policy = FormattingPolicy::new().accuracy(AccuracyMode::NameSuffix);

        let out = encode_waypoint(&waypoint(), &policy);
        assert!(out.contains("<name><![CDATA[Bridge (8.0m)]]></name></wpt>"));

        let policy = policy.compass(CompassMode::Comment);
        let out = encode_waypoint(&waypoint(), &policy);
        assert!(out.contains(
            "<name><![CDATA[Bridge (8.0m)]]></name>\
             <cmt><![CDATA[compass: 90.0 compass accuracy: 2]]></cmt>"
        ));
    }

    #[test]
    fn waypoint_comment_tag() {
        let policy = FormattingPolicy::new().accuracy(AccuracyMode::CommentTag);

        let out = encode_waypoint(&waypoint(), &policy);
        assert!(out.contains(
            "<name><![CDATA[Bridge]]></name><cmt><![CDATA[Accuracy: 8.0m]]></cmt>"
        ));

        let policy = policy.compass(CompassMode::Comment);
        let out = encode_waypoint(&waypoint(), &policy);
        assert!(out.contains(
            "<cmt><![CDATA[Accuracy: 8.0m compass heading: 90.0deg, compass accuracy: 2.0]]></cmt>"
        ));
        assert_eq!(1, out.matches("<cmt>").count());
    }

    #[test]
    fn waypoint_accuracy_mode_without_accuracy() {
        let mut rec = waypoint();
        rec.accuracy = None;

        for mode in [AccuracyMode::NameSuffix, AccuracyMode::CommentTag] {
            let policy = FormattingPolicy::new()
                .accuracy(mode)
                .compass(CompassMode::Comment);
            let out = encode_waypoint(&rec, &policy);
            assert!(out.contains(
                "<name><![CDATA[Bridge]]></name>\
                 <cmt><![CDATA[compass: 90.0 compass accuracy: 2]]></cmt>"
            ));
        }
    }

    #[test]
    fn waypoint_unrecognized_accuracy_mode() {
        let policy = FormattingPolicy::new()
            .accuracy(AccuracyMode::Unrecognized("wpt_both".to_string()))
            .compass(CompassMode::Comment);

        let out = encode_waypoint(&waypoint(), &policy);
        assert!(out.contains("<name><![CDATA[Bridge]]></name></wpt>"));
        assert!(!out.contains("<cmt>"));
    }

    #[test]
    fn waypoint_single_name() {
        let modes = [
            AccuracyMode::None,
            AccuracyMode::NameSuffix,
            AccuracyMode::CommentTag,
            AccuracyMode::Unrecognized("x".to_string()),
        ];
        for mode in modes {
            let policy = FormattingPolicy::new().accuracy(mode);
            let out = encode_waypoint(&waypoint(), &policy);
            assert_eq!(1, out.matches("<name>").count());
        }
    }

    #[test]
    fn waypoint_link_sat_hdop_extension() {
        let mut rec = waypoint();
        rec.name = "".to_string();
        rec.link = Some("photos/a b&c.jpg".to_string());
        rec.satellites = Some(7);

        let policy = FormattingPolicy::new()
            .fill_hdop(true)
            .compass(CompassMode::Extension);

        assert_eq!(
            "<wpt lat=\"-26.3185919\" lon=\"-48.8619776\"><time>2021-05-24T00:06:00Z</time>\
             <name><![CDATA[]]></name>\
             <link href=\"photos%2Fa+b%26c.jpg\"><text>photos/a b&amp;c.jpg</text></link>\
             <sat>7</sat><hdop>2.0</hdop>\
             <extensions><compass>90.0</compass><compass_accuracy>2</compass_accuracy>\
             </extensions></wpt>\n\n",
            encode_waypoint(&rec, &policy)
        );
    }

    #[test]
    fn waypoint_never_writes_point_extensions() {
        let mut rec = waypoint();
        rec.compass = None;

        let policy = FormattingPolicy::new().compass(CompassMode::Extension);
        let out = encode_waypoint(&rec, &policy);
        assert!(!out.contains("<extensions>"));
        assert!(!out.contains("<accuracy>"));
    }

    #[test]
    fn idempotent() {
        let policy = FormattingPolicy::new()
            .accuracy(AccuracyMode::CommentTag)
            .fill_hdop(true)
            .compass(CompassMode::Comment);

        assert_eq!(
            encode_track_point(&point(), &policy),
            encode_track_point(&point(), &policy)
        );
        assert_eq!(
            encode_waypoint(&waypoint(), &policy),
            encode_waypoint(&waypoint(), &policy)
        );
    }

    #[test]
    fn cdata_markup() {
        assert_eq!("<![CDATA[<b>&</b>]]>", cdata("<b>&</b>"));
        assert_eq!("<![CDATA[a]]]]><![CDATA[>b]]>", cdata("a]]>b"));
        assert_eq!("<![CDATA[]]>", cdata(""));
    }

    #[test]
    fn link_text_escaped() {
        let mut rec = waypoint();
        rec.link = Some("<a href='x'>\"1\" & ]]></a>".to_string());

        let out = encode_waypoint(&rec, &FormattingPolicy::new());
        assert!(out.contains(
            "<text>&lt;a href='x'&gt;\"1\" &amp; ]]&gt;&lt;/a&gt;</text></link>"
        ));
    }

    #[test]
    fn url_encoding() {
        assert_eq!("abc.-*_", form_urlencode("abc.-*_"));
        assert_eq!(
            "http%3A%2F%2Fx.org%2F%3Fq%3D1",
            form_urlencode("http://x.org/?q=1")
        );
        assert_eq!("%C3%A9+x", form_urlencode("é x"));
    }

    #[test]
    fn time_in_utc() {
        assert_eq!("2021-05-24T00:05:30Z", gpx_time(datetime!(2021-05-24 3:05:30 +3)));
    }
}
