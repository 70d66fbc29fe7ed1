use crate::sensor_interface::reading::{QueuedLine, Reading};
use std::str::FromStr;

/// Field separator on the wire.
pub const FIELD_DELIMITER: char = ',';
/// Number of fields carried by a detection frame.
pub const FRAME_WIDTH: usize = 7;
/// Presence tag marking a frame that carries a target.
pub const DETECTION_TAG: &str = "1";

const DISTANCE_FIELD: usize = 1;
const ENERGY_FIELD: usize = 3;
const AZIMUTH_FIELD: usize = 6;

/// Reasons a line does not yield a [`Reading`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FrameRejection {
    /// Full-width frame whose tag is not the detection tag.
    #[error("frame tagged {tag:?} carries no detection")]
    NoTarget { tag: String },
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field {field} is not numeric: {value:?}")]
    InvalidNumber { field: usize, value: String },
    #[error("field {field} out of range: {value:?}")]
    OutOfRange { field: usize, value: String },
}

impl FrameRejection {
    /// True for lines that are noise rather than an explicit negative frame.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, FrameRejection::NoTarget { .. })
    }
}

/// Stateless parser for the comma-separated sensor wire format.
///
/// `[tag, distance, _, energy, _, _, azimuth]`
pub struct FrameParser;

impl FrameParser {
    pub fn parse(line: &str, observed_at: f64) -> Result<Reading, FrameRejection> {
        let fields: Vec<&str> = line
            .trim()
            .split(FIELD_DELIMITER)
            .map(str::trim)
            .collect();

        if fields.len() != FRAME_WIDTH {
            return Err(FrameRejection::FieldCount {
                expected: FRAME_WIDTH,
                found: fields.len(),
            });
        }
        if fields[0] != DETECTION_TAG {
            return Err(FrameRejection::NoTarget {
                tag: fields[0].to_string(),
            });
        }

        let distance: f32 = numeric_field(&fields, DISTANCE_FIELD)?;
        if !distance.is_finite() || distance < 0.0 {
            return Err(out_of_range(&fields, DISTANCE_FIELD));
        }
        let energy: u32 = numeric_field(&fields, ENERGY_FIELD)?;
        let azimuth: f32 = numeric_field(&fields, AZIMUTH_FIELD)?;
        if !azimuth.is_finite() {
            return Err(out_of_range(&fields, AZIMUTH_FIELD));
        }

        Ok(Reading::new(distance, energy, azimuth, observed_at))
    }

    pub fn parse_queued(line: &QueuedLine) -> Result<Reading, FrameRejection> {
        Self::parse(&line.text, line.received_at)
    }
}

fn numeric_field<T: FromStr>(fields: &[&str], index: usize) -> Result<T, FrameRejection> {
    fields[index]
        .parse::<T>()
        .map_err(|_| FrameRejection::InvalidNumber {
            field: index,
            value: fields[index].to_string(),
        })
}

fn out_of_range(fields: &[&str], index: usize) -> FrameRejection {
    FrameRejection::OutOfRange {
        field: index,
        value: fields[index].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detection_frame() {
        let reading = FrameParser::parse("1,3.5,99,120,7,8,45.0", 1.25).unwrap();
        assert_eq!(reading.distance_meters, 3.5);
        assert_eq!(reading.energy, 120);
        assert_eq!(reading.azimuth_degrees, 45.0);
        assert_eq!(reading.observed_at, 1.25);
    }

    #[test]
    fn tolerates_line_terminators_and_padding() {
        let reading = FrameParser::parse(" 1, 2.0 ,0,50,0,0,10.0\r\n", 0.0).unwrap();
        assert_eq!(reading.distance_meters, 2.0);
        assert_eq!(reading.energy, 50);
    }

    #[test]
    fn no_target_frames_are_not_malformed() {
        let rejection = FrameParser::parse("0,0,0,0,0,0,0", 0.0).unwrap_err();
        assert_eq!(
            rejection,
            FrameRejection::NoTarget {
                tag: "0".to_string()
            }
        );
        assert!(!rejection.is_malformed());
    }

    #[test]
    fn rejects_malformed_lines_without_panicking() {
        let cases = [
            "",
            ",",
            "1",
            "1,3.5,99,120,7,8",
            "1,3.5,99,120,7,8,45.0,extra",
            "1,abc,99,120,7,8,45.0",
            "1,3.5,99,12.5,7,8,45.0",
            "1,3.5,99,-4,7,8,45.0",
            "1,3.5,99,120,7,8,north",
            "1,-3.5,99,120,7,8,45.0",
            "1,NaN,99,120,7,8,45.0",
            "1,3.5,99,120,7,8,inf",
            "yes,3.5,99,120,7,8,45.0",
            "\u{fffd}\u{fffd},,",
        ];
        for line in cases {
            assert!(
                FrameParser::parse(line, 0.0).is_err(),
                "line {:?} should be rejected",
                line
            );
        }
    }

    #[test]
    fn blank_and_short_lines_count_as_malformed() {
        for (line, found) in [("", 1), (",", 2), ("\r\n", 1), ("garbage", 1), ("0,0", 2)] {
            let rejection = FrameParser::parse(line, 0.0).unwrap_err();
            assert_eq!(
                rejection,
                FrameRejection::FieldCount {
                    expected: FRAME_WIDTH,
                    found
                },
                "line {:?}",
                line
            );
            assert!(rejection.is_malformed());
        }
    }

    #[test]
    fn reports_offending_field() {
        let rejection = FrameParser::parse("1,3.5,99,lots,7,8,45.0", 0.0).unwrap_err();
        assert_eq!(
            rejection,
            FrameRejection::InvalidNumber {
                field: 3,
                value: "lots".to_string()
            }
        );
        assert!(rejection.is_malformed());

        let rejection = FrameParser::parse("1,3.5", 0.0).unwrap_err();
        assert_eq!(
            rejection,
            FrameRejection::FieldCount {
                expected: 7,
                found: 2
            }
        );
    }

    #[test]
    fn queued_line_carries_capture_time() {
        let line = QueuedLine::new("1,2.0,0,50,0,0,10.0", 7.5);
        let reading = FrameParser::parse_queued(&line).unwrap();
        assert_eq!(reading.observed_at, 7.5);
    }
}
