//! Functionality related to extracting the physical location of a read on the
//! flowcell from its read name.
//!
//! Only Illumina 1.4 and 1.8 read names are understood by the default parser.
//! The expected convention is the following pattern, where `[]` denotes
//! optional sections of the name.
//!
//! `INSTRUMENT:[RUN:FLOWCELL:]LANE:TILE:X:Y`
//!
//! Other naming conventions can be supported through a
//! [`RegexLocationParser`] or by implementing [`PhysicalLocationParser`].

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use regex::Regex;

/// Where on the flowcell a cluster was imaged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalLocation {
    /// The tile of the flowcell lane.
    pub tile: i32,

    /// The X position of the cluster within the tile.
    pub x: i64,

    /// The Y position of the cluster within the tile.
    pub y: i64,
}

impl PhysicalLocation {
    /// Euclidean distance between two locations, in pixels.
    pub fn distance(&self, other: &PhysicalLocation) -> f64 {
        let dx = self.x.abs_diff(other.x) as f64;
        let dy = self.y.abs_diff(other.y) as f64;
        dx.hypot(dy)
    }
}

/// Something that can pull a [`PhysicalLocation`] out of a read name.
pub trait PhysicalLocationParser: fmt::Debug + Send + Sync {
    /// Returns `None` when the name carries no usable location.
    fn parse(&self, read_name: &str) -> Option<PhysicalLocation>;

    /// Whether locations are expected at all. A missing location is only an
    /// anomaly for parsers that expect one.
    fn expects_locations(&self) -> bool {
        true
    }
}

//=====================//
// Illumina read names //
//=====================//

/// An Illumina read name.
#[derive(Debug)]
pub struct IlluminaReadName {
    /// The name of the instrument that produced this read.
    pub instrument_name: String,

    /// The id of the run that produced this read, if Illumina 1.8 read names.
    pub run: Option<String>,

    /// The id of the flowcell that produced this read, if Illumina 1.8 read names.
    pub flowcell: Option<String>,

    /// The lane of the flowcell that produced this read.
    pub lane: String,

    /// The tile of the flowcell lane that produced this read.
    pub tile: i32,

    /// The X position of the flowcell well that produced this read.
    pub x: i64,

    /// The Y position of the flowcell well that produced this read.
    pub y: i64,
}

impl IlluminaReadName {
    /// The physical location encoded in the name.
    pub fn location(&self) -> PhysicalLocation {
        PhysicalLocation {
            tile: self.tile,
            x: self.x,
            y: self.y,
        }
    }
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {} in read name: {}", name, value))
}

impl FromStr for IlluminaReadName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(':').collect();

        let (instrument_name, run, flowcell, lane, rest) = match segments.len() {
            5 => (segments[0], None, None, segments[1], &segments[2..]),
            7 => (
                segments[0],
                Some(segments[1].to_string()),
                Some(segments[2].to_string()),
                segments[3],
                &segments[4..],
            ),
            _ => return Err(String::from("invalid number of segments for read name")),
        };

        Ok(IlluminaReadName {
            instrument_name: instrument_name.into(),
            run,
            flowcell,
            lane: lane.into(),
            tile: parse_field("tile", rest[0])?,
            x: parse_field("x", rest[1])?,
            y: parse_field("y", rest[2])?,
        })
    }
}

/// The default parser for colon delimited Illumina read names.
#[derive(Debug, Default, Clone, Copy)]
pub struct IlluminaLocationParser;

impl PhysicalLocationParser for IlluminaLocationParser {
    fn parse(&self, read_name: &str) -> Option<PhysicalLocation> {
        read_name
            .parse::<IlluminaReadName>()
            .ok()
            .map(|name| name.location())
    }
}

//=======================//
// Regex based locations //
//=======================//

/// Parses locations with a user supplied regular expression. The first three
/// capture groups must match the tile, X and Y coordinates respectively.
#[derive(Debug, Clone)]
pub struct RegexLocationParser {
    regex: Regex,
}

impl RegexLocationParser {
    /// Compiles the pattern and checks it captures at least three groups.
    pub fn new(pattern: &str) -> anyhow::Result<Self> {
        let regex = Regex::new(pattern)?;

        // The implicit whole-match group is counted by `captures_len`.
        if regex.captures_len() < 4 {
            bail!(
                "read name pattern must capture tile, x and y (found {} groups): {}",
                regex.captures_len() - 1,
                pattern
            );
        }

        Ok(Self { regex })
    }
}

impl PhysicalLocationParser for RegexLocationParser {
    fn parse(&self, read_name: &str) -> Option<PhysicalLocation> {
        let captures = self.regex.captures(read_name)?;

        Some(PhysicalLocation {
            tile: captures.get(1)?.as_str().parse().ok()?,
            x: captures.get(2)?.as_str().parse().ok()?,
            y: captures.get(3)?.as_str().parse().ok()?,
        })
    }
}

/// A parser that never finds a location, which turns off optical duplicate
/// detection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocationParser;

impl PhysicalLocationParser for NoLocationParser {
    fn parse(&self, _: &str) -> Option<PhysicalLocation> {
        None
    }

    fn expects_locations(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_parse_illumina_1_4_fmt() {
        let result = "MACHINE:0:1234:55555:66666".parse::<IlluminaReadName>();
        assert!(result.is_ok());

        let read_name = result.unwrap();
        assert_eq!(read_name.instrument_name, "MACHINE");
        assert_eq!(read_name.run, None);
        assert_eq!(read_name.flowcell, None);
        assert_eq!(read_name.lane, "0");
        assert_eq!(read_name.tile, 1234);
        assert_eq!(read_name.x, 55555);
        assert_eq!(read_name.y, 66666);
    }

    #[test]
    pub fn test_parse_illumina_1_8_fmt() {
        let result = "MACHINE:0:A0A00AAAA:0:1234:55555:66666".parse::<IlluminaReadName>();
        assert!(result.is_ok());

        let read_name = result.unwrap();
        assert_eq!(read_name.run, Some("0".into()));
        assert_eq!(read_name.flowcell, Some("A0A00AAAA".into()));
        assert_eq!(
            read_name.location(),
            PhysicalLocation {
                tile: 1234,
                x: 55555,
                y: 66666
            }
        );
    }

    #[test]
    pub fn test_parse_failure() {
        assert!("MACHINE:0:".parse::<IlluminaReadName>().is_err());
        assert!("MACHINE:0:tile:1:2".parse::<IlluminaReadName>().is_err());
        assert_eq!(IlluminaLocationParser.parse("read_1"), None);
    }

    #[test]
    pub fn test_regex_parser() {
        let parser = RegexLocationParser::new(r"^\w+_(\d+)_(\d+)_(\d+)$").unwrap();
        assert_eq!(
            parser.parse("read_7_10_20"),
            Some(PhysicalLocation {
                tile: 7,
                x: 10,
                y: 20
            })
        );
        assert_eq!(parser.parse("read_7_10"), None);
        assert!(RegexLocationParser::new(r"(\d+):(\d+)").is_err());
    }

    #[test]
    pub fn test_distance() {
        let a = PhysicalLocation { tile: 1, x: 0, y: 0 };
        let b = PhysicalLocation { tile: 1, x: 3, y: 4 };
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(NoLocationParser.parse("M:1:2:3:4"), None);
    }

    #[test]
    pub fn test_distance_between_extreme_coordinates() {
        let a = PhysicalLocation {
            tile: 1,
            x: i64::MIN,
            y: i64::MAX,
        };
        let b = PhysicalLocation {
            tile: 1,
            x: i64::MAX,
            y: i64::MIN,
        };
        assert!(a.distance(&b).is_finite());
        assert!(a.distance(&b) > 1e19);
        assert_eq!(a.distance(&a), 0.0);
    }
}
