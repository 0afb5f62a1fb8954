use regex::bytes::Regex;
use std::fmt;

/// Length of the `https://stitcher.io` host prefix stripped from every URL.
pub const DEFAULT_PREFIX_LEN: usize = 19;
/// Width of an ISO `YYYY-MM-DD` date.
pub const DEFAULT_DATE_WIDTH: usize = 10;
pub const DEFAULT_DELIMITER: u8 = b',';

/// Pulls the `(url, date)` pair out of one raw log line.
///
/// Returning `None` marks the line as malformed; the scanner skips it and
/// counts it, the worker keeps going.
pub trait FieldExtractor: Send + Sync + fmt::Debug {
    fn extract<'a>(&self, line: &'a [u8]) -> Option<(&'a [u8], &'a [u8])>;

    /// Rejects layouts that could never yield a usable date.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

pub fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// `<prefix><url><delimiter><date>...` with a fixed-length prefix and date.
#[derive(Debug, Clone)]
pub struct FixedOffsetExtractor {
    pub prefix_len: usize,
    pub delimiter: u8,
    pub date_width: usize,
}

impl Default for FixedOffsetExtractor {
    fn default() -> Self {
        FixedOffsetExtractor {
            prefix_len: DEFAULT_PREFIX_LEN,
            delimiter: DEFAULT_DELIMITER,
            date_width: DEFAULT_DATE_WIDTH,
        }
    }
}

impl FieldExtractor for FixedOffsetExtractor {
    fn validate(&self) -> Result<(), String> {
        if self.date_width == 0 {
            return Err("--date-width must be greater than 0".to_string());
        }
        Ok(())
    }

    fn extract<'a>(&self, line: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
        let line = trim_line_end(line);
        let rest = line.get(self.prefix_len..)?;
        let comma = rest.iter().position(|&b| b == self.delimiter)?;
        let url = &rest[..comma];
        let date = rest.get(comma + 1..comma + 1 + self.date_width)?;
        Some((url, date))
    }
}

/// Extracts fields with a regex carrying `url` and `date` named groups.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    pattern: Regex,
}

impl RegexExtractor {
    pub fn new(pattern: &str) -> Result<Self, String> {
        let pattern = Regex::new(pattern).map_err(|e| format!("Invalid pattern: {}", e))?;
        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        for required in ["url", "date"] {
            if !names.contains(&required) {
                return Err(format!("Pattern is missing the '{}' named group", required));
            }
        }
        Ok(RegexExtractor { pattern })
    }
}

impl FieldExtractor for RegexExtractor {
    fn extract<'a>(&self, line: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
        let captures = self.pattern.captures(trim_line_end(line))?;
        let url = captures.name("url")?.as_bytes();
        let date = captures.name("date")?.as_bytes();
        Some((url, date))
    }
}
