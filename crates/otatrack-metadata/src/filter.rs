//! Line filter stage

use crate::error::ExtractError;
use crate::stage::{Flow, Stage};

/// Metadata keys the extractor asks for
pub const METADATA_KEYS: [&str; 5] = [
    "post-build=",
    "post-build-incremental=",
    "post-security-patch-level=",
    "post-timestamp=",
    "post-sdk-level=",
];

/// Longest line held while waiting for its newline
const MAX_LINE_LEN: usize = 64 * 1024;

/// Stage passing through lines that start with one of a set of prefixes
///
/// Stops once `ceiling` lines have matched.
#[derive(Debug)]
pub struct LineFilterStage {
    prefixes: Vec<String>,
    ceiling: usize,
    matched: usize,
    partial: Vec<u8>,
    discarding: bool,
}

impl LineFilterStage {
    /// Filter for `prefixes`, stopping after `ceiling` matches
    pub fn new<I, S>(prefixes: I, ceiling: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            ceiling,
            matched: 0,
            partial: Vec::new(),
            discarding: false,
        }
    }

    /// Filter for [`METADATA_KEYS`], one match per key
    pub fn metadata_keys() -> Self {
        Self::new(METADATA_KEYS, METADATA_KEYS.len())
    }

    /// Lines matched so far
    pub fn matched(&self) -> usize {
        self.matched
    }

    fn consider(&mut self, line: &[u8], out: &mut Vec<u8>) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if self
            .prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_bytes()))
        {
            out.extend_from_slice(line);
            out.push(b'\n');
            self.matched += 1;
        }
    }
}

impl Stage for LineFilterStage {
    fn push(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<Flow, ExtractError> {
        if self.matched >= self.ceiling {
            return Ok(Flow::Done);
        }
        for segment in input.split_inclusive(|byte| *byte == b'\n') {
            let Some(body) = segment.strip_suffix(b"\n") else {
                self.partial.extend_from_slice(segment);
                if self.partial.len() > MAX_LINE_LEN {
                    self.partial.clear();
                    self.discarding = true;
                }
                continue;
            };
            if self.discarding {
                self.discarding = false;
                self.partial.clear();
                continue;
            }
            if self.partial.is_empty() {
                self.consider(body, out);
            } else {
                let mut line = std::mem::take(&mut self.partial);
                line.extend_from_slice(body);
                self.consider(&line, out);
            }
            if self.matched >= self.ceiling {
                return Ok(Flow::Done);
            }
        }
        Ok(Flow::Continue)
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), ExtractError> {
        if !self.discarding && !self.partial.is_empty() && self.matched < self.ceiling {
            let line = std::mem::take(&mut self.partial);
            self.consider(&line, out);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_wanted_lines() -> Result<(), ExtractError> {
        let mut filter = LineFilterStage::metadata_keys();
        let mut out = Vec::new();
        let input = b"ota-type=AB\npost-build=a/b:14/X/1:user/release-keys\r\npre-device=x\npost-sdk-level=34\n";
        assert_eq!(filter.push(input, &mut out)?, Flow::Continue);
        assert_eq!(
            out,
            b"post-build=a/b:14/X/1:user/release-keys\npost-sdk-level=34\n"
        );
        assert_eq!(filter.matched(), 2);
        Ok(())
    }

    #[test]
    fn lines_split_across_chunks() -> Result<(), ExtractError> {
        let mut filter = LineFilterStage::metadata_keys();
        let mut out = Vec::new();
        filter.push(b"post-tim", &mut out)?;
        filter.push(b"estamp=1700000000\npost-security", &mut out)?;
        filter.push(b"-patch-level=2024-01-05", &mut out)?;
        filter.finish(&mut out)?;
        assert_eq!(
            out,
            b"post-timestamp=1700000000\npost-security-patch-level=2024-01-05\n"
        );
        Ok(())
    }

    #[test]
    fn ceiling_stops_early() -> Result<(), ExtractError> {
        let mut filter = LineFilterStage::new(["k="], 2);
        let mut out = Vec::new();
        assert_eq!(filter.push(b"k=1\nk=2\nk=3\n", &mut out)?, Flow::Done);
        assert_eq!(out, b"k=1\nk=2\n");
        assert_eq!(filter.push(b"k=4\n", &mut out)?, Flow::Done);
        Ok(())
    }

    #[test]
    fn similar_prefix_is_not_confused() -> Result<(), ExtractError> {
        let mut filter = LineFilterStage::new(["post-build="], 5);
        let mut out = Vec::new();
        filter.push(b"post-build-incremental=1\npost-build=fp\n", &mut out)?;
        assert_eq!(out, b"post-build=fp\n");
        Ok(())
    }
}
