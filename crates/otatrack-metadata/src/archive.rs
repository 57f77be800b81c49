//! Streaming ZIP entry extraction
//!
//! Walks local file headers in download order and emits the uncompressed bytes of a
//! single named entry. The central directory at the end of the archive is never
//! needed, so the walker works on a forward-only stream. Entries before the target
//! are skipped by their declared compressed size; deflated entries whose sizes only
//! appear in a trailing data descriptor are inflated and discarded instead.

use flate2::{Decompress, FlushDecompress, Status};
use tracing::{debug, trace};

use crate::error::ExtractError;
use crate::stage::{Flow, Stage};

/// Entry holding the OTA build properties
pub const METADATA_ENTRY: &str = "META-INF/com/android/metadata";

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIRECTORY_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIRECTORY_SIG: u32 = 0x0605_4b50;
const ZIP64_END_OF_CENTRAL_DIRECTORY_SIG: u32 = 0x0606_4b50;
const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;

const LOCAL_HEADER_LEN: usize = 30;
const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;
const ZIP64_EXTRA_ID: u16 = 0x0001;
const ZIP64_MARKER: u32 = 0xffff_ffff;

const INFLATE_SCRATCH: usize = 16 * 1024;

#[derive(Debug, Clone)]
struct LocalHeader {
    flags: u16,
    method: u16,
    compressed_size: u64,
    uncompressed_size: u64,
    name_len: usize,
    extra_len: usize,
    zip64_extra: bool,
}

impl LocalHeader {
    fn parse(buf: &[u8]) -> Result<Self, ExtractError> {
        let field16 = |at| read_u16(buf, at).ok_or_else(|| truncated("local header"));
        let field32 = |at| read_u32(buf, at).ok_or_else(|| truncated("local header"));
        Ok(Self {
            flags: field16(6)?,
            method: field16(8)?,
            compressed_size: u64::from(field32(18)?),
            uncompressed_size: u64::from(field32(22)?),
            name_len: usize::from(field16(26)?),
            extra_len: usize::from(field16(28)?),
            zip64_extra: false,
        })
    }

    fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }

    /// Replace 32-bit size markers with the values from a ZIP64 extra field
    fn apply_zip64(&mut self, extra: &[u8]) {
        let mut rest = extra;
        while let (Some(id), Some(len)) = (read_u16(rest, 0), read_u16(rest, 2)) {
            let len = usize::from(len);
            let Some(data) = rest.get(4..4 + len) else {
                break;
            };
            if id == ZIP64_EXTRA_ID {
                self.zip64_extra = true;
                let mut offset = 0;
                let both = data.len() >= 16;
                if both || self.uncompressed_size == u64::from(ZIP64_MARKER) {
                    if let Some(size) = read_u64(data, offset) {
                        self.uncompressed_size = size;
                        offset += 8;
                    }
                }
                if both || self.compressed_size == u64::from(ZIP64_MARKER) {
                    if let Some(size) = read_u64(data, offset) {
                        self.compressed_size = size;
                    }
                }
                return;
            }
            rest = rest.get(4 + len..).unwrap_or_default();
        }
    }
}

#[derive(Debug)]
enum State {
    /// Collecting the fixed part of a local header
    Header,
    /// Collecting the file name and extra field
    Name(LocalHeader),
    /// Discarding an entry that is not the target
    Skip { remaining: u64, descriptor: Option<bool> },
    /// Inflating and discarding an entry of unknown compressed size
    Drain { inflater: Decompress, zip64: bool },
    /// Discarding a data descriptor after a skipped entry
    Descriptor { zip64: bool },
    /// Copying a stored target entry
    Stored { remaining: u64 },
    /// Inflating a deflated target entry
    Inflate {
        remaining: Option<u64>,
        inflater: Decompress,
    },
    /// Target emitted, or the archive holds no such entry
    Done,
}

/// Stage emitting the uncompressed contents of one ZIP entry
#[derive(Debug)]
pub struct ZipEntryStage {
    target: String,
    state: State,
    buffer: Vec<u8>,
    entries_skipped: usize,
}

impl ZipEntryStage {
    /// Extract the entry named `target`
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: State::Header,
            buffer: Vec::with_capacity(LOCAL_HEADER_LEN),
            entries_skipped: 0,
        }
    }

    /// Extract [`METADATA_ENTRY`]
    pub fn metadata() -> Self {
        Self::new(METADATA_ENTRY)
    }

    /// Number of entries passed over so far
    pub fn entries_skipped(&self) -> usize {
        self.entries_skipped
    }

    /// Move up to `want - buffer.len()` bytes from `input` into the buffer
    ///
    /// Returns whether the buffer now holds `want` bytes.
    fn fill(&mut self, input: &mut &[u8], want: usize) -> bool {
        let need = want.saturating_sub(self.buffer.len());
        let (head, tail) = input.split_at(need.min(input.len()));
        self.buffer.extend_from_slice(head);
        *input = tail;
        self.buffer.len() >= want
    }

    fn on_header(&mut self, input: &mut &[u8]) -> Result<Option<Flow>, ExtractError> {
        if !self.fill(input, 4) {
            return Ok(Some(Flow::Continue));
        }
        match read_u32(&self.buffer, 0) {
            Some(LOCAL_HEADER_SIG) => {}
            Some(
                CENTRAL_DIRECTORY_SIG
                | END_OF_CENTRAL_DIRECTORY_SIG
                | ZIP64_END_OF_CENTRAL_DIRECTORY_SIG,
            ) => {
                debug!(
                    entry = %self.target,
                    skipped = self.entries_skipped,
                    "reached central directory without finding entry"
                );
                self.state = State::Done;
                return Ok(Some(Flow::Done));
            }
            other => {
                return Err(ExtractError::Archive(format!(
                    "unexpected signature {:#010x}",
                    other.unwrap_or_default()
                )));
            }
        }
        if !self.fill(input, LOCAL_HEADER_LEN) {
            return Ok(Some(Flow::Continue));
        }
        let header = LocalHeader::parse(&self.buffer)?;
        self.buffer.clear();
        self.state = State::Name(header);
        Ok(None)
    }

    fn on_name(
        &mut self,
        mut header: LocalHeader,
        input: &mut &[u8],
    ) -> Result<Option<Flow>, ExtractError> {
        let want = header.name_len + header.extra_len;
        if !self.fill(input, want) {
            self.state = State::Name(header);
            return Ok(Some(Flow::Continue));
        }
        let (name, extra) = self.buffer.split_at(header.name_len.min(self.buffer.len()));
        header.apply_zip64(extra);
        let is_target = name == self.target.as_bytes();
        let name = String::from_utf8_lossy(name).into_owned();
        self.buffer.clear();

        let deferred_sizes = header.has_data_descriptor() && header.compressed_size == 0;
        if !is_target {
            if deferred_sizes {
                if header.method != METHOD_DEFLATE {
                    return Err(ExtractError::Archive(format!(
                        "cannot skip entry {name}: sizes are only in its data descriptor"
                    )));
                }
                trace!(entry = %name, "draining entry with deferred sizes");
                self.entries_skipped += 1;
                self.state = State::Drain {
                    inflater: Decompress::new(false),
                    zip64: header.zip64_extra,
                };
                return Ok(None);
            }
            trace!(entry = %name, bytes = header.compressed_size, "skipping entry");
            self.entries_skipped += 1;
            let zip64 = header.compressed_size > u64::from(u32::MAX)
                || header.uncompressed_size > u64::from(u32::MAX);
            self.state = State::Skip {
                remaining: header.compressed_size,
                descriptor: header.has_data_descriptor().then_some(zip64),
            };
            return Ok(None);
        }

        if header.flags & FLAG_ENCRYPTED != 0 {
            return Err(ExtractError::Archive(format!("entry {name} is encrypted")));
        }
        debug!(entry = %name, method = header.method, bytes = header.compressed_size, "found entry");
        self.state = match header.method {
            METHOD_STORED if deferred_sizes => {
                return Err(ExtractError::Archive(format!(
                    "stored entry {name} has no declared size"
                )));
            }
            METHOD_STORED => State::Stored {
                remaining: header.compressed_size,
            },
            METHOD_DEFLATE => State::Inflate {
                remaining: (!deferred_sizes).then_some(header.compressed_size),
                inflater: Decompress::new(false),
            },
            method => {
                return Err(ExtractError::Archive(format!(
                    "entry {name} uses unsupported compression method {method}"
                )));
            }
        };
        if matches!(self.state, State::Stored { remaining: 0 }) {
            self.state = State::Done;
            return Ok(Some(Flow::Done));
        }
        Ok(None)
    }

    fn on_descriptor(&mut self, zip64: bool, input: &mut &[u8]) -> Option<Flow> {
        if !self.fill(input, 4) {
            self.state = State::Descriptor { zip64 };
            return Some(Flow::Continue);
        }
        let sizes = if zip64 { 16 } else { 8 };
        // crc32 + sizes, with an optional leading signature
        let total = if read_u32(&self.buffer, 0) == Some(DATA_DESCRIPTOR_SIG) {
            8 + sizes
        } else {
            4 + sizes
        };
        if !self.fill(input, total) {
            self.state = State::Descriptor { zip64 };
            return Some(Flow::Continue);
        }
        self.buffer.clear();
        self.state = State::Header;
        None
    }
}

impl Stage for ZipEntryStage {
    fn push(&mut self, mut input: &[u8], out: &mut Vec<u8>) -> Result<Flow, ExtractError> {
        loop {
            let state = std::mem::replace(&mut self.state, State::Done);
            let flow = match state {
                State::Done => Some(Flow::Done),
                State::Header => {
                    self.state = State::Header;
                    if input.is_empty() {
                        Some(Flow::Continue)
                    } else {
                        self.on_header(&mut input)?
                    }
                }
                State::Name(header) => self.on_name(header, &mut input)?,
                State::Skip {
                    remaining,
                    descriptor,
                } => {
                    let take = usize::try_from(remaining)
                        .unwrap_or(usize::MAX)
                        .min(input.len());
                    input = input.split_at(take).1;
                    let remaining = remaining - take as u64;
                    if remaining > 0 {
                        self.state = State::Skip {
                            remaining,
                            descriptor,
                        };
                        Some(Flow::Continue)
                    } else {
                        self.state = match descriptor {
                            Some(zip64) => State::Descriptor { zip64 },
                            None => State::Header,
                        };
                        None
                    }
                }
                State::Drain {
                    mut inflater,
                    zip64,
                } => {
                    let mut discard = Vec::new();
                    let (consumed, finished) = inflate(&mut inflater, input, &mut discard)?;
                    input = input.get(consumed..).unwrap_or_default();
                    if finished {
                        self.state = State::Descriptor { zip64 };
                        None
                    } else if !input.is_empty() {
                        return Err(ExtractError::Archive(
                            "deflate stream of a skipped entry stalled".to_string(),
                        ));
                    } else {
                        self.state = State::Drain { inflater, zip64 };
                        Some(Flow::Continue)
                    }
                }
                State::Descriptor { zip64 } => self.on_descriptor(zip64, &mut input),
                State::Stored { remaining } => {
                    let take = usize::try_from(remaining)
                        .unwrap_or(usize::MAX)
                        .min(input.len());
                    let (head, tail) = input.split_at(take);
                    out.extend_from_slice(head);
                    input = tail;
                    let remaining = remaining - take as u64;
                    if remaining == 0 {
                        Some(Flow::Done)
                    } else {
                        self.state = State::Stored { remaining };
                        Some(Flow::Continue)
                    }
                }
                State::Inflate {
                    remaining,
                    mut inflater,
                } => {
                    let limit = remaining
                        .map_or(input.len(), |r| usize::try_from(r).unwrap_or(usize::MAX))
                        .min(input.len());
                    let (chunk, tail) = input.split_at(limit);
                    input = tail;
                    let (consumed, finished) = inflate(&mut inflater, chunk, out)?;
                    if finished {
                        Some(Flow::Done)
                    } else {
                        let remaining = remaining.map(|r| r - consumed as u64);
                        if remaining == Some(0) {
                            return Err(ExtractError::Archive(format!(
                                "deflate stream of {} ended early",
                                self.target
                            )));
                        }
                        self.state = State::Inflate {
                            remaining,
                            inflater,
                        };
                        Some(Flow::Continue)
                    }
                }
            };
            if let Some(flow) = flow {
                return Ok(flow);
            }
        }
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<(), ExtractError> {
        match &self.state {
            State::Header if self.buffer.is_empty() => {}
            State::Done => {}
            state => debug!(?state, entry = %self.target, "archive stream ended mid-entry"),
        }
        self.state = State::Done;
        Ok(())
    }
}

/// Inflate `chunk` completely, returning bytes consumed and whether the stream ended
fn inflate(
    inflater: &mut Decompress,
    chunk: &[u8],
    out: &mut Vec<u8>,
) -> Result<(usize, bool), ExtractError> {
    let mut scratch = vec![0u8; INFLATE_SCRATCH];
    let mut consumed = 0usize;
    loop {
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let pending = chunk.get(consumed..).unwrap_or_default();
        let status = inflater.decompress(pending, &mut scratch, FlushDecompress::None)?;
        let read = usize::try_from(inflater.total_in() - before_in).unwrap_or_default();
        let written = usize::try_from(inflater.total_out() - before_out).unwrap_or_default();
        consumed += read;
        out.extend_from_slice(scratch.get(..written).unwrap_or_default());

        if status == Status::StreamEnd {
            return Ok((consumed, true));
        }
        let drained = consumed >= chunk.len() && written < scratch.len();
        if drained || (read == 0 && written == 0) {
            return Ok((consumed, false));
        }
    }
}

fn truncated(what: &str) -> ExtractError {
    ExtractError::Archive(format!("truncated {what}"))
}

fn read_u16(buf: &[u8], at: usize) -> Option<u16> {
    let bytes = buf.get(at..at + 2)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u32(buf: &[u8], at: usize) -> Option<u32> {
    let bytes = buf.get(at..at + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

fn read_u64(buf: &[u8], at: usize) -> Option<u64> {
    let bytes = buf.get(at..at + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}
