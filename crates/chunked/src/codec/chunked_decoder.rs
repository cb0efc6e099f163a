//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! This module provides an incremental decoder for bodies that use chunked transfer
//! encoding as specified in [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Bytes may arrive in slices of any size: a single slice can hold several chunks,
//! and a single chunk can be spread over many slices. The decoder keeps whatever it
//! could not resolve yet and resumes from exactly that point on the next call.
//! Chunks are always yielded whole, in the order the peer encoded them.
//!
//! Two ways of driving it are offered:
//! - push: [`ChunkedDecoder::feed`] appends raw bytes to the decoder's own residue
//!   buffer and returns an iterator over the items that became complete, followed
//!   by [`ChunkedDecoder::finish`] once the transport is closed;
//! - pull: the [`Decoder`] impl works on the caller's buffer, which makes it usable
//!   with `tokio_util::codec::FramedRead`.

use crate::codec::grammar::{self, CRLF};
use crate::ensure;
use crate::protocol::{DecodeError, DecodePhase, ParseError, PayloadItem};
use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};
use ChunkedState::*;

/// Default limit for a single size line or trailer line, CRLF excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 4 * 1024;

/// Limits applied while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    max_line_len: usize,
    max_chunk_size: Option<u64>,
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self { max_line_len: DEFAULT_MAX_LINE_LEN, max_chunk_size: None }
    }

    /// Sets the longest size or trailer line accepted, CRLF excluded.
    pub fn max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Sets the largest chunk size accepted. Unlimited by default.
    pub fn max_chunk_size(mut self, max_chunk_size: u64) -> Self {
        self.max_chunk_size = Some(max_chunk_size);
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A decoder for HTTP chunked transfer encoding.
///
/// The decoder processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk, optional trailers and an empty line end the body
///
/// Once the body is complete, further input is discarded. Once an error is raised,
/// every later call reports that same error.
#[derive(Debug, Clone)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    config: DecoderConfig,
    /// data of the chunk currently being received
    chunk: BytesMut,
    /// bytes handed to `feed` and not resolved yet
    residue: BytesMut,
    /// length of the pending line prefix already searched for LF
    scanned: usize,
    consumed: u64,
    discarded: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChunkedState {
    /// Read the size line
    Size,
    /// Read chunk data
    Body { remaining: u64 },
    /// Read CRLF after chunk data
    BodyCrlf,
    /// Drain trailer fields up to the final empty line
    Trailer,
    /// The last chunk and its trailer section are consumed
    End,
    Failed(DecodeError),
}

impl ChunkedDecoder {
    /// Creates a new ChunkedDecoder with the default limits.
    ///
    /// The decoder starts in the size state, ready to read the size of the first chunk.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            state: Size,
            config,
            chunk: BytesMut::new(),
            residue: BytesMut::new(),
            scanned: 0,
            consumed: 0,
            discarded: 0,
        }
    }

    pub fn phase(&self) -> DecodePhase {
        match &self.state {
            Size => DecodePhase::AwaitingSizeLine,
            Body { remaining } => DecodePhase::AwaitingChunkData { remaining: *remaining },
            BodyCrlf => DecodePhase::AwaitingChunkCrlf,
            Trailer => DecodePhase::AwaitingTrailingCrlf,
            End => DecodePhase::Done,
            Failed(_) => DecodePhase::Failed,
        }
    }

    /// Returns true once the terminal frame has been fully consumed.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.state == End
    }

    /// Bytes consumed from the stream so far, framing included.
    #[inline]
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Bytes received after the end of the body and thrown away.
    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Number of bytes held in the residue buffer of the push API.
    #[inline]
    pub fn residue_len(&self) -> usize {
        self.residue.len()
    }

    /// Appends `bytes` to the residue and returns the items that can be decoded now.
    ///
    /// The returned iterator is lazy: items that are not pulled stay in the residue
    /// and come out of the next `feed`. It yields at most one error, after which the
    /// decoder is failed and every later `feed` yields that error again.
    pub fn feed(&mut self, bytes: &[u8]) -> Feed<'_> {
        match self.state {
            End => {
                if !bytes.is_empty() {
                    trace!(len = bytes.len(), "discard bytes fed after the last chunk");
                    self.discarded += bytes.len() as u64;
                }
            }
            Failed(_) => {}
            _ => self.residue.extend_from_slice(bytes),
        }

        Feed { decoder: self, errored: false }
    }

    /// Reports that the transport was closed.
    ///
    /// Items a lazy `feed` left in the residue come out first, one per call, so keep
    /// calling until `Ok(None)`: that is a body that ended cleanly. Closing before the
    /// terminal frame is complete fails the decoder with [`DecodeError::TruncatedStream`].
    pub fn finish(&mut self) -> Result<Option<PayloadItem>, DecodeError> {
        if let Some(item) = self.decode_residue()? {
            return Ok(Some(item));
        }

        match &self.state {
            End => Ok(None),
            Failed(e) => Err(e.clone()),
            _ => {
                let error = DecodeError::truncated_stream(self.phase(), self.consumed);
                Err(self.fail(error))
            }
        }
    }

    /// The error the decoder failed with, if any.
    #[inline]
    pub fn error(&self) -> Option<&DecodeError> {
        match &self.state {
            Failed(e) => Some(e),
            _ => None,
        }
    }

    fn decode_residue(&mut self) -> Result<Option<PayloadItem>, DecodeError> {
        let mut residue = std::mem::take(&mut self.residue);
        let result = self.decode_from(&mut residue);
        self.residue = residue;
        result
    }

    /// Runs the state machine over `src` until an item is complete or `src` is exhausted.
    fn decode_from(&mut self, src: &mut BytesMut) -> Result<Option<PayloadItem>, DecodeError> {
        loop {
            match &self.state {
                End => {
                    if !src.is_empty() {
                        trace!(len = src.len(), "discard bytes after the last chunk");
                        self.discarded += src.len() as u64;
                        src.clear();
                    }
                    return Ok(None);
                }

                Failed(e) => return Err(e.clone()),

                Size => {
                    let line = match self.take_line(src) {
                        Ok(Some(line)) => line,
                        Ok(None) => return Ok(None),
                        Err(reason) => {
                            let error = DecodeError::malformed_chunk_size(reason, self.consumed);
                            return Err(self.fail(error));
                        }
                    };

                    let size = match grammar::parse_size_line(&line) {
                        Ok(size) => size,
                        Err(reason) => {
                            let reason = format!("{reason}: {:?}", String::from_utf8_lossy(&line));
                            let error = DecodeError::malformed_chunk_size(reason, self.consumed);
                            return Err(self.fail(error));
                        }
                    };

                    if let Some(limit) = self.config.max_chunk_size {
                        if size > limit {
                            let error = DecodeError::chunk_too_large(size, limit, self.consumed);
                            return Err(self.fail(error));
                        }
                    }

                    trace!(size, "read chunk size");
                    self.state = if size == 0 { Trailer } else { Body { remaining: size } };
                }

                Body { remaining } => {
                    let remaining = *remaining;
                    if src.is_empty() {
                        return Ok(None);
                    }

                    // cap remaining bytes at the max capacity of usize
                    let read_size = usize::try_from(remaining).map_or(src.len(), |r| r.min(src.len()));

                    self.chunk.unsplit(src.split_to(read_size));
                    self.consumed += read_size as u64;

                    let remaining = remaining - read_size as u64;
                    self.state = if remaining == 0 { BodyCrlf } else { Body { remaining } };
                }

                BodyCrlf => {
                    let available = src.len().min(CRLF.len());
                    if src[..available] != CRLF[..available] {
                        let error = DecodeError::malformed_chunk_data("missing CRLF after chunk data", self.consumed);
                        return Err(self.fail(error));
                    }

                    if available < CRLF.len() {
                        return Ok(None);
                    }

                    src.advance(CRLF.len());
                    self.consumed += CRLF.len() as u64;
                    self.state = Size;

                    let bytes = self.chunk.split().freeze();
                    trace!(len = bytes.len(), "read chunk");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                Trailer => {
                    let line = match self.take_line(src) {
                        Ok(Some(line)) => line,
                        Ok(None) => return Ok(None),
                        Err(reason) => {
                            let error = DecodeError::malformed_trailer(reason, self.consumed);
                            return Err(self.fail(error));
                        }
                    };

                    if line.is_empty() {
                        trace!(consumed = self.consumed, "finished reading chunked data");
                        self.state = End;
                        return Ok(Some(PayloadItem::Eof));
                    }

                    trace!(len = line.len(), "discard trailer field");
                }
            }
        }
    }

    /// Splits one CRLF terminated line off the front of `src`, CRLF stripped.
    ///
    /// Returns `Ok(None)` when the line is not complete yet.
    fn take_line(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, &'static str> {
        let max_line_len = self.config.max_line_len;

        let Some(lf) = grammar::find_lf(src, self.scanned) else {
            // a pending CR may still turn out to be part of the line end
            ensure!(src.len() <= max_line_len.saturating_add(1), "line too long");
            self.scanned = src.len();
            return Ok(None);
        };

        self.scanned = 0;
        ensure!(lf > 0 && src[lf - 1] == b'\r', "line ends with a bare LF");
        ensure!(lf - 1 <= max_line_len, "line too long");

        let mut line = src.split_to(lf + 1);
        self.consumed += (lf + 1) as u64;
        line.truncate(lf - 1);
        Ok(Some(line))
    }

    fn fail(&mut self, error: DecodeError) -> DecodeError {
        debug!(cause = %error, "chunked decoding failed");
        self.state = Failed(error.clone());
        error
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    /// Decodes chunked transfer encoded data from the input buffer.
    ///
    /// # Returns
    /// - `Ok(Some(PayloadItem::Chunk(bytes)))` when a whole chunk is decoded
    /// - `Ok(Some(PayloadItem::Eof))` once, when the terminal frame is complete
    /// - `Ok(None)` when more data is needed, or the body is already complete
    /// - `Err(ParseError)` if the chunked encoding is invalid
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.decode_from(src)?)
    }

    /// Decodes what is left once the transport reached end of stream.
    ///
    /// Anything short of a complete terminal frame is reported as a truncated stream.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(item) = self.decode_from(src)? {
            return Ok(Some(item));
        }

        Ok(self.finish()?)
    }
}

/// Iterator over the items completed by one [`ChunkedDecoder::feed`] call.
#[derive(Debug)]
pub struct Feed<'a> {
    decoder: &'a mut ChunkedDecoder,
    errored: bool,
}

impl Iterator for Feed<'_> {
    type Item = Result<PayloadItem, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }

        match self.decoder.decode_residue() {
            Ok(item) => item.map(Ok),
            Err(e) => {
                self.errored = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const HI_BYE: &[u8] = b"2\r\nhi\r\n3\r\nbye\r\n0\r\n\r\n";

    fn chunk(data: &'static [u8]) -> PayloadItem {
        PayloadItem::Chunk(Bytes::from_static(data))
    }

    /// Feeds `slices` one after another, collecting every item and error in order.
    fn feed_all<'a>(decoder: &mut ChunkedDecoder, slices: impl IntoIterator<Item = &'a [u8]>) -> Vec<Result<PayloadItem, DecodeError>> {
        let mut items = vec![];
        for slice in slices {
            items.extend(decoder.feed(slice));
        }
        items
    }

    #[test]
    fn test_basic() {
        let mut buffer: BytesMut = BytesMut::from(&b"10\r\n1234567890abcdef\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_chunk());
        assert_eq!(item.as_bytes().unwrap().len(), 16);
        assert_eq!(std::str::from_utf8(&item.as_bytes().unwrap()[..]).unwrap(), "1234567890abcdef");

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert!(item.is_eof());
        assert!(decoder.is_done());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_chunks() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n7\r\n, world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(chunk(b"hello")));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(chunk(b", world")));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_chunks_with_extensions() {
        let mut buffer: BytesMut = BytesMut::from(&b"5;chunk-ext=value\r\nhello\r\n0;last\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(chunk(b"hello")));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn test_chunks_with_trailers() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhello\r\n0\r\nTrailer: value\r\nOther: x\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(chunk(b"hello")));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_incomplete_chunk_is_not_yielded() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhel"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
        assert_eq!(decoder.phase(), DecodePhase::AwaitingChunkData { remaining: 2 });
        assert!(buffer.is_empty());

        buffer.extend_from_slice(b"lo");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);
        assert_eq!(decoder.phase(), DecodePhase::AwaitingChunkCrlf);

        buffer.extend_from_slice(b"\r\n0\r\n\r\n");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(chunk(b"hello")));
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn test_invalid_chunk_size() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"zz\r\n"[..]]);

        assert_eq!(items.len(), 1);
        let error = items[0].as_ref().unwrap_err();
        assert!(matches!(error, DecodeError::MalformedChunkSize { .. }));
        assert_eq!(error.phase(), DecodePhase::AwaitingSizeLine);
        assert_eq!(decoder.phase(), DecodePhase::Failed);

        // the stored error is reported again, valid input does not revive the decoder
        let items = feed_all(&mut decoder, [&b"2\r\nhi\r\n"[..]]);
        assert_eq!(items, vec![Err(error.clone())]);
    }

    #[test]
    fn test_invalid_size_line_endings() {
        for input in [&b"5\nhello\r\n"[..], b"5;ext\nhello\r\n", b"\r\n"] {
            let mut decoder = ChunkedDecoder::new();
            let items = feed_all(&mut decoder, [input]);
            assert!(matches!(items[..], [Err(DecodeError::MalformedChunkSize { .. })]), "input {input:?}");
        }
    }

    #[test]
    fn test_missing_crlf() {
        let mut buffer: BytesMut = BytesMut::from(&b"5\r\nhelloBad"[..]);
        let mut decoder = ChunkedDecoder::new();

        let error = decoder.decode(&mut buffer).unwrap_err();
        let error = error.as_decode_error().unwrap();
        assert!(matches!(error, DecodeError::MalformedChunkData { consumed: 8, .. }));
    }

    #[test]
    fn test_missing_crlf_detected_on_first_byte() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"2\r\nhi"[..], b"\rX"]);
        assert!(matches!(items[..], [Err(DecodeError::MalformedChunkData { .. })]));

        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"2\r\nhi"[..], b"X"]);
        assert!(matches!(items[..], [Err(DecodeError::MalformedChunkData { .. })]));
    }

    #[test]
    fn test_large_chunk() {
        let size = 1024 * 1024;
        let mut data = Vec::with_capacity(size + 16);
        data.extend(format!("{size:x}\r\n").into_bytes());
        data.extend(vec![b'A'; size]);
        data.extend(b"\r\n0\r\n\r\n");

        let mut buffer = BytesMut::from(&data[..]);
        let mut decoder = ChunkedDecoder::new();

        let item = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(item.as_bytes().unwrap().len(), size);
        assert!(item.as_bytes().unwrap().iter().all(|&b| b == b'A'));

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_zero_size_chunk() {
        let mut buffer: BytesMut = BytesMut::from(&b"0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_eof());
    }

    #[test]
    fn test_feed_hi_bye_at_once() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [HI_BYE]);

        assert_eq!(items, vec![Ok(chunk(b"hi")), Ok(chunk(b"bye")), Ok(PayloadItem::Eof)]);
        assert_eq!(decoder.consumed(), HI_BYE.len() as u64);
        assert_eq!(decoder.finish(), Ok(None));
    }

    #[test]
    fn test_feed_hi_bye_split_after_fifth_byte() {
        let mut decoder = ChunkedDecoder::new();
        let (first, second) = HI_BYE.split_at(5);

        let items = feed_all(&mut decoder, [first]);
        assert!(items.is_empty());
        assert_eq!(decoder.phase(), DecodePhase::AwaitingChunkCrlf);

        let items = feed_all(&mut decoder, [second]);
        assert_eq!(items, vec![Ok(chunk(b"hi")), Ok(chunk(b"bye")), Ok(PayloadItem::Eof)]);
    }

    #[test]
    fn test_feed_hi_bye_byte_by_byte() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, HI_BYE.chunks(1));

        assert_eq!(items, vec![Ok(chunk(b"hi")), Ok(chunk(b"bye")), Ok(PayloadItem::Eof)]);
    }

    #[test]
    fn test_feed_split_at_every_offset() {
        let encoded: &[u8] = b"a;x=1\r\n0123456789\r\n1\r\n!\r\n3\r\nend\r\n0\r\nExpires: never\r\n\r\n";
        let expected = vec![Ok(chunk(b"0123456789")), Ok(chunk(b"!")), Ok(chunk(b"end")), Ok(PayloadItem::Eof)];

        for first in 0..=encoded.len() {
            for second in first..=encoded.len() {
                let mut decoder = ChunkedDecoder::new();
                let slices = [&encoded[..first], &encoded[first..second], &encoded[second..]];
                assert_eq!(feed_all(&mut decoder, slices), expected, "split at {first} and {second}");
                assert!(decoder.is_done());
                assert_eq!(decoder.residue_len(), 0);
            }
        }
    }

    #[test]
    fn test_feed_is_lazy() {
        let mut decoder = ChunkedDecoder::new();

        let first = decoder.feed(HI_BYE).next();
        assert_eq!(first, Some(Ok(chunk(b"hi"))));

        // the rest stays in the residue and comes out of the next feed
        let items = feed_all(&mut decoder, [&b""[..]]);
        assert_eq!(items, vec![Ok(chunk(b"bye")), Ok(PayloadItem::Eof)]);
    }

    #[test]
    fn test_done_ignores_further_input() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [HI_BYE]);
        assert_eq!(items.len(), 3);

        let items = feed_all(&mut decoder, [&b"2\r\nhi\r\n"[..], b"garbage", HI_BYE]);
        assert!(items.is_empty());
        assert!(decoder.is_done());
        assert_eq!(decoder.residue_len(), 0);
        assert_eq!(decoder.discarded(), (7 + 7 + HI_BYE.len()) as u64);
        assert_eq!(decoder.finish(), Ok(None));
    }

    #[test]
    fn test_bytes_after_terminal_frame_in_same_feed_are_discarded() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"0\r\n\r\nHTTP/1.1"[..]]);

        assert_eq!(items, vec![Ok(PayloadItem::Eof)]);
        assert_eq!(decoder.discarded(), 8);
    }

    #[test]
    fn test_truncated_inside_chunk() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"5\r\nabc"[..]]);
        assert!(items.is_empty());

        let error = decoder.finish().unwrap_err();
        assert_eq!(error, DecodeError::truncated_stream(DecodePhase::AwaitingChunkData { remaining: 2 }, 6));
        assert!(error.is_truncated());
        assert_eq!(decoder.phase(), DecodePhase::Failed);
        assert_eq!(decoder.finish(), Err(error));
    }

    #[test]
    fn test_finish_drains_lazy_feed() {
        let mut decoder = ChunkedDecoder::new();
        assert_eq!(decoder.feed(HI_BYE).next(), Some(Ok(chunk(b"hi"))));

        assert_eq!(decoder.finish(), Ok(Some(chunk(b"bye"))));
        assert_eq!(decoder.finish(), Ok(Some(PayloadItem::Eof)));
        assert_eq!(decoder.finish(), Ok(None));
        assert!(decoder.is_done());
    }

    #[test]
    fn test_finish_drains_before_reporting_truncation() {
        let mut decoder = ChunkedDecoder::new();
        drop(decoder.feed(b"2\r\nhi\r\n3\r\nb"));

        assert_eq!(decoder.finish(), Ok(Some(chunk(b"hi"))));
        let error = decoder.finish().unwrap_err();
        assert_eq!(error, DecodeError::truncated_stream(DecodePhase::AwaitingChunkData { remaining: 2 }, 11));
        assert_eq!(decoder.error(), Some(&error));
    }

    #[test]
    fn test_truncated_in_terminal_sequence() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"2\r\nhi\r\n0\r\n"[..]]);
        assert_eq!(items, vec![Ok(chunk(b"hi"))]);

        let error = decoder.finish().unwrap_err();
        assert_eq!(error.phase(), DecodePhase::AwaitingTrailingCrlf);
    }

    #[test]
    fn test_truncated_through_decode_eof() {
        let mut buffer: BytesMut = BytesMut::from(&b"2\r\nhi\r\n3\r\nb"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), Some(chunk(b"hi")));
        let error = decoder.decode_eof(&mut buffer).unwrap_err();
        assert!(error.as_decode_error().unwrap().is_truncated());
    }

    #[test]
    fn test_decode_eof_after_end() {
        let mut buffer: BytesMut = BytesMut::from(HI_BYE);
        let mut decoder = ChunkedDecoder::new();

        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), Some(chunk(b"hi")));
        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), Some(chunk(b"bye")));
        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), Some(PayloadItem::Eof));
        assert_eq!(decoder.decode_eof(&mut buffer).unwrap(), None);
    }

    #[test]
    fn test_size_line_too_long() {
        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_line_len(8));

        // the limit is enforced before a line end shows up
        let items = feed_all(&mut decoder, [&b"1;aaaaaaaaaaaa"[..]]);
        assert!(matches!(items[..], [Err(DecodeError::MalformedChunkSize { .. })]));

        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_line_len(8));
        let items = feed_all(&mut decoder, [&b"1;aaaaaaa"[..], b"\r\nx\r\n"]);
        assert!(matches!(items[..], [Err(DecodeError::MalformedChunkSize { .. })]));

        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_line_len(8));
        let items = feed_all(&mut decoder, [&b"1;aaaaa\r"[..], b"\nx\r\n"]);
        assert_eq!(items, vec![Ok(chunk(b"x"))]);
    }

    #[test]
    fn test_unbounded_line_len() {
        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_line_len(usize::MAX));

        let items = feed_all(&mut decoder, [&b"1;aaaa"[..], b"aaaa\r\nx\r\n0\r\n\r\n"]);
        assert_eq!(items, vec![Ok(chunk(b"x")), Ok(PayloadItem::Eof)]);
    }

    #[test]
    fn test_trailer_too_long() {
        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_line_len(8));
        let items = feed_all(&mut decoder, [&b"0\r\nTrailer: value\r\n\r\n"[..]]);

        assert!(matches!(items[..], [Err(DecodeError::MalformedTrailer { .. })]));
    }

    #[test]
    fn test_chunk_too_large() {
        let mut decoder = ChunkedDecoder::with_config(DecoderConfig::new().max_chunk_size(4));
        let items = feed_all(&mut decoder, [&b"4\r\nabcd\r\n5\r\nabcde\r\n"[..]]);

        assert_eq!(items[0], Ok(chunk(b"abcd")));
        assert_eq!(items[1], Err(DecodeError::chunk_too_large(5, 4, 12)));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_residue_does_not_hold_chunk_data() {
        let mut decoder = ChunkedDecoder::new();
        let items = feed_all(&mut decoder, [&b"100\r\n"[..], &[b'x'; 200][..]]);

        assert!(items.is_empty());
        assert_eq!(decoder.residue_len(), 0);
        assert_eq!(decoder.phase(), DecodePhase::AwaitingChunkData { remaining: 56 });
    }
}
