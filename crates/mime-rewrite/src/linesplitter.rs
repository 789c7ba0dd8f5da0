//! Streaming line splitter for base64 bodies
//!
//! RFC 2045 §6.8 caps encoded lines at 76 characters; downstream MTAs may
//! mangle longer lines. This wraps whatever byte stream is written to it
//! without re-buffering the whole body.

/// Writes input in fixed-size chunks separated by `sep`
///
/// Call [`LineSplitter::write`] one or more times, then
/// [`LineSplitter::finish`] to retrieve the accumulated output. A final
/// partial chunk is flushed without a trailing separator.
pub struct LineSplitter {
    chunk_len: usize,
    count: usize,
    sep: &'static [u8],
    out: Vec<u8>,
}

impl LineSplitter {
    /// Create a splitter that emits `sep` after every `chunk_len` bytes
    pub fn new(chunk_len: usize, sep: &'static [u8]) -> Self {
        Self {
            chunk_len,
            count: 0,
            sep,
            out: Vec::new(),
        }
    }

    /// Feed more input bytes
    pub fn write(&mut self, input: &[u8]) {
        let mut read_pos = 0;
        let mut chunk_size = (input.len()).min(self.chunk_len - self.count);
        loop {
            self.out.extend_from_slice(&input[read_pos..read_pos + chunk_size]);
            read_pos += chunk_size;
            self.count += chunk_size;

            if self.count >= self.chunk_len {
                self.out.extend_from_slice(self.sep);
                self.count = 0;
            }

            let remaining = input.len() - read_pos;
            if remaining == 0 {
                break;
            }
            chunk_size = remaining.min(self.chunk_len);
        }
    }

    /// Consume the splitter and return the accumulated output
    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

/// Split `data` into `chunk_len`-byte lines separated by `sep` in one call
pub fn wrap(data: &[u8], chunk_len: usize, sep: &'static [u8]) -> Vec<u8> {
    let mut splitter = LineSplitter::new(chunk_len, sep);
    if !data.is_empty() {
        splitter.write(data);
    }
    splitter.finish()
}

#[cfg(test)]
mod tests {
    use super::wrap;

    #[test]
    fn wraps_at_boundary_with_no_remainder() {
        let data = b"0123456789";
        let out = wrap(data, 5, b"|");
        assert_eq!(out, b"01234|56789|");
    }

    #[test]
    fn leaves_trailing_partial_chunk_unterminated() {
        let data = b"0123456789ab";
        let out = wrap(data, 5, b"|");
        assert_eq!(out, b"01234|56789|ab");
    }

    #[test]
    fn handles_multiple_write_calls_across_chunk_boundary() {
        let mut splitter = super::LineSplitter::new(4, b"\r\n");
        splitter.write(b"ab");
        splitter.write(b"cdef");
        splitter.write(b"gh");
        assert_eq!(splitter.finish(), b"abcd\r\nefgh\r\n");
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert_eq!(wrap(b"", 76, b"\r\n"), Vec::<u8>::new());
    }
}
