/// Line buffer with incremental UTF-8 decoding.
///
/// Chunks may end in the middle of a multi-byte character; those trailing
/// bytes are carried into the next [`extend`](Self::extend). Invalid
/// sequences decode to U+FFFD instead of failing the stream.
pub struct Utf8LineBuffer {
    text: String,
    carry: Vec<u8>,
}

impl Utf8LineBuffer {
    /// Create a new buffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            carry: Vec::with_capacity(4),
        }
    }

    /// Decode bytes into the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(bytes);

        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));

                    match e.error_len() {
                        Some(bad) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[bad..];
                        }
                        None => {
                            // incomplete code point at the end of this chunk
                            self.carry = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Extract next line (up to `\n`) from buffer, without the line ending.
    /// Returns None if no complete line is available.
    pub fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.text.find('\n')?;

        let mut line: String = self.text.drain(..=newline_pos).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }

        Some(line)
    }

    /// Text that has not been terminated by a newline yet
    pub fn remainder(&self) -> String {
        let mut rest = self.text.clone();
        if !self.carry.is_empty() {
            rest.push_str(&String::from_utf8_lossy(&self.carry));
        }
        rest
    }

    /// Pending (decoded plus carried) byte count
    pub fn len(&self) -> usize {
        self.text.len() + self.carry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.carry.is_empty()
    }
}

impl Default for Utf8LineBuffer {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}
