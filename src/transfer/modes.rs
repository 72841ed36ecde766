//! FTP transfer types
//!
//! ASCII transfers use CRLF line endings on the wire and the local convention
//! (LF) on disk. Binary transfers copy bytes untouched.

/// Representation type selected by `TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    /// Parses the argument of a `TYPE` command. Only `A` and `I` are accepted.
    pub fn from_type_arg(arg: &str) -> Option<Self> {
        match arg.trim() {
            "A" => Some(TransferType::Ascii),
            "I" => Some(TransferType::Binary),
            _ => None,
        }
    }
}

/// Converts bare LF to CRLF for outgoing ASCII data.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(input.len() + input.len() / 16);
        for &byte in input {
            if byte == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(byte);
            self.last_was_cr = byte == b'\r';
        }
    }
}

/// Converts CRLF to LF for incoming ASCII data.
///
/// A CR at the end of one chunk is held back until the next chunk shows
/// whether it starts a CRLF pair.
#[derive(Debug, Default)]
pub struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.clear();
        out.reserve(input.len() + 1);
        for &byte in input {
            if self.pending_cr {
                self.pending_cr = false;
                if byte != b'\n' {
                    out.push(b'\r');
                }
            }
            if byte == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(byte);
            }
        }
    }

    /// Flushes a trailing CR once the stream has ended.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        out.clear();
        if std::mem::take(&mut self.pending_cr) {
            out.push(b'\r');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_argument_is_case_sensitive() {
        assert_eq!(TransferType::from_type_arg("I"), Some(TransferType::Binary));
        assert_eq!(TransferType::from_type_arg("A"), Some(TransferType::Ascii));
        assert_eq!(TransferType::from_type_arg("E"), None);
        assert_eq!(TransferType::from_type_arg("i"), None);
    }

    #[test]
    fn encoder_adds_cr_only_to_bare_lf() {
        let mut enc = AsciiEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"a\nb\r\nc", &mut out);
        assert_eq!(out, b"a\r\nb\r\nc");
    }

    #[test]
    fn encoder_tracks_cr_across_chunks() {
        let mut enc = AsciiEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"line\r", &mut out);
        assert_eq!(out, b"line\r");
        enc.encode(b"\nnext\n", &mut out);
        assert_eq!(out, b"\nnext\r\n");
    }

    #[test]
    fn decoder_strips_crlf_split_across_chunks() {
        let mut dec = AsciiDecoder::default();
        let mut collected = Vec::new();
        let mut out = Vec::new();
        for chunk in [&b"one\r"[..], b"\ntwo\r\n", b"lone\rcr\r"] {
            dec.decode(chunk, &mut out);
            collected.extend_from_slice(&out);
        }
        dec.finish(&mut out);
        collected.extend_from_slice(&out);
        assert_eq!(collected, b"one\ntwo\nlone\rcr\r");
    }
}
