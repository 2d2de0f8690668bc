use std::fmt;

/// An in-memory byte source with a read position that can be rewound.
#[derive(Debug, Clone)]
pub struct CertificateSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> CertificateSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The whole input, regardless of position.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The unread part of the input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Consumes `count` bytes, stopping at the end of the input.
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count).min(self.data.len());
    }

    /// Rewinds to the start of the input.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }
}

/// Why a read attempt produced no certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// Text remained but held no certificate `BEGIN` line.
    NoStartLine,
    /// The input looked like DER but did not decode.
    MalformedDer(String),
    /// A certificate PEM block was truncated or did not decode.
    MalformedPem(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::NoStartLine => f.write_str("no PEM start line"),
            DecodeFailure::MalformedDer(reason) => write!(f, "malformed DER certificate: {reason}"),
            DecodeFailure::MalformedPem(reason) => write!(f, "malformed PEM certificate: {reason}"),
        }
    }
}

/// Failures recorded by readers, most recent last.
///
/// Each load call owns its own context.
#[derive(Debug, Default)]
pub struct DecodeContext {
    failures: Vec<DecodeFailure>,
}

impl DecodeContext {
    pub fn record(&mut self, failure: DecodeFailure) {
        log::trace!("decode failure recorded: {failure}");
        self.failures.push(failure);
    }

    pub fn peek_last(&self) -> Option<&DecodeFailure> {
        self.failures.last()
    }

    pub fn clear(&mut self) {
        self.failures.clear();
    }

    pub fn is_clear(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_is_clamped_and_reset_rewinds() {
        let mut source = CertificateSource::new(b"abcdef");
        source.advance(4);
        assert_eq!(source.remaining(), b"ef");
        source.advance(10);
        assert!(source.is_eof());
        assert_eq!(source.remaining(), b"");
        source.reset();
        assert_eq!(source.position(), 0);
        assert_eq!(source.remaining(), b"abcdef");
    }

    #[test]
    fn test_context_reports_latest_failure() {
        let mut context = DecodeContext::default();
        assert!(context.peek_last().is_none());
        context.record(DecodeFailure::MalformedDer("short".to_string()));
        context.record(DecodeFailure::NoStartLine);
        assert_eq!(context.peek_last(), Some(&DecodeFailure::NoStartLine));
        context.clear();
        assert!(context.is_clear());
    }
}
