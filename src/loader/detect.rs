use der::{Decode, Header, Reader, SliceReader, Tag};
use x509_cert::Certificate as X509Certificate;

use super::pem_block::{self, PemScan};
use super::source::{CertificateSource, DecodeContext, DecodeFailure};
use crate::cert::Certificate;

/// Encoding of a certificate stream, fixed by its first certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Der,
    Pem,
}

/// Reads single certificates from a [`CertificateSource`] in either encoding.
///
/// Readers return `None` when no certificate was produced. A reader records
/// a [`DecodeFailure`] only when the input was recognisably in its format;
/// input that is simply not DER, or whitespace at the end of a PEM stream,
/// leaves the context untouched.
pub struct FormatDetector;

impl FormatDetector {
    /// Reads one DER certificate at the current position.
    pub fn read_der(
        source: &mut CertificateSource<'_>,
        context: &mut DecodeContext,
    ) -> Option<Certificate> {
        let input = source.remaining();
        if !looks_like_der(input) {
            log::trace!("read_der: input at offset {} is not DER", source.position());
            return None;
        }
        match decode_der_prefix(input) {
            Ok((inner, consumed)) => {
                source.advance(consumed);
                Some(Certificate::from_x509(inner))
            }
            Err(e) => {
                context.record(DecodeFailure::MalformedDer(e.to_string()));
                None
            }
        }
    }

    /// Reads the next certificate block of a PEM stream.
    pub fn read_pem(
        source: &mut CertificateSource<'_>,
        context: &mut DecodeContext,
    ) -> Option<Certificate> {
        let input = source.remaining();
        match pem_block::next_certificate_block(input) {
            PemScan::Block { block, consumed } => {
                log::trace!("read_pem: certificate block at offset {}", source.position());
                source.advance(consumed);
                match pem_block::decode_block(block) {
                    Ok(inner) => Some(Certificate::from_x509(inner)),
                    Err(reason) => {
                        context.record(DecodeFailure::MalformedPem(reason));
                        None
                    }
                }
            }
            PemScan::Unterminated { label } => {
                context.record(DecodeFailure::MalformedPem(format!(
                    "missing END {label} line"
                )));
                None
            }
            PemScan::NoStartLine => {
                source.advance(input.len());
                context.record(DecodeFailure::NoStartLine);
                None
            }
            PemScan::Exhausted => {
                source.advance(input.len());
                None
            }
        }
    }

    /// Reads one certificate, trying DER first and then PEM from the start.
    pub fn detect(
        source: &mut CertificateSource<'_>,
        context: &mut DecodeContext,
    ) -> Option<(Format, Certificate)> {
        if let Some(certificate) = Self::read_der(source, context) {
            return Some((Format::Der, certificate));
        }
        source.reset();
        Self::read_pem(source, context).map(|certificate| (Format::Pem, certificate))
    }
}

/// Whether `input` starts with a SEQUENCE that fits in the input and whose
/// first element is itself a SEQUENCE, as a certificate's does.
///
/// The outer length must use the long form (first length octet 0x81 or
/// above). Every certificate is longer than 127 bytes, and text never
/// carries such an octet, so a line like `000...` is not taken for DER.
fn looks_like_der(input: &[u8]) -> bool {
    if !input.get(1).is_some_and(|&octet| octet > 0x80) {
        return false;
    }
    let Ok(mut reader) = SliceReader::new(input) else {
        return false;
    };
    let Ok(header) = Header::decode(&mut reader) else {
        return false;
    };
    if header.tag != Tag::Sequence {
        return false;
    }
    let (Ok(header_len), Ok(body_len)) = (
        usize::try_from(reader.position()),
        usize::try_from(header.length),
    ) else {
        return false;
    };
    header_len + body_len <= input.len() && input.get(header_len) == Some(&0x30)
}

/// Decodes the certificate at the start of `input`, returning it together
/// with the number of bytes it occupied.
pub(crate) fn decode_der_prefix(input: &[u8]) -> der::Result<(X509Certificate, usize)> {
    let mut reader = SliceReader::new(input)?;
    let certificate = X509Certificate::decode(&mut reader)?;
    let consumed = usize::try_from(reader.position())?;
    Ok((certificate, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_der_input_records_nothing() {
        let mut context = DecodeContext::default();
        let inputs: [&[u8]; 4] = [
            b"",
            b"hello",
            b"\x30\x05\x02\x01\x01",
            b"\x30\x82\xff\xff\x30",
        ];
        for input in inputs {
            let mut source = CertificateSource::new(input);
            assert!(FormatDetector::read_der(&mut source, &mut context).is_none());
        }
        assert!(context.is_clear());
    }

    #[test]
    fn test_text_with_sequence_bytes_is_not_der() {
        // "00" reads as SEQUENCE, length 48, then another SEQUENCE tag
        let text = format!("{} comment\n", "0".repeat(60));
        assert!(!looks_like_der(text.as_bytes()));
        let mut context = DecodeContext::default();
        let mut source = CertificateSource::new(text.as_bytes());
        assert!(FormatDetector::read_der(&mut source, &mut context).is_none());
        assert!(context.is_clear());
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn test_short_form_outer_length_is_not_der() {
        let mut input = vec![0x30, 0x7f, 0x30, 0x7d];
        input.extend([0u8; 0x7d]);
        assert!(!looks_like_der(&input));
    }

    #[test]
    fn test_broken_der_records_failure() {
        let mut context = DecodeContext::default();
        let mut input = vec![0x30, 0x81, 0x80, 0x30, 0x7e];
        input.extend([0u8; 0x7e]);
        assert!(looks_like_der(&input));
        let mut source = CertificateSource::new(&input);
        assert!(FormatDetector::read_der(&mut source, &mut context).is_none());
        assert!(matches!(
            context.peek_last(),
            Some(DecodeFailure::MalformedDer(_))
        ));
    }

    #[test]
    fn test_trailing_whitespace_ends_pem_stream_cleanly() {
        let mut context = DecodeContext::default();
        let mut source = CertificateSource::new(b"\n\n  \n");
        assert!(FormatDetector::read_pem(&mut source, &mut context).is_none());
        assert!(source.is_eof());
        assert!(context.is_clear());
    }
}
