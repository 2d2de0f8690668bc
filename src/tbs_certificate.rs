use std::time::SystemTime;

use der::asn1::{BitString, GeneralizedTime, Int, UtcTime};
use der::{Decode, Encode};
use num_bigint::BigInt;
use time::{OffsetDateTime, UtcOffset};
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::{Name, RdnSequence};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};

use crate::cert::extensions::ExtensionList;
use crate::error::X509KitError;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// Unlike the codec's `TbsCertificateInner`, every field may be unset, so a
/// certificate can be populated one field at a time. Conversion to the codec
/// form fails until the required fields are present.
///
/// # Fields
/// * `version` - The certificate version (v1 when unset).
/// * `serial_number` - The serial number as a signed integer.
/// * `signature_algorithm` - The algorithm declared inside the TBS structure.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `not_before` - The start of the certificate's validity period.
/// * `not_after` - The end of the certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key_info` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TbsCertificate {
    pub version: Version,
    pub serial_number: BigInt,
    pub signature_algorithm: Option<AlgorithmIdentifierOwned>,
    pub issuer: Name,
    pub not_before: Option<Time>,
    pub not_after: Option<Time>,
    pub subject: Name,
    pub subject_public_key_info: Option<SubjectPublicKeyInfoOwned>,
    pub issuer_unique_id: Option<BitString>,
    pub subject_unique_id: Option<BitString>,
    pub extensions: ExtensionList,
}

impl Default for TbsCertificate {
    fn default() -> Self {
        Self {
            version: Version::V1,
            serial_number: BigInt::from(0),
            signature_algorithm: None,
            issuer: RdnSequence(Vec::new()),
            not_before: None,
            not_after: None,
            subject: RdnSequence(Vec::new()),
            subject_public_key_info: None,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: ExtensionList::new(),
        }
    }
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    ///
    /// # Errors
    /// `EncodeError` naming the first required field that is not set.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner, X509KitError> {
        let missing = |field: &str| X509KitError::EncodeError(format!("{field} is not set"));

        let signature = self
            .signature_algorithm
            .clone()
            .ok_or_else(|| missing("signature algorithm"))?;
        let not_before = self.not_before.ok_or_else(|| missing("notBefore"))?;
        let not_after = self.not_after.ok_or_else(|| missing("notAfter"))?;
        let subject_public_key_info = self
            .subject_public_key_info
            .clone()
            .ok_or_else(|| missing("public key"))?;
        let serial_number = serial_number_from_bigint(&self.serial_number)
            .map_err(|e| X509KitError::EncodeError(format!("serial number: {e}")))?;

        Ok(TbsCertificateInner {
            version: self.version,
            serial_number,
            signature,
            issuer: self.issuer.clone(),
            validity: Validity {
                not_before,
                not_after,
            },
            subject: self.subject.clone(),
            subject_public_key_info,
            issuer_unique_id: self.issuer_unique_id.clone(),
            subject_unique_id: self.subject_unique_id.clone(),
            extensions: self.extensions.to_x509(),
        })
    }

    /// Creates a `TbsCertificate` from a decoded `TbsCertificateInner`.
    pub fn from_tbs_certificate_inner(inner: TbsCertificateInner) -> Self {
        Self {
            version: inner.version,
            serial_number: bigint_from_serial_number(&inner.serial_number),
            signature_algorithm: Some(inner.signature),
            issuer: inner.issuer,
            not_before: Some(inner.validity.not_before),
            not_after: Some(inner.validity.not_after),
            subject: inner.subject,
            subject_public_key_info: Some(inner.subject_public_key_info),
            issuer_unique_id: inner.issuer_unique_id,
            subject_unique_id: inner.subject_unique_id,
            extensions: ExtensionList::from_x509(inner.extensions),
        }
    }

    /// Encodes the `TbsCertificate` into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded TBS structure.
    pub fn to_der(&self) -> Result<Vec<u8>, X509KitError> {
        self.to_tbs_certificate_inner()?
            .to_der()
            .map_err(|e| X509KitError::EncodeError(e.to_string()))
    }
}

/// Longest serial accepted, in two's-complement octets. RFC 5280 allows 20,
/// decoders accept 21.
const MAX_SERIAL_LEN: usize = 21;

/// Encodes a signed integer as a certificate serial number.
pub(crate) fn serial_number_from_bigint(serial: &BigInt) -> der::Result<SerialNumber> {
    let bytes = serial.to_signed_bytes_be();
    if bytes.len() > MAX_SERIAL_LEN {
        return Err(der::Tag::Integer.length_error());
    }
    let int = Int::new(&bytes)?;
    SerialNumber::from_der(&int.to_der()?)
}

pub(crate) fn bigint_from_serial_number(serial: &SerialNumber) -> BigInt {
    BigInt::from_signed_bytes_be(serial.as_bytes())
}

/// Converts a timestamp into the certificate time type: UTCTime through
/// 2049, GeneralizedTime from 2050 on (RFC 5280 section 4.1.2.5).
pub(crate) fn time_from_datetime(datetime: OffsetDateTime) -> Result<Time, X509KitError> {
    let utc = datetime.to_offset(UtcOffset::UTC);
    let system_time = SystemTime::from(utc);
    let time = if utc.year() < 2050 {
        UtcTime::from_system_time(system_time).map(Time::UtcTime)
    } else {
        GeneralizedTime::from_system_time(system_time).map(Time::GeneralTime)
    };
    time.map_err(|e| X509KitError::InvalidArgument(format!("{datetime} is not representable: {e}")))
}

pub(crate) fn datetime_from_time(time: &Time) -> OffsetDateTime {
    match time {
        Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tbs_reports_missing_field() {
        let tbs = TbsCertificate::default();
        match tbs.to_der() {
            Err(X509KitError::EncodeError(msg)) => assert!(msg.contains("signature algorithm")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_serial_number_keeps_sign_and_width() {
        let wide: BigInt = "170141183460469231731687303715884105727".parse().unwrap();
        for serial in [BigInt::from(0), BigInt::from(-129), BigInt::from(255), wide] {
            let encoded = serial_number_from_bigint(&serial).unwrap();
            assert_eq!(bigint_from_serial_number(&encoded), serial);
        }
    }

    #[test]
    fn test_time_type_follows_the_2050_rule() {
        let before = OffsetDateTime::from_unix_timestamp(2_524_607_999).unwrap(); // 2049-12-31T23:59:59Z
        let after = OffsetDateTime::from_unix_timestamp(2_524_608_000).unwrap(); // 2050-01-01T00:00:00Z
        assert!(matches!(time_from_datetime(before), Ok(Time::UtcTime(_))));
        assert!(matches!(time_from_datetime(after), Ok(Time::GeneralTime(_))));
        let decoded = datetime_from_time(&time_from_datetime(after).unwrap());
        assert_eq!(decoded, after);
    }

    #[test]
    fn test_pre_epoch_time_is_rejected() {
        let old = OffsetDateTime::from_unix_timestamp(-86_400).unwrap();
        assert!(matches!(
            time_from_datetime(old),
            Err(X509KitError::InvalidArgument(_))
        ));
    }
}
