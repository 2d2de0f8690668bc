pub mod extensions;
pub mod params;
mod text;

use std::fmt;

use crate::error::X509KitError;
pub type Result<T> = std::result::Result<T, X509KitError>;

use const_oid::ObjectIdentifier;
use der::asn1::BitString;
use der::pem::LineEnding;
use der::{Encode, EncodePem};
use extensions::ToAndFromX509Extension;
use num_bigint::BigInt;
use params::{CertificationRequestInfo, ExtensionParam};
use time::OffsetDateTime;
use x509_cert::Version;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::issuer::Issuer;
use crate::key::{KeyPair, PublicKey};
use crate::loader::detect::FormatDetector;
use crate::loader::source::{CertificateSource, DecodeContext};
use crate::pki::{self, DigestAlgorithm};
use crate::tbs_certificate::{TbsCertificate, datetime_from_time, time_from_datetime};

/// ecdsa-with-SHA1 (RFC 3279 section 2.2.3).
const ECDSA_WITH_SHA_1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");

/// Represents the supported signature algorithms for certificates.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption.
    Sha256WithRSA,
    /// SHA-384 with RSA encryption.
    Sha384WithRSA,
    /// SHA-512 with RSA encryption.
    Sha512WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
    /// SHA-384 with ECDSA.
    Sha384WithECDSA,
    /// SHA-512 with ECDSA.
    Sha512WithECDSA,
    /// Pure EdDSA over Curve25519.
    Ed25519,
    /// SHA-1 with RSA encryption. Accepted by `verify` only.
    Sha1WithRSA,
    /// SHA-1 with ECDSA. Accepted by `verify` only.
    Sha1WithECDSA,
}

impl SignatureAlgorithm {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRSA => const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha384WithRSA => const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha512WithRSA => const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha256WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            SignatureAlgorithm::Sha384WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            SignatureAlgorithm::Sha512WithECDSA => const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
            SignatureAlgorithm::Ed25519 => const_oid::db::rfc8410::ID_ED_25519,
            SignatureAlgorithm::Sha1WithRSA => const_oid::db::rfc5912::SHA_1_WITH_RSA_ENCRYPTION,
            SignatureAlgorithm::Sha1WithECDSA => ECDSA_WITH_SHA_1,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [
            SignatureAlgorithm::Sha256WithRSA,
            SignatureAlgorithm::Sha384WithRSA,
            SignatureAlgorithm::Sha512WithRSA,
            SignatureAlgorithm::Sha256WithECDSA,
            SignatureAlgorithm::Sha384WithECDSA,
            SignatureAlgorithm::Sha512WithECDSA,
            SignatureAlgorithm::Ed25519,
            SignatureAlgorithm::Sha1WithRSA,
            SignatureAlgorithm::Sha1WithECDSA,
        ]
        .into_iter()
        .find(|algorithm| algorithm.oid() == *oid)
    }

    /// Picks the algorithm for signing with `key`.
    ///
    /// Without an explicit digest, RSA and P-256 use SHA-256, P-384 uses
    /// SHA-384 and P-521 uses SHA-512. Ed25519 hashes internally and rejects
    /// any digest. The SHA-1 algorithms are never picked.
    pub fn for_key(key: &KeyPair, digest: Option<DigestAlgorithm>) -> Result<Self> {
        let algorithm = match (key, digest) {
            (KeyPair::Rsa { .. }, None | Some(DigestAlgorithm::Sha256)) => {
                SignatureAlgorithm::Sha256WithRSA
            }
            (KeyPair::Rsa { .. }, Some(DigestAlgorithm::Sha384)) => SignatureAlgorithm::Sha384WithRSA,
            (KeyPair::Rsa { .. }, Some(DigestAlgorithm::Sha512)) => SignatureAlgorithm::Sha512WithRSA,
            (KeyPair::EcdsaP256 { .. }, None) => SignatureAlgorithm::Sha256WithECDSA,
            (KeyPair::EcdsaP384 { .. }, None) => SignatureAlgorithm::Sha384WithECDSA,
            (KeyPair::EcdsaP521 { .. }, None) => SignatureAlgorithm::Sha512WithECDSA,
            (
                KeyPair::EcdsaP256 { .. } | KeyPair::EcdsaP384 { .. } | KeyPair::EcdsaP521 { .. },
                Some(digest),
            ) => match digest {
                DigestAlgorithm::Sha256 => SignatureAlgorithm::Sha256WithECDSA,
                DigestAlgorithm::Sha384 => SignatureAlgorithm::Sha384WithECDSA,
                DigestAlgorithm::Sha512 => SignatureAlgorithm::Sha512WithECDSA,
            },
            (KeyPair::Ed25519 { .. }, None) => SignatureAlgorithm::Ed25519,
            (KeyPair::Ed25519 { .. }, Some(digest)) => {
                return Err(X509KitError::SignError(format!(
                    "sign: Ed25519 does not take a digest, got {digest}"
                )));
            }
        };
        Ok(algorithm)
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// # Returns
    /// An `AlgorithmIdentifierOwned` object containing the OID and parameters for the algorithm.
    fn from(value: SignatureAlgorithm) -> Self {
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: None,
        }
    }
}

/// Represents an X.509 certificate.
///
/// A certificate starts out empty (version 1, serial 0, empty names, no
/// validity, key or extensions, unsigned) and is filled in with setters,
/// or is decoded from DER or PEM. Every setter edits the to-be-signed part;
/// signing makes the outer signature consistent with it again.
#[derive(Clone, Default)]
pub struct Certificate {
    tbs: TbsCertificate,
    signature_algorithm: Option<AlgorithmIdentifierOwned>,
    signature: Option<BitString>,
}

impl Certificate {
    /// Creates an empty certificate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a decoded certificate.
    pub fn from_x509(inner: CertificateInner) -> Self {
        Self {
            tbs: TbsCertificate::from_tbs_certificate_inner(inner.tbs_certificate),
            signature_algorithm: Some(inner.signature_algorithm),
            signature: Some(inner.signature),
        }
    }

    /// Returns the codec form of this certificate.
    ///
    /// # Errors
    /// `EncodeError` if the certificate is unsigned or a required field is unset.
    pub fn to_x509(&self) -> Result<CertificateInner> {
        let (Some(signature_algorithm), Some(signature)) =
            (&self.signature_algorithm, &self.signature)
        else {
            return Err(X509KitError::EncodeError(
                "to_der: certificate is not signed".to_string(),
            ));
        };
        let tbs_certificate = self
            .tbs
            .to_tbs_certificate_inner()
            .map_err(|e| X509KitError::EncodeError(format!("to_der: {e}")))?;
        Ok(CertificateInner {
            tbs_certificate,
            signature_algorithm: signature_algorithm.clone(),
            signature: signature.clone(),
        })
    }

    /// Decodes one certificate from `data`, DER first, then PEM.
    ///
    /// Bytes after the first certificate are ignored.
    ///
    /// # Errors
    /// `DecodeError` when neither format yields a certificate.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut source = CertificateSource::new(data);
        let mut context = DecodeContext::default();
        match FormatDetector::detect(&mut source, &mut context) {
            Some((_, certificate)) => Ok(certificate),
            None => {
                let reason = context
                    .peek_last()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "no certificate found".to_string());
                Err(X509KitError::DecodeError(format!("from_bytes: {reason}")))
            }
        }
    }

    /// Decodes one DER certificate. Trailing bytes are ignored.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (inner, _) = crate::loader::detect::decode_der_prefix(der)
            .map_err(|e| X509KitError::DecodeError(format!("from_der: {e}")))?;
        Ok(Self::from_x509(inner))
    }

    /// Decodes the first certificate block of a PEM document.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let mut source = CertificateSource::new(pem.as_bytes());
        let mut context = DecodeContext::default();
        FormatDetector::read_pem(&mut source, &mut context).ok_or_else(|| {
            let reason = context
                .peek_last()
                .map(ToString::to_string)
                .unwrap_or_else(|| "no certificate found".to_string());
            X509KitError::DecodeError(format!("from_pem: {reason}"))
        })
    }

    /// Loads every certificate in `data`. See [`crate::loader::load`].
    pub fn load(data: &[u8]) -> Result<Vec<Self>> {
        crate::loader::load(data)
    }

    /// Encodes the certificate into DER format.
    ///
    /// # Returns
    /// A byte vector containing the DER-encoded certificate.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.to_x509()?
            .to_der()
            .map_err(|e| X509KitError::EncodeError(format!("to_der: {e}")))
    }

    /// Encodes the certificate into PEM format.
    ///
    /// # Returns
    /// A string containing the PEM-encoded certificate.
    pub fn to_pem(&self) -> Result<String> {
        self.to_pem_with_line_ending(LineEnding::LF)
    }

    pub fn to_pem_with_line_ending(&self, line_ending: LineEnding) -> Result<String> {
        self.to_x509()?
            .to_pem(line_ending)
            .map_err(|e| X509KitError::EncodeError(format!("to_pem: {e}")))
    }

    /// Renders a human-readable dump in the style of `openssl x509 -text`.
    pub fn to_text(&self) -> Result<String> {
        text::render(self).map_err(|e| X509KitError::EncodeError(format!("to_text: {e}")))
    }

    /// The DER encoding of the to-be-signed part, as covered by the signature.
    pub fn tbs_bytes(&self) -> Result<Vec<u8>> {
        self.tbs
            .to_der()
            .map_err(|e| X509KitError::EncodeError(format!("tbs_bytes: {e}")))
    }

    /// Zero-based version number: 0 is v1, 2 is v3.
    pub fn version(&self) -> i64 {
        match self.tbs.version {
            Version::V1 => 0,
            Version::V2 => 1,
            Version::V3 => 2,
        }
    }

    /// # Errors
    /// `InvalidArgument` for anything but 0, 1 or 2.
    pub fn set_version(&mut self, version: i64) -> Result<()> {
        self.tbs.version = match version {
            0 => Version::V1,
            1 => Version::V2,
            2 => Version::V3,
            _ => {
                return Err(X509KitError::InvalidArgument(format!(
                    "set_version: version must be between 0 and 2, got {version}"
                )));
            }
        };
        Ok(())
    }

    pub fn serial_number(&self) -> BigInt {
        self.tbs.serial_number.clone()
    }

    /// Sets the serial number. Negative and wide values are kept as given.
    ///
    /// # Errors
    /// `InvalidArgument` if the value does not fit in a certificate serial.
    pub fn set_serial_number(&mut self, serial: BigInt) -> Result<()> {
        crate::tbs_certificate::serial_number_from_bigint(&serial)
            .map_err(|e| X509KitError::InvalidArgument(format!("set_serial_number: {e}")))?;
        self.tbs.serial_number = serial;
        Ok(())
    }

    /// Name of the signature algorithm declared inside the to-be-signed part,
    /// or its dotted OID when the name is unknown.
    pub fn signature_algorithm(&self) -> Option<String> {
        self.tbs
            .signature_algorithm
            .as_ref()
            .map(|algorithm| text::oid_name(&algorithm.oid))
    }

    pub fn subject(&self) -> Name {
        self.tbs.subject.clone()
    }

    pub fn set_subject(&mut self, name: &Name) {
        self.tbs.subject = name.clone();
    }

    pub fn issuer(&self) -> Name {
        self.tbs.issuer.clone()
    }

    pub fn set_issuer(&mut self, name: &Name) {
        self.tbs.issuer = name.clone();
    }

    /// Start of the validity period, to the second. `None` until set.
    pub fn not_before(&self) -> Option<OffsetDateTime> {
        self.tbs.not_before.as_ref().map(datetime_from_time)
    }

    /// # Errors
    /// `InvalidArgument` for instants before 1970 or past 9999.
    pub fn set_not_before(&mut self, time: OffsetDateTime) -> Result<()> {
        self.tbs.not_before = Some(time_from_datetime(time)?);
        Ok(())
    }

    /// End of the validity period, to the second. `None` until set.
    pub fn not_after(&self) -> Option<OffsetDateTime> {
        self.tbs.not_after.as_ref().map(datetime_from_time)
    }

    /// # Errors
    /// `InvalidArgument` for instants before 1970 or past 9999.
    pub fn set_not_after(&mut self, time: OffsetDateTime) -> Result<()> {
        self.tbs.not_after = Some(time_from_datetime(time)?);
        Ok(())
    }

    /// Decodes the subject public key.
    ///
    /// # Errors
    /// `DecodeError` if no key is set, `InvalidArgument` for unsupported algorithms.
    pub fn public_key(&self) -> Result<PublicKey> {
        let spki = self.tbs.subject_public_key_info.as_ref().ok_or_else(|| {
            X509KitError::DecodeError("public_key: no public key set".to_string())
        })?;
        PublicKey::from_x509spki(spki)
    }

    pub fn set_public_key(&mut self, key: &PublicKey) -> Result<()> {
        self.tbs.subject_public_key_info = Some(key.to_spki()?);
        Ok(())
    }

    pub fn subject_public_key_info(&self) -> Option<&SubjectPublicKeyInfoOwned> {
        self.tbs.subject_public_key_info.as_ref()
    }

    /// Returns independent copies of the extensions, in order.
    pub fn extensions(&self) -> Vec<ExtensionParam> {
        self.tbs.extensions.to_params()
    }

    /// Replaces all extensions. On failure the extensions installed before
    /// the failing entry remain.
    pub fn set_extensions(&mut self, extensions: &[ExtensionParam]) -> Result<()> {
        self.tbs.extensions.replace_all(extensions)
    }

    pub fn add_extension(&mut self, extension: &ExtensionParam) -> Result<()> {
        self.tbs.extensions.push(extension)
    }

    /// Raw signature bits, if signed.
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_ref().map(BitString::raw_bytes)
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signs the certificate with `key`.
    ///
    /// Sets the signature algorithm in both the to-be-signed part and the
    /// outer structure, then replaces the signature. On error the
    /// certificate is left as it was.
    ///
    /// # Arguments
    /// * `key` - The private key.
    /// * `digest` - A digest name such as `"SHA256"`; `None` picks the key's default.
    pub fn sign(&mut self, key: &KeyPair, digest: Option<&str>) -> Result<()> {
        let digest = digest.map(DigestAlgorithm::from_name).transpose()?;
        let algorithm = SignatureAlgorithm::for_key(key, digest)?;
        let algorithm_identifier = AlgorithmIdentifierOwned::from(algorithm);

        let mut tbs = self.tbs.clone();
        tbs.signature_algorithm = Some(algorithm_identifier.clone());
        let tbs_der = tbs
            .to_der()
            .map_err(|e| X509KitError::SignError(format!("sign: {e}")))?;

        let signature = pki::sign_data(&tbs_der, key, algorithm)?;
        let signature = BitString::from_bytes(&signature)
            .map_err(|e| X509KitError::SignError(format!("sign: {e}")))?;

        self.tbs = tbs;
        self.signature_algorithm = Some(algorithm_identifier);
        self.signature = Some(signature);
        log::debug!("sign: signed certificate with {algorithm:?}");
        Ok(())
    }

    /// Checks the signature against `key`.
    ///
    /// # Returns
    /// `Ok(false)` when the signature does not match or the key cannot
    /// check this kind of signature.
    ///
    /// # Errors
    /// `VerifyError` when the certificate is unsigned, cannot be encoded,
    /// or uses an unknown signature algorithm.
    pub fn verify(&self, key: &PublicKey) -> Result<bool> {
        let (Some(algorithm), Some(signature)) = (&self.signature_algorithm, &self.signature)
        else {
            return Err(X509KitError::VerifyError(
                "verify: certificate is not signed".to_string(),
            ));
        };
        let algorithm = SignatureAlgorithm::from_oid(&algorithm.oid).ok_or_else(|| {
            X509KitError::VerifyError(format!(
                "verify: unsupported signature algorithm {}",
                algorithm.oid
            ))
        })?;
        let tbs_der = self
            .tbs
            .to_der()
            .map_err(|e| X509KitError::VerifyError(format!("verify: {e}")))?;

        let Some(signature) = signature.as_bytes() else {
            log::debug!("verify: signature has unused bits");
            return Ok(false);
        };
        let verified = pki::verify_data(&tbs_der, signature, key, algorithm);
        if !verified {
            log::debug!("verify: signature does not match with {algorithm:?}");
        }
        Ok(verified)
    }

    /// Whether `key` is the private half of the certificate's public key.
    pub fn check_private_key(&self, key: &KeyPair) -> bool {
        match self.public_key() {
            Ok(public) => public == key.public_key(),
            Err(e) => {
                log::debug!("check_private_key: {e}");
                false
            }
        }
    }

    /// Extracts certificate information into a `CertificationRequestInfo` object.
    ///
    /// # Returns
    /// A `CertificationRequestInfo` object containing the certificate details.
    pub fn to_cert_info(&self) -> Result<CertificationRequestInfo> {
        let subject = params::DistinguishedName::from_x509_name(&self.tbs.subject);
        let subject_public_key = self.public_key()?;
        let extensions = self.extensions();

        let usages = self
            .tbs
            .extensions
            .find(extensions::ExtendedKeyUsage::OID)
            .and_then(|ext| ext.to_extension::<extensions::ExtendedKeyUsage>().ok())
            .map(|eku| eku.usage)
            .unwrap_or_default();

        let is_ca = self
            .tbs
            .extensions
            .find(extensions::BasicConstraints::OID)
            .and_then(|ext| ext.to_extension::<extensions::BasicConstraints>().ok())
            .is_some_and(|bc| bc.is_ca);

        Ok(CertificationRequestInfo {
            subject,
            subject_public_key,
            usages,
            is_ca,
            extensions,
        })
    }

    /// Creates a new self-signed certificate valid for 365 days.
    ///
    /// # Arguments
    /// * `cert_info` - The certification request information.
    /// * `key` - The key pair used to sign the certificate.
    pub fn new_self_signed(cert_info: &CertificationRequestInfo, key: &KeyPair) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.as_x509_name()?,
            key,
        };
        self_issuer.issue(cert_info, params::Validity::for_days(365))
    }
}

impl PartialEq for Certificate {
    /// Certificates are equal when their DER encodings are. Certificates
    /// that cannot be encoded yet are compared field by field.
    fn eq(&self, other: &Self) -> bool {
        match (self.to_der(), other.to_der()) {
            (Ok(a), Ok(b)) => a == b,
            _ => {
                self.tbs == other.tbs
                    && self.signature_algorithm == other.signature_algorithm
                    && self.signature == other.signature
            }
        }
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.tbs.subject.to_string())
            .field("issuer", &self.tbs.issuer.to_string())
            .field("serial", &self.tbs.serial_number.to_string())
            .field("not_before", &self.not_before())
            .field("not_after", &self.not_after())
            .finish()
    }
}

// Helper struct for self-signed certificates
struct SelfIssuer<'a> {
    name: Name,
    key: &'a KeyPair,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Result<Name> {
        Ok(self.name.clone())
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// A certificate together with the private key of its subject, able to
/// issue certificates below it.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Result<Name> {
        // The name of the issuer is the subject of the certificate
        Ok(self.cert.subject())
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }
}
