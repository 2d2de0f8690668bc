use der::flagset::FlagSet;
use num_bigint::{BigInt, Sign};
use sha1::{Digest, Sha1};
use x509_cert::name::Name;

use crate::cert::extensions::AuthorityKeyIdentifier;
use crate::cert::extensions::BasicConstraints;
use crate::cert::extensions::ExtendedKeyUsage;
use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::cert::extensions::KeyUsage;
use crate::cert::extensions::KeyUsages;
use crate::cert::extensions::SubjectKeyIdentifier;
use crate::cert::params::Validity;
use crate::cert::params::{CertificationRequestInfo, ExtensionParam};
use crate::cert::{Certificate, Result};
use crate::key::KeyPair;

/// Represents an entity capable of issuing certificates.
///
/// This trait provides methods to retrieve issuer details and issue certificates.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Result<Name>;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Issues a v3 certificate based on the provided certification request information.
    ///
    /// The certificate gets a random 128-bit serial, subject and authority
    /// key identifiers, basic constraints, and key usages derived from the
    /// request. It is signed with the issuer key's default digest.
    ///
    /// # Arguments
    /// * `cert_request` - The certification request information containing details about the certificate to be issued.
    /// * `validity` - The validity period.
    ///
    /// # Returns
    /// A `Certificate` object representing the issued certificate.
    fn issue(
        &self,
        cert_request: &CertificationRequestInfo,
        validity: Validity,
    ) -> Result<Certificate> {
        let issuer_spki = self.signing_key().as_spki()?;
        let authority_key_id = Sha1::digest(issuer_spki.subject_public_key.raw_bytes());
        let subject_spki = cert_request.subject_public_key.to_spki()?;
        let subject_key_id = Sha1::digest(subject_spki.subject_public_key.raw_bytes());

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: None,
        };
        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: authority_key_id.to_vec(),
            ..Default::default()
        };

        let mut extensions: Vec<ExtensionParam> = vec![
            ExtensionParam::from_extension(basic_constraints, true)?,
            ExtensionParam::from_extension(SubjectKeyIdentifier(subject_key_id.to_vec()), false)?,
            ExtensionParam::from_extension(authority_key_id, false)?,
        ];

        let mut key_usage_flags: FlagSet<KeyUsages> = FlagSet::empty();

        if cert_request.is_ca {
            key_usage_flags |= KeyUsages::KeyCertSign;
            key_usage_flags |= KeyUsages::CRLSign;
        }

        for usage in &cert_request.usages {
            match usage {
                ExtendedKeyUsageOption::ClientAuth
                | ExtendedKeyUsageOption::ServerAuth
                | ExtendedKeyUsageOption::EmailProtection => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                    key_usage_flags |= KeyUsages::KeyEncipherment;
                }
                ExtendedKeyUsageOption::CodeSigning
                | ExtendedKeyUsageOption::TimeStamping
                | ExtendedKeyUsageOption::OcspSigning => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                }
            }
        }

        if !key_usage_flags.is_empty() {
            extensions.push(ExtensionParam::from_extension(
                KeyUsage(key_usage_flags),
                true,
            )?);
        }

        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage {
                usage: cert_request.usages.clone(),
            };
            extensions.push(ExtensionParam::from_extension(extended_key_usage, false)?);
        }

        let combined_extensions: Vec<ExtensionParam> = cert_request
            .extensions
            .iter()
            .cloned()
            .chain(extensions)
            .collect();

        let mut cert = Certificate::new();
        cert.set_version(2)?;
        cert.set_serial_number(random_serial_number())?;
        cert.set_issuer(&self.issuer_name()?);
        cert.set_subject(&cert_request.subject.as_x509_name()?);
        cert.set_not_before(validity.not_before)?;
        cert.set_not_after(validity.not_after)?;
        cert.set_public_key(&cert_request.subject_public_key)?;
        cert.set_extensions(&combined_extensions)?;
        cert.sign(self.signing_key(), None)?;

        log::debug!("issue: issued certificate for {}", cert.subject());
        Ok(cert)
    }
}

/// A positive 128-bit serial number with the top byte's high bit clear.
fn random_serial_number() -> BigInt {
    let mut bytes: [u8; 16] = rand::random();
    bytes[0] = (bytes[0] & 0x7f) | 0x01;
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_serial_is_positive_and_wide() {
        for _ in 0..32 {
            let serial = random_serial_number();
            assert_eq!(serial.sign(), Sign::Plus);
            assert!(serial.bits() > 64);
            assert!(serial.bits() <= 127);
        }
    }
}
