use std::fmt;
use std::str::FromStr;

use const_oid::AssociatedOid;
use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::cert::{Result, SignatureAlgorithm};
use crate::error::X509KitError;
use crate::key::{KeyPair, PublicKey};

/// Message digests usable for certificate signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Resolves a digest by name. Matching ignores case and dashes, so
    /// `"SHA256"`, `"sha256"` and `"SHA-256"` are the same digest.
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "SHA256" => Ok(DigestAlgorithm::Sha256),
            "SHA384" => Ok(DigestAlgorithm::Sha384),
            "SHA512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(X509KitError::SignError(format!(
                "sign: unsupported digest algorithm {name:?}"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sha384 => "SHA384",
            DigestAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Hashes `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = X509KitError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scalar sizes in bytes, used to pad short ECDSA digests.
const P256_FIELD_LEN: usize = 32;
const P384_FIELD_LEN: usize = 48;
const P521_FIELD_LEN: usize = 66;

/// Signs `data` with `key` under `algorithm`.
///
/// ECDSA signatures are returned DER-encoded, as X.509 requires. The SHA-1
/// algorithms are refused.
pub fn sign_data(data: &[u8], key: &KeyPair, algorithm: SignatureAlgorithm) -> Result<Vec<u8>> {
    let mismatch = || {
        X509KitError::SignError(format!(
            "sign: {algorithm:?} cannot be produced with this key type"
        ))
    };
    let failed = |e: ecdsa::Error| X509KitError::SignError(format!("sign: {e}"));

    match key {
        KeyPair::Rsa { private, .. } => match algorithm {
            SignatureAlgorithm::Sha256WithRSA => rsa_sign::<Sha256>(private, data),
            SignatureAlgorithm::Sha384WithRSA => rsa_sign::<Sha384>(private, data),
            SignatureAlgorithm::Sha512WithRSA => rsa_sign::<Sha512>(private, data),
            _ => Err(mismatch()),
        },
        KeyPair::EcdsaP256 { signing_key, .. } => {
            let digest = ecdsa_digest(algorithm).ok_or_else(mismatch)?;
            let prehash = pad_prehash(digest.digest(data), P256_FIELD_LEN);
            let signature: p256::ecdsa::Signature =
                signing_key.sign_prehash(&prehash).map_err(failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::EcdsaP384 { signing_key, .. } => {
            let digest = ecdsa_digest(algorithm).ok_or_else(mismatch)?;
            let prehash = pad_prehash(digest.digest(data), P384_FIELD_LEN);
            let signature: p384::ecdsa::Signature =
                signing_key.sign_prehash(&prehash).map_err(failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::EcdsaP521 { secret_key, .. } => {
            let digest = ecdsa_digest(algorithm).ok_or_else(mismatch)?;
            let prehash = pad_prehash(digest.digest(data), P521_FIELD_LEN);
            let signing_key =
                p521::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes()).map_err(failed)?;
            let signature: p521::ecdsa::Signature =
                signing_key.sign_prehash(&prehash).map_err(failed)?;
            Ok(signature.to_der().as_bytes().to_vec())
        }
        KeyPair::Ed25519 { signing_key } => {
            if algorithm != SignatureAlgorithm::Ed25519 {
                return Err(mismatch());
            }
            let signature = signing_key.try_sign(data).map_err(failed)?;
            Ok(signature.to_bytes().to_vec())
        }
    }
}

/// Checks `signature` over `data` against `key`.
///
/// Returns `false` for a signature that does not match, cannot be parsed,
/// or was made with an algorithm this key type cannot verify. Legacy SHA-1
/// signatures are checked like any other.
pub fn verify_data(
    data: &[u8],
    signature: &[u8],
    key: &PublicKey,
    algorithm: SignatureAlgorithm,
) -> bool {
    match key {
        PublicKey::Rsa(public) => match algorithm {
            SignatureAlgorithm::Sha256WithRSA => rsa_verify::<Sha256>(public, data, signature),
            SignatureAlgorithm::Sha384WithRSA => rsa_verify::<Sha384>(public, data, signature),
            SignatureAlgorithm::Sha512WithRSA => rsa_verify::<Sha512>(public, data, signature),
            SignatureAlgorithm::Sha1WithRSA => rsa_verify::<Sha1>(public, data, signature),
            _ => false,
        },
        PublicKey::EcdsaP256(verifying_key) => {
            let Some(prehash) = ecdsa_verify_prehash(algorithm, data, P256_FIELD_LEN) else {
                return false;
            };
            let Ok(signature) = p256::ecdsa::Signature::from_der(signature) else {
                return false;
            };
            verifying_key.verify_prehash(&prehash, &signature).is_ok()
        }
        PublicKey::EcdsaP384(verifying_key) => {
            let Some(prehash) = ecdsa_verify_prehash(algorithm, data, P384_FIELD_LEN) else {
                return false;
            };
            let Ok(signature) = p384::ecdsa::Signature::from_der(signature) else {
                return false;
            };
            verifying_key.verify_prehash(&prehash, &signature).is_ok()
        }
        PublicKey::EcdsaP521(public_key) => {
            let Some(prehash) = ecdsa_verify_prehash(algorithm, data, P521_FIELD_LEN) else {
                return false;
            };
            let Ok(verifying_key) =
                p521::ecdsa::VerifyingKey::from_sec1_bytes(&public_key.to_sec1_bytes())
            else {
                return false;
            };
            let Ok(signature) = p521::ecdsa::Signature::from_der(signature) else {
                return false;
            };
            verifying_key.verify_prehash(&prehash, &signature).is_ok()
        }
        PublicKey::Ed25519(verifying_key) => {
            if algorithm != SignatureAlgorithm::Ed25519 {
                return false;
            }
            let Ok(signature) = ed25519_dalek::Signature::from_slice(signature) else {
                return false;
            };
            verifying_key.verify(data, &signature).is_ok()
        }
    }
}

fn ecdsa_digest(algorithm: SignatureAlgorithm) -> Option<DigestAlgorithm> {
    match algorithm {
        SignatureAlgorithm::Sha256WithECDSA => Some(DigestAlgorithm::Sha256),
        SignatureAlgorithm::Sha384WithECDSA => Some(DigestAlgorithm::Sha384),
        SignatureAlgorithm::Sha512WithECDSA => Some(DigestAlgorithm::Sha512),
        _ => None,
    }
}

/// Digest for checking an ECDSA signature, SHA-1 included.
fn ecdsa_verify_prehash(
    algorithm: SignatureAlgorithm,
    data: &[u8],
    field_len: usize,
) -> Option<Vec<u8>> {
    let digest = match algorithm {
        SignatureAlgorithm::Sha1WithECDSA => Sha1::digest(data).to_vec(),
        other => ecdsa_digest(other)?.digest(data),
    };
    Some(pad_prehash(digest, field_len))
}

/// Left-pads a digest shorter than the curve's scalar with zeros. The
/// integer value is unchanged, and the ECDSA prehash traits refuse digests
/// under half the scalar size (SHA-1 on P-384, SHA-256 on P-521).
fn pad_prehash(digest: Vec<u8>, field_len: usize) -> Vec<u8> {
    if digest.len() >= field_len {
        return digest;
    }
    let mut padded = vec![0u8; field_len - digest.len()];
    padded.extend_from_slice(&digest);
    padded
}

fn rsa_sign<D>(private: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>>
where
    D: Digest + AssociatedOid,
{
    let signing_key = RsaSigningKey::<D>::new(private.clone());
    let signature = signing_key
        .try_sign(data)
        .map_err(|e| X509KitError::SignError(format!("sign: {e}")))?;
    Ok(signature.to_vec())
}

fn rsa_verify<D>(public: &RsaPublicKey, data: &[u8], signature: &[u8]) -> bool
where
    D: Digest + AssociatedOid,
{
    let Ok(signature) = RsaSignature::try_from(signature) else {
        return false;
    };
    RsaVerifyingKey::<D>::new(public.clone())
        .verify(data, &signature)
        .is_ok()
}
