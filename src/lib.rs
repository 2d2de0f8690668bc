//! # x509kit - An X.509 Certificate Object Model in Pure Rust
//!
//! x509kit models a single X.509 certificate as an editable object and loads
//! whole certificate chains from DER or PEM data. It is built on the RustCrypto
//! `x509-cert` and `der` crates and the RustCrypto signature implementations.
//!
//! ## Supported Key Types
//!
//! - **RSA**: PKCS#1 v1.5 signatures with SHA-256, SHA-384 or SHA-512
//! - **ECDSA**: P-256, P-384 and P-521 curves
//! - **Ed25519**: Edwards curve digital signature algorithm
//!
//! Certificates signed with SHA-1 (RSA or ECDSA) can be verified but are
//! never produced.
//!
//! ## Supported Certificate Formats
//!
//! - **DER**: Distinguished Encoding Rules (binary format)
//! - **PEM**: Privacy-Enhanced Mail (base64-encoded text format), including
//!   streams that mix certificates with other blocks and free text
//! - **Text**: a human-readable dump in the style of `openssl x509 -text`
//!
//! ## Quick Start
//!
//! ### Building and Signing a Certificate
//!
//! ```rust,no_run
//! use num_bigint::BigInt;
//! use time::{Duration, OffsetDateTime};
//! use x509kit::{cert::{Certificate, params::DistinguishedName}, key::KeyPair};
//!
//! # fn main() -> Result<(), x509kit::error::X509KitError> {
//! let key = KeyPair::generate_ecdsa_p256();
//! let name = DistinguishedName::builder()
//!     .common_name("example.com".to_string())
//!     .build()
//!     .as_x509_name()?;
//!
//! let mut cert = Certificate::new();
//! cert.set_version(2)?;
//! cert.set_serial_number(BigInt::from(1))?;
//! cert.set_subject(&name);
//! cert.set_issuer(&name);
//! cert.set_not_before(OffsetDateTime::now_utc())?;
//! cert.set_not_after(OffsetDateTime::now_utc() + Duration::days(30))?;
//! cert.set_public_key(&key.public_key())?;
//! cert.sign(&key, Some("SHA256"))?;
//!
//! assert!(cert.verify(&key.public_key())?);
//! println!("{}", cert.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Loading a Certificate Chain
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = std::fs::read("chain.pem")?;
//! for cert in x509kit::loader::load(&bundle)? {
//!     println!("{}", cert.subject());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing from a CA
//!
//! ```rust,no_run
//! use x509kit::{
//!     key::{KeyPair, PublicKey},
//!     cert::{Certificate, CertificateWithPrivateKey, params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     issuer::Issuer,
//! };
//!
//! # fn main() -> Result<(), x509kit::error::X509KitError> {
//! let ca_key = KeyPair::generate_ecdsa_p256();
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("Example CA".to_string()).build())
//!     .subject_public_key(PublicKey::from_key_pair(&ca_key))
//!     .is_ca(true)
//!     .build();
//! let ca = CertificateWithPrivateKey {
//!     cert: Certificate::new_self_signed(&ca_info, &ca_key)?,
//!     key: ca_key,
//! };
//!
//! let server_key = KeyPair::generate_ed25519();
//! let server_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("server.example.com".to_string()).build())
//!     .subject_public_key(PublicKey::from_key_pair(&server_key))
//!     .build();
//! let server = ca.issue(&server_info, Validity::for_days(90))?;
//! assert!(server.verify(&ca.key.public_key())?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::X509KitError`]:
//!
//! ```rust
//! use x509kit::{loader, error::X509KitError};
//!
//! match loader::load(b"not a certificate") {
//!     Ok(certs) => println!("{} certificates", certs.len()),
//!     Err(X509KitError::FormatError(msg)) => println!("Unrecognised data: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: The certificate object, its extensions and encodings
//! - [`loader`]: Format detection and multi-certificate loading
//! - [`key`]: Key generation, import, and public key handling
//! - [`pki`]: Digest selection, signing and verification primitives
//! - [`issuer`]: Certificate issuing functionality and CA operations
//! - [`error`]: Error types
//! - [`tbs_certificate`]: The to-be-signed structure

pub mod cert;
pub mod error;
pub mod issuer;
pub mod key;
pub mod loader;
pub mod pki;
pub mod tbs_certificate;
