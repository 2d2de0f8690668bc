#![allow(dead_code)]

use num_bigint::BigInt;
use time::OffsetDateTime;
use x509kit::cert::extensions::ExtendedKeyUsageOption;
use x509kit::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use x509kit::cert::{Certificate, CertificateWithPrivateKey};
use x509kit::issuer::Issuer;
use x509kit::key::{KeyPair, PublicKey};

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let ca_key = KeyPair::generate_ecdsa_p256();

    let subject_dn = DistinguishedName::builder()
        .common_name("myca.local".to_string())
        .build();

    let subject_public_key = PublicKey::from_key_pair(&ca_key);

    let ca_cert_info = CertificationRequestInfo::builder()
        .subject(subject_dn.clone())
        .subject_public_key(subject_public_key)
        .is_ca(true)
        .extensions(vec![])
        .build();

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_cert_info, &ca_key).unwrap(),
        key: ca_key,
    }
}

/// Issues a CA or leaf certificate below `issuer`.
pub fn issue(issuer: &CertificateWithPrivateKey, common_name: &str, is_ca: bool) -> CertificateWithPrivateKey {
    let key = KeyPair::generate_ecdsa_p256();
    let info = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name(common_name.to_string())
                .build(),
        )
        .subject_public_key(PublicKey::from_key_pair(&key))
        .usages(if is_ca {
            vec![]
        } else {
            vec![ExtendedKeyUsageOption::ServerAuth]
        })
        .is_ca(is_ca)
        .build();
    let cert = issuer.issue(&info, Validity::for_days(30)).unwrap();
    CertificateWithPrivateKey { cert, key }
}

/// Root, intermediate and leaf, in that order.
pub fn generate_chain() -> Vec<CertificateWithPrivateKey> {
    let root = generate_ca_cert();
    let intermediate = issue(&root, "intermediate.myca.local", true);
    let leaf = issue(&intermediate, "server.myca.local", false);
    vec![root, intermediate, leaf]
}

/// An unsigned v3 certificate with every required field set.
pub fn populated_cert(key: &KeyPair, common_name: &str) -> Certificate {
    let name = DistinguishedName::builder()
        .common_name(common_name.to_string())
        .build()
        .as_x509_name()
        .unwrap();
    let mut cert = Certificate::new();
    cert.set_version(2).unwrap();
    cert.set_serial_number(BigInt::from(1)).unwrap();
    cert.set_subject(&name);
    cert.set_issuer(&name);
    cert.set_not_before(OffsetDateTime::from_unix_timestamp(1_704_067_200).unwrap())
        .unwrap();
    cert.set_not_after(OffsetDateTime::from_unix_timestamp(1_767_225_600).unwrap())
        .unwrap();
    cert.set_public_key(&key.public_key()).unwrap();
    cert
}

pub fn pem_bundle(certs: &[Certificate]) -> String {
    certs.iter().map(|cert| cert.to_pem().unwrap()).collect()
}
