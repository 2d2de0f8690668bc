use std::fs::File;

use x509kit::cert::extensions::ExtendedKeyUsageOption;
use x509kit::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use x509kit::cert::{Certificate, CertificateWithPrivateKey};
use x509kit::issuer::Issuer;
use x509kit::key::{KeyPair, PublicKey};
use x509kit::loader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Self-signed CA on P-384
    let ca_key = KeyPair::generate_ecdsa_p384();
    let ca_info = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("My Test CA".to_string())
                .organization("Example Corp".to_string())
                .build(),
        )
        .subject_public_key(PublicKey::from_key_pair(&ca_key))
        .is_ca(true)
        .build();
    let ca = CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&ca_info, &ca_key)?,
        key: ca_key,
    };

    // Server certificate issued by the CA
    let server_key = KeyPair::generate_ed25519();
    let server_info = CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name("myserver.local".to_string())
                .build(),
        )
        .subject_public_key(PublicKey::from_key_pair(&server_key))
        .usages(vec![ExtendedKeyUsageOption::ServerAuth])
        .build();
    let server = ca.issue(&server_info, Validity::for_days(825))?;

    // Write the bundle leaf first, with a comment line the loader skips
    let bundle = format!(
        "# myserver.local chain\n{}{}",
        server.to_pem()?,
        ca.cert.to_pem()?
    );
    let path = std::env::temp_dir().join("x509kit-bundle.pem");
    std::fs::write(&path, &bundle)?;
    println!("Wrote {}", path.display());

    let loaded = loader::load_from_reader(File::open(&path)?)?;
    println!("Loaded {} certificates", loaded.len());

    let [leaf, root] = loaded.as_slice() else {
        return Err(format!("expected 2 certificates, got {}", loaded.len()).into());
    };
    println!("{}: verified by CA = {}", leaf.subject(), leaf.verify(&root.public_key()?)?);
    println!("{}: self-signed = {}", root.subject(), root.verify(&root.public_key()?)?);

    println!("{}", leaf.to_text()?);
    Ok(())
}
