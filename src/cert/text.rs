use std::fmt::{self, Write};

use const_oid::ObjectIdentifier;
use const_oid::db::DB;
use num_bigint::{BigInt, Sign};
use time::OffsetDateTime;

use super::Certificate;
use crate::tbs_certificate::datetime_from_time;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Registered name of `oid`, or its dotted form.
pub(crate) fn oid_name(oid: &ObjectIdentifier) -> String {
    DB.by_oid(oid)
        .map(str::to_string)
        .unwrap_or_else(|| oid.to_string())
}

pub(super) fn render(cert: &Certificate) -> Result<String, fmt::Error> {
    let tbs = &cert.tbs;
    let mut out = String::new();

    writeln!(out, "Certificate:")?;
    writeln!(out, "    Data:")?;
    let version = cert.version();
    writeln!(out, "        Version: {} (0x{version:x})", version + 1)?;
    write_serial(&mut out, &tbs.serial_number)?;
    writeln!(
        out,
        "        Signature Algorithm: {}",
        cert.signature_algorithm().as_deref().unwrap_or("NULL")
    )?;
    writeln!(out, "        Issuer: {}", tbs.issuer)?;
    writeln!(out, "        Validity")?;
    writeln!(out, "            Not Before: {}", format_time(tbs.not_before.as_ref()))?;
    writeln!(out, "            Not After : {}", format_time(tbs.not_after.as_ref()))?;
    writeln!(out, "        Subject: {}", tbs.subject)?;

    writeln!(out, "        Subject Public Key Info:")?;
    match &tbs.subject_public_key_info {
        Some(spki) => {
            writeln!(
                out,
                "            Public Key Algorithm: {}",
                oid_name(&spki.algorithm.oid)
            )?;
            write_hex(&mut out, spki.subject_public_key.raw_bytes(), 16)?;
        }
        None => writeln!(out, "            Public Key Algorithm: NULL")?,
    }

    if !tbs.extensions.is_empty() {
        writeln!(out, "        X509v3 extensions:")?;
        for extension in tbs.extensions.iter() {
            let critical = if extension.critical { " critical" } else { "" };
            writeln!(
                out,
                "            {}:{critical}",
                oid_name(&extension.extn_id)
            )?;
            write_hex(&mut out, extension.extn_value.as_bytes(), 16)?;
        }
    }

    match (&cert.signature_algorithm, &cert.signature) {
        (Some(algorithm), Some(signature)) => {
            writeln!(out, "    Signature Algorithm: {}", oid_name(&algorithm.oid))?;
            writeln!(out, "    Signature Value:")?;
            write_hex(&mut out, signature.raw_bytes(), 8)?;
        }
        _ => writeln!(out, "    Signature Algorithm: NULL")?,
    }

    Ok(out)
}

fn write_serial(out: &mut String, serial: &BigInt) -> fmt::Result {
    if let Ok(small) = u64::try_from(serial) {
        return writeln!(out, "        Serial Number: {small} (0x{small:x})");
    }
    let (sign, magnitude) = serial.to_bytes_be();
    let negative = if sign == Sign::Minus { " (Negative)" } else { "" };
    writeln!(out, "        Serial Number:{negative}")?;
    write_hex(out, &magnitude, 12)
}

/// Colon-separated hex, 15 bytes per line.
fn write_hex(out: &mut String, bytes: &[u8], indent: usize) -> fmt::Result {
    let chunks: Vec<&[u8]> = bytes.chunks(15).collect();
    for (i, chunk) in chunks.iter().enumerate() {
        write!(out, "{:indent$}", "")?;
        let line: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        write!(out, "{}", line.join(":"))?;
        if i + 1 < chunks.len() {
            write!(out, ":")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn format_time(time: Option<&x509_cert::time::Time>) -> String {
    match time {
        Some(time) => format_openssl_time(datetime_from_time(time)),
        None => "NULL".to_string(),
    }
}

/// `Jan  1 00:00:00 2024 GMT`
fn format_openssl_time(datetime: OffsetDateTime) -> String {
    let month = MONTHS[usize::from(u8::from(datetime.month())) - 1];
    format!(
        "{month} {:>2} {:02}:{:02}:{:02} {} GMT",
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second(),
        datetime.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openssl_time_format() {
        let datetime = OffsetDateTime::from_unix_timestamp(1_704_067_200).unwrap();
        assert_eq!(format_openssl_time(datetime), "Jan  1 00:00:00 2024 GMT");
    }

    #[test]
    fn test_wide_and_negative_serials_print_as_hex() {
        let mut out = String::new();
        write_serial(&mut out, &BigInt::from(-2)).unwrap();
        assert_eq!(out, "        Serial Number: (Negative)\n            02\n");

        let mut out = String::new();
        write_serial(&mut out, &BigInt::from(4096)).unwrap();
        assert_eq!(out, "        Serial Number: 4096 (0x1000)\n");
    }

    #[test]
    fn test_unknown_oid_is_dotted() {
        let oid = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.99999.1");
        assert_eq!(oid_name(&oid), "1.3.6.1.4.1.99999.1");
    }
}
