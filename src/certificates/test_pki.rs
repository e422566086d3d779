// Test PKI - Throwaway CA and server certificates generated per test

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{BasicConstraints, KeyUsage, SubjectAlternativeName};
use openssl::x509::{X509, X509NameBuilder, X509Ref};
use std::sync::atomic::{AtomicU32, Ordering};

static SERIAL: AtomicU32 = AtomicU32::new(1);

pub struct TestPki {
    pub ca: X509,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl TestPki {
    /// CA "Test Root CA" and a leaf for `hostname` signed by it
    pub fn generate(hostname: &str) -> Self {
        let ca_key = ec_key();
        let ca = build_cert("Test Root CA", &ca_key, None, true);
        let leaf_key = ec_key();
        let leaf = build_cert(hostname, &leaf_key, Some((&*ca, &ca_key)), false);
        Self { ca, leaf, leaf_key }
    }

    pub fn ca_der(&self) -> Vec<u8> {
        self.ca.to_der().unwrap()
    }

    pub fn leaf_der(&self) -> Vec<u8> {
        self.leaf.to_der().unwrap()
    }

    /// Leaf then CA, the order servers send
    pub fn chain_der(&self) -> Vec<Vec<u8>> {
        vec![self.leaf_der(), self.ca_der()]
    }
}

pub fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

/// Self-signed when `issuer` is `None`
pub fn build_cert(
    common_name: &str,
    key: &PKey<Private>,
    issuer: Option<(&X509Ref, &PKey<Private>)>,
    ca: bool,
) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(SERIAL.fetch_add(1, Ordering::SeqCst))
        .unwrap()
        .to_asn1_integer()
        .unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    builder
        .set_not_before(&Asn1Time::from_unix(now - 3600).unwrap())
        .unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();

    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
        builder
            .append_extension(KeyUsage::new().key_cert_sign().crl_sign().build().unwrap())
            .unwrap();
    } else {
        let san = SubjectAlternativeName::new()
            .dns(common_name)
            .build(&builder.x509v3_context(issuer.map(|(c, _)| c), None))
            .unwrap();
        builder.append_extension(san).unwrap();
    }

    let signer = issuer.map(|(_, k)| k).unwrap_or(key);
    builder.sign(signer, MessageDigest::sha256()).unwrap();
    builder.build()
}
