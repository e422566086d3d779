// Shared helpers for integration tests: throwaway PKI and loopback servers

#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod, SslVersion};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509, X509NameBuilder, X509Ref};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tlsprobe::protocols::handshake::{
    CONTENT_TYPE_HANDSHAKE, HANDSHAKE_CERTIFICATE, HANDSHAKE_SERVER_HELLO,
    HANDSHAKE_SERVER_HELLO_DONE,
};
use tlsprobe::utils::network::Target;

pub struct Pki {
    pub ca: X509,
    pub leaf: X509,
    pub leaf_key: PKey<Private>,
}

impl Pki {
    /// CA plus a leaf valid for localhost and 127.0.0.1
    pub fn generate() -> Self {
        let ca_key = ec_key();
        let ca = cert("Integration Root", &ca_key, None);
        let leaf_key = ec_key();
        let leaf = cert("localhost", &leaf_key, Some((&*ca, &ca_key)));
        Self { ca, leaf, leaf_key }
    }

    pub fn ca_der(&self) -> Vec<u8> {
        self.ca.to_der().unwrap()
    }

    pub fn chain_der(&self) -> Vec<Vec<u8>> {
        vec![self.leaf.to_der().unwrap(), self.ca_der()]
    }
}

fn ec_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn cert(cn: &str, key: &PKey<Private>, issuer: Option<(&X509Ref, &PKey<Private>)>) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", cn).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(rand::random::<u32>() >> 1).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some((issuer_cert, _)) => builder.set_issuer_name(issuer_cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(key).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();

    match issuer {
        None => {
            builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap();
        }
        Some((issuer_cert, _)) => {
            let san = SubjectAlternativeName::new()
                .dns("localhost")
                .ip("127.0.0.1")
                .build(&builder.x509v3_context(Some(issuer_cert), None))
                .unwrap();
            builder.append_extension(san).unwrap();
        }
    }

    let signer = issuer.map(|(_, k)| k).unwrap_or(key);
    builder.sign(signer, MessageDigest::sha256()).unwrap();
    builder.build()
}

pub fn loopback(port: u16) -> Target {
    Target::with_addresses("127.0.0.1", port, vec!["127.0.0.1".parse().unwrap()])
}

/// Modern OpenSSL server (TLS 1.2 only) accepting any number of connections
pub fn spawn_tls12_server(pki: &Pki) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&pki.leaf_key).unwrap();
    acceptor.set_certificate(&pki.leaf).unwrap();
    acceptor.add_extra_chain_cert(pki.ca.clone()).unwrap();
    acceptor.set_min_proto_version(Some(SslVersion::TLS1_2)).unwrap();
    acceptor.set_max_proto_version(Some(SslVersion::TLS1_2)).unwrap();
    let acceptor = Arc::new(acceptor.build());

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let acceptor = Arc::clone(&acceptor);
            thread::spawn(move || {
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                if let Ok(mut tls) = acceptor.accept(stream) {
                    let _ = tls.shutdown();
                }
            });
        }
    });
    port
}

fn record(body: &[u8]) -> Vec<u8> {
    let mut record = vec![CONTENT_TYPE_HANDSHAKE, 0x03, 0x00];
    record.extend_from_slice(&(body.len() as u16).to_be_bytes());
    record.extend_from_slice(body);
    record
}

/// ServerHello, Certificate and ServerHelloDone as an SSLv3 server sends them
pub fn sslv3_flight(pki: &Pki, suite: u16) -> Vec<u8> {
    let mut hello = vec![HANDSHAKE_SERVER_HELLO, 0x00, 0x00, 0x00, 0x03, 0x00];
    hello.extend_from_slice(&[0x5a; 32]);
    hello.push(0);
    hello.extend_from_slice(&suite.to_be_bytes());
    hello.push(0);
    hello[3] = (hello.len() - 4) as u8;

    let mut list = Vec::new();
    for der in pki.chain_der() {
        list.extend_from_slice(&(der.len() as u32).to_be_bytes()[1..]);
        list.extend_from_slice(&der);
    }
    let mut certificate = vec![HANDSHAKE_CERTIFICATE];
    certificate.extend_from_slice(&((list.len() + 3) as u32).to_be_bytes()[1..]);
    certificate.extend_from_slice(&(list.len() as u32).to_be_bytes()[1..]);
    certificate.extend_from_slice(&list);

    let mut flight = record(&hello);
    flight.extend_from_slice(&record(&certificate));
    flight.extend_from_slice(&record(&[HANDSHAKE_SERVER_HELLO_DONE, 0x00, 0x00, 0x00]));
    flight
}

/// Server that answers every hello with the same bytes, then waits for the
/// client to hang up
pub fn spawn_canned_server(reply: Vec<u8>) -> u16 {
    let reply = Arc::new(reply);
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let reply = Arc::clone(&reply);
            thread::spawn(move || answer(stream, &reply));
        }
    });
    port
}

fn answer(mut stream: TcpStream, reply: &[u8]) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(3)));
    let mut buf = [0u8; 4096];
    if !matches!(stream.read(&mut buf), Ok(n) if n > 0) {
        return;
    }
    let _ = stream.write_all(reply);
    while matches!(stream.read(&mut buf), Ok(n) if n > 0) {}
}

/// A port with nothing listening on it
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
