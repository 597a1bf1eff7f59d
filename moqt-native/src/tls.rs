use anyhow::Context;
use clap::Parser;
use ring::digest::{digest, SHA256};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::RootCertStore;
use std::fs;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Clone, Default)]
pub struct Args {
    /// The certificate chain, encoded as PEM.
    #[arg(long = "tls-cert")]
    pub cert: Option<PathBuf>,

    /// The private key, encoded as PEM.
    #[arg(long = "tls-key")]
    pub key: Option<PathBuf>,

    /// Additional root certificates, encoded as PEM.
    #[arg(long = "tls-root")]
    pub root: Vec<PathBuf>,

    /// Danger: disable server certificate verification.
    #[arg(long = "tls-disable-verify")]
    pub disable_verify: bool,
}

pub struct Config {
    pub client: rustls::ClientConfig,
    pub server: Option<rustls::ServerConfig>,

    /// Hex-encoded SHA-256 of each served certificate.
    pub fingerprints: Vec<String>,
}

impl Args {
    pub fn load(&self) -> anyhow::Result<Config> {
        let provider = Arc::new(default_provider());

        // Root certificates: the native store plus any extra --tls-root.
        let mut roots = RootCertStore::empty();
        for cert in rustls_native_certs::load_native_certs().context("failed to load native roots")?
        {
            roots.add(cert).ok();
        }
        for path in &self.root {
            for cert in load_certs(path)? {
                roots.add(cert).context("failed to add root certificate")?;
            }
        }

        let mut fingerprints = Vec::new();
        let server = match (&self.cert, &self.key) {
            (Some(cert_path), Some(key_path)) => {
                let chain = load_certs(cert_path)?;
                let key = load_key(key_path)?;

                for cert in &chain {
                    fingerprints.push(hex::encode(digest(&SHA256, cert.as_ref())));
                }

                let config = rustls::ServerConfig::builder_with_provider(provider.clone())
                    .with_protocol_versions(&[&rustls::version::TLS13])?
                    .with_no_client_auth()
                    .with_single_cert(chain, key)?;

                Some(config)
            }
            (None, None) => None,
            _ => anyhow::bail!("--tls-cert and --tls-key must be used together"),
        };

        let client = rustls::ClientConfig::builder_with_provider(provider.clone())
            .with_protocol_versions(&[&rustls::version::TLS13])?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let mut client = client;
        if self.disable_verify {
            log::warn!("TLS server certificate verification is DISABLED");
            client
                .dangerous()
                .set_certificate_verifier(Arc::new(NoCertificateVerification(provider)));
        }

        Ok(Config {
            client,
            server,
            fingerprints,
        })
    }
}

fn load_certs(path: &PathBuf) -> anyhow::Result<Vec<CertificateDer<'static>>> {
    let file = fs::File::open(path).context("failed to open certificate file")?;
    let mut reader = BufReader::new(file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to parse certificates")?;
    anyhow::ensure!(!certs.is_empty(), "no certificates in {:?}", path);

    Ok(certs)
}

fn load_key(path: &PathBuf) -> anyhow::Result<PrivateKeyDer<'static>> {
    let file = fs::File::open(path).context("failed to open key file")?;
    let mut reader = BufReader::new(file);

    rustls_pemfile::private_key(&mut reader)
        .context("failed to parse private key")?
        .context("no private key found")
}

/// Accepts any server certificate; signatures are still checked.
#[derive(Debug)]
struct NoCertificateVerification(Arc<rustls::crypto::CryptoProvider>);

impl ServerCertVerifier for NoCertificateVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        self.0
            .signature_verification_algorithms
            .supported_schemes()
    }
}
