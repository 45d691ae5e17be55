//! Integration test harness for the Parley server.
//!
//! Spins up a real server in-process (fresh database, self-signed
//! certificate, loopback TCP listener) and provides a minimal TLS
//! client speaking the framed protocol. The end-to-end scenarios live
//! in `tests/`.
//!
//! Run them all:
//! ```sh
//! cargo test -p parley-integration-tests
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parley_crypto::cipher::MessageCipher;
use parley_proto::frame;
use parley_proto::message::{ClientMessage, ServerMessage};
use parley_proto::payload::{LoginPayload, MyInfoPayload, RegisterPayload};
use parley_server::state::ServerState;
use parley_server::{dispatch, tls};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsConnector;

static NEXT_HARNESS_ID: AtomicU32 = AtomicU32::new(0);

/// How long a test waits for an expected packet before failing.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a test waits to conclude that no packet is coming.
pub const QUIET_TIMEOUT: Duration = Duration::from_millis(300);

/// A running in-process server.
pub struct TestServer {
    pub addr: SocketAddr,
    scratch_dir: PathBuf,
}

impl TestServer {
    /// Start a server on an ephemeral loopback port with a fresh
    /// database and a self-signed certificate.
    pub async fn start() -> anyhow::Result<Self> {
        let scratch_dir = std::env::temp_dir().join(format!(
            "parley-it-{}-{}",
            std::process::id(),
            NEXT_HARNESS_ID.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&scratch_dir)?;

        let key_pair = rcgen::KeyPair::generate()?;
        let params = rcgen::CertificateParams::new(vec!["localhost".to_string()])?;
        let cert = params.self_signed(&key_pair)?;

        let cert_path = scratch_dir.join("server.crt");
        let key_path = scratch_dir.join("server.key");
        std::fs::write(&cert_path, cert.pem())?;
        std::fs::write(&key_path, key_pair.serialize_pem())?;

        let acceptor = tls::load_acceptor(&cert_path, &key_path)?;
        let db = parley_db::open(&scratch_dir.join("parley.db"))?;
        let cipher = MessageCipher::from_passphrase("integration test key");
        let state = Arc::new(ServerState::new(db, cipher));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(dispatch::serve(listener, acceptor, state));

        Ok(Self { addr, scratch_dir })
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.scratch_dir);
    }
}

/// A minimal conforming client: TLS to the loopback server, framed
/// packets, typed messages.
pub struct TestClient {
    stream: tokio_rustls::client::TlsStream<TcpStream>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let provider = rustls::crypto::ring::default_provider();
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(TrustAnyCert))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let tcp = TcpStream::connect(addr).await?;
        let name = rustls::pki_types::ServerName::try_from("localhost".to_string())?;
        let stream = connector.connect(name, tcp).await?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> anyhow::Result<()> {
        let (msg_type, payload) = msg.encode();
        frame::write_frame(&mut self.stream, msg_type, &payload).await?;
        Ok(())
    }

    /// Receive the next packet, failing the test if none arrives within
    /// [`RECV_TIMEOUT`].
    pub async fn recv(&mut self) -> anyhow::Result<ServerMessage> {
        let (msg_type, payload) =
            tokio::time::timeout(RECV_TIMEOUT, frame::read_frame(&mut self.stream)).await??;
        Ok(ServerMessage::decode(msg_type, &payload)?)
    }

    /// Assert that no packet arrives within [`QUIET_TIMEOUT`].
    pub async fn expect_silence(&mut self) -> anyhow::Result<()> {
        match tokio::time::timeout(QUIET_TIMEOUT, frame::read_frame(&mut self.stream)).await {
            Err(_elapsed) => Ok(()),
            Ok(Ok((msg_type, _))) => {
                anyhow::bail!("expected silence, got a packet of type {msg_type}")
            }
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Register an account on a throwaway connection.
    pub async fn register(&mut self, email: &str, username: &str, password: &str) -> anyhow::Result<ServerMessage> {
        self.send(&ClientMessage::Register(RegisterPayload {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }))
        .await?;
        self.recv().await
    }

    /// Log in, returning the account info from `LOGIN_SUCCESS`.
    pub async fn login(&mut self, email: &str, password: &str) -> anyhow::Result<MyInfoPayload> {
        self.send(&ClientMessage::Login(LoginPayload {
            email: email.into(),
            password: password.into(),
        }))
        .await?;
        match self.recv().await? {
            ServerMessage::LoginSuccess(info) => Ok(info),
            other => anyhow::bail!("expected LoginSuccess, got {other:?}"),
        }
    }
}

/// Register an account and return a logged-in client plus its info.
pub async fn login_fresh_user(
    addr: SocketAddr,
    email: &str,
    username: &str,
) -> anyhow::Result<(TestClient, MyInfoPayload)> {
    let mut registrar = TestClient::connect(addr).await?;
    let response = registrar.register(email, username, "pw1").await?;
    anyhow::ensure!(
        response == ServerMessage::RegisterSuccess,
        "registration failed for {username}"
    );
    drop(registrar);

    let mut client = TestClient::connect(addr).await?;
    let info = client.login(email, "pw1").await?;
    Ok((client, info))
}

/// TLS verifier that accepts any server certificate. The harness talks
/// only to its own in-process server over loopback; certificate trust
/// is exercised separately by the TLS bootstrap tests.
#[derive(Debug)]
struct TrustAnyCert;

impl rustls::client::danger::ServerCertVerifier for TrustAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
