//! Exposes an in-process test server for use in integration tests.
//!
//! ```
//! use filestore_test::server::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestServer::new().await;
//!    let url = server.url("/health");
//!    // use the URL in tests...
//! }
//! ```

use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpListener};

use filestore_server::config::{Auth, Config, ConfigSecret, SessionKey, Storage};
use filestore_server::state::Services;
use filestore_server::web::App;
use secrecy::SecretBox;
use tempfile::TempDir;

use crate::session::{SIGNING_KID, SIGNING_PUBLIC_KEY};

/// The privileged API key accepted by the test server.
pub const TEST_API_KEY: &str = "test-api-key";

/// An in-process test server for use in integration tests.
///
/// This server runs the full filestore service using a temporary directory for storage, which is
/// deleted when the server is dropped. It listens on a random available port on localhost.
///
/// It accepts [`TEST_API_KEY`] as privileged credentials, and session tokens signed with the
/// helpers in [`crate::session`].
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    _tempdir: TempDir,
}

impl TestServer {
    /// Starts a test server with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Starts a test server with the given configuration.
    ///
    /// The address, storage, and credentials of `config` are replaced.
    pub async fn with_config(mut config: Config) -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let tempdir = tempfile::tempdir().unwrap();
        let key_file = tempdir.path().join("session-key.pem");
        std::fs::write(&key_file, SIGNING_PUBLIC_KEY).unwrap();

        config.http_addr = socket;
        config.storage = Storage::FileSystem {
            path: tempdir.path().join("files"),
        };
        config.auth = Auth {
            api_keys: BTreeMap::from([(
                "test".into(),
                SecretBox::new(Box::new(ConfigSecret::from(TEST_API_KEY))),
            )]),
            session_keys: BTreeMap::from([(
                SIGNING_KID.into(),
                SessionKey {
                    key_files: vec![key_file],
                },
            )]),
        };

        let state = Services::spawn(config).await.unwrap();
        let app = App::new(state);

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            app.serve(listener).await.unwrap();
        });

        Self {
            handle,
            socket,
            _tempdir: tempdir,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://localhost:{}/{}", self.socket.port(), path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
