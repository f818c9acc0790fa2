//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use portfolio_contact::config::{AppConfig, Environment};
use portfolio_contact::mail::{DispatchError, MailDispatcher, MailMessage, MailSettings, MailTransport};
use portfolio_contact::{HttpServer, Shutdown};

pub const ACCOUNT: &str = "portfolio.bot@gmail.com";
pub const SECRET: &str = "app-password-1234";
pub const OWNER: &str = "owner@example.com";

/// Transport that records messages instead of delivering them.
#[derive(Default)]
pub struct RecordingTransport {
    verify_error: Option<DispatchError>,
    sent: Mutex<Vec<MailMessage>>,
    verifications: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport whose verification always fails with `error`.
    pub fn failing(error: DispatchError) -> Arc<Self> {
        Arc::new(Self {
            verify_error: Some(error),
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}

impl MailTransport for RecordingTransport {
    fn verify(&self) -> BoxFuture<'_, Result<(), DispatchError>> {
        Box::pin(async move {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            match &self.verify_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        })
    }

    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, Result<(), DispatchError>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        })
    }
}

/// Configuration with complete mail settings, in test mode.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Test;
    config.listener.bind_address = "127.0.0.1".into();
    config.listener.port = 0;
    config.mail.user = Some(ACCOUNT.into());
    config.mail.password = Some(SECRET.into());
    config.mail.to = Some(OWNER.into());
    config.mail.timeout_secs = 2;
    config
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub transport: Arc<RecordingTransport>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `config` with deliveries going to `transport`.
pub async fn spawn_server(config: AppConfig, transport: Arc<RecordingTransport>) -> TestServer {
    let settings = MailSettings::from_config(&config.mail).expect("test config has mail settings");
    let dispatcher = MailDispatcher::with_transport(&config.mail, settings, transport.clone());
    spawn(HttpServer::with_dispatcher(config, dispatcher), transport).await
}

/// Serve `config` with the production SMTP dispatcher.
pub async fn spawn_smtp_server(config: AppConfig) -> TestServer {
    spawn(HttpServer::new(config), RecordingTransport::new()).await
}

async fn spawn(server: HttpServer, transport: Arc<RecordingTransport>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        transport,
        shutdown,
    }
}
