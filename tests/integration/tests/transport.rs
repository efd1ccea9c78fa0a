//! Real transport against local sockets.

use std::sync::Arc;

use dc_core::TlsSettings;
use dc_ldap::{ConnectionEstablisher, EncryptionMethod, Endpoint, Ldap3Connector, OutcomeKind};

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn establisher(tls: TlsSettings) -> ConnectionEstablisher {
    ConnectionEstablisher::new(Arc::new(Ldap3Connector::new()), tls)
}

#[tokio::test]
async fn tls_to_refused_port_cannot_connect() {
    let port = closed_port();

    let outcome = establisher(TlsSettings::default())
        .connect(&Endpoint::new("127.0.0.1", port, EncryptionMethod::Tls))
        .await;

    assert_eq!(outcome.kind(), OutcomeKind::CannotConnect);
}

#[tokio::test]
async fn plain_to_refused_port_cannot_connect() {
    let port = closed_port();

    let outcome = establisher(TlsSettings::default())
        .connect(&Endpoint::new("127.0.0.1", port, EncryptionMethod::None))
        .await;

    assert_eq!(outcome.kind(), OutcomeKind::CannotConnect);
}

#[tokio::test]
async fn unknown_protocol_cannot_configure() {
    let tls = TlsSettings {
        protocols: Some(vec!["SSLv2".to_string()]),
        ..TlsSettings::default()
    };

    let outcome = establisher(tls)
        .connect(&Endpoint::new("127.0.0.1", closed_port(), EncryptionMethod::Tls))
        .await;

    assert_eq!(outcome.kind(), OutcomeKind::CannotConfigure);
}
