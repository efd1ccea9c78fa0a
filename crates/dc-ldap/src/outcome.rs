//! Typed outcomes of connect and bind attempts.
//!
//! Connection and bind failures are distinct kinds so callers can point the
//! operator at the right remediation. Only the successful kinds carry a
//! payload.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of an [`Outcome`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeKind {
    /// A transport to the directory is open.
    SuccessfulConnection,
    /// The transport is open and authenticated.
    SuccessfulBind,
    /// The socket or handshake failed.
    CannotConnect,
    /// Local TLS setup failed before any socket was opened.
    CannotConfigure,
    /// The directory rejected the bind.
    CannotBind,
}

impl OutcomeKind {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuccessfulConnection => "successfulConnection",
            Self::SuccessfulBind => "successfulBind",
            Self::CannotConnect => "cannotConnect",
            Self::CannotConfigure => "cannotConfigure",
            Self::CannotBind => "cannotBind",
        }
    }

    /// Whether this kind is one of the successful ones.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::SuccessfulConnection | Self::SuccessfulBind)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a connect or bind attempt.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Connected; carries the open connection.
    SuccessfulConnection(T),
    /// Connected and bound; carries the bound connection.
    SuccessfulBind(T),
    /// The socket or handshake failed.
    CannotConnect,
    /// Local TLS setup failed.
    CannotConfigure,
    /// The bind was rejected.
    CannotBind,
}

impl<T> Outcome<T> {
    /// Returns the kind of this outcome.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::SuccessfulConnection(_) => OutcomeKind::SuccessfulConnection,
            Self::SuccessfulBind(_) => OutcomeKind::SuccessfulBind,
            Self::CannotConnect => OutcomeKind::CannotConnect,
            Self::CannotConfigure => OutcomeKind::CannotConfigure,
            Self::CannotBind => OutcomeKind::CannotBind,
        }
    }

    /// Whether this outcome carries a payload.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.kind().is_success()
    }

    /// Borrows the payload, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::SuccessfulConnection(v) | Self::SuccessfulBind(v) => Some(v),
            _ => None,
        }
    }

    /// Takes the payload, if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::SuccessfulConnection(v) | Self::SuccessfulBind(v) => Some(v),
            _ => None,
        }
    }

    /// Re-types a failed outcome. Returns `None` for successful outcomes.
    #[must_use]
    pub fn failure<U>(&self) -> Option<Outcome<U>> {
        match self {
            Self::CannotConnect => Some(Outcome::CannotConnect),
            Self::CannotConfigure => Some(Outcome::CannotConfigure),
            Self::CannotBind => Some(Outcome::CannotBind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_only_on_success() {
        let ok: Outcome<u8> = Outcome::SuccessfulBind(7);
        assert_eq!(ok.kind(), OutcomeKind::SuccessfulBind);
        assert_eq!(ok.value(), Some(&7));
        assert_eq!(ok.into_value(), Some(7));

        let failed: Outcome<u8> = Outcome::CannotBind;
        assert!(!failed.is_success());
        assert!(failed.value().is_none());
    }

    #[test]
    fn failure_retypes_only_failures() {
        let failed: Outcome<u8> = Outcome::CannotConfigure;
        let retyped: Option<Outcome<String>> = failed.failure();
        assert_eq!(retyped.map(|o| o.kind()), Some(OutcomeKind::CannotConfigure));

        let ok: Outcome<u8> = Outcome::SuccessfulConnection(1);
        assert!(ok.failure::<String>().is_none());
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(OutcomeKind::CannotConnect.to_string(), "cannotConnect");
        assert_eq!(
            serde_json::to_string(&OutcomeKind::SuccessfulConnection).unwrap(),
            "\"successfulConnection\""
        );
    }
}
