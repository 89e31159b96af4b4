//! Messages exchanged with the requesting browsing context.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::proof::ProofPayload;

/// A well-formed absolute origin (`scheme://host[:port]`) a message may be addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetOrigin(String);

impl TargetOrigin {
    /// Accepts http(s) origins only. Paths other than `/`, queries, fragments,
    /// credentials and the `*` wildcard are rejected rather than widened.
    pub fn parse(origin: &str) -> Option<Self> {
        let url = Url::parse(origin).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        if url.host_str().is_none()
            || !url.username().is_empty()
            || url.password().is_some()
            || url.query().is_some()
            || url.fragment().is_some()
            || url.path() != "/"
        {
            return None;
        }
        let serialized = url.origin().ascii_serialization();
        if serialized != origin.trim_end_matches('/') {
            return None;
        }
        Some(Self(serialized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TargetOrigin {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TargetOrigin::parse(&value).ok_or_else(|| format!("invalid origin: {value}"))
    }
}

impl From<TargetOrigin> for String {
    fn from(origin: TargetOrigin) -> Self {
        origin.0
    }
}

/// Cross-context message kinds. `close-request` never carries session data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RelayMessage {
    ProofResult(ProofPayload),
    CloseRequest {},
}

impl RelayMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayMessage::ProofResult(_) => "proof-result",
            RelayMessage::CloseRequest {} => "close-request",
        }
    }
}

/// A message together with the origin it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub target_origin: TargetOrigin,
    pub message: RelayMessage,
}
