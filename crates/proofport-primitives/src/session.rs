//! Session parameters handed over by the embedding requester and the immutable
//! context a proof session runs against.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::circuits::{available_circuits, resolve_circuit, CircuitDescriptor};

/// Raw, untrusted parameters from the portal URL. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    pub circuit: Option<String>,
    pub nonce: Option<String>,
    pub origin: Option<String>,
    pub sdk: bool,
}

impl SessionParams {
    /// Parses a URL query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = SessionParams::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.into_owned();
            match key.as_ref() {
                "circuit" => params.circuit = non_empty(value),
                "nonce" => params.nonce = non_empty(value),
                "origin" => params.origin = non_empty(value),
                "sdk" => params.sdk = value == "1",
                _ => {}
            }
        }
        params
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Everything a session needs, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    requesting_origin: String,
    nonce: String,
    wallet_address: Address,
    rpc_endpoint: String,
    circuit: &'static CircuitDescriptor,
}

impl SessionContext {
    pub fn requesting_origin(&self) -> &str {
        &self.requesting_origin
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn wallet_address(&self) -> Address {
        self.wallet_address
    }

    pub fn rpc_endpoint(&self) -> &str {
        &self.rpc_endpoint
    }

    pub fn circuit(&self) -> &'static CircuitDescriptor {
        self.circuit
    }
}

/// Whether the portal may run a session or only display itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    Active(SessionContext),
    ReadOnly { reason: String },
}

impl SessionMode {
    /// Builds the session context if and only if every input is present.
    ///
    /// `has_opener` tells whether the portal was opened by a requester context;
    /// without it (and without `sdk=1`) the portal is read-only.
    pub fn resolve(
        params: &SessionParams,
        has_opener: bool,
        wallet_address: Option<Address>,
        rpc_endpoint: Option<&str>,
    ) -> Self {
        if !has_opener && !params.sdk {
            return Self::read_only("portal is read-only in web mode, open it via the SDK");
        }
        let Some(circuit_id) = params.circuit.as_deref() else {
            return Self::read_only("missing circuit id");
        };
        let Some(circuit) = resolve_circuit(circuit_id) else {
            return Self::read_only(format!(
                "unknown circuit id: {circuit_id}, available: {}",
                available_circuits().join(", ")
            ));
        };
        let Some(nonce) = params.nonce.clone() else {
            return Self::read_only("missing nonce");
        };
        let Some(requesting_origin) = params.origin.clone() else {
            return Self::read_only("missing requester origin");
        };
        let Some(wallet_address) = wallet_address else {
            return Self::read_only("wallet not connected");
        };
        let rpc_endpoint = match rpc_endpoint {
            Some(rpc) if !rpc.is_empty() => rpc.to_string(),
            _ => return Self::read_only("missing RPC endpoint"),
        };

        SessionMode::Active(SessionContext {
            requesting_origin,
            nonce,
            wallet_address,
            rpc_endpoint,
            circuit,
        })
    }

    fn read_only(reason: impl Into<String>) -> Self {
        SessionMode::ReadOnly {
            reason: reason.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionMode::Active(_))
    }

    pub fn context(&self) -> Option<&SessionContext> {
        match self {
            SessionMode::Active(ctx) => Some(ctx),
            SessionMode::ReadOnly { .. } => None,
        }
    }
}
