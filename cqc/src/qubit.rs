//! Qubit handles and remote endpoints.

use std::fmt;
use std::net::Ipv4Addr;

use cqc_proto::{CommunicationHeader, EntanglementInfoHeader};
use serde::{Deserialize, Serialize};

/// Backend-assigned handle of a qubit.
///
/// Handles are scoped to one application on one backend and become invalid
/// once the qubit is sent, measured, or expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QubitId(u16);

impl QubitId {
    /// Wraps a raw qubit id.
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw qubit id.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl From<u16> for QubitId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Application on a remote node, the target of SEND and EPR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteApp {
    /// Application id on the remote node.
    pub app_id: u16,
    /// Address of the remote node.
    pub node: Ipv4Addr,
    /// Classical control port of the remote node.
    pub port: u16,
}

impl RemoteApp {
    /// Creates a remote endpoint.
    pub const fn new(app_id: u16, node: Ipv4Addr, port: u16) -> Self {
        Self { app_id, node, port }
    }

    /// Encodes the endpoint as a communication header.
    pub fn to_header(self) -> CommunicationHeader {
        CommunicationHeader {
            remote_app_id: self.app_id,
            remote_port: self.port,
            remote_node: u32::from(self.node),
        }
    }
}

/// Local half of an EPR pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EprHalf {
    /// Handle of the local qubit.
    pub qubit: QubitId,
    /// Entanglement information reported by the backend.
    pub info: EntanglementInfoHeader,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_app_header() {
        let r = RemoteApp::new(2, Ipv4Addr::new(10, 0, 0, 7), 8004);
        let h = r.to_header();
        assert_eq!(h.remote_app_id, 2);
        assert_eq!(h.remote_port, 8004);
        assert_eq!(h.remote_node, 0x0A00_0007);
    }
}
