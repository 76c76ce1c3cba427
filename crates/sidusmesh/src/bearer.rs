//! Transport adapter contract
//!
//! The BLE transport (scan, connect, characteristic discovery, GATT I/O)
//! lives outside the engine. The engine hands complete proxy PDUs to a
//! [`ProxyBearer`] and receives inbound notification payloads through the
//! `process_*` entry points of the pipeline and the provisioning machine.
//! Writes are write-without-response; completion is never awaited.

use crate::error::MeshResult;

/// Byte-out contract the embedding transport implements
///
/// A bearer instance corresponds to one open GATT session: writes go to
/// the Mesh Proxy Data In characteristic (2ADD) for a provisioned node,
/// or to Mesh Provisioning Data In (2ADB) during provisioning.
pub trait ProxyBearer {
    /// Best-effort write of one complete proxy PDU
    fn write(&mut self, pdu: &[u8]) -> MeshResult<()>;

    /// Tear down the GATT session
    fn close(&mut self);
}
