//! Sidus vendor access-layer codec
//!
//! Aputure/Amaran Sidus-Link lights are driven by 10-byte bit-packed
//! vendor payloads carried under the Telink vendor opcode. This module
//! implements the command model, the encoder, and the inverse parser used
//! both for commands and for the status payloads lights publish back.

mod bits;
mod codec;
mod command;
mod constants;

#[cfg(test)]
mod tests;

pub use self::codec::{checksum, parse_status, vendor_payload};
pub use self::command::{
    CctCommand, EffectCommand, HsiCommand, SidusCommand, SidusError, SidusStatus,
};
pub use self::constants::*;
