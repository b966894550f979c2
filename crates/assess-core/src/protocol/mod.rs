//! Protocol module containing the envelope types and the JSON codec.

pub mod codec;
pub mod envelope;

pub use codec::{decode, encode, DecodeError, EncodeError};
pub use envelope::*;
