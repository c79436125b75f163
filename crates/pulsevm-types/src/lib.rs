//! Domain value types shared by every layer of pulsevm: the `Name` identifier,
//! account/permission/authority records, actions and transactions, and the
//! block type the consensus engine exchanges with the executor.
//!
//! Every type here implements [`pulsevm_codec::Marshal`]/[`pulsevm_codec::Unmarshal`]
//! in addition to `serde`, so the same structs serve both the deterministic
//! wire format used for hashing/signing and the JSON surface exposed over RPC.

mod account;
mod action;
mod authority;
mod block;
mod code;
mod digest;
mod error;
mod name;
mod permission;
mod tx;

pub use account::Account;
pub use action::Action;
pub use authority::{Authority, KeyWeight, PermissionLevel, PermissionLevelWeight};
pub use block::StandardBlock;
pub use code::Code;
pub use digest::{sha256, Digest32, EMPTY_DIGEST};
pub use error::TypesError;
pub use name::Name;
pub use permission::Permission;
pub use tx::{BaseTx, Signature, Tx, UnsignedTx, BASE_TX_TYPE_ID};
