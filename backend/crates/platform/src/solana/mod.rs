//! Solana primitives
//!
//! Just enough of the Solana wire format to build, sign and track a
//! server-paid transaction without pulling in the full SDK:
//! - [`pubkey`]: 32-byte addresses and program-derived addresses
//! - [`keypair`]: the Ed25519 signing keypair of the platform authority
//! - [`transaction`]: legacy message compilation, signing and serialization
//! - [`rpc`]: JSON-RPC client over `reqwest`

pub mod keypair;
pub mod pubkey;
pub mod rpc;
pub mod transaction;

pub use keypair::{Keypair, KeypairError};
pub use pubkey::{Pubkey, PubkeyError};
pub use rpc::{Commitment, RpcClient, RpcError};
pub use transaction::{AccountMeta, Instruction, Transaction};

/// Well-known program addresses
pub mod programs {
    use super::Pubkey;

    pub const SYSTEM: Pubkey = Pubkey::new_from_array([0u8; 32]);

    /// mpl-bubblegum (`BGUMAp9Gq7iTEuizy4pqaxsTyUCBK68MDfK752saRPUY`)
    pub const BUBBLEGUM: Pubkey = Pubkey::new_from_array([
        152, 139, 128, 235, 121, 53, 40, 105, 178, 36, 116, 95, 89, 221, 191, 138, 38, 88, 202,
        19, 220, 104, 129, 33, 38, 53, 28, 174, 7, 193, 165, 165,
    ]);

    /// spl-noop (`noopb9bkMVfRPU8AsbpTUg8AQkHtKwMYZiFUjNRtMmV`)
    pub const NOOP: Pubkey = Pubkey::new_from_array([
        11, 188, 15, 192, 187, 71, 202, 47, 116, 196, 17, 46, 148, 171, 19, 207, 163, 198, 52,
        229, 220, 23, 234, 203, 3, 205, 26, 35, 205, 126, 120, 124,
    ]);

    /// spl-account-compression (`cmtDvXumGCrqC1Age74AVPhSRVXJMd8PJS91L8KbNCK`)
    pub const ACCOUNT_COMPRESSION: Pubkey = Pubkey::new_from_array([
        9, 42, 19, 238, 149, 196, 28, 186, 8, 166, 127, 90, 198, 126, 141, 247, 225, 218, 17, 98,
        94, 29, 100, 19, 127, 143, 79, 35, 131, 3, 127, 20,
    ]);

    /// mpl-token-metadata (`metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`)
    pub const TOKEN_METADATA: Pubkey = Pubkey::new_from_array([
        11, 112, 101, 177, 227, 209, 124, 69, 56, 157, 82, 127, 107, 4, 195, 205, 88, 184, 108,
        115, 26, 160, 253, 181, 73, 182, 209, 188, 3, 248, 41, 70,
    ]);

}
