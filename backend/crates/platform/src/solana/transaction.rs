//! Legacy transaction format
//!
//! Wire layout:
//! ```text
//! transaction = compact_u16(n) || signature[n] || message
//! message     = header(3) || compact_u16(k) || key[k] || blockhash(32)
//!               || compact_u16(i) || instruction[i]
//! instruction = program_index(u8) || compact_u16(a) || account_index[a]
//!               || compact_u16(d) || data[d]
//! ```

use thiserror::Error;

use super::keypair::Keypair;
use super::pubkey::Pubkey;
use crate::crypto::to_base64;

pub const SIGNATURE_BYTES: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Too many accounts in one message")]
    TooManyAccounts,

    #[error("Signer {0} is required but was not provided")]
    MissingSigner(Pubkey),

    #[error("Keypair {0} is not a required signer")]
    UnexpectedSigner(Pubkey),
}

/// Account reference of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Compiled message ready for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub num_required_signatures: u8,
    pub num_readonly_signed: u8,
    pub num_readonly_unsigned: u8,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: [u8; 32],
    instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CompiledInstruction {
    program_index: u8,
    accounts: Vec<u8>,
    data: Vec<u8>,
}

impl Message {
    /// Compile instructions with `payer` as fee payer
    ///
    /// Keys are ordered writable signers (payer first), readonly signers,
    /// writable non-signers, then readonly non-signers.
    pub fn compile(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: [u8; 32],
    ) -> Result<Self, TransactionError> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*payer, true)];
        let mut merge = |meta: AccountMeta| {
            match metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                Some(existing) => {
                    existing.is_signer |= meta.is_signer;
                    existing.is_writable |= meta.is_writable;
                }
                None => metas.push(meta),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(*meta);
            }
            merge(AccountMeta::new_readonly(ix.program_id, false));
        }

        // Stable sort keeps first-seen order inside each class
        let class = |m: &AccountMeta| match (m.is_signer, m.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        };
        let payer_meta = metas.remove(0);
        metas.sort_by_key(class);
        metas.insert(0, payer_meta);

        if metas.len() > u8::MAX as usize {
            return Err(TransactionError::TooManyAccounts);
        }

        let count = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(|m| m.is_signer == signer && m.is_writable == writable)
                .count() as u8
        };
        let num_required_signatures = metas.iter().filter(|m| m.is_signer).count() as u8;
        let num_readonly_signed = count(true, false);
        let num_readonly_unsigned = count(false, false);

        let account_keys: Vec<Pubkey> = metas.iter().map(|m| m.pubkey).collect();
        let index_of = |key: &Pubkey| -> u8 {
            account_keys
                .iter()
                .position(|k| k == key)
                .unwrap_or_default() as u8
        };

        let instructions = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_index: index_of(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| index_of(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Ok(Self {
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            account_keys,
            recent_blockhash,
            instructions,
        })
    }

    pub fn signers(&self) -> &[Pubkey] {
        &self.account_keys[..self.num_required_signatures as usize]
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let signed = self.num_required_signatures as usize;
        if index < signed {
            index < signed - self.num_readonly_signed as usize
        } else {
            index < self.account_keys.len() - self.num_readonly_unsigned as usize
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = vec![
            self.num_required_signatures,
            self.num_readonly_signed,
            self.num_readonly_unsigned,
        ];
        encode_compact_u16(&mut out, self.account_keys.len() as u16);
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash);
        encode_compact_u16(&mut out, self.instructions.len() as u16);
        for ix in &self.instructions {
            out.push(ix.program_index);
            encode_compact_u16(&mut out, ix.accounts.len() as u16);
            out.extend_from_slice(&ix.accounts);
            encode_compact_u16(&mut out, ix.data.len() as u16);
            out.extend_from_slice(&ix.data);
        }
        out
    }
}

/// Fully signed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<[u8; SIGNATURE_BYTES]>,
    pub message: Message,
}

impl Transaction {
    /// Compile and sign in one step; every required signer must be supplied
    pub fn new_signed(
        instructions: &[Instruction],
        payer: &Keypair,
        extra_signers: &[&Keypair],
        recent_blockhash: [u8; 32],
    ) -> Result<Self, TransactionError> {
        let message = Message::compile(instructions, &payer.pubkey(), recent_blockhash)?;
        let bytes = message.serialize();

        let mut keypairs: Vec<&Keypair> = vec![payer];
        keypairs.extend_from_slice(extra_signers);
        for keypair in &keypairs {
            if !message.signers().contains(&keypair.pubkey()) {
                return Err(TransactionError::UnexpectedSigner(keypair.pubkey()));
            }
        }

        let signatures = message
            .signers()
            .iter()
            .map(|signer| {
                keypairs
                    .iter()
                    .find(|k| k.pubkey() == *signer)
                    .map(|k| k.sign_message(&bytes))
                    .ok_or(TransactionError::MissingSigner(*signer))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            signatures,
            message,
        })
    }

    /// Transaction id: base58 of the fee payer's signature
    pub fn signature(&self) -> String {
        self.signatures
            .first()
            .map(|sig| bs58::encode(sig).into_string())
            .unwrap_or_default()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode_compact_u16(&mut out, self.signatures.len() as u16);
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out.extend_from_slice(&self.message.serialize());
        out
    }

    /// Encoding accepted by `sendTransaction` with `encoding: base64`
    pub fn to_base64(&self) -> String {
        to_base64(&self.serialize())
    }
}

/// Solana "shortvec" length prefix
pub fn encode_compact_u16(out: &mut Vec<u8>, mut value: u16) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
