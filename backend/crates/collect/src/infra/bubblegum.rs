//! Bubblegum compressed-NFT instructions
//!
//! Builds `mint_v1` / `mint_to_collection_v1` and reads back the leaf event
//! Bubblegum logs through the noop program. Arguments are Borsh encoded by
//! hand; the layouts are fixed by the on-chain program.

use platform::solana::rpc::ConfirmedTransaction;
use platform::solana::{AccountMeta, Instruction, Pubkey, PubkeyError, programs};

/// sha256("global:mint_v1")[..8]
pub const MINT_V1_DISCRIMINATOR: [u8; 8] = [145, 98, 192, 118, 184, 147, 118, 104];
/// sha256("global:mint_to_collection_v1")[..8]
pub const MINT_TO_COLLECTION_V1_DISCRIMINATOR: [u8; 8] = [153, 18, 178, 47, 197, 158, 86, 15];

pub const MAX_NAME_LEN: usize = 32;
pub const MAX_SYMBOL_LEN: usize = 10;
pub const MAX_URI_LEN: usize = 200;

const TOKEN_STANDARD_NON_FUNGIBLE: u8 = 0;
const TOKEN_PROGRAM_VERSION_ORIGINAL: u8 = 0;

/// `BubblegumEventType::LeafSchemaEvent`, `Version::V1`, `LeafSchema::V1`
const LEAF_EVENT_PREFIX: [u8; 3] = [1, 0, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Creator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

/// Subset of Token Metadata `MetadataArgs` this service sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    /// Collection key; verification is done by the program
    pub collection: Option<Pubkey>,
    pub creators: Vec<Creator>,
}

impl MetadataArgs {
    /// Borsh layout of `MetadataArgs`
    pub fn encode(&self, out: &mut Vec<u8>) {
        put_string(out, truncate_utf8(&self.name, MAX_NAME_LEN));
        put_string(out, truncate_utf8(&self.symbol, MAX_SYMBOL_LEN));
        put_string(out, truncate_utf8(&self.uri, MAX_URI_LEN));
        out.extend_from_slice(&self.seller_fee_basis_points.to_le_bytes());
        out.push(self.primary_sale_happened as u8);
        out.push(self.is_mutable as u8);
        // edition_nonce: None
        out.push(0);
        // token_standard: Some(NonFungible)
        out.extend_from_slice(&[1, TOKEN_STANDARD_NON_FUNGIBLE]);
        match &self.collection {
            Some(key) => {
                out.extend_from_slice(&[1, 0]);
                out.extend_from_slice(key.as_bytes());
            }
            None => out.push(0),
        }
        // uses: None
        out.push(0);
        out.push(TOKEN_PROGRAM_VERSION_ORIGINAL);
        out.extend_from_slice(&(self.creators.len() as u32).to_le_bytes());
        for creator in &self.creators {
            out.extend_from_slice(creator.address.as_bytes());
            out.push(creator.verified as u8);
            out.push(creator.share);
        }
    }
}

/// Accounts shared by both mint instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintAccounts {
    pub merkle_tree: Pubkey,
    /// Collector wallet; also the leaf delegate. Never signs.
    pub leaf_owner: Pubkey,
    pub payer: Pubkey,
    pub tree_delegate: Pubkey,
}

/// Verified collection the leaf is minted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionAccounts {
    pub mint: Pubkey,
    pub authority: Pubkey,
}

pub fn tree_config(merkle_tree: &Pubkey) -> Result<Pubkey, PubkeyError> {
    Pubkey::find_program_address(&[merkle_tree.as_ref()], &programs::BUBBLEGUM)
        .map(|(address, _)| address)
}

pub fn metadata_account(mint: &Pubkey) -> Result<Pubkey, PubkeyError> {
    Pubkey::find_program_address(
        &[
            b"metadata".as_slice(),
            programs::TOKEN_METADATA.as_ref(),
            mint.as_ref(),
        ],
        &programs::TOKEN_METADATA,
    )
    .map(|(address, _)| address)
}

pub fn master_edition_account(mint: &Pubkey) -> Result<Pubkey, PubkeyError> {
    Pubkey::find_program_address(
        &[
            b"metadata".as_slice(),
            programs::TOKEN_METADATA.as_ref(),
            mint.as_ref(),
            b"edition".as_slice(),
        ],
        &programs::TOKEN_METADATA,
    )
    .map(|(address, _)| address)
}

pub fn collection_cpi_signer() -> Result<Pubkey, PubkeyError> {
    Pubkey::find_program_address(&[b"collection_cpi".as_slice()], &programs::BUBBLEGUM)
        .map(|(address, _)| address)
}

fn leading_accounts(accounts: &MintAccounts) -> Result<Vec<AccountMeta>, PubkeyError> {
    Ok(vec![
        AccountMeta::new(tree_config(&accounts.merkle_tree)?, false),
        AccountMeta::new_readonly(accounts.leaf_owner, false),
        AccountMeta::new_readonly(accounts.leaf_owner, false),
        AccountMeta::new(accounts.merkle_tree, false),
        AccountMeta::new(accounts.payer, true),
        AccountMeta::new_readonly(accounts.tree_delegate, true),
    ])
}

pub fn mint_v1(
    accounts: &MintAccounts,
    metadata: &MetadataArgs,
) -> Result<Instruction, PubkeyError> {
    let mut metas = leading_accounts(accounts)?;
    metas.extend([
        AccountMeta::new_readonly(programs::NOOP, false),
        AccountMeta::new_readonly(programs::ACCOUNT_COMPRESSION, false),
        AccountMeta::new_readonly(programs::SYSTEM, false),
    ]);

    let mut data = MINT_V1_DISCRIMINATOR.to_vec();
    metadata.encode(&mut data);

    Ok(Instruction {
        program_id: programs::BUBBLEGUM,
        accounts: metas,
        data,
    })
}

pub fn mint_to_collection_v1(
    accounts: &MintAccounts,
    collection: &CollectionAccounts,
    metadata: &MetadataArgs,
) -> Result<Instruction, PubkeyError> {
    let mut metas = leading_accounts(accounts)?;
    metas.extend([
        AccountMeta::new_readonly(collection.authority, true),
        // No delegate record: the program id stands in for the optional account
        AccountMeta::new_readonly(programs::BUBBLEGUM, false),
        AccountMeta::new_readonly(collection.mint, false),
        AccountMeta::new(metadata_account(&collection.mint)?, false),
        AccountMeta::new_readonly(master_edition_account(&collection.mint)?, false),
        AccountMeta::new_readonly(collection_cpi_signer()?, false),
        AccountMeta::new_readonly(programs::NOOP, false),
        AccountMeta::new_readonly(programs::ACCOUNT_COMPRESSION, false),
        AccountMeta::new_readonly(programs::TOKEN_METADATA, false),
        AccountMeta::new_readonly(programs::SYSTEM, false),
    ]);

    let mut data = MINT_TO_COLLECTION_V1_DISCRIMINATOR.to_vec();
    let metadata = MetadataArgs {
        collection: Some(collection.mint),
        ..metadata.clone()
    };
    metadata.encode(&mut data);

    Ok(Instruction {
        program_id: programs::BUBBLEGUM,
        accounts: metas,
        data,
    })
}

/// Leaf written by a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEvent {
    pub asset_id: Pubkey,
    pub owner: Pubkey,
    pub delegate: Pubkey,
    /// Leaf index in the tree
    pub nonce: u64,
}

/// Decode the `LeafSchemaEvent` Bubblegum passes to the noop program
pub fn parse_leaf_event(data: &[u8]) -> Option<LeafEvent> {
    let body = data.strip_prefix(&LEAF_EVENT_PREFIX)?;
    if body.len() < 32 * 3 + 8 {
        return None;
    }
    let key = |i: usize| Pubkey::try_from_slice(&body[i * 32..(i + 1) * 32]).ok();
    let nonce = u64::from_le_bytes(body[96..104].try_into().ok()?);

    Some(LeafEvent {
        asset_id: key(0)?,
        owner: key(1)?,
        delegate: key(2)?,
        nonce,
    })
}

/// First leaf event among the transaction's noop inner instructions
pub fn find_leaf_event(tx: &ConfirmedTransaction) -> Option<LeafEvent> {
    let noop = programs::NOOP.to_string();
    tx.inner_instructions
        .iter()
        .flat_map(|group| group.instructions.iter())
        .filter(|ix| {
            tx.account_keys
                .get(ix.program_id_index as usize)
                .is_some_and(|key| *key == noop)
        })
        .filter_map(|ix| bs58::decode(&ix.data).into_vec().ok())
        .find_map(|data| parse_leaf_event(&data))
}

fn put_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

/// Longest prefix of at most `max` bytes ending on a char boundary
pub fn truncate_utf8(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
