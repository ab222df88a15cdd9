use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{format_sats, BlockContext};
use serde::{Deserialize, Serialize};

use crate::dftx::CreateToken;

/// A token definition.
///
/// User tokens are keyed by their creating txid. The native coin has no
/// creating transaction and is seeded at genesis under id `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenModel {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimal: u8,
    pub limit: String,
    pub mintable: bool,
    pub tradeable: bool,
    pub is_dat: bool,
    pub block: BlockContext,
    pub sort: String,
}

impl TokenModel {
    pub const NATIVE_ID: &'static str = "0";

    pub fn native(genesis: BlockContext) -> Result<Self, IndexerError> {
        Ok(Self {
            id: Self::NATIVE_ID.into(),
            symbol: "DFI".into(),
            name: "Default Defi token".into(),
            decimal: 8,
            limit: format_sats(0),
            mintable: false,
            tradeable: true,
            is_dat: true,
            sort: Self::sort_of(genesis.height, 0)?,
            block: genesis,
        })
    }

    pub fn created(
        txid: &str,
        txno: usize,
        block: BlockContext,
        token: &CreateToken,
    ) -> Result<Self, IndexerError> {
        Ok(Self {
            id: txid.to_string(),
            symbol: token.symbol.clone(),
            name: token.name.clone(),
            decimal: token.decimal,
            limit: format_sats(token.limit),
            mintable: token.mintable(),
            tradeable: token.tradeable(),
            is_dat: token.is_dat(),
            sort: Self::sort_of(block.height, txno)?,
            block,
        })
    }

    fn sort_of(height: u64, txno: usize) -> Result<String, IndexerError> {
        Ok(format!(
            "{}{}",
            keys::encode_height(height)?,
            keys::encode_vout_index(txno as u64)?
        ))
    }
}

impl Entity for TokenModel {
    const KIND: &'static str = "token";

    fn id(&self) -> String {
        self.id.clone()
    }

    /// Tokens are listed in creation order.
    fn partition_key(&self) -> String {
        String::new()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}
