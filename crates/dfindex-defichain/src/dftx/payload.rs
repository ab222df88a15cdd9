//! Typed DfTx payloads.

use serde::{Deserialize, Serialize};

use super::codec::{DecodeError, Reader, Writer};

/// Op-codes of the DfTx types this indexer understands.
pub mod op {
    pub const CREATE_TOKEN: u8 = b'T';
    pub const POOL_SWAP: u8 = b's';
    pub const COMPOSITE_SWAP: u8 = b'i';
    pub const AUCTION_BID: u8 = b'I';
}

/// Token flag bits as stored by the node.
pub mod token_flags {
    pub const MINTABLE: u8 = 0x01;
    pub const TRADEABLE: u8 = 0x02;
    pub const DAT: u8 = 0x04;
}

// ─── CreateToken ('T') ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateToken {
    pub symbol: String,
    pub name: String,
    pub decimal: u8,
    /// Supply limit in satoshis, 0 = unlimited.
    pub limit: i64,
    pub flags: u8,
}

impl CreateToken {
    pub fn mintable(&self) -> bool {
        self.flags & token_flags::MINTABLE != 0
    }

    pub fn tradeable(&self) -> bool {
        self.flags & token_flags::TRADEABLE != 0
    }

    pub fn is_dat(&self) -> bool {
        self.flags & token_flags::DAT != 0
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            symbol: r.read_string()?,
            name: r.read_string()?,
            decimal: r.read_u8()?,
            limit: r.read_i64()?,
            flags: r.read_u8()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), DecodeError> {
        w.write_string(&self.symbol)
            .write_string(&self.name)
            .write_u8(self.decimal)
            .write_i64(self.limit)
            .write_u8(self.flags);
        Ok(())
    }
}

// ─── PoolSwap ('s') ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPrice {
    pub integer: i64,
    pub fraction: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSwap {
    pub from_script: String,
    pub from_token_id: u64,
    /// Amount in satoshis.
    pub from_amount: i64,
    pub to_script: String,
    pub to_token_id: u64,
    pub max_price: MaxPrice,
}

impl PoolSwap {
    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            from_script: r.read_script_hex()?,
            from_token_id: r.read_var_int()?,
            from_amount: r.read_i64()?,
            to_script: r.read_script_hex()?,
            to_token_id: r.read_var_int()?,
            max_price: MaxPrice {
                integer: r.read_i64()?,
                fraction: r.read_i64()?,
            },
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), DecodeError> {
        w.write_script_hex(&self.from_script)?
            .write_var_int(self.from_token_id)
            .write_i64(self.from_amount);
        w.write_script_hex(&self.to_script)?
            .write_var_int(self.to_token_id)
            .write_i64(self.max_price.integer)
            .write_i64(self.max_price.fraction);
        Ok(())
    }
}

// ─── CompositeSwap ('i') ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeSwap {
    pub pool_swap: PoolSwap,
    /// Pool pair ids routed through, in order.
    pub pools: Vec<u64>,
}

impl CompositeSwap {
    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let pool_swap = PoolSwap::decode(r)?;
        let count = r.read_compact_size()?;
        let mut pools = Vec::new();
        for _ in 0..count {
            pools.push(r.read_var_int()?);
        }
        Ok(Self { pool_swap, pools })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), DecodeError> {
        self.pool_swap.encode(w)?;
        w.write_compact_size(self.pools.len() as u64);
        for id in &self.pools {
            w.write_var_int(*id);
        }
        Ok(())
    }
}

// ─── AuctionBid ('I') ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBid {
    /// Vault id in display (byte-reversed) hex.
    pub vault_id: String,
    /// Auction batch index within the vault.
    pub index: u32,
    pub from: String,
    pub token_id: u64,
    /// Bid amount in satoshis.
    pub amount: i64,
}

impl AuctionBid {
    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut vault = r.read_bytes(32)?.to_vec();
        vault.reverse();
        Ok(Self {
            vault_id: hex::encode(vault),
            index: r.read_u32()?,
            from: r.read_script_hex()?,
            token_id: r.read_var_int()?,
            amount: r.read_i64()?,
        })
    }

    pub(crate) fn encode(&self, w: &mut Writer) -> Result<(), DecodeError> {
        let mut vault =
            hex::decode(&self.vault_id).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
        if vault.len() != 32 {
            return Err(DecodeError::InvalidHex(format!(
                "vault id must be 32 bytes, got {}",
                vault.len()
            )));
        }
        vault.reverse();
        w.write_bytes(&vault).write_u32(self.index);
        w.write_script_hex(&self.from)?
            .write_var_int(self.token_id)
            .write_i64(self.amount);
        Ok(())
    }
}
