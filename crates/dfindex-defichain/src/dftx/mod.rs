//! DfTx extraction: finds application transactions embedded in `OP_RETURN`
//! outputs and decodes them into typed payloads.
//!
//! A DfTx output script is `OP_RETURN <push>` where the pushed data is
//! `"DfTx" ‖ op-code ‖ payload`.

pub mod codec;
pub mod payload;

use dfindex_core::types::{RawBlock, RawTransaction};
use serde::{Deserialize, Serialize};
use tracing::warn;

use codec::{
    decode_script, encode_op_return, DecodeError, Reader, ScriptOp, Writer, OP_PUSHDATA1,
    OP_PUSHDATA2, OP_PUSHDATA4, OP_RETURN,
};
pub use payload::{op, AuctionBid, CompositeSwap, CreateToken, MaxPrice, PoolSwap};

/// `"DfTx"`
pub const DFTX_MAGIC: [u8; 4] = *b"DfTx";

/// Decoded DfTx body, one variant per supported op-code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DfTxPayload {
    CreateToken(CreateToken),
    PoolSwap(PoolSwap),
    CompositeSwap(CompositeSwap),
    AuctionBid(AuctionBid),
    /// A valid envelope with an op-code this indexer doesn't decode.
    Unmapped { op_code: u8, data: Vec<u8> },
}

impl DfTxPayload {
    pub fn op_code(&self) -> u8 {
        match self {
            Self::CreateToken(_) => op::CREATE_TOKEN,
            Self::PoolSwap(_) => op::POOL_SWAP,
            Self::CompositeSwap(_) => op::COMPOSITE_SWAP,
            Self::AuctionBid(_) => op::AUCTION_BID,
            Self::Unmapped { op_code, .. } => *op_code,
        }
    }

    fn decode(op_code: u8, body: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(body);
        Ok(match op_code {
            op::CREATE_TOKEN => Self::CreateToken(CreateToken::decode(&mut r)?),
            op::POOL_SWAP => Self::PoolSwap(PoolSwap::decode(&mut r)?),
            op::COMPOSITE_SWAP => Self::CompositeSwap(CompositeSwap::decode(&mut r)?),
            op::AUCTION_BID => Self::AuctionBid(AuctionBid::decode(&mut r)?),
            other => Self::Unmapped {
                op_code: other,
                data: r.read_rest().to_vec(),
            },
        })
    }

    /// Serialize as a complete `OP_RETURN` script, hex encoded.
    pub fn to_script_hex(&self) -> Result<String, DecodeError> {
        let mut w = Writer::new();
        w.write_bytes(&DFTX_MAGIC).write_u8(self.op_code());
        match self {
            Self::CreateToken(p) => p.encode(&mut w)?,
            Self::PoolSwap(p) => p.encode(&mut w)?,
            Self::CompositeSwap(p) => p.encode(&mut w)?,
            Self::AuctionBid(p) => p.encode(&mut w)?,
            Self::Unmapped { data, .. } => {
                w.write_bytes(data);
            }
        }
        Ok(hex::encode(encode_op_return(&w.into_bytes())))
    }
}

/// Decode a DfTx from an output script.
///
/// Returns `Ok(None)` if the script is not a DfTx envelope at all, and an
/// error if it carries the marker but cannot be decoded.
pub fn decode_dftx_script(script_hex: &str) -> Result<Option<DfTxPayload>, DecodeError> {
    if !script_hex.starts_with("6a") {
        return Ok(None);
    }
    let bytes = hex::decode(script_hex).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    if !is_dftx_candidate(&bytes) {
        return Ok(None);
    }
    let ops = decode_script(&bytes)?;
    let data = match ops.as_slice() {
        [ScriptOp::Code(OP_RETURN), ScriptOp::Push(data)] => data,
        _ => {
            return Err(DecodeError::NotDfTx {
                reason: format!("expected OP_RETURN + single push, got {} ops", ops.len()),
            })
        }
    };
    if data.len() < 5 {
        return Err(DecodeError::NotDfTx {
            reason: "missing op-code".into(),
        });
    }
    DfTxPayload::decode(data[4], &data[5..]).map(Some)
}

/// `OP_RETURN`, then a push whose data starts with the magic.
fn is_dftx_candidate(script: &[u8]) -> bool {
    let Some((&OP_RETURN, rest)) = script.split_first() else {
        return false;
    };
    let Some((&push, rest)) = rest.split_first() else {
        return false;
    };
    let data = match push {
        0x01..=0x4b => Some(rest),
        OP_PUSHDATA1 => rest.get(1..),
        OP_PUSHDATA2 => rest.get(2..),
        OP_PUSHDATA4 => rest.get(4..),
        _ => None,
    };
    data.is_some_and(|d| d.starts_with(&DFTX_MAGIC))
}

/// A DfTx found in a block, with its position.
#[derive(Debug, Clone)]
pub struct DfTxTransaction<'a> {
    pub txn: &'a RawTransaction,
    /// Index of the transaction within the block.
    pub txno: usize,
    /// Index of the carrying output within the transaction.
    pub vout: u32,
    pub dftx: DfTxPayload,
}

/// Every DfTx in `block`, in transaction order then output order.
///
/// Outputs that carry the marker but fail to decode are logged and skipped.
pub fn extract(block: &RawBlock) -> Vec<DfTxTransaction<'_>> {
    let mut out = Vec::new();
    for (txno, txn) in block.tx.iter().enumerate() {
        for vout in &txn.vout {
            match decode_dftx_script(&vout.script_pub_key.hex) {
                Ok(Some(dftx)) => out.push(DfTxTransaction {
                    txn,
                    txno,
                    vout: vout.n,
                    dftx,
                }),
                Ok(None) => {}
                Err(e) => warn!(
                    height = block.height,
                    txid = %txn.txid,
                    vout = vout.n,
                    error = %e,
                    "skipping malformed DfTx output"
                ),
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfindex_core::types::{CoinbaseVin, RawVin, RawVout, ScriptPubKey};

    fn tx(txid: &str, scripts: &[&str]) -> RawTransaction {
        RawTransaction {
            txid: txid.into(),
            hash: txid.into(),
            version: 4,
            size: 0,
            vsize: 0,
            weight: 0,
            locktime: 0,
            vin: vec![RawVin::Coinbase(CoinbaseVin {
                coinbase: "00".into(),
                sequence: 0,
                txinwitness: vec![],
            })],
            vout: scripts
                .iter()
                .enumerate()
                .map(|(n, hex)| RawVout {
                    value: 0.0,
                    n: n as u32,
                    script_pub_key: ScriptPubKey {
                        hex: hex.to_string(),
                        ..Default::default()
                    },
                    token_id: Some(0),
                })
                .collect(),
            hex: String::new(),
        }
    }

    fn block(tx: Vec<RawTransaction>) -> RawBlock {
        RawBlock {
            hash: "bb".into(),
            height: 10,
            previous_hash: Some("aa".into()),
            time: 0,
            median_time: 0,
            version: 0,
            merkleroot: String::new(),
            size: 0,
            stripped_size: 0,
            weight: 0,
            difficulty: 0.0,
            masternode: None,
            minter: None,
            minted_blocks: None,
            stake_modifier: None,
            tx,
        }
    }

    fn swap(amount: i64) -> DfTxPayload {
        DfTxPayload::PoolSwap(PoolSwap {
            from_script: "0014aa".into(),
            from_token_id: 0,
            from_amount: amount,
            to_script: "0014bb".into(),
            to_token_id: 2,
            max_price: MaxPrice {
                integer: 1,
                fraction: 0,
            },
        })
    }

    #[test]
    fn decodes_create_token_script() {
        let payload = DfTxPayload::CreateToken(CreateToken {
            symbol: "GOLD".into(),
            name: "Gold".into(),
            decimal: 8,
            limit: 0,
            flags: payload::token_flags::TRADEABLE | payload::token_flags::MINTABLE,
        });
        let script = payload.to_script_hex().unwrap();
        assert!(script.starts_with("6a"));
        assert!(script[4..].starts_with("4466547854"));
        assert_eq!(decode_dftx_script(&script).unwrap(), Some(payload));
    }

    #[test]
    fn ignores_plain_scripts() {
        assert_eq!(decode_dftx_script("76a914aa88ac").unwrap(), None);
        // OP_RETURN without the magic is an ordinary data carrier
        assert_eq!(decode_dftx_script("6a0468656c6c6f").unwrap(), None);
    }

    #[test]
    fn magic_must_open_the_pushed_data() {
        // magic one byte into the push
        assert_eq!(decode_dftx_script("6a050044665478").unwrap(), None);
        // magic hex digits straddling byte boundaries
        assert_eq!(decode_dftx_script("6a050446654780").unwrap(), None);
        // magic behind OP_PUSHDATA1 still counts
        let long = DfTxPayload::Unmapped {
            op_code: 0xfe,
            data: vec![0xab; 90],
        };
        let script = long.to_script_hex().unwrap();
        assert!(script.starts_with("6a4c"));
        assert_eq!(decode_dftx_script(&script).unwrap(), Some(long));
    }

    #[test]
    fn malformed_marker_is_an_error() {
        // magic + pool swap op-code with a truncated body
        assert!(decode_dftx_script("6a07446654787301").is_err());
    }

    #[test]
    fn unknown_op_code_is_unmapped() {
        let dftx = decode_dftx_script("6a0644665478ff01").unwrap().unwrap();
        assert_eq!(
            dftx,
            DfTxPayload::Unmapped {
                op_code: 0xff,
                data: vec![0x01]
            }
        );
    }

    #[test]
    fn extract_preserves_block_order_and_skips_garbage() {
        let first = swap(1).to_script_hex().unwrap();
        let second = swap(2).to_script_hex().unwrap();
        let block = block(vec![
            tx("t0", &["76a914aa88ac"]),
            tx("t1", &[&first]),
            tx("t2", &["6a07446654787301", "76a914bb88ac"]),
            tx("t3", &["76a914cc88ac", &second]),
        ]);

        let found = extract(&block);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].txn.txid, "t1");
        assert_eq!(found[0].txno, 1);
        assert_eq!(found[0].vout, 0);
        assert_eq!(found[1].txn.txid, "t3");
        assert_eq!(found[1].txno, 3);
        assert_eq!(found[1].vout, 1);
        assert!(found[0].txno < found[1].txno);
        assert_eq!(found[1].dftx, swap(2));
    }
}
