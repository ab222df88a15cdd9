//! Raw chain data as returned by `getblock <hash> 2`, plus shared helpers.

use serde::{Deserialize, Serialize};

/// Number of satoshis in one coin.
pub const COIN: i64 = 100_000_000;

// ─── RawBlock ─────────────────────────────────────────────────────────────────

/// A full-verbosity block from the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub hash: String,
    pub height: u64,
    /// `None` only for genesis.
    #[serde(rename = "previousblockhash", default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    pub time: i64,
    #[serde(rename = "mediantime")]
    pub median_time: i64,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub merkleroot: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "strippedsize", default)]
    pub stripped_size: u64,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masternode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minter: Option<String>,
    #[serde(rename = "mintedBlocks", default, skip_serializing_if = "Option::is_none")]
    pub minted_blocks: Option<u64>,
    #[serde(rename = "stakeModifier", default, skip_serializing_if = "Option::is_none")]
    pub stake_modifier: Option<String>,
    pub tx: Vec<RawTransaction>,
}

impl RawBlock {
    /// Returns `true` if this block builds directly on `hash`.
    pub fn extends(&self, hash: &str) -> bool {
        self.previous_hash.as_deref() == Some(hash)
    }

    /// Sum of the coinbase outputs, in satoshis.
    pub fn reward(&self) -> i64 {
        self.tx
            .first()
            .filter(|t| t.is_coinbase())
            .map(|t| t.vout.iter().map(|v| coins_to_sats(v.value)).sum())
            .unwrap_or(0)
    }
}

// ─── RawTransaction ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub vsize: u64,
    #[serde(default)]
    pub weight: u64,
    #[serde(default)]
    pub locktime: u64,
    pub vin: Vec<RawVin>,
    pub vout: Vec<RawVout>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hex: String,
}

impl RawTransaction {
    pub fn is_coinbase(&self) -> bool {
        matches!(self.vin.first(), Some(RawVin::Coinbase(_)))
    }

    /// Sum of all output values, in satoshis.
    pub fn total_vout_sats(&self) -> i64 {
        self.vout.iter().map(|v| coins_to_sats(v.value)).sum()
    }
}

/// A transaction input: either the coinbase or a spend of a prior output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVin {
    Coinbase(CoinbaseVin),
    Spend(SpendVin),
}

impl RawVin {
    pub fn sequence(&self) -> u64 {
        match self {
            Self::Coinbase(c) => c.sequence,
            Self::Spend(s) => s.sequence,
        }
    }

    pub fn witness(&self) -> &[String] {
        match self {
            Self::Coinbase(c) => &c.txinwitness,
            Self::Spend(s) => &s.txinwitness,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinbaseVin {
    pub coinbase: String,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txinwitness: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendVin {
    /// Transaction holding the output being spent.
    pub txid: String,
    /// Index of the output being spent.
    pub vout: u32,
    #[serde(rename = "scriptSig", default)]
    pub script_sig: ScriptSig,
    #[serde(default)]
    pub sequence: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txinwitness: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptSig {
    #[serde(default)]
    pub asm: String,
    #[serde(default)]
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVout {
    /// Value in coins, as the node reports it.
    pub value: f64,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
    #[serde(rename = "tokenId", default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub asm: String,
    pub hex: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "reqSigs", default, skip_serializing_if = "Option::is_none")]
    pub req_sigs: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
}

impl ScriptPubKey {
    /// Data-carrier scripts (`OP_RETURN …`) never hold spendable value.
    pub fn is_op_return(&self) -> bool {
        self.hex.starts_with("6a")
    }
}

// ─── BlockContext ─────────────────────────────────────────────────────────────

/// Block fields denormalized onto every derived row so reads never join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContext {
    pub hash: String,
    pub height: u64,
    pub time: i64,
    pub median_time: i64,
}

impl From<&RawBlock> for BlockContext {
    fn from(block: &RawBlock) -> Self {
        Self {
            hash: block.hash.clone(),
            height: block.height,
            time: block.time,
            median_time: block.median_time,
        }
    }
}

// ─── Amounts ──────────────────────────────────────────────────────────────────

/// Convert a coin value reported by the node into satoshis.
pub fn coins_to_sats(value: f64) -> i64 {
    (value * COIN as f64).round() as i64
}

/// Render satoshis as a fixed 8-decimal coin string, e.g. `"1.50000000"`.
pub fn format_sats(sats: i64) -> String {
    let sign = if sats < 0 { "-" } else { "" };
    let abs = sats.unsigned_abs();
    let coin = COIN as u64;
    format!("{sign}{}.{:08}", abs / coin, abs % coin)
}

/// Inverse of [`format_sats`].
pub fn parse_sats(amount: &str) -> Option<i64> {
    let (negative, digits) = match amount.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, amount),
    };
    let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if frac.len() > 8 {
        return None;
    }
    let whole: i64 = whole.parse().ok()?;
    let frac: i64 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<8}").parse().ok()?
    };
    let sats = whole.checked_mul(COIN)?.checked_add(frac)?;
    Some(if negative { -sats } else { sats })
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_JSON: &str = r#"{
        "hash": "bb",
        "height": 1,
        "previousblockhash": "aa",
        "time": 1600000010,
        "mediantime": 1600000000,
        "version": 536870912,
        "merkleroot": "cc",
        "size": 300,
        "strippedsize": 250,
        "weight": 1050,
        "difficulty": 1.0,
        "minter": "8defichainBurnAddressXXXXXXXdRQkSm",
        "mintedBlocks": 3,
        "tx": [
            {
                "txid": "c0",
                "hash": "c0",
                "version": 4,
                "size": 100,
                "vsize": 100,
                "weight": 400,
                "locktime": 0,
                "vin": [{ "coinbase": "0101", "sequence": 4294967295 }],
                "vout": [
                    { "value": 38.0, "n": 0, "scriptPubKey": { "asm": "", "hex": "76a914", "type": "pubkeyhash" }, "tokenId": 0 }
                ]
            },
            {
                "txid": "d0",
                "vin": [{ "txid": "c0", "vout": 0, "scriptSig": { "asm": "", "hex": "" }, "sequence": 1 }],
                "vout": [
                    { "value": 0.0, "n": 0, "scriptPubKey": { "hex": "6a0444665478" } }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_node_block() {
        let block: RawBlock = serde_json::from_str(BLOCK_JSON).unwrap();
        assert_eq!(block.height, 1);
        assert!(block.extends("aa"));
        assert!(block.tx[0].is_coinbase());
        assert!(!block.tx[1].is_coinbase());
        match &block.tx[1].vin[0] {
            RawVin::Spend(s) => {
                assert_eq!(s.txid, "c0");
                assert_eq!(s.vout, 0);
            }
            other => panic!("expected spend, got {other:?}"),
        }
        assert!(block.tx[1].vout[0].script_pub_key.is_op_return());
        assert_eq!(block.reward(), 38 * COIN);
    }

    #[test]
    fn genesis_has_no_parent() {
        let json = r#"{"hash":"g","height":0,"time":0,"mediantime":0,"tx":[]}"#;
        let block: RawBlock = serde_json::from_str(json).unwrap();
        assert!(block.previous_hash.is_none());
        assert!(!block.extends(""));
    }

    #[test]
    fn amount_formatting() {
        assert_eq!(format_sats(100_000_000 * COIN), "100000000.00000000");
        assert_eq!(format_sats(0), "0.00000000");
        assert_eq!(format_sats(1), "0.00000001");
        assert_eq!(format_sats(-150_000_000), "-1.50000000");
        assert_eq!(coins_to_sats(0.1), 10_000_000);
        assert_eq!(coins_to_sats(100_000_000.0), 100_000_000 * COIN);
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_sats("100000000.00000000"), Some(100_000_000 * COIN));
        assert_eq!(parse_sats("0.5"), Some(50_000_000));
        assert_eq!(parse_sats("-1.50000000"), Some(-150_000_000));
        assert_eq!(parse_sats("1.000000001"), None);
        assert_eq!(parse_sats("abc"), None);
    }
}
