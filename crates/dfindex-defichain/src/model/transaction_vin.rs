use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::{RawTransaction, RawVin};
use serde::{Deserialize, Serialize};

use super::{Script, TransactionVoutModel};

/// The output a vin spends, resolved at index time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VinVout {
    pub txid: String,
    pub n: u32,
    pub value: String,
    pub token_id: Option<u32>,
    pub script: Script,
}

impl From<&TransactionVoutModel> for VinVout {
    fn from(vout: &TransactionVoutModel) -> Self {
        Self {
            txid: vout.txid.clone(),
            n: vout.n,
            value: vout.value.clone(),
            token_id: vout.token_id,
            script: vout.script.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionVinModel {
    pub id: String,
    pub txid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coinbase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vout: Option<VinVout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_sig: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txinwitness: Vec<String>,
    pub sequence: u64,
}

impl TransactionVinModel {
    /// Coinbase vins carry no previous output, so `spent` is `None` for them.
    pub fn new(
        txn: &RawTransaction,
        vin: &RawVin,
        spent: Option<&TransactionVoutModel>,
    ) -> Result<Self, IndexerError> {
        let id = Self::id_of(&txn.txid, vin)?;
        let (coinbase, script_sig) = match vin {
            RawVin::Coinbase(c) => (Some(c.coinbase.clone()), None),
            RawVin::Spend(s) => (None, Some(s.script_sig.hex.clone())),
        };
        Ok(Self {
            id,
            txid: txn.txid.clone(),
            coinbase,
            vout: spent.map(VinVout::from),
            script_sig,
            txinwitness: vin.witness().to_vec(),
            sequence: vin.sequence(),
        })
    }

    /// `txid ‖ spent txid ‖ spent vout`, or `txid ‖ "00"` for a coinbase.
    pub fn id_of(txid: &str, vin: &RawVin) -> Result<String, IndexerError> {
        Ok(match vin {
            RawVin::Coinbase(_) => format!("{txid}00"),
            RawVin::Spend(s) => format!(
                "{txid}{}{}",
                s.txid,
                keys::encode_vout_index(u64::from(s.vout))?
            ),
        })
    }
}

impl Entity for TransactionVinModel {
    const KIND: &'static str = "transaction_vin";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.txid.clone()
    }

    fn sort_key(&self) -> String {
        self.id.clone()
    }
}
