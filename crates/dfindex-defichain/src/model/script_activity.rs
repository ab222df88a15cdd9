use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::BlockContext;
use serde::{Deserialize, Serialize};

use super::Script;

/// Whether value left (`Vin`) or entered (`Vout`) the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptActivityType {
    Vin,
    Vout,
}

impl ScriptActivityType {
    /// Key fragment; vins sort before vouts at the same height.
    pub fn type_hex(&self) -> &'static str {
        match self {
            Self::Vin => "00",
            Self::Vout => "01",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityOutPoint {
    pub txid: String,
    pub n: u32,
}

/// One movement of value into or out of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptActivityModel {
    pub id: String,
    pub hid: String,
    #[serde(rename = "type")]
    pub kind: ScriptActivityType,
    pub type_hex: String,
    /// Transaction doing the spending or receiving.
    pub txid: String,
    pub block: BlockContext,
    pub script: Script,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<ActivityOutPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vout: Option<ActivityOutPoint>,
    pub value: String,
    pub token_id: Option<u32>,
}

impl ScriptActivityModel {
    /// `hid ‖ height ‖ type ‖ txid ‖ n`, where `(txid, n)` is the output
    /// created (vout) or spent (vin).
    pub fn id_of(
        hid: &str,
        height: u64,
        kind: ScriptActivityType,
        txid: &str,
        n: u32,
    ) -> Result<String, IndexerError> {
        Ok(format!(
            "{hid}{}{}{txid}{}",
            keys::encode_height(height)?,
            kind.type_hex(),
            keys::encode_vout_index(u64::from(n))?
        ))
    }
}

impl Entity for ScriptActivityModel {
    const KIND: &'static str = "script_activity";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.hid.clone()
    }

    fn sort_key(&self) -> String {
        self.id.clone()
    }
}
