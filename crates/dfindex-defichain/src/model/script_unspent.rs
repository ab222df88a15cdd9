use dfindex_core::error::IndexerError;
use dfindex_core::keys;
use dfindex_core::store::Entity;
use dfindex_core::types::BlockContext;
use serde::{Deserialize, Serialize};

use super::{Script, TransactionVoutModel};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptUnspentVout {
    pub txid: String,
    pub n: u32,
    pub value: String,
    pub token_id: Option<u32>,
}

/// An output currently unspent, keyed under its script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptUnspentModel {
    pub id: String,
    pub hid: String,
    /// Block that created the output.
    pub block: BlockContext,
    pub script: Script,
    pub vout: ScriptUnspentVout,
    pub sort: String,
}

impl ScriptUnspentModel {
    pub fn new(
        hid: &str,
        block: BlockContext,
        vout: &TransactionVoutModel,
    ) -> Result<Self, IndexerError> {
        let n = keys::encode_vout_index(u64::from(vout.n))?;
        let sort = format!("{}{}{n}", keys::encode_height(block.height)?, vout.txid);
        Ok(Self {
            id: format!("{}{n}", vout.txid),
            hid: hid.to_string(),
            block,
            script: vout.script.clone(),
            vout: ScriptUnspentVout {
                txid: vout.txid.clone(),
                n: vout.n,
                value: vout.value.clone(),
                token_id: vout.token_id,
            },
            sort,
        })
    }
}

impl Entity for ScriptUnspentModel {
    const KIND: &'static str = "script_unspent";

    fn id(&self) -> String {
        self.id.clone()
    }

    fn partition_key(&self) -> String {
        self.hid.clone()
    }

    fn sort_key(&self) -> String {
        self.sort.clone()
    }
}
