//! Per-script event log: one row for each output a script receives and each
//! output it spends.

use async_trait::async_trait;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::Indexer;
use dfindex_core::keys;
use dfindex_core::types::{BlockContext, RawBlock, RawVin};

use super::VoutFinder;
use crate::database::Store;
use crate::model::{
    ActivityOutPoint, ScriptActivityModel, ScriptActivityType, TransactionVoutModel,
};

pub struct ScriptActivityIndexer {
    activities: Store<ScriptActivityModel>,
    finder: VoutFinder,
}

impl ScriptActivityIndexer {
    pub fn new(activities: Store<ScriptActivityModel>, finder: VoutFinder) -> Self {
        Self { activities, finder }
    }

    /// Every activity row `block` produces, in block order.
    async fn activities_of(
        &self,
        block: &RawBlock,
    ) -> Result<Vec<ScriptActivityModel>, IndexerError> {
        let context = BlockContext::from(block);
        let mut rows = Vec::new();
        for txn in &block.tx {
            for vin in &txn.vin {
                let RawVin::Spend(spend) = vin else {
                    continue;
                };
                let spent = self.finder.find_spent(block, spend).await?;
                rows.push(activity(
                    &context,
                    &txn.txid,
                    ScriptActivityType::Vin,
                    &spent,
                )?);
            }
            for vout in &txn.vout {
                if vout.script_pub_key.is_op_return() {
                    continue;
                }
                let created = TransactionVoutModel::new(txn, vout)?;
                rows.push(activity(
                    &context,
                    &txn.txid,
                    ScriptActivityType::Vout,
                    &created,
                )?);
            }
        }
        Ok(rows)
    }
}

fn activity(
    block: &BlockContext,
    txid: &str,
    kind: ScriptActivityType,
    vout: &TransactionVoutModel,
) -> Result<ScriptActivityModel, IndexerError> {
    let hid = keys::hash_script(&vout.script.hex)?;
    let outpoint = ActivityOutPoint {
        txid: vout.txid.clone(),
        n: vout.n,
    };
    let (vin, vout_ref) = match kind {
        ScriptActivityType::Vin => (Some(outpoint), None),
        ScriptActivityType::Vout => (None, Some(outpoint)),
    };
    Ok(ScriptActivityModel {
        id: ScriptActivityModel::id_of(&hid, block.height, kind, &vout.txid, vout.n)?,
        hid,
        kind,
        type_hex: kind.type_hex().to_string(),
        txid: txid.to_string(),
        block: block.clone(),
        script: vout.script.clone(),
        vin,
        vout: vout_ref,
        value: vout.value.clone(),
        token_id: vout.token_id,
    })
}

#[async_trait]
impl Indexer for ScriptActivityIndexer {
    fn name(&self) -> &str {
        "script_activity"
    }

    async fn index(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for row in self.activities_of(block).await? {
            self.activities.put(&row).await?;
        }
        Ok(())
    }

    async fn invalidate(&self, block: &RawBlock) -> Result<(), IndexerError> {
        for row in self.activities_of(block).await? {
            self.activities.delete(&row.id).await?;
        }
        Ok(())
    }
}
