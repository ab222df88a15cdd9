//! Projection row types. Each is owned by exactly one indexer.

mod auction_bid;
mod block;
mod dex_swap;
mod script_activity;
mod script_aggregation;
mod script_unspent;
mod token;
mod transaction;
mod transaction_vin;
mod transaction_vout;

pub use auction_bid::AuctionBidModel;
pub use block::BlockModel;
pub use dex_swap::{DexSwapKind, DexSwapModel, SwapFrom, SwapTo};
pub use script_activity::{ActivityOutPoint, ScriptActivityModel, ScriptActivityType};
pub use script_aggregation::{
    add_sats, ScriptAggregationAmount, ScriptAggregationModel, ScriptAggregationStatistic,
};
pub use script_unspent::{ScriptUnspentModel, ScriptUnspentVout};
pub use token::TokenModel;
pub use transaction::TransactionModel;
pub use transaction_vin::{TransactionVinModel, VinVout};
pub use transaction_vout::TransactionVoutModel;

use dfindex_core::types::ScriptPubKey;
use serde::{Deserialize, Serialize};

/// A locking script as stored on script-keyed rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "type")]
    pub kind: String,
    pub hex: String,
}

impl From<&ScriptPubKey> for Script {
    fn from(spk: &ScriptPubKey) -> Self {
        Self {
            kind: spk.kind.clone(),
            hex: spk.hex.clone(),
        }
    }
}
