//! End-to-end indexing of hand-built blocks through the full RootIndexer.

use dfindex_core::indexer::Indexer;
use dfindex_core::keys;
use dfindex_core::store::{ProjectionStore, QueryOptions};
use dfindex_core::types::RawBlock;
use dfindex_defichain::dftx::{
    op, AuctionBid, CompositeSwap, CreateToken, DfTxPayload, MaxPrice, PoolSwap,
};
use dfindex_defichain::mock::BlockBuilder;
use dfindex_defichain::model::{DexSwapKind, ScriptActivityType, TokenModel};
use dfindex_defichain::{MemoryDatabase, RootIndexer};

const S: &str = "00141111111111111111111111111111111111111111";
const R: &str = "00142222222222222222222222222222222222222222";
const MINER: &str = "00143333333333333333333333333333333333333333";

fn setup() -> (MemoryDatabase, RootIndexer) {
    let mem = MemoryDatabase::new();
    let root = RootIndexer::new(&mem.database());
    (mem, root)
}

/// genesis pays S, block 1 pays only the miner, block 2 moves S's coins to R.
fn three_blocks() -> Vec<RawBlock> {
    let genesis = BlockBuilder::genesis()
        .coinbase(&[(S, 100_000_000.0)])
        .build();
    let b1 = BlockBuilder::child_of(&genesis)
        .coinbase(&[(MINER, 2.0)])
        .build();
    let funding = genesis.tx[0].txid.clone();
    let b2 = BlockBuilder::child_of(&b1)
        .coinbase(&[(MINER, 2.0)])
        .transaction(&[(funding.as_str(), 0)], &[(R, 100_000_000.0)])
        .build();
    vec![genesis, b1, b2]
}

fn swap(from_amount: i64) -> PoolSwap {
    PoolSwap {
        from_script: MINER.into(),
        from_token_id: 0,
        from_amount,
        to_script: MINER.into(),
        to_token_id: 2,
        max_price: MaxPrice {
            integer: 10,
            fraction: 0,
        },
    }
}

#[tokio::test]
async fn script_aggregation_tracks_receive_and_spend() {
    let (mem, root) = setup();
    let blocks = three_blocks();
    let hid_s = keys::hash_script(S).unwrap();
    let hid_r = keys::hash_script(R).unwrap();

    root.index(&blocks[0]).await.unwrap();
    root.index(&blocks[1]).await.unwrap();

    let rows = mem
        .script_aggregations
        .query(&hid_s, QueryOptions::desc(0))
        .await
        .unwrap()
        .items;
    assert_eq!(rows.len(), 1);
    let genesis_row = &rows[0];
    assert_eq!(genesis_row.block.height, 0);
    assert_eq!(genesis_row.statistic.tx_count, 1);
    assert_eq!(genesis_row.statistic.tx_in_count, 1);
    assert_eq!(genesis_row.statistic.tx_out_count, 0);
    assert_eq!(genesis_row.amount.tx_in, "100000000.00000000");
    assert_eq!(genesis_row.amount.unspent, "100000000.00000000");

    root.index(&blocks[2]).await.unwrap();

    let latest = mem.script_aggregations.latest(&hid_s).await.unwrap().unwrap();
    assert_eq!(latest.block.height, 2);
    assert_eq!(latest.statistic.tx_count, 2);
    assert_eq!(latest.statistic.tx_in_count, 1);
    assert_eq!(latest.statistic.tx_out_count, 1);
    assert_eq!(latest.amount.tx_out, "100000000.00000000");
    assert_eq!(latest.amount.unspent, "0.00000000");

    let receiver = mem.script_aggregations.latest(&hid_r).await.unwrap().unwrap();
    assert_eq!(receiver.block.height, 2);
    assert_eq!(receiver.statistic.tx_in_count, 1);
    assert_eq!(receiver.amount.unspent, "100000000.00000000");
}

#[tokio::test]
async fn unspent_and_activity_follow_spends() {
    let (mem, root) = setup();
    let blocks = three_blocks();
    for block in &blocks {
        root.index(block).await.unwrap();
    }
    let hid_s = keys::hash_script(S).unwrap();
    let hid_r = keys::hash_script(R).unwrap();

    let s_unspent = mem
        .script_unspents
        .query(&hid_s, QueryOptions::asc(0))
        .await
        .unwrap();
    assert!(s_unspent.items.is_empty());

    let r_unspent = mem
        .script_unspents
        .query(&hid_r, QueryOptions::asc(0))
        .await
        .unwrap();
    assert_eq!(r_unspent.items.len(), 1);
    assert_eq!(r_unspent.items[0].vout.txid, blocks[2].tx[1].txid);
    assert_eq!(r_unspent.items[0].block.height, 2);

    let activity = mem
        .script_activities
        .query(&hid_s, QueryOptions::asc(0))
        .await
        .unwrap()
        .items;
    let kinds: Vec<_> = activity.iter().map(|a| (a.block.height, a.kind)).collect();
    assert_eq!(
        kinds,
        vec![(0, ScriptActivityType::Vout), (2, ScriptActivityType::Vin)]
    );
    // the spend is recorded against the spending transaction
    assert_eq!(activity[1].txid, blocks[2].tx[1].txid);
    assert_eq!(activity[1].value, "100000000.00000000");
}

#[tokio::test]
async fn indexing_twice_is_idempotent() {
    let (mem, root) = setup();
    for block in three_blocks() {
        root.index(&block).await.unwrap();
        let once = mem.snapshot();
        root.index(&block).await.unwrap();
        assert_eq!(mem.snapshot(), once, "height {}", block.height);
    }
}

#[tokio::test]
async fn invalidate_restores_previous_state() {
    let (mem, root) = setup();
    let blocks = three_blocks();
    let mut snapshots = vec![mem.snapshot()];
    for block in &blocks {
        root.index(block).await.unwrap();
        snapshots.push(mem.snapshot());
    }

    for (i, block) in blocks.iter().enumerate().rev() {
        root.invalidate(block).await.unwrap();
        assert_eq!(mem.snapshot(), snapshots[i], "after invalidating {}", block.height);
    }
}

#[tokio::test]
async fn invalidate_handles_in_block_spends() {
    let (mem, root) = setup();
    let genesis = BlockBuilder::genesis().coinbase(&[(S, 5.0)]).build();
    root.index(&genesis).await.unwrap();
    let before = mem.snapshot();

    // tx1 spends genesis, tx2 spends tx1 in the same block
    let funding = genesis.tx[0].txid.clone();
    let partial = BlockBuilder::child_of(&genesis)
        .coinbase(&[(MINER, 1.0)])
        .transaction(&[(funding.as_str(), 0)], &[(R, 5.0)])
        .build();
    let middle = partial.tx[1].txid.clone();
    let b1 = BlockBuilder::child_of(&genesis)
        .coinbase(&[(MINER, 1.0)])
        .transaction(&[(funding.as_str(), 0)], &[(R, 5.0)])
        .transaction(&[(middle.as_str(), 0)], &[(S, 5.0)])
        .build();

    root.index(&b1).await.unwrap();
    let hid_r = keys::hash_script(R).unwrap();
    let r_unspent = mem.script_unspents.query(&hid_r, QueryOptions::asc(0)).await.unwrap();
    assert!(r_unspent.items.is_empty());

    root.invalidate(&b1).await.unwrap();
    assert_eq!(mem.snapshot(), before);
}

#[tokio::test]
async fn missing_spent_output_is_fatal_and_rolled_back() {
    let (mem, root) = setup();
    let genesis = BlockBuilder::genesis().coinbase(&[(S, 1.0)]).build();
    root.index(&genesis).await.unwrap();
    let before = mem.snapshot();

    let orphan_spend = BlockBuilder::child_of(&genesis)
        .transaction(&[("ff".repeat(32).as_str(), 0)], &[(R, 1.0)])
        .build();
    let err = root.index(&orphan_spend).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");

    // the block row written before the failure is gone again
    assert!(mem.blocks.get(&orphan_spend.hash).await.unwrap().is_none());
    assert_eq!(mem.snapshot(), before);
}

#[tokio::test]
async fn genesis_seeds_native_token() {
    let (mem, root) = setup();
    let genesis = BlockBuilder::genesis().coinbase(&[(S, 1.0)]).build();
    root.index(&genesis).await.unwrap();

    let dfi = mem.tokens.get(TokenModel::NATIVE_ID).await.unwrap().unwrap();
    assert_eq!(dfi.symbol, "DFI");
    assert!(dfi.is_dat);

    root.invalidate(&genesis).await.unwrap();
    assert!(mem.tokens.is_empty());
}

#[tokio::test]
async fn dftx_records_keep_block_order() {
    let (mem, root) = setup();
    let genesis = BlockBuilder::genesis().coinbase(&[(MINER, 10.0)]).build();
    root.index(&genesis).await.unwrap();
    let funding = genesis.tx[0].txid.clone();

    let first = DfTxPayload::PoolSwap(swap(100)).to_script_hex().unwrap();
    let second = DfTxPayload::CompositeSwap(CompositeSwap {
        pool_swap: swap(200),
        pools: vec![4, 5],
    })
    .to_script_hex()
    .unwrap();
    let token = DfTxPayload::CreateToken(CreateToken {
        symbol: "GOLD".into(),
        name: "Gold".into(),
        decimal: 8,
        limit: 0,
        flags: 0x03,
    })
    .to_script_hex()
    .unwrap();
    let b1 = BlockBuilder::child_of(&genesis)
        .coinbase(&[(MINER, 1.0)])
        .transaction(&[(funding.as_str(), 0)], &[(first.as_str(), 0.0), (MINER, 9.0)])
        .transaction(&[], &[(token.as_str(), 0.0)])
        .transaction(&[], &[(second.as_str(), 0.0)])
        .build();
    root.index(&b1).await.unwrap();

    let swaps = mem
        .dex_swaps
        .query("0-2", QueryOptions::asc(0))
        .await
        .unwrap()
        .items;
    assert_eq!(swaps.len(), 2);
    assert!(swaps[0].txno < swaps[1].txno);
    assert_eq!(swaps[0].txid, b1.tx[1].txid);
    assert_eq!(swaps[0].kind, DexSwapKind::Direct);
    assert_eq!(swaps[0].from.amount, "0.00000100");
    assert_eq!(swaps[1].kind, DexSwapKind::Composite);
    assert_eq!(swaps[1].pools, vec![4, 5]);

    let gold = mem.tokens.get(&b1.tx[2].txid).await.unwrap().unwrap();
    assert_eq!(gold.symbol, "GOLD");
    assert!(gold.mintable && gold.tradeable && !gold.is_dat);

    root.invalidate(&b1).await.unwrap();
    assert!(mem.dex_swaps.is_empty());
    assert!(mem.tokens.get(&b1.tx[2].txid).await.unwrap().is_none());
}

#[tokio::test]
async fn auction_bids_are_grouped_per_batch() {
    let (mem, root) = setup();
    let genesis = BlockBuilder::genesis().coinbase(&[(MINER, 1.0)]).build();
    root.index(&genesis).await.unwrap();

    let vault = "ab".repeat(32);
    let bid = |amount| {
        DfTxPayload::AuctionBid(AuctionBid {
            vault_id: vault.clone(),
            index: 1,
            from: MINER.into(),
            token_id: 0,
            amount,
        })
        .to_script_hex()
        .unwrap()
    };
    let (low, high) = (bid(1_000), bid(2_000));
    let b1 = BlockBuilder::child_of(&genesis)
        .transaction(&[], &[(low.as_str(), 0.0)])
        .transaction(&[], &[(high.as_str(), 0.0)])
        .build();
    root.index(&b1).await.unwrap();

    let bids = mem
        .auction_bids
        .query(&format!("{vault}-1"), QueryOptions::desc(0))
        .await
        .unwrap()
        .items;
    assert_eq!(bids.len(), 2);
    assert_eq!(bids[0].amount, "0.00002000");
    assert_eq!(bids[1].amount, "0.00001000");
    assert_eq!(bids[0].id, format!("{vault}-1-{}", b1.tx[1].txid));
}

#[test]
fn registry_runs_in_fixed_order() {
    let (_, root) = setup();
    assert_eq!(
        root.names(),
        vec![
            "block",
            "dftx",
            "transaction",
            "transaction_vin",
            "transaction_vout",
            "script_activity",
            "script_aggregation",
            "script_unspent",
        ]
    );
    assert_eq!(op::POOL_SWAP, b's');
}
