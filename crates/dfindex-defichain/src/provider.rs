//! BlockProvider: the sync loop that walks the node's best chain one block
//! at a time and drives the [`RootIndexer`].
//!
//! # Stepping
//!
//! Each `synchronize()` step compares the highest indexed block (the cursor)
//! with the node:
//!   - nothing indexed: index genesis
//!   - next block builds on the cursor: index it
//!   - next block builds on something else: invalidate the cursor block
//!   - node has no next block yet: done for this cycle
//!
//! A reorg of depth k therefore takes k invalidation steps, highest block
//! first, before the new branch is indexed.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use dfindex_core::client::ChainClient;
use dfindex_core::error::IndexerError;
use dfindex_core::indexer::{Indexer, SyncState};
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::registry::RootIndexer;

const HEIGHT_POLL: Duration = Duration::from_millis(50);

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

pub struct BlockProvider<C> {
    client: C,
    db: Database,
    indexer: RootIndexer,
    state: watch::Sender<SyncState>,
}

impl<C: ChainClient> BlockProvider<C> {
    /// A provider running the standard indexer pipeline over `db`.
    pub fn new(client: C, db: Database) -> Self {
        let indexer = RootIndexer::new(&db);
        Self::with_indexer(client, db, indexer)
    }

    pub fn with_indexer(client: C, db: Database, indexer: RootIndexer) -> Self {
        let (state, _) = watch::channel(SyncState::Stopped);
        Self {
            client,
            db,
            indexer,
            state,
        }
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// `Stopped → Idle`. Returns `false` if the provider was already running.
    pub fn start(&self) -> bool {
        let started = self.state.send_if_modified(|state| {
            if *state == SyncState::Stopped {
                *state = SyncState::Idle;
                true
            } else {
                false
            }
        });
        if started {
            info!("block provider started");
        }
        started
    }

    /// Run one cycle if idle. Returns `false` without doing anything when the
    /// provider is stopped or a cycle is already in flight.
    pub async fn tick(&self) -> bool {
        let acquired = self.state.send_if_modified(|state| {
            if *state == SyncState::Idle {
                *state = SyncState::Cycling;
                true
            } else {
                false
            }
        });
        if !acquired {
            return false;
        }

        match AssertUnwindSafe(self.cycle()).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "sync cycle failed"),
            Err(panic) => error!(panic = panic_message(&*panic), "sync cycle panicked"),
        }

        self.state.send_modify(|state| {
            *state = match *state {
                SyncState::Stopping => SyncState::Stopped,
                _ => SyncState::Idle,
            };
        });
        true
    }

    /// Step until caught up, or until a stop is requested.
    pub async fn cycle(&self) -> Result<(), IndexerError> {
        while self.synchronize().await? {
            if self.state() != SyncState::Cycling {
                break;
            }
        }
        Ok(())
    }

    /// Advance the projections by one step. Returns `true` if a block was
    /// indexed or invalidated.
    pub async fn synchronize(&self) -> Result<bool, IndexerError> {
        let Some(cursor) = self.db.highest_block().await? else {
            let hash = self.client.get_block_hash(0).await?;
            let genesis = self.client.get_block(&hash).await?;
            info!(hash = %genesis.hash, "indexing genesis block");
            self.indexer.index(&genesis).await?;
            return Ok(true);
        };

        let height = cursor.height + 1;
        let hash = match self.client.get_block_hash(height).await {
            Ok(hash) => hash,
            Err(e) if e.is_out_of_range() => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let block = self.client.get_block(&hash).await?;

        if block.extends(&cursor.hash) {
            self.indexer.index(&block).await?;
            info!(height, hash = %block.hash, txs = block.tx.len(), "indexed block");
        } else {
            warn!(
                height = cursor.height,
                hash = %cursor.hash,
                next_previous_hash = ?block.previous_hash,
                "best chain moved, invalidating block"
            );
            self.indexer.invalidate(&cursor.raw).await?;
        }
        Ok(true)
    }

    /// Request a stop. An idle provider stops at once; an in-flight cycle
    /// finishes its current step first. Returns `true` if the provider
    /// reached `Stopped` within `timeout`.
    pub async fn stop(&self, timeout: Duration) -> bool {
        let mut previous = SyncState::Stopped;
        self.state.send_if_modified(|state| {
            previous = *state;
            match *state {
                SyncState::Idle => {
                    *state = SyncState::Stopped;
                    true
                }
                SyncState::Cycling => {
                    *state = SyncState::Stopping;
                    true
                }
                SyncState::Stopped | SyncState::Stopping => false,
            }
        });
        if previous.is_quiescent() {
            info!("block provider stopped");
            return true;
        }

        let mut rx = self.state.subscribe();
        let stopped = matches!(
            tokio::time::timeout(timeout, rx.wait_for(|s| *s == SyncState::Stopped)).await,
            Ok(Ok(_))
        );
        if stopped {
            info!("block provider stopped");
        } else {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "block provider did not stop in time"
            );
        }
        stopped
    }

    /// Tick every `interval` until stopped. Call [`start`](Self::start) first.
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.state() == SyncState::Stopped {
                break;
            }
            self.tick().await;
        }
    }

    /// Height of the highest indexed block.
    pub async fn indexed_height(&self) -> Result<Option<u64>, IndexerError> {
        Ok(self.db.highest_block().await?.map(|b| b.height))
    }

    /// Wait until blocks up to `height` are indexed. Returns `false` on
    /// timeout.
    pub async fn wait_for_height(
        &self,
        height: u64,
        timeout: Duration,
    ) -> Result<bool, IndexerError> {
        let reached = async {
            loop {
                let highest = self.db.highest_block().await?;
                if highest.is_some_and(|b| b.cursor().has_reached(height)) {
                    return Ok::<_, IndexerError>(());
                }
                tokio::time::sleep(HEIGHT_POLL).await;
            }
        };
        match tokio::time::timeout(timeout, reached).await {
            Ok(result) => result.map(|()| true),
            Err(_) => Ok(false),
        }
    }
}
