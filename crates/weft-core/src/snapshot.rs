// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Double-buffered hand-off of world snapshots from a producer to a consumer.
//!
//! The producer (simulation) publishes a freshly built
//! [`WorldGraph`] on [`WORLD_DYNAMIC`] every production cycle. The
//! [`SnapshotExchange`] subscriber parks the newest one in a single back-buffer
//! slot; the consumer's [`SnapshotReader`] adopts it at the top of its frame.
//!
//! ```text
//!  producer thread                 exchange (mutex)            consumer thread
//!  publish(world_dynamic, g_n) ──► back = g_n, fresh = true
//!                                                        ◄──── acquire(): take back,
//!                                                              fresh = false, unlock,
//!                                                              front = g_n, drop g_old
//! ```
//!
//! The mutex guards only the slot exchange. The consumer renders against its
//! front buffer outside the lock, and the displaced front is released after the
//! lock is gone. If the producer outpaces the consumer only the newest snapshot
//! survives; the ones it overwrote are counted in [`SnapshotExchange::dropped`].

use crate::feed::topic::WORLD_DYNAMIC;
use crate::feed::{FeedBus, SubscriptionId};
use crate::payload::{Envelope, Payload, WorldGraph};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct BackSlot {
    back: Option<WorldGraph>,
    fresh: bool,
}

/// The shared half of the exchange: receives snapshots from the bus.
#[derive(Default)]
pub struct SnapshotExchange {
    slot: Mutex<BackSlot>,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl SnapshotExchange {
    /// Creates an exchange subscribed to [`WORLD_DYNAMIC`] on `bus`, plus the
    /// reader that owns the front buffer.
    ///
    /// The bus binding is weak: dropping both the reader and every other clone
    /// of the exchange turns the subscription inert.
    pub fn attach(bus: &FeedBus) -> (SnapshotReader, SubscriptionId) {
        let exchange = Arc::new(SnapshotExchange::default());
        let id = bus.subscribe_weak(WORLD_DYNAMIC, &exchange, SnapshotExchange::on_envelope);
        log::debug!("SnapshotExchange attached to '{}'.", WORLD_DYNAMIC);
        (SnapshotReader::new(exchange), id)
    }

    fn lock(&self) -> MutexGuard<'_, BackSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_envelope(&self, envelope: &Envelope) {
        match &envelope.payload {
            Payload::WorldSnapshot(graph) => self.store(graph),
            other => log::warn!(
                "SnapshotExchange: ignoring {} payload on '{}'.",
                other.kind(),
                envelope.topic
            ),
        }
    }

    /// Stores a copy of `graph` as the pending back buffer, replacing any
    /// snapshot the consumer has not adopted yet.
    pub fn store(&self, graph: &Arc<WorldGraph>) {
        // Copy before locking so the critical section is only the slot write.
        let incoming = WorldGraph::clone(graph);
        let displaced = {
            let mut slot = self.lock();
            let displaced = if slot.fresh { slot.back.take() } else { None };
            slot.back = Some(incoming);
            slot.fresh = true;
            displaced
        };
        self.received.fetch_add(1, Ordering::Relaxed);
        if let Some(stale) = displaced {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!(
                "SnapshotExchange: snapshot {} overwritten before the consumer adopted it.",
                stale.sequence
            );
        }
    }

    /// Takes the pending snapshot if one arrived since the last call.
    fn take_fresh(&self) -> Option<WorldGraph> {
        let mut slot = self.lock();
        if !slot.fresh {
            return None;
        }
        slot.fresh = false;
        slot.back.take()
    }

    /// Returns `true` if a snapshot is waiting to be adopted.
    pub fn pending(&self) -> bool {
        self.lock().fresh
    }

    /// Snapshots received from the bus so far.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Snapshots overwritten before the consumer adopted them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The consumer's half of the exchange. Owns the front buffer exclusively.
pub struct SnapshotReader {
    exchange: Arc<SnapshotExchange>,
    front: WorldGraph,
    swaps: u64,
}

impl SnapshotReader {
    fn new(exchange: Arc<SnapshotExchange>) -> Self {
        Self {
            exchange,
            front: WorldGraph::default(),
            swaps: 0,
        }
    }

    /// Adopts the newest snapshot, if any arrived since the previous call.
    ///
    /// Call once at the start of each frame. Returns `true` when the front
    /// buffer changed. The previous front buffer is released after the swap.
    pub fn acquire(&mut self) -> bool {
        let Some(incoming) = self.exchange.take_fresh() else {
            return false;
        };
        let displaced = std::mem::replace(&mut self.front, incoming);
        self.swaps += 1;
        log::trace!(
            "SnapshotReader: front {} -> {} ({} nodes).",
            displaced.sequence,
            self.front.sequence,
            self.front.len()
        );
        drop(displaced);
        true
    }

    /// The stable snapshot to render this frame.
    pub fn front(&self) -> &WorldGraph {
        &self.front
    }

    /// Sequence number of the front buffer (`0` before the first swap).
    pub fn sequence(&self) -> u64 {
        self.front.sequence
    }

    /// Number of successful swaps.
    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    /// The shared half, for diagnostics.
    pub fn exchange(&self) -> &Arc<SnapshotExchange> {
        &self.exchange
    }
}
