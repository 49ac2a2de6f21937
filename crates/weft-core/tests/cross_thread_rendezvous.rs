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

//! Request/response and snapshot hand-off between real threads.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use weft_core::feed::topic::{WINDOW_HANDLE, WINDOW_PROVIDER, WORLD_DYNAMIC};
use weft_core::feed::DataProvider;
use weft_core::payload::{ObjectHandle, Payload, SceneNode, SettingValue, WindowHandle, WorldGraph};
use weft_core::snapshot::SnapshotExchange;
use weft_core::{AppContext, FeedError};

struct Window(u64);

impl DataProvider for Window {
    fn get_data(&self, name: &str) -> Option<Payload> {
        (name == WINDOW_HANDLE).then_some(Payload::Window(WindowHandle(self.0)))
    }
}

#[test]
fn input_waits_for_a_window_offered_by_another_thread() {
    let context = AppContext::new();

    let offering = {
        let context = Arc::clone(&context);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            let window = Arc::new(Window(77));
            context.bus.offer(WINDOW_PROVIDER, &window);
            // Keep the provider alive until the request has been answered.
            thread::sleep(Duration::from_millis(200));
        })
    };

    let started = Instant::now();
    let answer = context.bus.request(WINDOW_HANDLE, Duration::from_secs(2));
    assert_eq!(answer, Ok(Payload::Window(WindowHandle(77))));
    assert!(started.elapsed() >= Duration::from_millis(30));
    offering.join().unwrap();

    // The provider is gone once its owner dropped it.
    assert!(matches!(
        context.bus.request(WINDOW_HANDLE, Duration::ZERO),
        Err(FeedError::RequestTimeout { .. })
    ));
}

#[test]
fn settings_written_on_one_thread_are_served_on_another() {
    let context = AppContext::new();
    {
        let context = Arc::clone(&context);
        thread::spawn(move || context.settings.set("vsync", SettingValue::Bool(true)))
            .join()
            .unwrap();
    }
    match context.bus.request("settings.vsync", Duration::from_millis(50)) {
        Ok(Payload::Setting(setting)) => assert_eq!(setting.value, SettingValue::Bool(true)),
        other => panic!("unexpected answer {other:?}"),
    }
}

#[test]
fn consumer_sees_increasing_untorn_snapshots_while_producer_runs() {
    const SNAPSHOTS: u64 = 300;
    let context = AppContext::new();
    let (mut reader, _id) = SnapshotExchange::attach(&context.bus);

    let producer = {
        let context = Arc::clone(&context);
        thread::spawn(move || {
            for sequence in 1..=SNAPSHOTS {
                let mut graph = WorldGraph::new(sequence);
                for handle in 0..8 {
                    graph.nodes.push(SceneNode {
                        handle: ObjectHandle(handle),
                        position: weft_core::math::Vec3::new(sequence as f32, 0.0, 0.0),
                        ..SceneNode::default()
                    });
                }
                context
                    .bus
                    .publish(WORLD_DYNAMIC, Payload::WorldSnapshot(Arc::new(graph)));
            }
        })
    };

    let mut last = 0;
    while !producer.is_finished() {
        if reader.acquire() {
            let front = reader.front();
            assert!(front.sequence > last);
            assert!(front
                .nodes
                .iter()
                .all(|n| n.position.x == front.sequence as f32));
            last = front.sequence;
        }
    }
    producer.join().unwrap();
    reader.acquire();

    assert_eq!(reader.sequence(), SNAPSHOTS);
    let exchange = reader.exchange();
    assert_eq!(exchange.received(), SNAPSHOTS);
    assert_eq!(exchange.dropped() + reader.swaps(), SNAPSHOTS);
}
