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

//! Defines the RenderTask, the frame-locked snapshot consumer.

#[cfg(debug_assertions)]
use super::providers::SceneInspector;
use super::providers::WindowProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use weft_core::feed::topic::{
    CREATE_OBJECT, CREATE_TERRAIN, THREAD_EVENT, WINDOW_PROVIDER,
};
#[cfg(debug_assertions)]
use weft_core::feed::topic::SCENE_INSPECT;
use weft_core::feed::SubscriptionId;
use weft_core::math::Vec3;
#[cfg(debug_assertions)]
use weft_core::payload::SceneSummary;
use weft_core::payload::{ObjectHandle, ObjectToCreate, Payload, ThreadEvent, WindowHandle};
use weft_core::snapshot::{SnapshotExchange, SnapshotReader};
use weft_core::{AppContext, FrameTime, RunFlag, Task};

/// Configuration of the [`RenderTask`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target frame duration; the task sleeps off what is left of it.
    pub frame_interval_ms: u64,
    /// Identifier served as `window.handle`.
    pub window_id: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            window_id: 1,
        }
    }
}

/// The render task's own view of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    /// Resource specification the visual was built from.
    pub specification: String,
    /// Last position adopted from a snapshot.
    pub position: Vec3,
    /// Visual scale.
    pub scale: Vec3,
}

#[derive(Debug, Default)]
struct FrameStats {
    frames: u64,
    busy: Duration,
    /// Snapshot nodes with no matching scene entry yet.
    unmatched: u64,
}

/// The render task.
pub struct RenderTask {
    context: Arc<AppContext>,
    config: RenderConfig,
    running: RunFlag,
    reader: Option<SnapshotReader>,
    additions: Arc<Mutex<Vec<ObjectToCreate>>>,
    subscriptions: Vec<SubscriptionId>,
    window: Arc<WindowProvider>,
    #[cfg(debug_assertions)]
    inspector: Arc<SceneInspector>,
    scene: HashMap<ObjectHandle, SceneEntry>,
    stats: FrameStats,
    started: Option<Instant>,
}

impl RenderTask {
    /// Creates the task. Nothing is subscribed or offered until `on_start`.
    pub fn new(context: Arc<AppContext>, config: RenderConfig) -> Self {
        Self {
            window: Arc::new(WindowProvider::new(WindowHandle(config.window_id))),
            #[cfg(debug_assertions)]
            inspector: Arc::new(SceneInspector::default()),
            context,
            config,
            running: RunFlag::new(),
            reader: None,
            additions: Arc::new(Mutex::new(Vec::new())),
            subscriptions: Vec::new(),
            scene: HashMap::new(),
            stats: FrameStats::default(),
            started: None,
        }
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.stats.frames
    }

    /// The scene entry for `handle`.
    pub fn entry(&self, handle: ObjectHandle) -> Option<&SceneEntry> {
        self.scene.get(&handle)
    }

    /// Number of objects in the scene.
    pub fn scene_len(&self) -> usize {
        self.scene.len()
    }

    /// Sequence of the snapshot on screen.
    pub fn front_sequence(&self) -> u64 {
        self.reader.as_ref().map_or(0, SnapshotReader::sequence)
    }

    fn announce(&self, event: ThreadEvent) {
        self.context
            .bus
            .publish(THREAD_EVENT, Payload::Thread(event));
    }

    fn queue_additions(&mut self, topic: &str) {
        let additions = Arc::clone(&self.additions);
        let id = self.context.bus.subscribe(topic, move |envelope| {
            let object = match &envelope.payload {
                Payload::CreateObject(object) | Payload::CreateTerrain(object) => object.clone(),
                _ => return,
            };
            additions
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(object);
        });
        self.subscriptions.push(id);
    }

    /// Builds scene entries for objects requested since the last frame.
    fn build_pending(&mut self) {
        let pending =
            std::mem::take(&mut *self.additions.lock().unwrap_or_else(|e| e.into_inner()));
        for object in pending {
            self.scene.insert(
                object.node.handle,
                SceneEntry {
                    specification: object.specification,
                    position: object.node.position,
                    scale: object.scale,
                },
            );
        }
    }

    fn update_positions(&mut self) {
        let Some(reader) = &self.reader else {
            return;
        };
        for node in &reader.front().nodes {
            match self.scene.get_mut(&node.handle) {
                Some(entry) => entry.position = node.position,
                None => self.stats.unmatched += 1,
            }
        }
    }
}

impl Task for RenderTask {
    fn name(&self) -> &str {
        "render"
    }

    fn on_start(&mut self) -> anyhow::Result<()> {
        self.announce(ThreadEvent::Starting);

        let bus = &self.context.bus;
        self.running.stop_on_shutdown(bus, "RenderTask");
        let (reader, id) = SnapshotExchange::attach(bus);
        self.reader = Some(reader);
        self.subscriptions.push(id);
        self.queue_additions(CREATE_OBJECT);
        self.queue_additions(CREATE_TERRAIN);

        let bus = &self.context.bus;
        if let Some(conflict) = bus.offer(WINDOW_PROVIDER, &self.window) {
            log::warn!("RenderTask: {} [{}]", conflict, conflict.as_label());
        }
        #[cfg(debug_assertions)]
        if let Some(conflict) = bus.offer(SCENE_INSPECT, &self.inspector) {
            log::warn!("RenderTask: {} [{}]", conflict, conflict.as_label());
        }

        log::info!(
            "RenderTask: window {} ready, frame interval {} ms",
            self.config.window_id,
            self.config.frame_interval_ms
        );
        self.started = Some(Instant::now());
        self.announce(ThreadEvent::Ready);
        Ok(())
    }

    fn on_step(&mut self, _frame: &FrameTime) -> anyhow::Result<bool> {
        let frame_started = Instant::now();

        if let Some(reader) = self.reader.as_mut() {
            reader.acquire();
        }
        self.build_pending();
        self.update_positions();
        self.stats.frames += 1;

        #[cfg(debug_assertions)]
        self.inspector.update(SceneSummary {
            sequence: self.front_sequence(),
            nodes: self.reader.as_ref().map_or(0, |r| r.front().len()),
            frames: self.stats.frames,
        });

        let busy = frame_started.elapsed();
        self.stats.busy += busy;
        let interval = Duration::from_millis(self.config.frame_interval_ms);
        if let Some(rest) = interval.checked_sub(busy) {
            thread::sleep(rest);
        }
        Ok(self.running.is_running())
    }

    fn on_stop(&mut self) -> anyhow::Result<()> {
        let bus = &self.context.bus;
        for id in self.subscriptions.drain(..) {
            bus.unsubscribe(id);
        }
        bus.revoke(WINDOW_PROVIDER);
        #[cfg(debug_assertions)]
        bus.revoke(SCENE_INSPECT);

        let runtime = self
            .started
            .map_or(Duration::ZERO, |started| started.elapsed())
            .as_secs_f64();
        let (swaps, received, dropped) = self.reader.as_ref().map_or((0, 0, 0), |r| {
            (r.swaps(), r.exchange().received(), r.exchange().dropped())
        });
        log::info!(
            "RenderTask: {} frames in {:.3}s ({:.1} fps), {:.3}s busy",
            self.stats.frames,
            runtime,
            if runtime > 0.0 {
                self.stats.frames as f64 / runtime
            } else {
                0.0
            },
            self.stats.busy.as_secs_f64()
        );
        log::info!(
            "RenderTask: {} snapshots received, {} adopted, {} dropped, {} unmatched nodes",
            received,
            swaps,
            dropped,
            self.stats.unmatched
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::feed::topic::{WINDOW_HANDLE, WORLD_DYNAMIC};
    use weft_core::math::Quaternion;
    use weft_core::payload::{SceneNode, WorldGraph};

    fn quick() -> RenderConfig {
        RenderConfig {
            frame_interval_ms: 0,
            window_id: 9,
        }
    }

    fn object(handle: u32) -> ObjectToCreate {
        ObjectToCreate {
            node: SceneNode {
                handle: ObjectHandle(handle),
                position: Vec3::ZERO,
                orientation: Quaternion::IDENTITY,
            },
            scale: Vec3::ONE,
            specification: "ogrehead.mesh".into(),
        }
    }

    fn snapshot(sequence: u64, handle: u32, x: f32) -> Payload {
        let mut graph = WorldGraph::new(sequence);
        graph.nodes.push(SceneNode {
            handle: ObjectHandle(handle),
            position: Vec3::new(x, 0.0, 0.0),
            orientation: Quaternion::IDENTITY,
        });
        Payload::WorldSnapshot(Arc::new(graph))
    }

    #[test]
    fn announces_itself_and_offers_the_window() {
        let context = AppContext::new();
        let threads = context.bus.subscribe_queue(THREAD_EVENT);
        let mut render = RenderTask::new(Arc::clone(&context), quick());
        render.on_start().unwrap();

        let events: Vec<_> = threads
            .drain()
            .into_iter()
            .filter_map(|e| e.payload.as_thread())
            .collect();
        assert_eq!(events, [ThreadEvent::Starting, ThreadEvent::Ready]);
        assert_eq!(
            context.bus.request(WINDOW_HANDLE, Duration::ZERO),
            Ok(Payload::Window(WindowHandle(9)))
        );

        render.on_stop().unwrap();
        assert!(context.bus.request(WINDOW_HANDLE, Duration::ZERO).is_err());
        assert_eq!(context.bus.subscriber_count(WORLD_DYNAMIC), 0);
    }

    #[test]
    fn adopts_only_the_newest_snapshot() {
        let context = AppContext::new();
        let mut render = RenderTask::new(Arc::clone(&context), quick());
        render.on_start().unwrap();
        let bus = &context.bus;

        bus.publish(CREATE_OBJECT, Payload::CreateObject(object(3)));
        for sequence in 1..=4 {
            bus.publish(WORLD_DYNAMIC, snapshot(sequence, 3, sequence as f32));
        }
        assert!(render.on_step(&FrameTime::default()).unwrap());

        assert_eq!(render.front_sequence(), 4);
        assert_eq!(render.scene_len(), 1);
        assert_eq!(
            render.entry(ObjectHandle(3)).unwrap().position,
            Vec3::new(4.0, 0.0, 0.0)
        );
        assert_eq!(render.frames(), 1);

        // Nothing new: the front stays put.
        render.on_step(&FrameTime::default()).unwrap();
        assert_eq!(render.front_sequence(), 4);
        render.on_stop().unwrap();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn debug_builds_serve_scene_inspection() {
        use weft_core::feed::topic::SCENE_INSPECT;

        let context = AppContext::new();
        let mut render = RenderTask::new(Arc::clone(&context), quick());
        render.on_start().unwrap();
        context.bus.publish(WORLD_DYNAMIC, snapshot(7, 1, 0.0));
        render.on_step(&FrameTime::default()).unwrap();

        assert_eq!(
            context.bus.request(SCENE_INSPECT, Duration::ZERO),
            Ok(Payload::Inspection(SceneSummary {
                sequence: 7,
                nodes: 1,
                frames: 1,
            }))
        );
    }
}
