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

use super::provider::{DataProvider, ProviderRegistry};
use super::queue::FeedReceiver;
use crate::error::{panic_message, FeedError};
use crate::payload::{Envelope, Payload};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Identifies one subscription on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Tuning knobs for a [`FeedBus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// How often a blocked `request` re-checks its provider, in microseconds.
    pub poll_interval_us: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_us: 100,
        }
    }
}

impl FeedConfig {
    /// The poll interval as a [`Duration`]. Never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us.max(1))
    }
}

/// Outcome of one [`FeedBus::publish`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Delivery {
    /// Subscribers that ran to completion.
    pub delivered: usize,
    /// Subscribers that panicked. Delivery continued past them.
    pub faulted: usize,
    /// Inert subscriptions (dropped target or receiver) removed during this call.
    pub pruned: usize,
    /// The publish was refused because it re-entered the topic being delivered
    /// on this thread.
    pub refused: bool,
}

enum Dispatch {
    Delivered,
    Inert,
}

type Callback = Arc<dyn Fn(&Envelope) -> Dispatch + Send + Sync>;

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    callback: Callback,
}

static NEXT_BUS_ID: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// (bus, topic) pairs currently being delivered on this thread.
    static DISPATCHING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

struct DispatchGuard;

impl DispatchGuard {
    fn enter(bus: usize, topic: &str) -> Option<Self> {
        DISPATCHING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(b, t)| *b == bus && t == topic) {
                None
            } else {
                stack.push((bus, topic.to_string()));
                Some(DispatchGuard)
            }
        })
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        DISPATCHING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The process-wide publish/subscribe and request/response hub.
///
/// # Delivery contract
///
/// [`publish`](Self::publish) invokes every subscriber of the topic
/// **synchronously, on the calling thread**, in registration order. There is
/// no internal queue: once `publish` returns, every subscriber has observed the
/// event. Consequently a callback:
///
/// - may run on any thread that publishes, concurrently with its owner's own
///   step logic, and must guard whatever state it touches;
/// - must not block indefinitely;
/// - must not publish on the topic it is currently receiving. Such a nested
///   publish is refused and reported via [`Delivery::refused`].
///
/// Subscribers that want their events on their own thread use
/// [`subscribe_queue`](Self::subscribe_queue) instead.
///
/// A panicking subscriber is caught, logged, and counted; the remaining
/// subscribers still receive the event.
pub struct FeedBus {
    id: usize,
    config: FeedConfig,
    topics: RwLock<HashMap<String, Arc<Vec<Subscriber>>>>,
    providers: Mutex<ProviderRegistry>,
    next_subscription: AtomicU64,
}

impl FeedBus {
    /// Creates an empty bus with the default configuration.
    pub fn new() -> Self {
        Self::with_config(FeedConfig::default())
    }

    /// Creates an empty bus.
    pub fn with_config(config: FeedConfig) -> Self {
        log::info!(
            "FeedBus initialized (request poll interval {:?}).",
            config.poll_interval()
        );
        Self {
            id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
            config,
            topics: RwLock::new(HashMap::new()),
            providers: Mutex::new(ProviderRegistry::default()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// The bus configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn add_subscriber(&self, topic: &str, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        let list = topics.entry(topic.to_string()).or_default();
        // Copy-on-write: publishers holding the previous list keep their view.
        Arc::make_mut(list).push(Subscriber { id, callback });
        log::debug!("FeedBus: subscription {:?} added to '{}'.", id, topic);
        id
    }

    /// Registers `callback` for future publishes on `topic`.
    ///
    /// Intended to be called from the subscribing task's `on_start`, before it
    /// begins stepping. The callback owns whatever it captures; call
    /// [`unsubscribe`](Self::unsubscribe) before that state goes away, or use
    /// [`subscribe_weak`](Self::subscribe_weak).
    pub fn subscribe<F>(&self, topic: &str, callback: F) -> SubscriptionId
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        self.add_subscriber(
            topic,
            Arc::new(move |envelope: &Envelope| {
                callback(envelope);
                Dispatch::Delivered
            }),
        )
    }

    /// Registers `handler` bound to `target` without keeping it alive.
    ///
    /// Once `target` is dropped the subscription is inert and is pruned on the
    /// next publish to `topic`.
    pub fn subscribe_weak<T, F>(&self, topic: &str, target: &Arc<T>, handler: F) -> SubscriptionId
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &Envelope) + Send + Sync + 'static,
    {
        let weak: Weak<T> = Arc::downgrade(target);
        self.add_subscriber(
            topic,
            Arc::new(move |envelope: &Envelope| match weak.upgrade() {
                Some(target) => {
                    handler(&target, envelope);
                    Dispatch::Delivered
                }
                None => Dispatch::Inert,
            }),
        )
    }

    /// Subscribes with queued delivery: each envelope is enqueued on an
    /// unbounded channel and handled whenever the owner drains the returned
    /// [`FeedReceiver`], on the owner's thread.
    pub fn subscribe_queue(&self, topic: &str) -> FeedReceiver {
        let (sender, receiver) = flume::unbounded();
        self.add_subscriber(
            topic,
            Arc::new(move |envelope: &Envelope| match sender.send(envelope.clone()) {
                Ok(()) => Dispatch::Delivered,
                Err(_) => Dispatch::Inert,
            }),
        );
        FeedReceiver::new(topic, receiver)
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        for list in topics.values_mut() {
            if let Some(pos) = list.iter().position(|s| s.id == id) {
                Arc::make_mut(list).remove(pos);
                log::debug!("FeedBus: subscription {:?} removed.", id);
                return true;
            }
        }
        false
    }

    /// Number of subscriptions currently registered on `topic`, inert ones included.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
            .map_or(0, |list| list.len())
    }

    /// Delivers `payload` to every subscriber of `topic`. See the type-level
    /// docs for the delivery contract. An unknown topic is not an error: it
    /// simply has no subscribers.
    pub fn publish(&self, topic: &str, payload: Payload) -> Delivery {
        let Some(_guard) = DispatchGuard::enter(self.id, topic) else {
            log::error!(
                "FeedBus: nested publish of {} on '{}' from one of its own subscribers refused.",
                payload.kind(),
                topic
            );
            return Delivery {
                refused: true,
                ..Delivery::default()
            };
        };

        let subscribers = {
            let topics = self.topics.read().unwrap_or_else(|e| e.into_inner());
            match topics.get(topic) {
                Some(list) => Arc::clone(list),
                None => {
                    log::trace!("FeedBus: no subscribers for '{}'.", topic);
                    return Delivery::default();
                }
            }
        };

        let envelope = Envelope::new(topic, payload);
        let mut delivery = Delivery::default();
        let mut inert = Vec::new();

        for subscriber in subscribers.iter() {
            match catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(&envelope))) {
                Ok(Dispatch::Delivered) => delivery.delivered += 1,
                Ok(Dispatch::Inert) => inert.push(subscriber.id),
                Err(panic) => {
                    delivery.faulted += 1;
                    log::error!(
                        "FeedBus: subscriber {:?} on '{}' panicked while handling {}: {}",
                        subscriber.id,
                        topic,
                        envelope.payload.kind(),
                        panic_message(panic.as_ref())
                    );
                }
            }
        }

        if !inert.is_empty() {
            let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
            if let Some(list) = topics.get_mut(topic) {
                Arc::make_mut(list).retain(|s| !inert.contains(&s.id));
            }
            delivery.pruned = inert.len();
            log::debug!(
                "FeedBus: pruned {} inert subscription(s) from '{}'.",
                delivery.pruned,
                topic
            );
        }

        delivery
    }

    /// Registers `provider` to answer requests for `name` (and any dotted name
    /// below it). Last registration wins; if a different live provider was
    /// displaced, a [`FeedError::ProviderConflict`] is returned for diagnosis.
    /// The bus only keeps a weak reference.
    pub fn offer<P>(&self, name: &str, provider: &Arc<P>) -> Option<FeedError>
    where
        P: DataProvider + 'static,
    {
        let weak: Weak<dyn DataProvider> = Arc::downgrade(provider) as Weak<dyn DataProvider>;
        let conflict = self
            .providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, weak);
        match &conflict {
            Some(err) => log::warn!("FeedBus: {err}"),
            None => log::debug!("FeedBus: provider offered for '{}'.", name),
        }
        conflict
    }

    /// Withdraws the provider registered under exactly `name`.
    pub fn revoke(&self, name: &str) -> bool {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
    }

    /// Number of live providers.
    pub fn provider_count(&self) -> usize {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn resolve(&self, name: &str) -> Option<Arc<dyn DataProvider>> {
        self.providers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .resolve(name)
    }

    /// Blocks until a provider for `name` exists and answers, or `timeout`
    /// elapses.
    ///
    /// The provider is called on this thread, outside the registry lock. A
    /// provider returning `None` is treated as not ready yet. A zero timeout
    /// makes exactly one attempt.
    ///
    /// # Errors
    ///
    /// [`FeedError::RequestTimeout`] if no answer arrived in time.
    pub fn request(&self, name: &str, timeout: Duration) -> Result<Payload, FeedError> {
        let started = Instant::now();
        let deadline = started + timeout;
        let poll = self.config.poll_interval();

        loop {
            if let Some(payload) = self.resolve(name).and_then(|p| p.get_data(name)) {
                log::trace!(
                    "FeedBus: request '{}' answered after {:?}.",
                    name,
                    started.elapsed()
                );
                return Ok(payload);
            }

            let now = Instant::now();
            if now >= deadline {
                let waited = now - started;
                log::debug!("FeedBus: request '{}' timed out after {:?}.", name, waited);
                return Err(FeedError::RequestTimeout {
                    name: name.to_string(),
                    waited,
                });
            }
            thread::sleep(poll.min(deadline - now));
        }
    }
}

impl Default for FeedBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::topic;
    use crate::payload::{AppEvent, KeyCode, KeyboardEvent, WindowHandle};
    use std::sync::atomic::AtomicBool;

    fn key(code: KeyCode) -> Payload {
        Payload::Keyboard(KeyboardEvent::pressed(code))
    }

    #[test]
    fn subscribers_run_once_each_in_registration_order() {
        let bus = FeedBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for n in 0..5 {
            let log = Arc::clone(&log);
            bus.subscribe(topic::INPUT_KEYBOARD, move |_| log.lock().unwrap().push(n));
        }

        let delivery = bus.publish(topic::INPUT_KEYBOARD, key(KeyCode::Up));
        assert_eq!(delivery.delivered, 5);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn publish_order_matches_call_order() {
        let bus = FeedBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(topic::INPUT_KEYBOARD, move |env| {
            sink.lock().unwrap().push(env.payload.as_keyboard().unwrap().key)
        });

        for code in [KeyCode::Up, KeyCode::Down, KeyCode::Left] {
            bus.publish(topic::INPUT_KEYBOARD, key(code));
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![KeyCode::Up, KeyCode::Down, KeyCode::Left]
        );
    }

    #[test]
    fn unknown_topic_has_no_subscribers() {
        let bus = FeedBus::new();
        assert_eq!(bus.publish("nobody_listens", key(KeyCode::Q)), Delivery::default());
        assert_eq!(bus.subscriber_count("nobody_listens"), 0);
    }

    #[test]
    fn envelope_carries_topic() {
        let bus = FeedBus::new();
        let topic_seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&topic_seen);
        bus.subscribe(topic::APP_EVENT, move |env| {
            *sink.lock().unwrap() = env.topic.to_string();
        });
        bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
        assert_eq!(*topic_seen.lock().unwrap(), topic::APP_EVENT);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_delivery() {
        let bus = FeedBus::new();
        let reached = Arc::new(AtomicBool::new(false));
        bus.subscribe(topic::APP_EVENT, |_| panic!("subscriber failure"));
        let flag = Arc::clone(&reached);
        bus.subscribe(topic::APP_EVENT, move |_| flag.store(true, Ordering::SeqCst));

        let delivery = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Shutdown));
        assert_eq!(delivery.faulted, 1);
        assert_eq!(delivery.delivered, 1);
        assert!(reached.load(Ordering::SeqCst));
    }

    #[test]
    fn nested_publish_on_same_topic_is_refused() {
        let bus = Arc::new(FeedBus::new());
        let inner = Arc::new(Mutex::new(None));
        let (weak_bus, sink) = (Arc::downgrade(&bus), Arc::clone(&inner));
        bus.subscribe(topic::APP_EVENT, move |_| {
            if let Some(bus) = weak_bus.upgrade() {
                let d = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
                *sink.lock().unwrap() = Some(d);
            }
        });

        let outer = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Starting));
        assert_eq!(outer.delivered, 1);
        assert!(inner.lock().unwrap().unwrap().refused);

        // The guard is released once the outer publish returns.
        let again = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Starting));
        assert!(!again.refused);
    }

    #[test]
    fn nested_publish_on_other_topic_is_delivered() {
        let bus = Arc::new(FeedBus::new());
        let relayed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&relayed);
        bus.subscribe(topic::GUI_EVENT, move |_| flag.store(true, Ordering::SeqCst));
        let weak_bus = Arc::downgrade(&bus);
        bus.subscribe(topic::INPUT_KEYBOARD, move |_| {
            if let Some(bus) = weak_bus.upgrade() {
                bus.publish(topic::GUI_EVENT, Payload::Gui(crate::payload::GuiEvent::DoButton));
            }
        });

        bus.publish(topic::INPUT_KEYBOARD, key(KeyCode::Enter));
        assert!(relayed.load(Ordering::SeqCst));
    }

    #[test]
    fn weak_subscription_goes_inert_when_target_drops() {
        let bus = FeedBus::new();
        let target = Arc::new(Mutex::new(0u32));
        bus.subscribe_weak(topic::APP_EVENT, &target, |count, _| {
            *count.lock().unwrap() += 1;
        });

        assert_eq!(bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started)).delivered, 1);
        assert_eq!(*target.lock().unwrap(), 1);

        drop(target);
        let delivery = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
        assert_eq!(delivery.delivered, 0);
        assert_eq!(delivery.pruned, 1);
        assert_eq!(bus.subscriber_count(topic::APP_EVENT), 0);
    }

    #[test]
    fn unsubscribe_removes_callback() {
        let bus = FeedBus::new();
        let id = bus.subscribe(topic::APP_EVENT, |_| {});
        assert_eq!(bus.subscriber_count(topic::APP_EVENT), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started)).delivered, 0);
    }

    #[test]
    fn queued_subscription_defers_to_owner() {
        let bus = FeedBus::new();
        let rx = bus.subscribe_queue(topic::APP_EVENT);
        assert_eq!(rx.topic(), topic::APP_EVENT);

        bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Starting));
        bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
        assert_eq!(rx.len(), 2);

        let drained: Vec<_> = rx.drain().into_iter().map(|e| e.payload.as_app()).collect();
        assert_eq!(drained, vec![Some(AppEvent::Starting), Some(AppEvent::Started)]);
        assert!(rx.is_empty());

        drop(rx);
        let delivery = bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
        assert_eq!(delivery.pruned, 1);
    }

    #[test]
    fn subscribing_during_publish_affects_only_later_publishes() {
        let bus = Arc::new(FeedBus::new());
        let late_calls = Arc::new(AtomicUsize::new(0));
        let (weak_bus, counter) = (Arc::downgrade(&bus), Arc::clone(&late_calls));
        bus.subscribe(topic::APP_EVENT, move |_| {
            if let Some(bus) = weak_bus.upgrade() {
                let counter = Arc::clone(&counter);
                bus.subscribe(topic::APP_EVENT, move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started)).delivered, 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        bus.publish(topic::APP_EVENT, Payload::App(AppEvent::Started));
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    struct WindowProvider {
        handle: Mutex<Option<WindowHandle>>,
    }

    impl DataProvider for WindowProvider {
        fn get_data(&self, name: &str) -> Option<Payload> {
            match name {
                topic::WINDOW_HANDLE => self.handle.lock().unwrap().map(Payload::Window),
                _ => None,
            }
        }
    }

    #[test]
    fn request_answers_from_registered_provider() {
        let bus = FeedBus::new();
        let provider = Arc::new(WindowProvider {
            handle: Mutex::new(Some(WindowHandle(42))),
        });
        assert!(bus.offer(topic::WINDOW_PROVIDER, &provider).is_none());

        let answer = bus
            .request(topic::WINDOW_HANDLE, Duration::from_millis(10))
            .unwrap();
        assert_eq!(answer.as_window(), Some(WindowHandle(42)));
    }

    #[test]
    fn request_times_out_without_provider() {
        let bus = FeedBus::new();
        let timeout = Duration::from_millis(20);
        let started = Instant::now();
        let err = bus.request(topic::WINDOW_HANDLE, timeout).unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, FeedError::RequestTimeout { .. }));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(500));
    }

    #[test]
    fn request_waits_for_a_late_provider() {
        let bus = Arc::new(FeedBus::new());
        let provider = Arc::new(WindowProvider {
            handle: Mutex::new(None),
        });
        bus.offer(topic::WINDOW_PROVIDER, &provider);

        let late = Arc::clone(&provider);
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(15));
            *late.handle.lock().unwrap() = Some(WindowHandle(7));
        });

        let answer = bus.request(topic::WINDOW_HANDLE, Duration::from_secs(2)).unwrap();
        assert_eq!(answer.as_window(), Some(WindowHandle(7)));
        writer.join().unwrap();
    }

    #[test]
    fn zero_timeout_makes_a_single_attempt() {
        let bus = FeedBus::new();
        let provider = Arc::new(WindowProvider {
            handle: Mutex::new(Some(WindowHandle(1))),
        });
        bus.offer(topic::WINDOW_PROVIDER, &provider);
        assert!(bus.request(topic::WINDOW_HANDLE, Duration::ZERO).is_ok());
        assert!(bus.request("window.title", Duration::ZERO).is_err());
    }

    #[test]
    fn offer_reports_conflict_and_last_wins() {
        let bus = FeedBus::new();
        let first = Arc::new(WindowProvider {
            handle: Mutex::new(Some(WindowHandle(1))),
        });
        let second = Arc::new(WindowProvider {
            handle: Mutex::new(Some(WindowHandle(2))),
        });
        assert!(bus.offer(topic::WINDOW_PROVIDER, &first).is_none());
        let conflict = bus.offer(topic::WINDOW_PROVIDER, &second);
        assert!(matches!(conflict, Some(FeedError::ProviderConflict { .. })));

        let answer = bus.request(topic::WINDOW_HANDLE, Duration::ZERO).unwrap();
        assert_eq!(answer.as_window(), Some(WindowHandle(2)));
        assert_eq!(bus.provider_count(), 1);

        assert!(bus.revoke(topic::WINDOW_PROVIDER));
        assert!(bus.request(topic::WINDOW_HANDLE, Duration::ZERO).is_err());
    }

    #[test]
    fn bus_never_keeps_a_provider_alive() {
        let bus = FeedBus::new();
        let provider = Arc::new(WindowProvider {
            handle: Mutex::new(Some(WindowHandle(1))),
        });
        bus.offer(topic::WINDOW_PROVIDER, &provider);
        drop(provider);
        assert!(bus.request(topic::WINDOW_HANDLE, Duration::ZERO).is_err());
    }

    #[test]
    fn concurrent_publishers_each_reach_every_subscriber() {
        let bus = Arc::new(FeedBus::new());
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            bus.subscribe(topic::INPUT_MOUSE, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for _ in 0..25 {
                        bus.publish(topic::INPUT_MOUSE, key(KeyCode::Space));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(count.load(Ordering::SeqCst), 4 * 25 * 3);
    }

    #[test]
    fn feed_config_has_sub_millisecond_default() {
        let config = FeedConfig::default();
        assert!(config.poll_interval() < Duration::from_millis(1));
        let zero = FeedConfig { poll_interval_us: 0 };
        assert_eq!(zero.poll_interval(), Duration::from_micros(1));
    }
}
