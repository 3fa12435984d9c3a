//! Input origin classification.
//!
//! A classifier watches touch signals on a target and, whenever the target
//! event type fires, re-dispatches it as `touch<type>` or `mouse<type>` with
//! the original event as detail. Touch-start marks the stream as touch;
//! touch-end starts a decay window after which the stream reverts to mouse.
//! A touch-classified event consumes the touch state.

use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{names, prefixed_type, CustomEventInit, Event, InputOrigin};
use crate::services::capabilities::PlatformCapabilities;
use crate::services::event_target::{listener, EventTarget, Listener, ListenerId};
use crate::services::scheduler::{Scheduler, TimerHandle};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_DECAY: Duration = Duration::from_millis(1000);

/// Tunables for a classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierOptions {
    /// How long after touch-end a target event still counts as touch
    pub decay: Duration,
    pub touch_prefix: String,
    pub mouse_prefix: String,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            decay: DEFAULT_DECAY,
            touch_prefix: InputOrigin::Touch.prefix().to_string(),
            mouse_prefix: InputOrigin::Mouse.prefix().to_string(),
        }
    }
}

impl ClassifierOptions {
    pub fn prefix_for(&self, origin: InputOrigin) -> &str {
        match origin {
            InputOrigin::Touch => &self.touch_prefix,
            InputOrigin::Mouse => &self.mouse_prefix,
        }
    }
}

#[derive(Default)]
struct ClassifierState {
    touch_active: bool,
    reset_timer: Option<Box<dyn TimerHandle>>,
    // Bumped on every transition; a reset only applies if nothing happened since it was scheduled
    generation: u64,
}

/// State shared by every listener of one registration
struct ClassifierShared {
    event_type: String,
    options: ClassifierOptions,
    scheduler: Arc<dyn Scheduler>,
    state: Mutex<ClassifierState>,
}

impl ClassifierShared {
    fn touch_start(&self) {
        let pending = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.touch_active = true;
            state.reset_timer.take()
        };
        if let Some(timer) = pending {
            timer.cancel();
        }
        debug_if_enabled!("[{}] touch start: active", self.event_type);
    }

    fn touch_end(self: &Arc<Self>) {
        let (pending, generation) = {
            let mut state = self.state.lock();
            state.generation += 1;
            (state.reset_timer.take(), state.generation)
        };
        if let Some(timer) = pending {
            timer.cancel();
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let timer = self.scheduler.after(
            self.options.decay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.expire(generation);
                }
            }),
        );

        let mut state = self.state.lock();
        if state.generation == generation {
            state.reset_timer = Some(timer);
            drop(state);
            debug_if_enabled!(
                "[{}] touch end: reset in {}ms",
                self.event_type,
                self.options.decay.as_millis()
            );
        } else {
            // Superseded while scheduling (a reset that fired already is harmless)
            drop(state);
            timer.cancel();
        }
    }

    fn expire(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }
        state.touch_active = false;
        state.reset_timer = None;
        drop(state);
        debug_if_enabled!("[{}] decay window elapsed: idle", self.event_type);
    }

    /// Decide the origin of one target event, consuming the touch state
    fn classify(&self) -> InputOrigin {
        let (origin, pending) = {
            let mut state = self.state.lock();
            if state.touch_active {
                state.touch_active = false;
                state.generation += 1;
                (InputOrigin::Touch, state.reset_timer.take())
            } else {
                (InputOrigin::Mouse, None)
            }
        };
        if let Some(timer) = pending {
            timer.cancel();
        }
        origin
    }

    fn is_touch_active(&self) -> bool {
        self.state.lock().touch_active
    }

    fn has_pending_reset(&self) -> bool {
        self.state.lock().reset_timer.is_some()
    }
}

/// Dispatch `<prefix><event_type>` on `target`, wrapping `original`.
///
/// The synthetic event copies `bubbles`/`cancelable` from the original and
/// carries the original itself (same allocation) as `detail`.
pub fn dispatch_prefixed<T>(
    prefix: &str,
    event_type: &str,
    target: &T,
    original: &Arc<Event>,
) -> Result<usize>
where
    T: EventTarget + ?Sized,
{
    let synthetic = Event::custom(
        prefixed_type(prefix, event_type),
        CustomEventInit::wrapping(original),
    );
    target.dispatch_event(synthetic.into_shared())
}

/// Handle returned by [`InputOriginClassifier::attach`].
///
/// Dropping it leaves the listeners in place; it only offers inspection.
pub struct Registration {
    event_type: String,
    listeners: Vec<(&'static str, ListenerId)>,
    target_listener: ListenerId,
    shared: Arc<ClassifierShared>,
}

impl Registration {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Touch signal event names this registration listens to
    pub fn signal_types(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|(name, _)| *name).collect()
    }

    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.listeners
            .iter()
            .map(|(_, id)| *id)
            .chain(std::iter::once(self.target_listener))
            .collect()
    }

    pub fn is_touch_active(&self) -> bool {
        self.shared.is_touch_active()
    }

    pub fn has_pending_reset(&self) -> bool {
        self.shared.has_pending_reset()
    }
}

/// Attaches origin classification to event targets.
#[derive(Clone)]
pub struct InputOriginClassifier {
    capabilities: PlatformCapabilities,
    scheduler: Arc<dyn Scheduler>,
    options: ClassifierOptions,
}

impl InputOriginClassifier {
    pub fn new(capabilities: PlatformCapabilities, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            capabilities,
            scheduler,
            options: ClassifierOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ClassifierOptions) -> Self {
        self.options = options;
        self
    }

    pub fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// Register classification of `event_type` on `target`.
    ///
    /// Every call adds an independent listener set; attaching twice for the
    /// same pair produces two synthetic events per target event. Errors from
    /// the target are propagated and any listeners added by this call are
    /// removed again.
    pub fn attach<T>(&self, target: &Arc<T>, event_type: &str) -> Result<Registration>
    where
        T: EventTarget + ?Sized + 'static,
    {
        let shared = Arc::new(ClassifierShared {
            event_type: event_type.to_string(),
            options: self.options.clone(),
            scheduler: Arc::clone(&self.scheduler),
            state: Mutex::new(ClassifierState::default()),
        });

        let mut signals: Vec<(&'static str, Listener)> = Vec::new();

        if self.capabilities.has_pointer_events() {
            for name in [names::MS_POINTER_DOWN, names::POINTER_DOWN] {
                let weak = Arc::downgrade(&shared);
                signals.push((
                    name,
                    listener(move |event| {
                        if event.is_touch_pointer() {
                            if let Some(shared) = weak.upgrade() {
                                shared.touch_start();
                            }
                        }
                    }),
                ));
            }
            for name in [names::MS_POINTER_UP, names::POINTER_UP] {
                let weak = Arc::downgrade(&shared);
                signals.push((
                    name,
                    listener(move |event| {
                        if event.is_touch_pointer() {
                            if let Some(shared) = weak.upgrade() {
                                shared.touch_end();
                            }
                        }
                    }),
                ));
            }
        } else {
            debug_if_enabled!("No pointer event support, skipping pointer listeners");
        }

        if self.capabilities.has_touch_events() {
            let weak = Arc::downgrade(&shared);
            signals.push((
                names::TOUCH_START,
                listener(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.touch_start();
                    }
                }),
            ));
            let weak = Arc::downgrade(&shared);
            signals.push((
                names::TOUCH_END,
                listener(move |_| {
                    if let Some(shared) = weak.upgrade() {
                        shared.touch_end();
                    }
                }),
            ));
        } else {
            debug_if_enabled!("No touch event support, skipping touch listeners");
        }

        let mut registered: Vec<(&'static str, ListenerId)> = Vec::with_capacity(signals.len());
        for (name, callback) in signals {
            match target.add_event_listener(name, callback) {
                Ok(id) => registered.push((name, id)),
                Err(e) => {
                    Self::rollback(target.as_ref(), &registered);
                    return Err(e);
                }
            }
        }

        let target_listener = {
            let weak_target: Weak<T> = Arc::downgrade(target);
            let weak_shared = Arc::downgrade(&shared);
            let owned_type = event_type.to_string();
            listener(move |event| {
                let (Some(target), Some(shared)) = (weak_target.upgrade(), weak_shared.upgrade())
                else {
                    return;
                };
                let origin = shared.classify();
                let prefix = shared.options.prefix_for(origin);
                debug_if_enabled!("[{}] classified as {}", owned_type, origin);
                if let Err(e) = dispatch_prefixed(prefix, &owned_type, target.as_ref(), event) {
                    warn!("Failed to dispatch {}{}: {}", prefix, owned_type, e);
                }
            })
        };

        let target_listener = match target.add_event_listener(event_type, target_listener) {
            Ok(id) => id,
            Err(e) => {
                Self::rollback(target.as_ref(), &registered);
                return Err(e);
            }
        };

        info!(
            "Classifier attached for '{}' (capabilities: {}, decay: {}ms)",
            event_type,
            self.capabilities,
            self.options.decay.as_millis()
        );
        if self.capabilities.is_degraded() {
            warn!(
                "No touch capability detected: '{}' will always classify as {}",
                event_type,
                InputOrigin::Mouse
            );
        }

        Ok(Registration {
            event_type: event_type.to_string(),
            listeners: registered,
            target_listener,
            shared,
        })
    }

    fn rollback<T>(target: &T, registered: &[(&'static str, ListenerId)])
    where
        T: EventTarget + ?Sized,
    {
        for (name, id) in registered {
            target.remove_event_listener(name, *id);
        }
    }
}

/// Attach with default options
pub fn attach<T>(
    target: &Arc<T>,
    event_type: &str,
    capabilities: PlatformCapabilities,
    scheduler: Arc<dyn Scheduler>,
) -> Result<Registration>
where
    T: EventTarget + ?Sized + 'static,
{
    InputOriginClassifier::new(capabilities, scheduler).attach(target, event_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;
    use crate::events::PointerType;
    use crate::services::event_target::Element;
    use crate::services::scheduler::{TokioScheduler, VirtualScheduler};

    type Seen = Arc<Mutex<Vec<Arc<Event>>>>;

    fn capture(element: &Element, types: &[&str]) -> Seen {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        for event_type in types {
            let seen = Arc::clone(&seen);
            element
                .add_event_listener(event_type, listener(move |e| seen.lock().push(Arc::clone(e))))
                .unwrap();
        }
        seen
    }

    fn seen_types(seen: &Seen) -> Vec<String> {
        seen.lock().iter().map(|e| e.event_type.clone()).collect()
    }

    fn fire(element: &Element, event: Event) -> Arc<Event> {
        let event = event.into_shared();
        element.dispatch_event(Arc::clone(&event)).unwrap();
        event
    }

    fn setup(capabilities: PlatformCapabilities) -> (Arc<Element>, VirtualScheduler, Registration, Seen) {
        let element = Element::shared("test");
        let scheduler = VirtualScheduler::new();
        let registration = attach(&element, "click", capabilities, Arc::new(scheduler.clone())).unwrap();
        let seen = capture(&element, &["mouseclick", "touchclick"]);
        (element, scheduler, registration, seen)
    }

    #[test]
    fn plain_click_is_mouse() {
        let (element, _scheduler, registration, seen) = setup(PlatformCapabilities::all());

        let original = fire(&element, Event::new("click"));

        assert_eq!(seen_types(&seen), vec!["mouseclick"]);
        assert!(Arc::ptr_eq(seen.lock()[0].detail.as_ref().unwrap(), &original));
        assert!(!registration.is_touch_active());
    }

    #[test]
    fn touchstart_then_click_is_touch_and_consumes_state() {
        let (element, _scheduler, registration, seen) = setup(PlatformCapabilities::all());

        fire(&element, Event::new("touchstart"));
        assert!(registration.is_touch_active());

        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["touchclick"]);
        assert_eq!(seen.lock()[0].detail.as_ref().unwrap().event_type, "click");
        assert!(!registration.is_touch_active());

        // Classification was consumed: the next click is mouse again
        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["touchclick", "mouseclick"]);
    }

    #[test]
    fn click_within_decay_window_is_touch() {
        let (element, scheduler, registration, seen) = setup(PlatformCapabilities::all());

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        assert!(registration.has_pending_reset());

        scheduler.advance(Duration::from_millis(999));
        fire(&element, Event::new("click"));

        assert_eq!(seen_types(&seen), vec!["touchclick"]);
        assert!(!registration.has_pending_reset());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn click_after_decay_window_is_mouse() {
        let (element, scheduler, registration, seen) = setup(PlatformCapabilities::all());

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        scheduler.advance(Duration::from_millis(1001));
        assert!(!registration.is_touch_active());

        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["mouseclick"]);
    }

    #[test]
    fn second_touchstart_cancels_decay() {
        let (element, scheduler, registration, seen) = setup(PlatformCapabilities::all());

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        scheduler.advance(Duration::from_millis(500));
        fire(&element, Event::new("touchstart"));
        assert!(!registration.has_pending_reset());
        assert_eq!(scheduler.pending(), 0);

        // Well past the original deadline: still touch
        scheduler.advance(Duration::from_millis(2000));
        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["touchclick"]);
    }

    #[test]
    fn repeated_touchend_keeps_single_pending_reset() {
        let (element, scheduler, _registration, seen) = setup(PlatformCapabilities::touch_only());

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        scheduler.advance(Duration::from_millis(600));
        fire(&element, Event::new("touchend"));
        assert_eq!(scheduler.pending(), 1);

        // The first reset would have fired at 1000ms; the second one is due at 1600ms
        scheduler.advance(Duration::from_millis(600));
        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["touchclick"]);
    }

    #[test]
    fn synthetic_event_copies_flags_and_detail() {
        let (element, _scheduler, _registration, seen) = setup(PlatformCapabilities::all());

        let original = fire(
            &element,
            Event::new("click").with_bubbles(true).with_cancelable(true),
        );
        let quiet = fire(&element, Event::new("click"));

        let seen = seen.lock();
        assert!(seen[0].bubbles);
        assert!(seen[0].cancelable);
        assert!(Arc::ptr_eq(seen[0].detail.as_ref().unwrap(), &original));
        assert!(!seen[1].bubbles);
        assert!(!seen[1].cancelable);
        assert!(Arc::ptr_eq(seen[1].detail.as_ref().unwrap(), &quiet));
    }

    #[test]
    fn pointer_events_filter_on_touch_pointer_type() {
        let (element, scheduler, registration, seen) = setup(PlatformCapabilities::pointer_only());
        assert_eq!(
            registration.signal_types(),
            vec!["MSPointerDown", "pointerdown", "MSPointerUp", "pointerup"]
        );

        fire(&element, Event::new("pointerdown").with_pointer_type(PointerType::Mouse));
        fire(&element, Event::new("click"));

        fire(&element, Event::touch_pointer("pointerdown"));
        fire(&element, Event::touch_pointer("pointerup"));
        scheduler.advance(Duration::from_millis(200));
        fire(&element, Event::new("click"));

        fire(&element, Event::touch_pointer("MSPointerDown"));
        fire(&element, Event::new("click"));

        assert_eq!(
            seen_types(&seen),
            vec!["mouseclick", "touchclick", "touchclick"]
        );
    }

    #[test]
    fn touch_events_ignored_without_touch_capability() {
        let (element, _scheduler, registration, seen) = setup(PlatformCapabilities::pointer_only());

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("click"));

        assert!(!registration.signal_types().contains(&"touchstart"));
        assert_eq!(seen_types(&seen), vec!["mouseclick"]);
    }

    #[test]
    fn degraded_platform_always_mouse() {
        let (element, _scheduler, registration, seen) = setup(PlatformCapabilities::none());

        assert!(registration.signal_types().is_empty());
        assert_eq!(registration.listener_ids().len(), 1);

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::touch_pointer("pointerdown"));
        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["mouseclick"]);
    }

    #[test]
    fn duplicate_attach_dispatches_twice() {
        let element = Element::shared("test");
        let scheduler: Arc<dyn Scheduler> = Arc::new(VirtualScheduler::new());
        let classifier = InputOriginClassifier::new(PlatformCapabilities::touch_only(), scheduler);
        let _first = classifier.attach(&element, "click").unwrap();
        let _second = classifier.attach(&element, "click").unwrap();
        let seen = capture(&element, &["mouseclick", "touchclick"]);

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("click"));

        assert_eq!(seen_types(&seen), vec!["touchclick", "touchclick"]);
    }

    #[test]
    fn custom_options_change_prefixes_and_decay() {
        let element = Element::shared("test");
        let scheduler = VirtualScheduler::new();
        let options = ClassifierOptions {
            decay: Duration::from_millis(300),
            touch_prefix: "finger-".to_string(),
            mouse_prefix: "cursor-".to_string(),
        };
        let _registration = InputOriginClassifier::new(
            PlatformCapabilities::touch_only(),
            Arc::new(scheduler.clone()),
        )
        .with_options(options)
        .attach(&element, "tap")
        .unwrap();
        let seen = capture(&element, &["finger-tap", "cursor-tap"]);

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        scheduler.advance(Duration::from_millis(301));
        fire(&element, Event::new("tap"));

        assert_eq!(seen_types(&seen), vec!["cursor-tap"]);
    }

    #[test]
    fn invalid_target_fails_and_rolls_back() {
        let element = Element::shared("test");
        let scheduler: Arc<dyn Scheduler> = Arc::new(VirtualScheduler::new());

        let err = attach(&element, "", PlatformCapabilities::all(), Arc::clone(&scheduler))
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::InvalidArgument(_)));
        assert!(element.registered_types().is_empty());

        element.disconnect();
        let err = attach(&element, "click", PlatformCapabilities::none(), scheduler)
            .err()
            .unwrap();
        assert!(matches!(err, ClassifierError::InvalidArgument(_)));
    }

    #[test]
    fn works_through_trait_object_target() {
        let element = Element::shared("test");
        let target: Arc<dyn EventTarget> = element.clone();
        let scheduler = VirtualScheduler::new();
        let _registration =
            attach(&target, "click", PlatformCapabilities::touch_only(), Arc::new(scheduler)).unwrap();
        let seen = capture(&element, &["touchclick"]);

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["touchclick"]);
    }

    #[tokio::test(start_paused = true)]
    async fn decay_window_on_tokio_clock() {
        let element = Element::shared("test");
        let scheduler = TokioScheduler::new().unwrap();
        let registration =
            attach(&element, "click", PlatformCapabilities::touch_only(), Arc::new(scheduler)).unwrap();
        let seen = capture(&element, &["mouseclick", "touchclick"]);

        fire(&element, Event::new("touchstart"));
        fire(&element, Event::new("touchend"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(registration.is_touch_active());

        tokio::time::sleep(Duration::from_millis(600)).await;
        tokio::task::yield_now().await;
        assert!(!registration.is_touch_active());

        fire(&element, Event::new("click"));
        assert_eq!(seen_types(&seen), vec!["mouseclick"]);
    }
}
