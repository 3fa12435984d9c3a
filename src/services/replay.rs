//! Scenario replay: feeds a timed script of input events through a
//! classifier and records what it emits. Runs either on a virtual clock or
//! in real time on tokio.

use crate::classifier_error;
use crate::config::Config;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{prefixed_type, Event, InputOrigin, PointerType};
use crate::services::capabilities::PlatformCapabilities;
use crate::services::classifier::{InputOriginClassifier, Registration};
use crate::services::event_target::{listener, Element, EventTarget};
use crate::services::scheduler::{Scheduler, TokioScheduler, VirtualScheduler};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::info;

/// One scripted input event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioStep {
    /// Offset from the start of the scenario
    pub at_ms: u64,
    pub event: String,
    #[serde(default)]
    pub bubbles: bool,
    #[serde(default)]
    pub cancelable: bool,
    #[serde(default)]
    pub pointer_type: Option<PointerType>,
}

impl ScenarioStep {
    fn to_event(&self) -> Event {
        let mut event = Event::new(self.event.clone())
            .with_bubbles(self.bubbles)
            .with_cancelable(self.cancelable);
        event.pointer_type = self.pointer_type.clone();
        event
    }
}

/// Replay script. Unset fields fall back to the loaded [`Config`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_types: Option<Vec<String>>,
    #[serde(default)]
    pub capabilities: Option<PlatformCapabilities>,
    #[serde(default)]
    pub decay_ms: Option<u64>,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(classifier_error!(scenario, "scenario file {:?} not found", path));
        }
        Self::extract(Figment::from(Toml::file(path)), &path.display().to_string())
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Self::extract(Figment::from(Toml::string(source)), "<inline>")
    }

    fn extract(figment: Figment, origin: &str) -> Result<Self> {
        let scenario: Scenario = figment
            .extract()
            .map_err(|e| classifier_error!(scenario, "failed to parse {}: {}", origin, e))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(decay_ms) = self.decay_ms {
            if decay_ms == 0 {
                return Err(classifier_error!(scenario, "decay_ms must be greater than 0"));
            }
        }

        let mut last = 0;
        for (i, step) in self.steps.iter().enumerate() {
            if step.at_ms < last {
                return Err(classifier_error!(
                    scenario,
                    "step #{} at {}ms goes back in time (previous step at {}ms)",
                    i + 1,
                    step.at_ms,
                    last
                ));
            }
            last = step.at_ms;
        }

        Ok(())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

/// A synthetic event observed during replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub at: Duration,
    pub origin: InputOrigin,
    pub event_type: String,
    pub source_type: String,
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>6}ms  {:<16} ({} <- {})",
            self.at.as_millis(),
            self.event_type,
            self.origin,
            self.source_type
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub events: Vec<ClassifiedEvent>,
}

impl ReplayReport {
    pub fn count(&self, origin: InputOrigin) -> usize {
        self.events.iter().filter(|e| e.origin == origin).count()
    }

    pub fn event_types(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.event_type.as_str()).collect()
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "{}", event)?;
        }
        write!(
            f,
            "{} touch, {} mouse",
            self.count(InputOrigin::Touch),
            self.count(InputOrigin::Mouse)
        )
    }
}

pub struct Replayer {
    config: Arc<Config>,
}

impl Replayer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Replay on a virtual clock; returns as soon as the last step ran
    pub fn run(&self, scenario: &Scenario) -> Result<ReplayReport> {
        let scheduler = VirtualScheduler::new();
        let clock = scheduler.clone();
        let session = self.prepare(scenario, Arc::new(scheduler.clone()), Arc::new(move || clock.now()))?;

        for step in &scenario.steps {
            scheduler.advance_to(Duration::from_millis(step.at_ms));
            session.dispatch(step)?;
        }

        Ok(session.finish())
    }

    /// Replay in real time on the current tokio runtime
    pub async fn run_realtime(&self, scenario: &Scenario) -> Result<ReplayReport> {
        let scheduler = TokioScheduler::new()?;
        let start = Instant::now();
        let session = self.prepare(scenario, Arc::new(scheduler), Arc::new(move || start.elapsed()))?;

        for step in &scenario.steps {
            sleep_until(start + Duration::from_millis(step.at_ms)).await;
            session.dispatch(step)?;
        }

        Ok(session.finish())
    }

    fn prepare(
        &self,
        scenario: &Scenario,
        scheduler: Arc<dyn Scheduler>,
        clock: Clock,
    ) -> Result<ReplaySession> {
        let capabilities = scenario.capabilities.unwrap_or(self.config.capabilities);
        let mut options = self.config.classifier_options();
        if let Some(decay_ms) = scenario.decay_ms {
            options.decay = Duration::from_millis(decay_ms);
        }
        let target_types = scenario
            .target_types
            .clone()
            .unwrap_or_else(|| self.config.classifier.target_types.clone());

        info!(
            "Replaying '{}': {} step(s), targets {:?}, capabilities {}",
            scenario.display_name(),
            scenario.steps.len(),
            target_types,
            capabilities
        );

        let element = Element::shared(scenario.display_name());
        let classifier = InputOriginClassifier::new(capabilities, scheduler).with_options(options.clone());
        let recorded: Arc<Mutex<Vec<ClassifiedEvent>>> = Arc::new(Mutex::new(Vec::new()));

        let mut registrations = Vec::with_capacity(target_types.len());
        for target_type in &target_types {
            registrations.push(classifier.attach(&element, target_type)?);

            for origin in [InputOrigin::Touch, InputOrigin::Mouse] {
                let name = prefixed_type(options.prefix_for(origin), target_type);
                let recorded = Arc::clone(&recorded);
                let clock = Arc::clone(&clock);
                let source_type = target_type.clone();
                let event_type = name.clone();
                element.add_event_listener(
                    &name,
                    listener(move |_| {
                        recorded.lock().push(ClassifiedEvent {
                            at: clock(),
                            origin,
                            event_type: event_type.clone(),
                            source_type: source_type.clone(),
                        });
                    }),
                )?;
            }
        }

        Ok(ReplaySession {
            element,
            recorded,
            _registrations: registrations,
        })
    }
}

type Clock = Arc<dyn Fn() -> Duration + Send + Sync>;

struct ReplaySession {
    element: Arc<Element>,
    recorded: Arc<Mutex<Vec<ClassifiedEvent>>>,
    _registrations: Vec<Registration>,
}

impl ReplaySession {
    fn dispatch(&self, step: &ScenarioStep) -> Result<()> {
        let event = step.to_event();
        debug_if_enabled!("t={}ms dispatching {}", step.at_ms, event);
        self.element.dispatch_event(event.into_shared())?;
        Ok(())
    }

    fn finish(self) -> ReplayReport {
        let events = std::mem::take(&mut *self.recorded.lock());
        let report = ReplayReport { events };
        info!(
            "Replay finished: {} touch, {} mouse",
            report.count(InputOrigin::Touch),
            report.count(InputOrigin::Mouse)
        );
        report
    }
}
