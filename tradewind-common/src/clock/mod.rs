//! Wall-clock and virtual-clock variants sharing one timer surface.
//!
//! Components hold clocks as explicit parameters; there is no global time
//! source. Timer handlers are resolved at registration: either a plain
//! callback, or `OwnerEvent`, meaning the produced [`TimeEvent`] is routed
//! into the owning component's event stream by whoever drives the clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::error::TradingError;
use crate::identifiers::UuidFactory;
use uuid::Uuid;

/// A named timer firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEvent {
    pub name: String,
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TimeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeEvent({} @ {})", self.name, self.timestamp.to_rfc3339())
    }
}

/// What to do when a timer fires.
#[derive(Debug, Clone, Copy)]
pub enum TimeEventHandler {
    /// Deliver the event through the owning component's event stream.
    OwnerEvent,
    /// Invoke a plain function.
    Callback(fn(&TimeEvent)),
}

/// One clock surface over two variants.
pub trait Clock {
    /// The current time in UTC.
    fn time_now(&self) -> DateTime<Utc>;

    /// Register the handler used when `set_time_alert`/`set_timer` receive
    /// none.
    fn register_default_handler(&mut self, handler: TimeEventHandler);

    /// A one-shot alert at `alert_time`.
    ///
    /// Names are unique per clock and `alert_time` must not precede now;
    /// violations fail with `InvalidArgument`. With no handler given and no
    /// default registered, fails with `NoHandler`.
    fn set_time_alert(
        &mut self,
        name: &str,
        alert_time: DateTime<Utc>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError>;

    /// A periodic timer firing every `interval` from `start_time`
    /// (defaulting to now) until `stop_time` (defaulting to forever).
    ///
    /// `interval` must be positive and `stop_time`, when given, must be at
    /// least one interval after the start.
    fn set_timer(
        &mut self,
        name: &str,
        interval: Duration,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError>;

    /// Cancel the named timer; `NotFound` if absent.
    fn cancel_timer(&mut self, name: &str) -> Result<(), TradingError>;

    fn cancel_all_timers(&mut self);

    fn timer_names(&self) -> Vec<String>;

    /// The earliest pending timer firing, if any.
    fn next_event_time(&self) -> Option<DateTime<Utc>>;

    /// Collect the time events falling in `(now, to]`, in non-decreasing
    /// timestamp order with ties broken by registration order, advancing
    /// the clock's notion of time where applicable.
    ///
    /// `to` before now yields nothing; `to` equal to now yields exactly-due
    /// events.
    fn advance_time(&mut self, to: DateTime<Utc>) -> Vec<(TimeEvent, TimeEventHandler)>;

    /// Force the clock to a specific time. Virtual clocks only; the live
    /// clock follows the wall and ignores this.
    fn set_time(&mut self, to: DateTime<Utc>);
}

struct Timer {
    name: String,
    handler: TimeEventHandler,
    next_time: DateTime<Utc>,
    interval: Option<Duration>,
    stop_time: Option<DateTime<Utc>>,
    insertion: u64,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("name", &self.name)
            .field("next_time", &self.next_time)
            .field("interval", &self.interval)
            .field("stop_time", &self.stop_time)
            .finish()
    }
}

/// Timer bookkeeping shared by both clock variants.
#[derive(Debug, Default)]
struct TimerRegistry {
    timers: Vec<Timer>,
    default_handler: Option<TimeEventHandler>,
    insertions: u64,
}

impl TimerRegistry {
    fn resolve_handler(
        &self,
        name: &str,
        handler: Option<TimeEventHandler>,
    ) -> Result<TimeEventHandler, TradingError> {
        handler
            .or(self.default_handler)
            .ok_or_else(|| TradingError::NoHandler(format!("timer '{name}'")))
    }

    fn check_unique(&self, name: &str) -> Result<(), TradingError> {
        if self.timers.iter().any(|t| t.name == name) {
            Err(TradingError::InvalidArgument(format!(
                "timer name '{name}' is already registered"
            )))
        } else {
            Ok(())
        }
    }

    fn set_time_alert(
        &mut self,
        name: &str,
        alert_time: DateTime<Utc>,
        handler: Option<TimeEventHandler>,
        now: DateTime<Utc>,
    ) -> Result<(), TradingError> {
        self.check_unique(name)?;
        if alert_time < now {
            return Err(TradingError::InvalidArgument(format!(
                "alert time for '{name}' is in the past"
            )));
        }
        let handler = self.resolve_handler(name, handler)?;
        self.insertions += 1;
        self.timers.push(Timer {
            name: name.to_string(),
            handler,
            next_time: alert_time,
            interval: None,
            stop_time: None,
            insertion: self.insertions,
        });
        Ok(())
    }

    fn set_timer(
        &mut self,
        name: &str,
        interval: Duration,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
        handler: Option<TimeEventHandler>,
        now: DateTime<Utc>,
    ) -> Result<(), TradingError> {
        self.check_unique(name)?;
        if interval <= Duration::zero() {
            return Err(TradingError::InvalidArgument(format!(
                "timer '{name}' interval must be positive"
            )));
        }
        let start = start_time.unwrap_or(now);
        if let Some(stop) = stop_time {
            if stop < start + interval {
                return Err(TradingError::InvalidArgument(format!(
                    "timer '{name}' stop time precedes the first firing"
                )));
            }
        }
        let handler = self.resolve_handler(name, handler)?;
        self.insertions += 1;
        self.timers.push(Timer {
            name: name.to_string(),
            handler,
            next_time: start + interval,
            interval: Some(interval),
            stop_time,
            insertion: self.insertions,
        });
        Ok(())
    }

    fn cancel(&mut self, name: &str) -> Result<(), TradingError> {
        match self.timers.iter().position(|t| t.name == name) {
            Some(index) => {
                self.timers.remove(index);
                Ok(())
            }
            None => Err(TradingError::NotFound(format!("timer '{name}'"))),
        }
    }

    fn cancel_all(&mut self) {
        self.timers.clear();
    }

    fn names(&self) -> Vec<String> {
        self.timers.iter().map(|t| t.name.clone()).collect()
    }

    fn next_event_time(&self) -> Option<DateTime<Utc>> {
        self.timers.iter().map(|t| t.next_time).min()
    }

    /// Pop every firing due at or before `to`, re-arming periodic timers.
    fn collect_due(
        &mut self,
        to: DateTime<Utc>,
        uuids: &mut UuidFactory,
    ) -> Vec<(TimeEvent, TimeEventHandler)> {
        let mut events = Vec::new();
        loop {
            let due = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.next_time <= to)
                .min_by_key(|(_, t)| (t.next_time, t.insertion))
                .map(|(i, _)| i);
            let Some(index) = due else { break };

            let timestamp = self.timers[index].next_time;
            let name = self.timers[index].name.clone();
            let handler = self.timers[index].handler;
            events.push((
                TimeEvent {
                    name,
                    id: uuids.generate(),
                    timestamp,
                },
                handler,
            ));

            match self.timers[index].interval {
                Some(interval) => {
                    let next = timestamp + interval;
                    let expired = self.timers[index]
                        .stop_time
                        .map(|stop| next > stop)
                        .unwrap_or(false);
                    if expired {
                        self.timers.remove(index);
                    } else {
                        self.timers[index].next_time = next;
                    }
                }
                None => {
                    self.timers.remove(index);
                }
            }
        }
        events
    }
}

/// A clock driven by virtual time, for backtests.
#[derive(Debug)]
pub struct TestClock {
    current: DateTime<Utc>,
    registry: TimerRegistry,
    uuids: UuidFactory,
}

impl TestClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: start,
            registry: TimerRegistry::default(),
            uuids: UuidFactory::deterministic(0xC10C),
        }
    }
}

impl Clock for TestClock {
    fn time_now(&self) -> DateTime<Utc> {
        self.current
    }

    fn register_default_handler(&mut self, handler: TimeEventHandler) {
        self.registry.default_handler = Some(handler);
    }

    fn set_time_alert(
        &mut self,
        name: &str,
        alert_time: DateTime<Utc>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError> {
        self.registry
            .set_time_alert(name, alert_time, handler, self.current)
    }

    fn set_timer(
        &mut self,
        name: &str,
        interval: Duration,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError> {
        self.registry
            .set_timer(name, interval, start_time, stop_time, handler, self.current)
    }

    fn cancel_timer(&mut self, name: &str) -> Result<(), TradingError> {
        self.registry.cancel(name)
    }

    fn cancel_all_timers(&mut self) {
        self.registry.cancel_all();
    }

    fn timer_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn next_event_time(&self) -> Option<DateTime<Utc>> {
        self.registry.next_event_time()
    }

    fn advance_time(&mut self, to: DateTime<Utc>) -> Vec<(TimeEvent, TimeEventHandler)> {
        if to < self.current {
            return Vec::new();
        }
        let events = self.registry.collect_due(to, &mut self.uuids);
        self.current = to;
        events
    }

    fn set_time(&mut self, to: DateTime<Utc>) {
        self.current = to;
    }
}

/// A clock reading real wall time.
#[derive(Debug)]
pub struct LiveClock {
    registry: TimerRegistry,
    uuids: UuidFactory,
}

impl LiveClock {
    pub fn new() -> Self {
        Self {
            registry: TimerRegistry::default(),
            uuids: UuidFactory::random(),
        }
    }
}

impl Default for LiveClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for LiveClock {
    fn time_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn register_default_handler(&mut self, handler: TimeEventHandler) {
        self.registry.default_handler = Some(handler);
    }

    fn set_time_alert(
        &mut self,
        name: &str,
        alert_time: DateTime<Utc>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError> {
        let now = Utc::now();
        self.registry.set_time_alert(name, alert_time, handler, now)
    }

    fn set_timer(
        &mut self,
        name: &str,
        interval: Duration,
        start_time: Option<DateTime<Utc>>,
        stop_time: Option<DateTime<Utc>>,
        handler: Option<TimeEventHandler>,
    ) -> Result<(), TradingError> {
        let now = Utc::now();
        self.registry
            .set_timer(name, interval, start_time, stop_time, handler, now)
    }

    fn cancel_timer(&mut self, name: &str) -> Result<(), TradingError> {
        self.registry.cancel(name)
    }

    fn cancel_all_timers(&mut self) {
        self.registry.cancel_all();
    }

    fn timer_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn next_event_time(&self) -> Option<DateTime<Utc>> {
        self.registry.next_event_time()
    }

    fn advance_time(&mut self, to: DateTime<Utc>) -> Vec<(TimeEvent, TimeEventHandler)> {
        // Never deliver ahead of the wall.
        let cap = to.min(Utc::now());
        self.registry.collect_due(cap, &mut self.uuids)
    }

    fn set_time(&mut self, _to: DateTime<Utc>) {}
}
