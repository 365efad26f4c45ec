/*
    The contract between the explorer and a system under test.

    A SUT adapter exposes its observable state, a reset to the initial
    state, and a request-processing entry point. Events wrap the requests
    that can be fired at the SUT. The explorer is generic over the adapter,
    so one crate can drive any system that implements these traits.

    A state is a deterministic situation of the running system represented
    by a unique collection of properties. Two states are the same exactly
    when their values are the same; the invalid state marks an observation
    the adapter could not interpret and never equals a valid one.
*/

use crate::errors::ProbeError;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

// Observation returned by the SUT when a request is processed. Failure
// responses are plain observations, not errors.
pub type Output = Value;

#[derive(Clone, Debug)]
pub struct State {
    name: String,
    value: Value,
    valid: bool,
}

impl State {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self { name: name.into(), value, valid: true }
    }

    pub fn invalid() -> Self {
        Self {
            name: "invalid".to_string(),
            value: json!({ "value": "invalid" }),
            valid: false,
        }
    }

    // The unique name of the state's equivalence class.
    pub fn name(&self) -> &str {
        &self.name
    }

    // The canonical payload; equality is defined over this.
    pub fn value(&self) -> &Value {
        &self.value
    }

    // An invalid target state means the SUT rejected the request in the
    // source state.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid && self.value == other.value
    }
}
impl Eq for State {}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.valid {
            write!(f, "name={}, value={}", self.name, self.value)
        } else {
            write!(f, "invalid state")
        }
    }
}

/*
    A transition is the 4-tuple of source state, event, target state and
    the output observed while firing the event.
*/
#[derive(Clone, Debug)]
pub struct Transition {
    pub source: State,
    pub target: State,
    pub event: String,
    pub event_value: Value,
    pub output: Output,
}

impl Transition {
    pub fn new(
        source: State,
        target: State,
        event: impl Into<String>,
        event_value: Value,
        output: Output,
    ) -> Self {
        Self { source, target, event: event.into(), event_value, output }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}--{}->{}",
            self.source.name(),
            self.event,
            self.target.name()
        )
    }
}

/*
    System under test. Reading the state must be cheap and side-effect
    free; reset must be idempotent; process_request must not fail on
    SUT-level rejections and instead encodes them in the output.
*/
pub trait Sut {
    // Initialize the system and return the initial state. Called once.
    fn start(&mut self) -> State;

    // Force the system back to the initial state.
    fn reset(&mut self);

    // The current observable state.
    fn state(&self) -> State;

    // Read-only configuration snapshot used to build requests.
    fn env(&self) -> &Map<String, Value>;

    fn process_request(&mut self, request: &Value) -> Output;
}

/*
    An event is outside data sent to the SUT. Each event has a unique name
    within the configured alphabet; firing it builds a request from the
    SUT's environment and processes it.
*/
pub trait Event<S: Sut> {
    fn name(&self) -> &str;

    // Detail payload attached to learned transitions.
    fn value(&self) -> Value {
        Value::Null
    }

    fn build_request(&self, args: &Map<String, Value>) -> Value;

    fn fire(&self, sut: &mut S) -> Output {
        let args = sut.env().clone();
        let request = self.build_request(&args);
        sut.process_request(&request)
    }
}

// The configured alphabet; iteration order is the key order and fixes the
// order in which events are tried on each state.
pub type EventMap<S> = BTreeMap<String, Box<dyn Event<S>>>;

// Called once per new transition before it is committed.
pub trait Validator {
    fn validate(&self, transition: &Transition) -> Result<(), ProbeError>;
}
