/*
    The simulated application driven by the integration tests: 4 states,
    5 events, and the transitions below. Requests outside the table are
    rejected with an error output and leave the state unchanged.

           +--Reset--+
           |         |
           |     +---v---+
           +-----+ Idle  <-------------+
                 +---+---+             |
                     |                 |
                   Init              Reset
                     |                 |
                 +---v---+        +----+----+
           +----->Running+--Stop--> Stopped |
           |     +---+---+        +----^----+
           |         |                 |
        Resume     Pause               |
           |         |                 |
           |     +---v---+             |
           +-----+Paused +---Stop------+
                 +-------+
*/

// not every test binary touches every helper
#![allow(dead_code)]

use fsm_probe::graph::{AttrMap, NestedMap};
use fsm_probe::interface::{Event, EventMap, Output, State, Sut};
use serde_json::{json, Map, Value};

pub const TOGGLE_STATES: [&str; 4] = ["Idle", "Running", "Paused", "Stopped"];
pub const TOGGLE_EVENTS: [&str; 5] =
    ["Initialize", "Reset", "Pause", "Stop", "Resume"];
pub const TOGGLE_TABLE: [(&str, &str, &str); 7] = [
    ("Idle", "Initialize", "Running"),
    ("Idle", "Reset", "Idle"),
    ("Running", "Pause", "Paused"),
    ("Running", "Stop", "Stopped"),
    ("Paused", "Resume", "Running"),
    ("Paused", "Stop", "Stopped"),
    ("Stopped", "Reset", "Idle"),
];

pub fn toggle_state(name: &str) -> State {
    State::new(name, json!({ "state": name }))
}

fn target_of(state: &str, event: &str) -> Option<&'static str> {
    TOGGLE_TABLE
        .iter()
        .find(|(source, name, _)| *source == state && *name == event)
        .map(|(_, _, target)| *target)
}

pub struct ToggleApp {
    current: String,
    env: Map<String, Value>,
    resets: usize,
}

impl ToggleApp {
    pub fn new() -> Self {
        Self {
            current: "Idle".to_string(),
            env: Map::new(),
            resets: 0,
        }
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    // force the state, to exercise single transitions
    pub fn set_state(&mut self, name: &str) {
        self.current = name.to_string();
    }
}

impl Sut for ToggleApp {
    fn start(&mut self) -> State {
        self.current = "Idle".to_string();
        self.state()
    }
    fn reset(&mut self) {
        self.resets += 1;
        self.current = "Idle".to_string();
    }
    fn state(&self) -> State {
        toggle_state(&self.current)
    }
    fn env(&self) -> &Map<String, Value> {
        &self.env
    }
    fn process_request(&mut self, request: &Value) -> Output {
        let event = request.get("name").and_then(Value::as_str).unwrap_or("");
        match target_of(&self.current, event) {
            Some(target) => {
                self.current = target.to_string();
                json!({ "success": 0 })
            }
            None => json!({ "error": -1 }),
        }
    }
}

pub struct ToggleEvent {
    name: String,
}

impl ToggleEvent {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Event<ToggleApp> for ToggleEvent {
    fn name(&self) -> &str {
        &self.name
    }
    fn build_request(&self, _args: &Map<String, Value>) -> Value {
        json!({ "name": self.name })
    }
}

pub fn toggle_alphabet() -> EventMap<ToggleApp> {
    let mut events: EventMap<ToggleApp> = EventMap::new();
    for name in TOGGLE_EVENTS {
        events.insert(name.to_string(), Box::new(ToggleEvent::new(name)));
    }
    events
}

/*
    A small layered graph shared by the graph and strategy tests:

        A -> B -> D -> E -> G
          -> C ->   -> F ->
*/
pub fn sample_nested_map() -> NestedMap {
    let edges = [
        ("A", "B", "1"),
        ("A", "C", "2"),
        ("B", "D", "3"),
        ("C", "D", "4"),
        ("D", "E", "5"),
        ("D", "F", "6"),
        ("E", "G", "7"),
        ("F", "G", "8"),
    ];
    let mut data = NestedMap::new();
    for (source, target, name) in edges {
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_string(), json!(name));
        data.entry(source.to_string()).or_default().insert(target.to_string(), attrs);
    }
    data
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
