/*
    Builds a finite state machine from a running system. Starting at the
    initial state, the explorer applies each event of the configured
    alphabet, observes the resulting state, and records the transition.
    Whenever the current state has no unexplored event left, it walks the
    learned graph to the nearest state that still has one, resetting the
    SUT first when the route through the initial state is shorter.

    The learned machine lives in two places: the maze, a matrix of
    source state and event-to-target slots, and the state graph used for
    path planning and export.
*/

use crate::errors::ProbeError;
use crate::graph::{Arrow, AttrMap, StateGraph};
use crate::interface::{EventMap, State, Sut, Transition, Validator};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

/*
    One row of the learned matrix: the source state and the target state
    observed for each event of the alphabet. A row is immature while any
    slot is still unknown; the maze is mature when every row is.
    The slot set is fixed when the state is inserted and equals the
    configured alphabet.
*/
#[derive(Clone, Debug)]
pub struct MazeEntry {
    pub source: State,
    pub transitions: BTreeMap<String, Option<State>>,
}

#[derive(Clone, Debug, Default)]
pub struct Maze {
    entries: BTreeMap<String, MazeEntry>,
    alphabet: Vec<String>,
}

impl Maze {
    fn new(alphabet: Vec<String>) -> Self {
        Self { entries: BTreeMap::new(), alphabet }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
    pub fn entry(&self, name: &str) -> Option<&MazeEntry> {
        self.entries.get(name)
    }
    pub fn entries(&self) -> impl Iterator<Item = (&str, &MazeEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
    pub fn state(&self, name: &str) -> Option<&State> {
        self.entries.get(name).map(|entry| &entry.source)
    }

    // Insert a state with all transitions unknown. Invalid states and
    // states already present are skipped.
    pub fn add_state(&mut self, state: &State) -> bool {
        if !state.is_valid() || self.entries.contains_key(state.name()) {
            return false;
        }
        let transitions =
            self.alphabet.iter().map(|name| (name.clone(), None)).collect();
        self.entries.insert(
            state.name().to_string(),
            MazeEntry { source: state.clone(), transitions },
        );
        info!("add new state: {}", state);
        true
    }

    pub fn is_mature_state(&self, name: &str) -> Result<bool, ProbeError> {
        match self.entries.get(name) {
            Some(entry) => {
                Ok(entry.transitions.values().all(|slot| slot.is_some()))
            }
            None => {
                warn!("state {} does not exist", name);
                Err(ProbeError::UnknownState(name.to_string()))
            }
        }
    }

    pub fn is_mature(&self) -> bool {
        self.entries
            .values()
            .all(|entry| entry.transitions.values().all(|slot| slot.is_some()))
    }

    pub fn immature_states(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| {
                entry.transitions.values().any(|slot| slot.is_none())
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    // Fill a slot. Returns whether the slot was newly filled; observing a
    // different target for an already filled slot is fatal, since the SUT
    // then violates determinism.
    fn record(&mut self, transition: &Transition) -> Result<bool, ProbeError> {
        let source_name = transition.source.name();
        let entry = self.entries.get_mut(source_name).ok_or_else(|| {
            ProbeError::UnknownState(source_name.to_string())
        })?;
        let slot =
            entry.transitions.get_mut(&transition.event).ok_or_else(|| {
                ProbeError::UnknownEvent(transition.event.clone())
            })?;
        match slot {
            None => {
                *slot = Some(transition.target.clone());
                Ok(true)
            }
            Some(known) if *known == transition.target => Ok(false),
            Some(known) => {
                error!(
                    "ambiguous behavior, got {} vs {} when processing {} on {}",
                    known.name(),
                    transition.target.name(),
                    transition.event,
                    source_name
                );
                Err(ProbeError::AmbiguousBehavior {
                    from_state: source_name.to_string(),
                    event: transition.event.clone(),
                    first: known.name().to_string(),
                    second: transition.target.name().to_string(),
                })
            }
        }
    }
}

pub struct Explorer<S: Sut> {
    maze: Maze,
    graph: StateGraph,
    sut: S,
    events: EventMap<S>,
    validators: Vec<Box<dyn Validator>>,
    initial: State,
    max_iterations: usize,
}

impl<S: Sut> Explorer<S> {
    pub fn new(sut: S, events: EventMap<S>) -> Self {
        let initial = sut.state();
        let alphabet: Vec<String> = events.keys().cloned().collect();
        let max_iterations = events.len().pow(3);
        let mut explorer = Self {
            maze: Maze::new(alphabet),
            graph: StateGraph::new(),
            sut,
            events,
            validators: Vec::new(),
            initial: initial.clone(),
            max_iterations,
        };
        explorer.add_state(&initial);
        explorer
    }

    pub fn with_validators(mut self, validators: Vec<Box<dyn Validator>>) -> Self {
        self.validators = validators;
        self
    }

    // Override the default cap of |alphabet| cubed iterations.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.max_iterations = limit;
        self
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }
    pub fn state_graph(&self) -> &StateGraph {
        &self.graph
    }
    pub fn sut(&self) -> &S {
        &self.sut
    }
    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    /*
        Build the state machine from a state. Each round moves the SUT to
        the nearest immature state and explores there; the loop ends when
        every known state is mature. The iteration cap is a safety warning
        against runaway systems, not an abort.
    */
    pub fn explore(&mut self, start: &State) -> Result<(), ProbeError> {
        let mut current = start.clone();
        let mut generation: usize = 0;
        while !self.maze.is_mature() {
            info!(
                "evolve the state machine iteration {}, from {}",
                generation, current
            );
            let source = self.go_to_nearest_immature(current.name())?;
            let state = self
                .maze
                .state(&source)
                .cloned()
                .ok_or_else(|| ProbeError::UnknownState(source.clone()))?;
            current = self.discover(state)?;
            generation += 1;
            if generation > self.max_iterations {
                warn!(
                    "the state machine is too complicated or something is wrong \
                     ({} iterations for {} events)",
                    generation,
                    self.events.len()
                );
            }
        }
        Ok(())
    }

    // Dump the learned matrix for debugging.
    pub fn log_matrix(&self) {
        for (source, entry) in self.maze.entries() {
            for (event, target) in &entry.transitions {
                if let Some(target) = target {
                    if target.is_valid() {
                        debug!("{} -- {} -> {}", source, event, target.name());
                    }
                }
            }
        }
    }

    fn add_state(&mut self, state: &State) {
        if self.maze.add_state(state) {
            let mut attrs = AttrMap::new();
            attrs.insert("detail".to_string(), state.value().clone());
            self.graph.add_vertex(state.name(), attrs);
        }
    }

    /*
        Explore the transitions of one state by firing every event whose
        slot is still unknown. When an event moves the SUT to a different
        state, exploration continues there; the returned state is mature.
    */
    fn discover(&mut self, state: State) -> Result<State, ProbeError> {
        let mut current = state;
        'restart: loop {
            if !self.maze.contains(current.name()) {
                error!("state {} does not exist", current.name());
                return Err(ProbeError::UnknownState(current.name().to_string()));
            }
            if self.maze.is_mature_state(current.name())? {
                return Ok(current);
            }
            let alphabet: Vec<String> = self.events.keys().cloned().collect();
            for name in alphabet {
                match self
                    .maze
                    .entry(current.name())
                    .and_then(|entry| entry.transitions.get(&name))
                {
                    Some(Some(_)) => continue, // already exercised
                    Some(None) => {}
                    None => return Err(ProbeError::UnknownEvent(name)),
                }
                let (output, event_value) = {
                    let event = self
                        .events
                        .get(&name)
                        .ok_or_else(|| ProbeError::UnknownEvent(name.clone()))?;
                    (event.fire(&mut self.sut), event.value())
                };
                let target = self.sut.state();
                self.set_transition(Transition::new(
                    current.clone(),
                    target.clone(),
                    name.clone(),
                    event_value,
                    output,
                ))?;
                if current != target {
                    debug!(
                        "state changed to {} when running {} on {}",
                        target.name(),
                        name,
                        current.name()
                    );
                    current = target;
                    continue 'restart;
                }
            }
            return Ok(current);
        }
    }

    fn set_transition(&mut self, transition: Transition) -> Result<(), ProbeError> {
        for validator in &self.validators {
            validator.validate(&transition)?;
        }
        self.add_state(&transition.source);
        self.add_state(&transition.target);
        if self.maze.record(&transition)? {
            info!("add new transition {}", transition);
            if transition.source.is_valid() && transition.target.is_valid() {
                let mut attrs = AttrMap::new();
                attrs.insert("detail".to_string(), transition.event_value.clone());
                attrs.insert("output".to_string(), transition.output.clone());
                self.graph.add_edge(
                    transition.source.name(),
                    transition.target.name(),
                    &transition.event,
                    attrs,
                    true,
                );
            }
        }
        Ok(())
    }

    /*
        Move the SUT to the nearest immature state and return its name.
        Two candidate walks are compared: from the current state and from
        the initial state (after a reset). The shorter one is replayed
        blindly; recorded transitions are deterministic, so the replay ends
        where the graph says it does.
    */
    fn go_to_nearest_immature(&mut self, source: &str) -> Result<String, ProbeError> {
        if !self.maze.is_mature_state(source)? {
            return Ok(source.to_string());
        }

        let path_from_current = self
            .find_nearest_immature(source)
            .map(|target| self.graph.shortest_path(source, &target))
            .filter(|path| !path.is_empty());

        let mut path_from_initial = None;
        if source != self.initial.name() {
            if !self.maze.is_mature_state(self.initial.name())? {
                self.sut.reset();
                return Ok(self.initial.name().to_string());
            }
            path_from_initial = self
                .find_nearest_immature(self.initial.name())
                .map(|target| {
                    self.graph.shortest_path(self.initial.name(), &target)
                })
                .filter(|path| !path.is_empty());
        }

        match (path_from_current, path_from_initial) {
            (Some(cur), Some(init)) => {
                if cur.len() <= init.len() {
                    self.execute_path(&cur)
                } else {
                    self.sut.reset();
                    self.execute_path(&init)
                }
            }
            (Some(cur), None) => self.execute_path(&cur),
            (None, Some(init)) => {
                self.sut.reset();
                self.execute_path(&init)
            }
            (None, None) => Err(ProbeError::UnknownState(format!(
                "no immature state reachable from {} or {}",
                source,
                self.initial.name()
            ))),
        }
    }

    // The nearest immature state in BFS order, so the walk to it is as
    // short as possible.
    fn find_nearest_immature(&self, source: &str) -> Option<String> {
        self.graph
            .bfs(source)
            .into_iter()
            .find(|name| !self.maze.is_mature_state(name).unwrap_or(true))
    }

    fn execute_path(&mut self, path: &[Arrow]) -> Result<String, ProbeError> {
        for arrow in path {
            let event = self.events.get(&arrow.name).ok_or_else(|| {
                error!("unknown event {} on {}", arrow.name, arrow.tail);
                ProbeError::UnknownEvent(arrow.name.clone())
            })?;
            event.fire(&mut self.sut);
        }
        path.last()
            .map(|arrow| arrow.head.clone())
            .ok_or_else(|| ProbeError::UnknownState("empty replay path".to_string()))
    }
}
