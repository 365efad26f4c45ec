/*
    Error kinds surfaced by the explorer, the coverage strategies,
    and the CSV interchange.

    SUT-side failure responses are not errors: an output map carrying an
    "error" key is recorded with the transition like any other observation.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// A named state is missing from the learned matrix or the graph.
    #[error("unknown state: {0}")]
    UnknownState(String),

    /// An event name outside the configured alphabet.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// A transition rejected by a configured validator.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The same (source, event) pair produced two different target states.
    #[error("ambiguous behavior: {event} on {from_state} reached {first}, then {second}")]
    AmbiguousBehavior {
        from_state: String,
        event: String,
        first: String,
        second: String,
    },

    /// The graph cannot be balanced by duplicating existing edges.
    #[error("graph cannot be made eulerian by duplicating existing edges")]
    NotEulerizable,

    /// Malformed CSV bundle or underlying I/O failure.
    #[error("interchange error: {0}")]
    Interchange(String),
}

impl From<csv::Error> for ProbeError {
    fn from(err: csv::Error) -> Self {
        ProbeError::Interchange(err.to_string())
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Interchange(err.to_string())
    }
}
