//! Agents that play Threes! and learn from their own games.
//!
//! The learning agents approximate the value of an afterstate (the board right
//! after a slide, before the environment places a tile) with an n-tuple
//! network and train it by temporal-difference learning, replaying each
//! episode backward once it ends.
//!
//! - [`n_tuple`] - Tuple shapes, symmetry expansion and feature extraction
//! - [`weights`] - The shared weight store and its binary file format
//! - [`trajectory`] - Per-episode history and the backward TD(0) update
//! - [`agent`] - The [`Agent`](agent::Agent) interface and every player:
//!   learning sliders, baseline sliders and the tile placer
//! - [`episode`] - Plays one game between a slider and a placer
//! - [`config`] - `key=value` agent configuration

use std::{io, path::PathBuf};

use threes_engine::IllegalActionError;

pub mod agent;
pub mod board;
pub mod config;
pub mod episode;
pub mod n_tuple;
pub mod trajectory;
pub mod weights;

/// Invalid agent arguments or a weight store that does not fit the network.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigurationError {
    #[display("malformed argument {_0:?}, expected key=value")]
    MalformedArgument(#[error(not(source))] String),
    #[display("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[display("no table sizes given")]
    MissingSizes,
    #[display("table sizes must be positive")]
    NonPositiveSize,
    #[display("weight store is already initialized")]
    AlreadyInitialized,
    #[display("weight store has {actual} tables, network expects {expected}")]
    TableCount { expected: usize, actual: usize },
    #[display("weight table {table} has {actual} entries, network expects {expected}")]
    TableSize {
        table: usize,
        expected: usize,
        actual: usize,
    },
    #[display("invalid tuple shape {cells:?}")]
    InvalidShape {
        #[error(not(source))]
        cells: Vec<usize>,
    },
    #[display("network yields {_0} features per board, expected 1 to 32")]
    FeatureCount(#[error(not(source))] usize),
    #[display("unknown agent {_0:?}")]
    UnknownAgent(#[error(not(source))] String),
}

/// A weight lookup outside the bounds of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("weight index out of range: table {table}, key {key}")]
pub struct IndexOutOfRange {
    pub table: usize,
    pub key: usize,
}

/// Failure to read or write a weight file.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistenceError {
    #[display("failed to access weight file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed weight file {}: {reason}", path.display())]
    Format {
        path: PathBuf,
        #[error(not(source))]
        reason: String,
    },
}

/// An agent was driven out of the open/act/close episode protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ProtocolError {
    #[display("no episode is open")]
    EpisodeNotOpen,
    #[display("an episode is already open")]
    EpisodeAlreadyOpen,
}

/// Any failure raised while building agents or playing with them.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum AgentError {
    #[display("{_0}")]
    Configuration(ConfigurationError),
    #[display("{_0}")]
    IndexOutOfRange(IndexOutOfRange),
    #[display("{_0}")]
    Persistence(PersistenceError),
    #[display("{_0}")]
    Protocol(ProtocolError),
    #[display("{_0}")]
    IllegalAction(IllegalActionError),
}
