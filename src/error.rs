//! Errors raised by the ledger core. Everything here is a user-input or invariant violation and is
//! expected to be reported at the command line boundary, never retried.

use crate::space::raw::CastError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{owner}.{field} is unset, has no default value nor default factory, and is not optional")]
    UnsetRequiredField {
        owner: &'static str,
        field: &'static str,
    },

    #[error("{owner}.{field} rejected value {value}")]
    Validation {
        owner: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{owner}.{field} holds a value that can't be read: {source}")]
    Cast {
        owner: &'static str,
        field: &'static str,
        #[source]
        source: CastError,
    },

    #[error("{0} is already ongoing")]
    AlreadyOngoing(String),

    #[error("{0} is not ongoing")]
    NotOngoing(String),

    #[error("cannot stop {activity} before its start time (tried to stop at {time})")]
    StopBeforeStart { activity: String, time: String },

    #[error("{ongoing} is ongoing, and has a similar name to {requested:?}")]
    SimilarName { ongoing: String, requested: String },

    #[error("no ongoing activity")]
    NoOngoingActivity,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
