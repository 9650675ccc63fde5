//! Ownership of the backend resource for one session

use crate::backend::{MediaBackend, MediaHandle};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Monotonic tag for each `load` request
///
/// Asynchronous results carry the handle they belong to; the controller maps
/// the handle back to the generation it was created under and drops anything
/// that is not the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub(crate) fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen {}", self.0)
    }
}

/// A backend handle acquired for one generation
///
/// [`release`](Self::release) consumes the guard, so a resource can be
/// unloaded at most once. The controller keeps it in an `Option` and every
/// teardown path goes through `Option::take` + `release`.
#[derive(Debug)]
#[must_use = "a MediaResource must be released through the backend"]
pub(crate) struct MediaResource {
    generation: Generation,
    handle: MediaHandle,
}

impl MediaResource {
    pub(crate) fn new(generation: Generation, handle: MediaHandle) -> Self {
        Self { generation, handle }
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation
    }

    pub(crate) fn handle(&self) -> MediaHandle {
        self.handle
    }

    /// The generation a notification about `handle` belongs to, if it is this resource
    pub(crate) fn owns(&self, handle: MediaHandle) -> Option<Generation> {
        (self.handle == handle).then_some(self.generation)
    }

    pub(crate) fn release<B: MediaBackend + ?Sized>(self, backend: &mut B) {
        debug!(handle = %self.handle, generation = %self.generation, "releasing media resource");
        backend.unload(self.handle);
    }
}
