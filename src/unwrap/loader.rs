//! Background loading of an unwrapper backend.
//!
//! Backends may need time to come up (an external library, a warm-up pass).
//! [`UnwrapperLoader::spawn`] runs the factory on a worker thread and hands
//! the result back over a channel; the owner polls or waits for it. There is
//! no timeout: a factory that never returns leaves the loader in
//! [`Readiness::Loading`] for good.

use std::thread;

use crossbeam_channel::{bounded, Receiver, RecvError, TryRecvError};

use super::Unwrapper;
use crate::error::{Error, Result};

/// Load state of an unwrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The backend is still being created.
    Loading,
    /// The backend can be used.
    Ready,
    /// The backend failed to load and never will.
    Failed,
}

enum State {
    Pending(Receiver<Result<Box<dyn Unwrapper>>>),
    Ready(Box<dyn Unwrapper>),
    Failed(String),
}

/// Holds an unwrapper that may still be loading.
pub struct UnwrapperLoader {
    state: State,
}

impl UnwrapperLoader {
    /// Wrap an unwrapper that is usable immediately.
    pub fn ready<U: Unwrapper + 'static>(unwrapper: U) -> Self {
        Self {
            state: State::Ready(Box::new(unwrapper)),
        }
    }

    /// Create the unwrapper on a background thread.
    pub fn spawn<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn Unwrapper>> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let spawned = thread::Builder::new()
            .name("unwrapper-loader".to_string())
            .spawn(move || {
                // The receiver may already be gone if the owner was dropped.
                let _ = tx.send(factory());
            });

        let state = match spawned {
            Ok(_) => State::Pending(rx),
            Err(e) => failed(format!("could not start loader thread: {e}")),
        };
        Self { state }
    }

    /// Check for a finished load without blocking.
    pub fn poll(&mut self) -> Readiness {
        if let State::Pending(rx) = &self.state {
            let next = match rx.try_recv() {
                Ok(result) => Some(settle(result)),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    Some(failed("loader thread exited without a result".to_string()))
                }
            };
            if let Some(state) = next {
                self.state = state;
            }
        }
        self.readiness()
    }

    /// Block until the load finishes one way or the other.
    pub fn wait(&mut self) -> Readiness {
        if let State::Pending(rx) = &self.state {
            self.state = match rx.recv() {
                Ok(result) => settle(result),
                Err(RecvError) => failed("loader thread exited without a result".to_string()),
            };
        }
        self.readiness()
    }

    /// Current state, without polling.
    pub fn readiness(&self) -> Readiness {
        match self.state {
            State::Pending(_) => Readiness::Loading,
            State::Ready(_) => Readiness::Ready,
            State::Failed(_) => Readiness::Failed,
        }
    }

    /// The unwrapper, once ready.
    pub fn get(&self) -> Option<&dyn Unwrapper> {
        match &self.state {
            State::Ready(unwrapper) => Some(unwrapper.as_ref()),
            _ => None,
        }
    }

    /// Why loading failed, if it did.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            State::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Debug for UnwrapperLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnwrapperLoader")
            .field("readiness", &self.readiness())
            .finish_non_exhaustive()
    }
}

fn settle(result: Result<Box<dyn Unwrapper>>) -> State {
    match result {
        Ok(unwrapper) => {
            log::info!("UV unwrapper ready: {}", unwrapper.name());
            State::Ready(unwrapper)
        }
        Err(e) => failed(e.to_string()),
    }
}

fn failed(reason: String) -> State {
    log::error!("UV unwrapper failed to load: {}", reason);
    State::Failed(reason)
}

impl From<Error> for UnwrapperLoader {
    fn from(error: Error) -> Self {
        Self {
            state: failed(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unwrap::{ChartAtlas, CylindricalProjection};

    #[test]
    fn test_ready_loader() {
        let mut loader = UnwrapperLoader::ready(CylindricalProjection);
        assert_eq!(loader.poll(), Readiness::Ready);
        assert_eq!(loader.get().map(|u| u.name()), Some("cylindrical"));
    }

    #[test]
    fn test_spawned_loader_stays_loading_until_released() {
        let (release, gate) = bounded::<()>(1);
        let mut loader = UnwrapperLoader::spawn(move || {
            gate.recv()
                .map_err(|_| Error::UnwrapperUnavailable("gate closed".into()))?;
            Ok(Box::new(ChartAtlas::default()) as Box<dyn Unwrapper>)
        });

        assert_eq!(loader.poll(), Readiness::Loading);
        assert!(loader.get().is_none());

        release.send(()).unwrap();
        assert_eq!(loader.wait(), Readiness::Ready);
        assert_eq!(loader.get().map(|u| u.name()), Some("atlas"));
    }

    #[test]
    fn test_failed_factory() {
        let mut loader =
            UnwrapperLoader::spawn(|| Err(Error::UnwrapperUnavailable("no backend".into())));
        assert_eq!(loader.wait(), Readiness::Failed);
        assert!(loader.failure().unwrap().contains("no backend"));
        // Failure is permanent.
        assert_eq!(loader.poll(), Readiness::Failed);
        assert!(loader.get().is_none());
    }

    #[test]
    fn test_panicking_factory_fails() {
        let mut loader = UnwrapperLoader::spawn(|| panic!("backend crashed"));
        assert_eq!(loader.wait(), Readiness::Failed);
    }

    #[test]
    fn test_from_error() {
        let loader = UnwrapperLoader::from(Error::invalid_param("padding", 1.0, "too large"));
        assert_eq!(loader.readiness(), Readiness::Failed);
    }
}
