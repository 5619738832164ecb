// Rescue Registry - routes job failures to registered handlers

use crate::domain::JobError;
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

type Handler<C> = Box<dyn Fn(&mut C, &JobError) -> Result<(), JobError> + Send + Sync>;

/// Which failures a handler accepts.
///
/// Kinds nest: `Any` covers everything, `Perform` covers every `Type`.
#[derive(Clone, Copy)]
pub enum RescueKind {
    Any,
    NotImplemented,
    Argument,
    Perform,
    Panicked,
    Deserialization,
    /// A concrete user error type, matched by downcast
    Type {
        name: &'static str,
        matches: fn(&(dyn StdError + 'static)) -> bool,
    },
}

impl RescueKind {
    /// Match a concrete error type raised from a perform body
    pub fn of<E: StdError + 'static>() -> Self {
        RescueKind::Type {
            name: std::any::type_name::<E>(),
            matches: |err| err.is::<E>(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RescueKind::Any => "Any",
            RescueKind::NotImplemented => "NotImplemented",
            RescueKind::Argument => "Argument",
            RescueKind::Perform => "Perform",
            RescueKind::Panicked => "Panicked",
            RescueKind::Deserialization => "Deserialization",
            RescueKind::Type { name, .. } => *name,
        }
    }

    fn matches(&self, error: &JobError) -> bool {
        match self {
            RescueKind::Any => true,
            RescueKind::NotImplemented => matches!(error, JobError::NotImplemented),
            RescueKind::Argument => matches!(error, JobError::Argument(_)),
            RescueKind::Perform => matches!(error, JobError::Perform(_)),
            RescueKind::Panicked => matches!(error, JobError::Panicked(_)),
            RescueKind::Deserialization => matches!(
                error,
                JobError::UnknownJobClass(_) | JobError::Deserialization(_)
            ),
            RescueKind::Type { matches, .. } => error.user_error().is_some_and(|err| matches(err)),
        }
    }

    fn matches_cause(&self, cause: &(dyn StdError + 'static)) -> bool {
        if let Some(job_error) = cause.downcast_ref::<JobError>() {
            return self.matches(job_error);
        }
        match self {
            RescueKind::Type { matches, .. } => matches(cause),
            _ => false,
        }
    }
}

impl fmt::Debug for RescueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for RescueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of offering an error to the registry
#[derive(Debug)]
pub enum RescueOutcome {
    /// A handler ran; the error is returned for reporting
    Handled(JobError),
    /// No handler matched; the caller must raise the error unchanged
    Unhandled(JobError),
}

impl RescueOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, RescueOutcome::Handled(_))
    }
}

struct RescueEntry<C> {
    kind: RescueKind,
    handler: Handler<C>,
}

/// Ordered error-kind to handler mapping, searched newest first
pub struct RescueRegistry<C> {
    entries: Vec<RescueEntry<C>>,
}

impl<C> RescueRegistry<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a handler. Later registrations win over earlier ones.
    pub fn register<F>(&mut self, kind: RescueKind, handler: F) -> &mut Self
    where
        F: Fn(&mut C, &JobError) -> Result<(), JobError> + Send + Sync + 'static,
    {
        self.entries.push(RescueEntry {
            kind,
            handler: Box::new(handler),
        });
        self
    }

    /// Shorthand for `register(RescueKind::of::<E>(), handler)`
    pub fn rescue_from<E, F>(&mut self, handler: F) -> &mut Self
    where
        E: StdError + 'static,
        F: Fn(&mut C, &JobError) -> Result<(), JobError> + Send + Sync + 'static,
    {
        self.register(RescueKind::of::<E>(), handler)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered kinds, in registration order
    pub fn kinds(&self) -> Vec<RescueKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    /// Offer `error` to the handlers.
    ///
    /// The error itself is tried against every handler first; only then
    /// is each of its causes tried in turn. A handler that fails replaces
    /// the original error with its own.
    pub fn handle(&self, ctx: &mut C, error: JobError) -> Result<RescueOutcome, JobError> {
        let entry = self.find(&error);
        match entry {
            Some(entry) => {
                debug!(kind = %entry.kind, error = %error, "Rescue handler matched");
                (entry.handler)(ctx, &error)?;
                Ok(RescueOutcome::Handled(error))
            }
            None => Ok(RescueOutcome::Unhandled(error)),
        }
    }

    fn find(&self, error: &JobError) -> Option<&RescueEntry<C>> {
        if let Some(entry) = self.entries.iter().rev().find(|e| e.kind.matches(error)) {
            return Some(entry);
        }

        let mut cause = match error.user_error() {
            Some(user) => user.source(),
            None => error.source(),
        };
        while let Some(current) = cause {
            if let Some(entry) = self
                .entries
                .iter()
                .rev()
                .find(|e| e.kind.matches_cause(current))
            {
                return Some(entry);
            }
            cause = current.source();
        }
        None
    }
}

impl<C> Default for RescueRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for RescueRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RescueRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArgumentError;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("timed out")]
    struct Timeout;

    #[derive(Debug, Error)]
    #[error("request failed")]
    struct RequestFailed(#[source] Timeout);

    fn recording(tag: &'static str) -> impl Fn(&mut Vec<&'static str>, &JobError) -> Result<(), JobError> {
        move |log, _| {
            log.push(tag);
            Ok(())
        }
    }

    #[test]
    fn test_exact_kind_is_handled() {
        let mut registry = RescueRegistry::new();
        registry.rescue_from::<Timeout, _>(recording("timeout"));

        let mut log = Vec::new();
        let outcome = registry
            .handle(&mut log, JobError::perform(Timeout))
            .unwrap();

        assert!(outcome.is_handled());
        assert_eq!(log, vec!["timeout"]);
    }

    #[test]
    fn test_unmatched_error_is_returned_unchanged() {
        let mut registry = RescueRegistry::new();
        registry.register(RescueKind::Argument, recording("argument"));

        let mut log = Vec::new();
        let outcome = registry
            .handle(&mut log, JobError::perform(Timeout))
            .unwrap();

        match outcome {
            RescueOutcome::Unhandled(err) => assert!(err.downcast_ref::<Timeout>().is_some()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_most_recent_registration_wins() {
        let mut registry = RescueRegistry::new();
        registry.register(RescueKind::Any, recording("broad"));
        registry.rescue_from::<Timeout, _>(recording("narrow"));

        let mut log = Vec::new();
        registry.handle(&mut log, JobError::perform(Timeout)).unwrap();
        registry
            .handle(&mut log, JobError::Argument(ArgumentError::NotMaterialized))
            .unwrap();

        assert_eq!(log, vec!["narrow", "broad"]);
    }

    #[test]
    fn test_broad_registered_last_shadows_narrow() {
        let mut registry = RescueRegistry::new();
        registry.rescue_from::<Timeout, _>(recording("narrow"));
        registry.register(RescueKind::Perform, recording("broad"));

        let mut log = Vec::new();
        registry.handle(&mut log, JobError::perform(Timeout)).unwrap();

        assert_eq!(log, vec!["broad"]);
    }

    #[test]
    fn test_cause_is_matched_when_error_is_not() {
        let mut registry = RescueRegistry::new();
        registry.rescue_from::<Timeout, _>(recording("cause"));

        let mut log = Vec::new();
        let outcome = registry
            .handle(&mut log, JobError::perform(RequestFailed(Timeout)))
            .unwrap();

        assert!(outcome.is_handled());
        assert_eq!(log, vec!["cause"]);
    }

    #[test]
    fn test_failing_handler_replaces_error() {
        let mut registry: RescueRegistry<()> = RescueRegistry::new();
        registry.register(RescueKind::Panicked, |_, _| {
            Err(JobError::Deserialization("handler gave up".into()))
        });

        let err = registry
            .handle(&mut (), JobError::Panicked("boom".into()))
            .unwrap_err();
        assert!(matches!(err, JobError::Deserialization(_)));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(RescueKind::Any.name(), "Any");
        assert!(RescueKind::of::<Timeout>().name().ends_with("Timeout"));
    }
}
