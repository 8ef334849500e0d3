//! Named continuations and the per-rule transition tables that reach them.
//!
//! The serving runtime jumps to a named block when the authorization call
//! returns one of a set of statuses. That jump is modelled here as data: each
//! rule kind owns at most one [`Transition`] mapping upstream statuses to a
//! [`Continuation`]. The compiler only emits the wiring; the transition is
//! taken at request time.

use std::fmt;

use crate::rules::tree::Directive;

/// Statuses the authorization service uses to signal it could not decide.
pub const AUTH_FAILURE_STATUSES: &[u16] = &[500, 501, 502];

/// Cache exceptions only fall back on a plain internal error.
pub const CACHE_EXCEPTION_FAILURE_STATUSES: &[u16] = &[500];

/// Outcome blocks a request can be transferred into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Continuation {
    AccessDenied,
    AccessGranted,
    FailOpen,
    FailClosed,
}

impl Continuation {
    /// Emission order, appended after all path-matched rules.
    pub const ORDERED: [Continuation; 4] = [
        Continuation::AccessDenied,
        Continuation::AccessGranted,
        Continuation::FailOpen,
        Continuation::FailClosed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Continuation::AccessDenied => "access_denied",
            Continuation::AccessGranted => "access_granted",
            Continuation::FailOpen => "fail_open",
            Continuation::FailClosed => "fail_closed",
        }
    }
}

impl fmt::Display for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// Maps a set of authorization statuses to a continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub statuses: &'static [u16],
    pub target: Continuation,
}

impl Transition {
    pub const fn new(statuses: &'static [u16], target: Continuation) -> Self {
        Self { statuses, target }
    }

    /// The continuation entered for `status`, if this transition covers it.
    ///
    /// `None` means the authorization response itself carries the decision.
    pub fn resolve(&self, status: u16) -> Option<Continuation> {
        self.statuses.contains(&status).then_some(self.target)
    }

    /// `error_page 500 501 502 @fail_closed;`
    pub fn to_directive(&self) -> Directive {
        let statuses: Vec<String> = self.statuses.iter().map(u16::to_string).collect();
        Directive::new("error_page", format!("{} {}", statuses.join(" "), self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuation_labels() {
        assert_eq!(Continuation::FailClosed.to_string(), "@fail_closed");
        assert_eq!(Continuation::AccessDenied.name(), "access_denied");
    }

    #[test]
    fn test_transition_resolves_only_listed_statuses() {
        let t = Transition::new(AUTH_FAILURE_STATUSES, Continuation::FailClosed);
        assert_eq!(t.resolve(502), Some(Continuation::FailClosed));
        assert_eq!(t.resolve(200), None);
        assert_eq!(t.resolve(503), None);
    }

    #[test]
    fn test_transition_directive() {
        let t = Transition::new(CACHE_EXCEPTION_FAILURE_STATUSES, Continuation::AccessGranted);
        let d = t.to_directive();
        assert_eq!(d.name, "error_page");
        assert_eq!(d.value.as_deref(), Some("500 @access_granted"));
    }
}
