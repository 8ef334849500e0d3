//! A single compiled location rule.

use crate::rules::continuation::{
    Continuation, Transition, AUTH_FAILURE_STATUSES, CACHE_EXCEPTION_FAILURE_STATUSES,
};
use crate::rules::matcher::LocationMatch;
use crate::rules::tree::{Block, Node};

/// Which policy a rule implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    PasswordProtected,
    CacheException,
    StaticAsset,
    Default,
    Continuation(Continuation),
}

impl RuleKind {
    /// Value of `$loc_in`/`$loc_out`, surfaced in the access log.
    pub fn log_label(self) -> &'static str {
        match self {
            RuleKind::PasswordProtected => "pass_prot",
            RuleKind::CacheException => "cache_exc",
            RuleKind::StaticAsset => "static_file",
            RuleKind::Default => "slash_block",
            RuleKind::Continuation(c) => c.name(),
        }
    }

    /// Where an authorization failure sends the request, per rule kind.
    ///
    /// Password-protected paths fail closed, the default path fails open and
    /// cache exceptions are served as if granted. Static assets and the
    /// continuations themselves never consult authorization.
    pub fn failure_transition(self) -> Option<Transition> {
        match self {
            RuleKind::PasswordProtected => {
                Some(Transition::new(AUTH_FAILURE_STATUSES, Continuation::FailClosed))
            }
            RuleKind::CacheException => Some(Transition::new(
                CACHE_EXCEPTION_FAILURE_STATUSES,
                Continuation::AccessGranted,
            )),
            RuleKind::Default => Some(Transition::new(AUTH_FAILURE_STATUSES, Continuation::FailOpen)),
            RuleKind::StaticAsset | RuleKind::Continuation(_) => None,
        }
    }

    pub fn consults_authorization(self) -> bool {
        self.failure_transition().is_some()
    }
}

/// One location rule: a match condition plus its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub matcher: LocationMatch,
    pub body: Vec<Node>,
}

impl Rule {
    pub fn new(kind: RuleKind, matcher: LocationMatch) -> Self {
        Self {
            kind,
            matcher,
            body: Vec::new(),
        }
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.body.push(node.into());
    }

    pub fn extend<I, N>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.body.extend(nodes.into_iter().map(Into::into));
    }

    pub fn to_block(&self) -> Block {
        let mut block = Block::with_args("location", self.matcher.to_string());
        block.extend(self.body.iter().cloned());
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_way_failure_asymmetry() {
        let target = |k: RuleKind| k.failure_transition().map(|t| t.target);

        assert_eq!(target(RuleKind::PasswordProtected), Some(Continuation::FailClosed));
        assert_eq!(target(RuleKind::CacheException), Some(Continuation::AccessGranted));
        assert_eq!(target(RuleKind::Default), Some(Continuation::FailOpen));
        assert_eq!(target(RuleKind::StaticAsset), None);
    }

    #[test]
    fn test_continuations_do_not_consult_authorization() {
        for c in Continuation::ORDERED {
            assert!(!RuleKind::Continuation(c).consults_authorization());
        }
    }

    #[test]
    fn test_to_block_uses_matcher_args() {
        let rule = Rule::new(RuleKind::Default, LocationMatch::catch_all());
        let block = rule.to_block();
        assert_eq!(block.name, "location");
        assert_eq!(block.args.as_deref(), Some("/"));
    }
}
