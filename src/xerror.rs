//! X protocol error tolerance
//!
//! Protocol errors arrive on the event queue. Most are unexpected and
//! fatal, but operations racing against window destruction produce
//! BadWindow errors as a matter of course and must not kill the daemon.

use x11rb::protocol::ErrorKind;
use x11rb::x11_utils::X11Error;

/// What to do with a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Swallow the error and keep running.
    Ignore,
    /// Treat the error as unrecoverable.
    Fatal,
}

type ErrorRule = Box<dyn Fn(&X11Error) -> Option<ErrorAction>>;

/// Ordered list of error rules.
///
/// Rules are tried in registration order and the first one with an opinion
/// decides. Anything unmatched is fatal, inheriting the stock X error
/// handler's behavior.
#[derive(Default)]
pub struct ErrorPolicy {
    rules: Vec<ErrorRule>,
}

impl ErrorPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; earlier rules keep precedence.
    pub fn rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&X11Error) -> Option<ErrorAction> + 'static,
    {
        self.rules.push(Box::new(rule));
        self
    }

    /// The daemon's stock policy: ignore BadWindow, defer everything else.
    pub fn with_defaults() -> Self {
        Self::new()
            .rule(|error| (error.error_kind == ErrorKind::Window).then_some(ErrorAction::Ignore))
    }

    pub fn decide(&self, error: &X11Error) -> ErrorAction {
        self.rules
            .iter()
            .find_map(|rule| rule(error))
            .unwrap_or(ErrorAction::Fatal)
    }
}
