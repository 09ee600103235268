//! Command vocabulary for the window controller.
//!
//! A management layer (serial console, MQTT bridge, buttons) turns its input
//! into a [`WindowCommand`] and hands it to
//! [`WindowController::apply`](crate::WindowController::apply). The returned
//! [`CommandOutcome`] says whether anything happened.
//!
//! # Command Outcomes
//!
//! - [`CommandOutcome::Started`]: a move was scheduled
//! - [`CommandOutcome::Stopping`]: the current move is decelerating to a halt
//! - [`CommandOutcome::Ignored`]: nothing changed, with a [`RejectReason`]
//!
//! Requests suppressed by an end-stop are not errors: a window that is
//! already open simply ignores `open`.
//!
//! # Example
//!
//! ```rust
//! use smart_window::{RejectReason, WindowCommand};
//!
//! assert_eq!(WindowCommand::from_text(" OPEN\r\n"), Some(WindowCommand::Open));
//! assert_eq!(WindowCommand::from_text("ajar"), None);
//! assert_eq!(RejectReason::LimitReached.as_str(), "limit_reached");
//! ```

/// Request to the window controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WindowCommand {
    /// Travel the full length towards open.
    Open,
    /// Travel the full length towards closed.
    Close,
    /// Decelerate to a halt.
    Stop,
}

impl WindowCommand {
    /// Parse a command word, ignoring case and surrounding whitespace.
    ///
    /// Accepts `open`, `close` and `stop`.
    pub fn from_text(text: &str) -> Option<Self> {
        let word = text.trim();
        if word.eq_ignore_ascii_case("open") {
            Some(WindowCommand::Open)
        } else if word.eq_ignore_ascii_case("close") {
            Some(WindowCommand::Close)
        } else if word.eq_ignore_ascii_case("stop") {
            Some(WindowCommand::Stop)
        } else {
            None
        }
    }

    /// Returns the command as a lowercase string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            WindowCommand::Open => "open",
            WindowCommand::Close => "close",
            WindowCommand::Stop => "stop",
        }
    }
}

/// What a command did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommandOutcome {
    /// A move was scheduled.
    Started,
    /// The current move is decelerating.
    Stopping,
    /// Nothing changed.
    Ignored(RejectReason),
}

impl CommandOutcome {
    /// True unless the command was ignored.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, CommandOutcome::Ignored(_))
    }
}

/// Why a command was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RejectReason {
    /// The end-stop in the requested direction is triggered.
    LimitReached,
    /// Already travelling in the requested direction.
    AlreadyMoving,
    /// Stop requested while at rest.
    NotMoving,
}

impl RejectReason {
    /// Returns the reason as a snake_case string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LimitReached => "limit_reached",
            RejectReason::AlreadyMoving => "already_moving",
            RejectReason::NotMoving => "not_moving",
        }
    }
}
