use std::error::Error as StdError;
use std::fmt;

mod dom;
mod enhance;
mod html;
mod intl;
mod page;
mod selector;
mod widgets;

pub use enhance::Enhancer;
pub use intl::{
    CivilDate, format_currency, format_date, format_two_decimals, month_year_label,
    parse_float_prefix, sanitize_currency,
};
pub use page::{Page, PendingTimer};

pub(crate) use dom::{Dom, NodeId};
pub(crate) use enhance::Action;
pub(crate) use html::parse_html;
pub(crate) use selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorPseudoClass, SelectorStep,
    parse_selector_groups,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Fallback delay after which a guarded submit button is re-enabled when
/// the submission was never resolved.
pub const SUBMIT_GUARD_RECOVERY_MS: i64 = 5_000;

/// Delay before a modal containing a submitted form is hidden.
pub const MODAL_CLOSE_DELAY_MS: i64 = 500;

/// Delay before non-permanent alerts are dismissed.
pub const ALERT_DISMISS_MS: i64 = 5_000;

/// Refresh interval for the current-month display.
pub const MONTH_REFRESH_MS: i64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    DomOp(String),
    Pattern(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    Timer(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::DomOp(msg) => write!(f, "dom operation error: {msg}"),
            Self::Pattern(msg) => write!(f, "pattern error: {msg}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::Timer(msg) => write!(f, "timer error: {msg}"),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
