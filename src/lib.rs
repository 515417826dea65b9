//! Form field validation, focus recovery, field-group toggling and popup
//! form windows, running on a deterministic in-memory [`Page`].
//!
//! ```
//! use forms_support::{FieldRule, FieldValidator, FocusRecovery, Page};
//!
//! # fn main() -> forms_support::Result<()> {
//! let mut page = Page::from_html("<input id='postal' name='postal'>")?;
//! let postal = page.select_one("#postal")?;
//! FieldValidator::new(FocusRecovery::new()).attach(&mut page, postal, FieldRule::PostalCode);
//!
//! page.change_text("#postal", "k1a0b1")?;
//! page.assert_value("#postal", "K1A 0B1")?;
//! # Ok(())
//! # }
//! ```

use std::error::Error as StdError;
use std::fmt;

pub mod classify;
mod dom;
mod form_windows;
mod html;
mod page;
mod pattern;
mod recovery;
mod scheduler;
mod toggle;
mod trace;
mod validation;
mod windows;

pub use classify::{IntegerBounds, Rejection};
pub use dom::NodeId;
pub use form_windows::{FormWindowManager, WindowGeometry};
pub use page::{Event, EventHandler, Page, Selection, UnloadHandler};
pub use recovery::FocusRecovery;
pub use scheduler::PendingTimer;
pub use toggle::{FieldGroupToggler, GroupAction};
pub use validation::{FieldRule, FieldValidator, ValidationOutcome};
pub use windows::{BrowsingContext, ScreenSize, WindowHost, WindowId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Runtime(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}"
            ),
        }
    }
}

impl StdError for Error {}
