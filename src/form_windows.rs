use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::Result;
use crate::page::{Page, UnloadHandler};
use crate::windows::{ScreenSize, WindowId};

pub const DEFAULT_FORM_WIDTH: i64 = 720;
pub const DEFAULT_FORM_HEIGHT: i64 = 480;
pub const DEFAULT_FORMS_DIR: &str = "forms";
pub const DEFAULT_CONTACT_DOMAIN: &str = "trainconference.com";

/// Offset used for a dimension the screen does not report.
const UNKNOWN_SCREEN_OFFSET: i64 = 50;

/// Size and position of a form window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub width: i64,
    pub height: i64,
    pub left: i64,
    pub top: i64,
}

impl WindowGeometry {
    pub fn centered(screen: ScreenSize, width: i64, height: i64) -> Self {
        let left = if screen.width > 0 {
            (screen.width - width) / 2
        } else {
            UNKNOWN_SCREEN_OFFSET
        };
        let top = if screen.height > 0 {
            (screen.height - height) / 2
        } else {
            UNKNOWN_SCREEN_OFFSET
        };
        Self {
            width,
            height,
            left,
            top,
        }
    }

    /// The window-features string handed to the window host. Form windows
    /// get scrollbars and resizing but no browser chrome.
    pub fn features(&self) -> String {
        format!(
            "width={},height={},top={},left={},scrollbars=1,location=0,directories=0,status=0,menubar=0,toolbar=0,resizable=1",
            self.width, self.height, self.top, self.left
        )
    }
}

/// Registry of named popup form windows for one page.
///
/// Each form name maps to the last window opened for it. Entries are never
/// removed; a closed window is simply replaced the next time its form is
/// shown. Clones share the registry and the chained unload handler.
#[derive(Clone)]
pub struct FormWindowManager {
    registry: Rc<RefCell<BTreeMap<String, WindowId>>>,
    chained_unload: Rc<RefCell<Option<UnloadHandler>>>,
    width: i64,
    height: i64,
    forms_dir: String,
    contact_domain: String,
}

impl fmt::Debug for FormWindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormWindowManager")
            .field("registry", &self.registry)
            .field("chained_unload", &self.chained_unload.borrow().is_some())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("forms_dir", &self.forms_dir)
            .field("contact_domain", &self.contact_domain)
            .finish()
    }
}

impl Default for FormWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FormWindowManager {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(BTreeMap::new())),
            chained_unload: Rc::new(RefCell::new(None)),
            width: DEFAULT_FORM_WIDTH,
            height: DEFAULT_FORM_HEIGHT,
            forms_dir: DEFAULT_FORMS_DIR.to_string(),
            contact_domain: DEFAULT_CONTACT_DOMAIN.to_string(),
        }
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = i64::from(width);
        self.height = i64::from(height);
        self
    }

    /// Directory that `show_form` resolves `<name>.html` against when no URL
    /// is given.
    pub fn with_forms_dir(mut self, forms_dir: &str) -> Self {
        self.forms_dir = forms_dir.trim_end_matches('/').to_string();
        self
    }

    pub fn with_contact_domain(mut self, domain: &str) -> Self {
        self.contact_domain = domain.to_string();
        self
    }

    /// Hooks [`close_all_forms`](Self::close_all_forms) into the page's
    /// unload signal. A handler that was already installed is kept and runs
    /// from `close_all_forms`, after the forms are closed.
    pub fn install(self, page: &mut Page) -> Self {
        let previous = page.take_unload_handler();
        page.trace(format!(
            "[unload] install form windows chained={}",
            previous.is_some()
        ));
        *self.chained_unload.borrow_mut() = previous;

        let manager = self.clone();
        page.set_unload_handler(Box::new(move |page: &mut Page| {
            manager.close_all_forms(page).map(|_| ())
        }));
        self
    }

    /// Brings the form's window forward, opening it if it is not open.
    ///
    /// Without `url` the window loads `<forms_dir>/<name>.html`. An empty
    /// `name` opens an anonymous window that is not registered.
    pub fn show_form(
        &self,
        page: &mut Page,
        name: &str,
        url: Option<&str>,
    ) -> Result<WindowId> {
        if let Some(id) = self.form_window(name) {
            if !page.windows().is_closed(id)? {
                page.focus_window(id)?;
                return Ok(id);
            }
        }

        let geometry = WindowGeometry::centered(page.screen(), self.width, self.height);
        let url = match url {
            Some(url) if !url.is_empty() => url.to_string(),
            _ if !name.is_empty() => format!("{}/{name}.html", self.forms_dir),
            _ => "about:blank".to_string(),
        };
        let id = page.open_window(&url, name, &geometry.features());
        if !name.is_empty() {
            self.registry.borrow_mut().insert(name.to_string(), id);
        }
        Ok(id)
    }

    /// Closes every registered window that is still open, then runs the
    /// unload handler chained by [`install`](Self::install). The chained
    /// handler runs at most once. Returns how many windows were closed.
    pub fn close_all_forms(&self, page: &mut Page) -> Result<usize> {
        let ids = self.registry.borrow().values().copied().collect::<Vec<_>>();
        let mut closed = 0usize;
        for id in ids {
            if page.close_window(id)? {
                closed += 1;
            }
        }
        page.trace(format!("[unload] closed form windows count={closed}"));

        let chained = self.chained_unload.borrow_mut().take();
        if let Some(handler) = chained {
            handler(page)?;
        }
        Ok(closed)
    }

    pub fn form_window(&self, name: &str) -> Option<WindowId> {
        if name.is_empty() {
            return None;
        }
        self.registry.borrow().get(name).copied()
    }

    pub fn is_form_open(&self, page: &Page, name: &str) -> bool {
        self.form_window(name)
            .is_some_and(|id| matches!(page.windows().is_closed(id), Ok(false)))
    }

    pub fn form_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Tells the visitor a form cannot be used right now, optionally why and
    /// whom to e-mail instead.
    pub fn form_unavailable(
        &self,
        page: &mut Page,
        reason: Option<&str>,
        contact: Option<&str>,
    ) {
        let mut message = String::from("We're sorry, but this form is unavailable at the moment.");
        if let Some(reason) = reason {
            message.push_str("  ");
            message.push_str(reason);
        }
        message.push_str("\n\nWe'll try to get this form working again as quickly as possible.");
        if let Some(contact) = contact {
            message.push_str(&format!(
                "  In the meantime, you can try to e-mail your information to \"{contact}@{}\".",
                self.contact_domain
            ));
        }
        page.alert(&message);
    }
}
