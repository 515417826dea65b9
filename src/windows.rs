use crate::{Error, Result};

/// Handle to a secondary browsing context opened from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsingContext {
    id: WindowId,
    url: String,
    target: String,
    features: String,
    closed: bool,
    focus_count: usize,
}

impl BrowsingContext {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn features(&self) -> &str {
        &self.features
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count
    }
}

/// Screen dimensions in pixels; zero means the dimension is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: i64,
    pub height: i64,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

/// In-memory stand-in for the browser's window list.
///
/// Opening with the target name of a window that is still open reuses that
/// window, the way named browsing contexts behave.
#[derive(Debug, Default)]
pub struct WindowHost {
    windows: Vec<BrowsingContext>,
    focused: Option<WindowId>,
    created: usize,
}

impl WindowHost {
    pub(crate) fn open(&mut self, url: &str, target: &str, features: &str) -> WindowId {
        let reusable = if target.is_empty() {
            None
        } else {
            self.windows
                .iter_mut()
                .find(|window| !window.closed && window.target == target)
        };

        if let Some(window) = reusable {
            window.url = url.to_string();
            window.features = features.to_string();
            window.focus_count += 1;
            let id = window.id;
            self.focused = Some(id);
            return id;
        }

        let id = WindowId(self.windows.len());
        self.windows.push(BrowsingContext {
            id,
            url: url.to_string(),
            target: target.to_string(),
            features: features.to_string(),
            closed: false,
            focus_count: 1,
        });
        self.created += 1;
        self.focused = Some(id);
        id
    }

    pub(crate) fn focus(&mut self, id: WindowId) -> Result<()> {
        let window = self.window_mut(id)?;
        if window.closed {
            return Ok(());
        }
        window.focus_count += 1;
        self.focused = Some(id);
        Ok(())
    }

    /// Closes the window; returns whether it was still open.
    pub fn close(&mut self, id: WindowId) -> Result<bool> {
        let window = self.window_mut(id)?;
        if window.closed {
            return Ok(false);
        }
        window.closed = true;
        if self.focused == Some(id) {
            self.focused = None;
        }
        Ok(true)
    }

    pub fn is_closed(&self, id: WindowId) -> Result<bool> {
        Ok(self.window(id)?.closed)
    }

    pub fn window(&self, id: WindowId) -> Result<&BrowsingContext> {
        self.windows
            .get(id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown window: {}", id.0)))
    }

    fn window_mut(&mut self, id: WindowId) -> Result<&mut BrowsingContext> {
        self.windows
            .get_mut(id.0)
            .ok_or_else(|| Error::Runtime(format!("unknown window: {}", id.0)))
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    /// Number of windows ever created, reused ones counted once.
    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn open_count(&self) -> usize {
        self.windows.iter().filter(|window| !window.closed).count()
    }

    pub fn windows(&self) -> impl Iterator<Item = &BrowsingContext> {
        self.windows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_targets_are_reused_while_open() -> Result<()> {
        let mut host = WindowHost::default();
        let first = host.open("forms/a.html", "a", "width=1");
        let again = host.open("forms/a2.html", "a", "width=2");
        assert_eq!(first, again);
        assert_eq!(host.created_count(), 1);
        assert_eq!(host.window(first)?.url(), "forms/a2.html");
        assert_eq!(host.window(first)?.focus_count(), 2);

        assert!(host.close(first)?);
        assert!(!host.close(first)?);
        let fresh = host.open("forms/a.html", "a", "");
        assert_ne!(first, fresh);
        assert_eq!(host.created_count(), 2);
        assert_eq!(host.open_count(), 1);
        Ok(())
    }

    #[test]
    fn unnamed_targets_always_create() {
        let mut host = WindowHost::default();
        let a = host.open("x.html", "", "");
        let b = host.open("x.html", "", "");
        assert_ne!(a, b);
        assert_eq!(host.created_count(), 2);
    }

    #[test]
    fn focusing_a_closed_window_is_a_no_op() -> Result<()> {
        let mut host = WindowHost::default();
        let id = host.open("x.html", "x", "");
        host.close(id)?;
        host.focus(id)?;
        assert_eq!(host.window(id)?.focus_count(), 1);
        assert_eq!(host.focused(), None);
        Ok(())
    }
}
