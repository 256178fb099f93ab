//! Navigation context used to decide whether a reload is needed.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// The host's notion of "current page" and "reload".
///
/// In a browser this is `window.location`; headless hosts use
/// [`HeadlessPage`].
pub trait PageContext: Send + Sync + std::fmt::Debug + 'static {
    /// The current navigable location path.
    fn current_path(&self) -> String;

    /// Re-initialise the host from a clean slate.
    fn reload(&self);
}

/// A page context for hosts without navigation.
///
/// Records the path it was given and counts reload requests.
#[derive(Debug)]
pub struct HeadlessPage {
    path: Mutex<String>,
    reloads: AtomicUsize,
}

impl HeadlessPage {
    /// Create a context sitting on `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(path.into()),
            reloads: AtomicUsize::new(0),
        }
    }

    /// Move to another path.
    pub fn navigate(&self, path: impl Into<String>) {
        if let Ok(mut current) = self.path.lock() {
            *current = path.into();
        }
    }

    /// How many reloads were requested.
    pub fn reload_count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new("/")
    }
}

impl PageContext for HeadlessPage {
    fn current_path(&self) -> String {
        self.path
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(path = %self.current_path(), "Reload requested on headless page");
    }
}
