//! View-scoped scroll tracking.
//!
//! A [`ReadingSession`] is created when a reading view is entered. It attaches
//! one listener to the view's [`ScrollSurface`] and publishes progress on a
//! watch channel. The listener is detached when the session is dropped, so
//! nothing survives a navigation away from the view.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::reading::metrics::{progress_for, ElementGeometry, ScrollPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

pub type ScrollCallback = Box<dyn Fn(ScrollPosition) + Send + Sync>;

/// Something that scrolls and reports it.
pub trait ScrollSurface: Send + Sync {
    fn position(&self) -> ScrollPosition;
    fn add_listener(&self, callback: ScrollCallback) -> ListenerId;
    fn remove_listener(&self, id: ListenerId);
}

pub struct ReadingSession {
    surface: Arc<dyn ScrollSurface>,
    listener: Option<ListenerId>,
    geometry: Arc<Mutex<ElementGeometry>>,
    progress: watch::Receiver<f64>,
}

impl ReadingSession {
    /// Attach to `surface` and compute the initial progress right away.
    pub fn enter(surface: Arc<dyn ScrollSurface>, geometry: ElementGeometry) -> Self {
        let initial = progress_for(geometry, surface.position());
        let (tx, rx) = watch::channel(initial);
        let geometry = Arc::new(Mutex::new(geometry));

        let shared = geometry.clone();
        let listener = surface.add_listener(Box::new(move |position| {
            let Ok(geometry) = shared.lock() else {
                return;
            };
            let progress = progress_for(*geometry, position);
            tx.send_if_modified(|current| {
                if *current == progress {
                    false
                } else {
                    *current = progress;
                    true
                }
            });
        }));
        tracing::debug!("Reading session attached listener {:?}", listener);

        Self {
            surface,
            listener: Some(listener),
            geometry,
            progress: rx,
        }
    }

    pub fn progress(&self) -> f64 {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.progress.clone()
    }

    /// The article body moved or resized; takes effect on the next scroll.
    pub fn relayout(&self, geometry: ElementGeometry) {
        if let Ok(mut current) = self.geometry.lock() {
            *current = geometry;
        }
    }

    /// Detach explicitly. Dropping the session does the same.
    pub fn leave(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.surface.remove_listener(id);
            tracing::debug!("Reading session detached listener {:?}", id);
        }
    }
}

impl Drop for ReadingSession {
    fn drop(&mut self) {
        self.detach();
    }
}

/// In-process scroll surface driven by explicit [`emit`](Self::emit) calls.
/// Used where there is no real window, such as tests and terminal front ends.
pub struct HeadlessSurface {
    position: Mutex<ScrollPosition>,
    listeners: Mutex<BTreeMap<ListenerId, Arc<ScrollCallback>>>,
    next_id: AtomicU64,
}

impl HeadlessSurface {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            position: Mutex::new(ScrollPosition {
                scroll_top: 0.0,
                viewport_height,
            }),
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Move to `scroll_top` and notify every listener.
    pub fn emit(&self, scroll_top: f64) {
        let position = match self.position.lock() {
            Ok(mut current) => {
                current.scroll_top = scroll_top;
                *current
            }
            Err(_) => return,
        };
        let callbacks: Vec<_> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            (**callback)(position);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl ScrollSurface for HeadlessSurface {
    fn position(&self) -> ScrollPosition {
        self.position
            .lock()
            .map(|p| *p)
            .unwrap_or(ScrollPosition {
                scroll_top: 0.0,
                viewport_height: 0.0,
            })
    }

    fn add_listener(&self, callback: ScrollCallback) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, Arc::new(callback));
        }
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}
