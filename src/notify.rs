use crate::model::Toast;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

pub const TOAST_DURATION: Duration = Duration::from_millis(3500);

type DismissFn = Box<dyn FnOnce() + Send>;

/// A displayed toast with its auto-dismiss timer.
///
/// The dismiss callback runs at most once: either when the timer elapses or on
/// [`Notification::dismiss`]. Dropping the notification (for instance when a
/// newer toast replaces it) cancels the timer without running the callback.
pub struct Notification {
    toast: Toast,
    on_dismiss: Arc<Mutex<Option<DismissFn>>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl Notification {
    /// Starts the timer. Must be called from within a tokio runtime.
    pub fn show<F>(toast: Toast, delay: Duration, on_dismiss: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let on_dismiss: Arc<Mutex<Option<DismissFn>>> =
            Arc::new(Mutex::new(Some(Box::new(on_dismiss))));
        let (cancel, cancelled) = oneshot::channel::<()>();

        let timer_dismiss = on_dismiss.clone();
        let toast_id = toast.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    tracing::debug!("Toast {} expired", toast_id);
                    fire(&timer_dismiss);
                }
                _ = cancelled => {}
            }
        });

        Self {
            toast,
            on_dismiss,
            cancel: Some(cancel),
        }
    }

    pub fn toast(&self) -> &Toast {
        &self.toast
    }

    /// False once the callback has run.
    pub fn is_active(&self) -> bool {
        self.on_dismiss.lock().is_some()
    }

    /// User dismissal: stops the timer and runs the callback now.
    pub fn dismiss(mut self) {
        self.stop_timer();
        fire(&self.on_dismiss);
    }

    fn stop_timer(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

impl Drop for Notification {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

fn fire(slot: &Mutex<Option<DismissFn>>) {
    let callback = slot.lock().take();
    if let Some(callback) = callback {
        callback();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn toast() -> Toast {
        Toast {
            id: 1,
            text: "Fetched 20. Updated 15.".into(),
            severity: Severity::Success,
        }
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn expires_after_delay() {
        let (count, callback) = counter();
        let note = Notification::show(toast(), Duration::from_millis(30), callback);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(note.is_active());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!note.is_active());
    }

    #[tokio::test]
    async fn explicit_dismiss_fires_once() {
        let (count, callback) = counter();
        let note = Notification::show(toast(), Duration::from_millis(30), callback);
        note.dismiss();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replacing_cancels_pending_timer() {
        let (first_count, first) = counter();
        let (second_count, second) = counter();

        let mut shown = Some(Notification::show(toast(), Duration::from_millis(30), first));
        let replacement = Notification::show(
            Toast {
                id: 2,
                text: "db locked".into(),
                severity: Severity::Error,
            },
            Duration::from_millis(60),
            second,
        );
        drop(shown.replace(replacement));
        assert_eq!(shown.as_ref().map(|n| n.toast().id), Some(2));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stays_up_until_delay() {
        let (count, callback) = counter();
        let _note = Notification::show(toast(), Duration::from_millis(500), callback);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
