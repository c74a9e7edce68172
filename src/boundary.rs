//! Render supervisor.
//!
//! [`ErrorBoundary`] wraps a [`Component`] and traps failures of its
//! `render` call, both `Err` returns and panics. After a failure it keeps
//! rendering the fallback until someone resets it, either through
//! [`ErrorBoundary::reset`] or through a [`ResetHandle`] handed to the
//! fallback (the "retry" button).
//!
//! Only the wrapped render call is supervised. Failures in background
//! work (e.g. a debounced save) never reach the boundary.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Locale;
use crate::view::ErrorPanel;

/// Anything that can build its output and may fail while doing so.
pub trait Component {
    type Output;

    fn render(&mut self) -> Result<Self::Output>;
}

/// A captured render failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub message: String,
    /// True when the render panicked rather than returning `Err`.
    pub panicked: bool,
}

impl RenderFailure {
    fn from_error(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
            panicked: false,
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "render panicked".to_string()
        };
        Self {
            message,
            panicked: true,
        }
    }
}

impl std::fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Cloneable "retry" action. Requests a reset; the boundary applies it
/// on its next render.
#[derive(Debug, Clone, Default)]
pub struct ResetHandle(Arc<AtomicBool>);

impl ResetHandle {
    pub fn reset(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

type FallbackFn<O> = Box<dyn Fn(&RenderFailure, ResetHandle) -> O + Send>;

pub struct ErrorBoundary<C: Component> {
    child: C,
    fallback: FallbackFn<C::Output>,
    failure: Option<RenderFailure>,
    reset: ResetHandle,
    failures_caught: usize,
}

impl<C> ErrorBoundary<C>
where
    C: Component,
    C::Output: From<ErrorPanel>,
{
    /// Boundary that shows the built-in localized panel on failure.
    pub fn new(child: C, locale: Locale) -> Self {
        Self::with_fallback(child, move |_failure, reset| {
            ErrorPanel::new(locale, reset).into()
        })
    }
}

impl<C: Component> ErrorBoundary<C> {
    /// Boundary with a caller-supplied fallback renderer.
    pub fn with_fallback<F>(child: C, fallback: F) -> Self
    where
        F: Fn(&RenderFailure, ResetHandle) -> C::Output + Send + 'static,
    {
        Self {
            child,
            fallback: Box::new(fallback),
            failure: None,
            reset: ResetHandle::default(),
            failures_caught: 0,
        }
    }

    /// Render the child, or the fallback while in the failed state.
    pub fn render(&mut self) -> C::Output {
        if self.reset.take() {
            self.failure = None;
        }
        if let Some(failure) = &self.failure {
            return (self.fallback)(failure, self.reset.clone());
        }

        let child = &mut self.child;
        let failure = match catch_unwind(AssertUnwindSafe(|| child.render())) {
            Ok(Ok(output)) => return output,
            Ok(Err(err)) => RenderFailure::from_error(err),
            Err(payload) => RenderFailure::from_panic(payload),
        };

        tracing::error!(
            panicked = failure.panicked,
            "ErrorBoundary caught an error: {}",
            failure.message
        );
        self.failures_caught += 1;
        let output = (self.fallback)(&failure, self.reset.clone());
        self.failure = Some(failure);
        output
    }

    /// Clear the captured failure; the next render re-attempts the child.
    pub fn reset(&mut self) {
        self.reset.take();
        self.failure = None;
    }

    pub fn reset_handle(&self) -> ResetHandle {
        self.reset.clone()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some() && !self.reset.is_requested()
    }

    pub fn failure(&self) -> Option<&RenderFailure> {
        self.failure.as_ref()
    }

    /// Number of distinct failures captured so far.
    pub fn failures_caught(&self) -> usize {
        self.failures_caught
    }

    pub fn child(&self) -> &C {
        &self.child
    }

    pub fn child_mut(&mut self) -> &mut C {
        &mut self.child
    }

    pub fn into_child(self) -> C {
        self.child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Screen;

    #[derive(Debug, PartialEq)]
    enum Out {
        Child(u32),
        Fallback(String),
    }

    struct Flaky {
        fail_with: Option<&'static str>,
        panic: bool,
        renders: u32,
    }

    impl Flaky {
        fn ok() -> Self {
            Self {
                fail_with: None,
                panic: false,
                renders: 0,
            }
        }
    }

    impl Component for Flaky {
        type Output = Out;

        fn render(&mut self) -> Result<Out> {
            self.renders += 1;
            if self.panic {
                panic!("boom");
            }
            match self.fail_with {
                Some(msg) => anyhow::bail!(msg),
                None => Ok(Out::Child(self.renders)),
            }
        }
    }

    fn custom(child: Flaky) -> ErrorBoundary<Flaky> {
        ErrorBoundary::with_fallback(child, |failure, _reset| {
            Out::Fallback(failure.message.clone())
        })
    }

    #[test]
    fn healthy_renders_children() {
        let mut boundary = custom(Flaky::ok());
        assert_eq!(boundary.render(), Out::Child(1));
        assert!(!boundary.is_failed());
    }

    #[test]
    fn error_switches_to_fallback_once() {
        let mut boundary = custom(Flaky {
            fail_with: Some("bad state"),
            ..Flaky::ok()
        });
        assert_eq!(boundary.render(), Out::Fallback("bad state".to_string()));
        assert_eq!(boundary.render(), Out::Fallback("bad state".to_string()));
        // Child is not retried while failed; the failure is recorded once.
        assert_eq!(boundary.child().renders, 1);
        assert_eq!(boundary.failures_caught(), 1);
        assert!(boundary.is_failed());
    }

    #[test]
    fn panic_is_captured() {
        let mut boundary = custom(Flaky {
            panic: true,
            ..Flaky::ok()
        });
        assert_eq!(boundary.render(), Out::Fallback("boom".to_string()));
        assert!(boundary.failure().unwrap().panicked);
    }

    #[test]
    fn reset_retries_children() {
        let mut boundary = custom(Flaky {
            fail_with: Some("once"),
            ..Flaky::ok()
        });
        boundary.render();
        boundary.child_mut().fail_with = None;
        boundary.reset();
        assert_eq!(boundary.render(), Out::Child(2));
        assert!(!boundary.is_failed());
    }

    #[test]
    fn reset_handle_from_fallback_retries() {
        let mut boundary = ErrorBoundary::with_fallback(
            Flaky {
                fail_with: Some("x"),
                ..Flaky::ok()
            },
            |_failure, reset| {
                // A fallback that immediately presses its own retry button.
                reset.reset();
                Out::Fallback("retrying".to_string())
            },
        );
        assert_eq!(boundary.render(), Out::Fallback("retrying".to_string()));
        assert!(!boundary.is_failed());
        boundary.child_mut().fail_with = None;
        assert_eq!(boundary.render(), Out::Child(2));
    }

    #[test]
    fn repeated_failures_are_counted_separately() {
        let mut boundary = custom(Flaky {
            fail_with: Some("again"),
            ..Flaky::ok()
        });
        boundary.render();
        boundary.reset();
        boundary.render();
        assert_eq!(boundary.failures_caught(), 2);
    }

    struct Broken;

    impl Component for Broken {
        type Output = Screen;

        fn render(&mut self) -> Result<Screen> {
            anyhow::bail!("nope")
        }
    }

    #[test]
    fn default_panel_is_localized() {
        let mut boundary = ErrorBoundary::new(Broken, Locale::Fr);
        match boundary.render() {
            Screen::Error(panel) => {
                assert_eq!(panel.title, "Une erreur s'est produite");
                panel.retry();
            }
            other => panic!("expected error panel, got {other:?}"),
        }
        assert!(!boundary.is_failed());
    }
}
