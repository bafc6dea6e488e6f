//! Circular dependency detection infrastructure.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

// Each nested build takes several stack frames; this fits a 2 MiB thread
// stack in debug builds.
pub(crate) const MAX_DEPTH: usize = 128;

// Thread-local stack of the definition builds in progress
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<Frame>,
}

/// One build in progress: the container doing it and the identifier.
#[derive(PartialEq, Eq)]
struct Frame {
    container: u64,
    id: String,
}

/// Guard for managing thread-local resolution stack
pub(crate) struct StackGuard {
    container: u64,
}

impl StackGuard {
    /// Pushes a frame, failing if it is already on the stack or the stack is
    /// full.
    pub(crate) fn enter(container: u64, id: &str) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            // Circular detection BEFORE pushing the new frame
            if let Some(start) = tls
                .stack
                .iter()
                .position(|frame| frame.container == container && frame.id == id)
            {
                let mut path: Vec<String> = tls.stack[start..].iter().map(|frame| frame.id.clone()).collect();
                path.push(id.to_string());
                return Err(DiError::Circular(path));
            }

            if tls.stack.len() >= MAX_DEPTH {
                return Err(DiError::DepthExceeded(MAX_DEPTH));
            }

            tls.stack.push(Frame {
                container,
                id: id.to_string(),
            });
            Ok(Self { container })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let last = tls.borrow_mut().stack.pop();
            debug_assert!(last.map_or(false, |frame| frame.container == self.container));
        });
    }
}

/// Runs `f` with `(container, id)` pushed on the resolution stack.
pub(crate) fn with_circular_catch<T, F>(container: u64, id: &str, f: F) -> DiResult<T>
where
    F: FnOnce() -> DiResult<T>,
{
    let _guard = StackGuard::enter(container, id)?;
    f()
}
