//! Ambient resolver context
//!
//! Code started by the bootstrap finds the resolver it was loaded through
//! here, the same way a thread's context is consulted for anything it did
//! not receive explicitly. The slot is per thread and written once by the
//! bootstrap before the entry point runs.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::debug;

use crate::resolver::UnitResolver;

thread_local! {
    static CONTEXT_RESOLVER: RefCell<Option<Arc<dyn UnitResolver>>> = const { RefCell::new(None) };
}

/// Install `resolver` as the ambient resolver, returning the previous one
pub fn set_context_resolver(resolver: Arc<dyn UnitResolver>) -> Option<Arc<dyn UnitResolver>> {
    debug!("installing context resolver {}", resolver.name());
    CONTEXT_RESOLVER.with(|slot| slot.borrow_mut().replace(resolver))
}

/// The ambient resolver of the current thread, if one was installed
pub fn context_resolver() -> Option<Arc<dyn UnitResolver>> {
    CONTEXT_RESOLVER.with(|slot| slot.borrow().clone())
}

/// Remove the ambient resolver of the current thread
pub fn clear_context_resolver() -> Option<Arc<dyn UnitResolver>> {
    CONTEXT_RESOLVER.with(|slot| slot.borrow_mut().take())
}
