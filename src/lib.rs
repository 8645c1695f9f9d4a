pub mod csg;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod halfedge;
pub mod kernel;
pub mod math;
pub mod registry;
pub mod sync;

pub use domain::Domain;
pub use error::{FvError, Result};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static KERNEL_LOCK: Mutex<()> = Mutex::new(());

    /// Serialises tests that acquire the process-wide discretization kernel.
    pub(crate) fn serial() -> MutexGuard<'static, ()> {
        KERNEL_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
