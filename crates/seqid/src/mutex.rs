#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, RwLock};
#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Mutex, RwLock};

/// Acquires a lock, mapping poisoning into [`crate::Error::LockPoisoned`].
#[cfg(not(feature = "parking-lot"))]
macro_rules! acquire {
    ($lock:expr, $method:ident) => {
        $lock.$method()?
    };
}

/// Acquires a lock. `parking_lot` locks do not poison, so this is
/// infallible.
#[cfg(feature = "parking-lot")]
macro_rules! acquire {
    ($lock:expr, $method:ident) => {
        $lock.$method()
    };
}

pub(crate) use acquire;
