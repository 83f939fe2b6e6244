//! In-process stores implementing the repository ports.
//!
//! Each conditional operation runs under one lock: the book's own mutex for
//! counters, the map's mutex for rentals. That matches the atomicity the SQL
//! adapters get from single-statement guarded updates.

mod book_store;
mod rental_store;

pub use book_store::InMemoryBookStore;
pub use rental_store::InMemoryRentalStore;

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
