use std::fmt::{self, Debug, Formatter};
use std::sync::Mutex;

/// A bounded free list of reusable objects.
///
/// [`acquire`](Pool::acquire) pops an idle object or, on a miss, builds a new
/// one with the factory; it never waits. [`release`](Pool::release) keeps the
/// object only while fewer than `capacity` are idle, so a pool with capacity
/// `0` simply allocates every time.
pub struct Pool<T> {
    idle: Mutex<Vec<T>>,
    capacity: usize,
    factory: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Pool<T> {
    pub fn new<F>(capacity: usize, factory: F) -> Pool<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Pool {
            idle: Mutex::new(Vec::new()),
            capacity,
            factory: Box::new(factory),
        }
    }

    pub fn acquire(&self) -> T {
        let reused = match self.idle.lock() {
            Ok(mut idle) => idle.pop(),
            Err(poisoned) => poisoned.into_inner().pop(),
        };
        reused.unwrap_or_else(|| (self.factory)())
    }

    /// Returns `item` to the pool. Callers reset it first.
    pub fn release(&self, item: T) {
        let mut idle = match self.idle.lock() {
            Ok(idle) => idle,
            Err(poisoned) => poisoned.into_inner(),
        };
        if idle.len() < self.capacity {
            idle.push(item);
        }
    }

    /// Number of objects currently waiting for reuse.
    pub fn idle(&self) -> usize {
        match self.idle.lock() {
            Ok(idle) => idle.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Debug for Pool<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ idle: {}, capacity: {} }}", self.idle(), self.capacity)
    }
}
