use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Byte budget shared by all decoded messages.
///
/// Messages reserve their size up front and give it back when the last reference is dropped.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    capacity: usize,
    used: AtomicUsize,
}

impl Pool {
    /// Creates pool able to hold `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Pool {
            inner: Arc::new(PoolInner {
                capacity,
                used: AtomicUsize::new(0),
            }),
        }
    }

    /// Reserves `size` bytes, or returns `None` if that would exceed the capacity.
    pub fn try_reserve(&self, size: usize) -> Option<PoolReservation> {
        let mut used = self.inner.used.load(Ordering::Relaxed);
        loop {
            let new_used = used.checked_add(size).filter(|&u| u <= self.inner.capacity)?;
            match self
                .inner
                .used
                .compare_exchange_weak(used, new_used, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => {
                    return Some(PoolReservation {
                        pool: Arc::clone(&self.inner),
                        size,
                    })
                }
                Err(current) => used = current,
            }
        }
    }

    /// Returns number of bytes currently reserved.
    pub fn used(&self) -> usize {
        self.inner.used.load(Ordering::Acquire)
    }

    /// Returns the pool size in bytes.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pool {{ used: {}, capacity: {} }}", self.used(), self.capacity())
    }
}

/// Bytes held in a [`Pool`], released on drop.
pub struct PoolReservation {
    pool: Arc<PoolInner>,
    size: usize,
}

impl PoolReservation {
    /// Returns number of reserved bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for PoolReservation {
    fn drop(&mut self) {
        self.pool.used.fetch_sub(self.size, Ordering::AcqRel);
    }
}

impl fmt::Debug for PoolReservation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PoolReservation {{ size: {} }}", self.size)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserve_and_release() {
        let pool = Pool::new(100);
        let first = pool.try_reserve(60).unwrap();
        assert_eq!(pool.used(), 60);
        assert!(pool.try_reserve(41).is_none());

        let second = pool.try_reserve(40).unwrap();
        assert_eq!(pool.used(), 100);
        assert!(pool.try_reserve(1).is_none());

        drop(first);
        assert_eq!(pool.used(), 40);
        drop(second);
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn zero_sized_reservation_fits_full_pool() {
        let pool = Pool::new(1);
        let _full = pool.try_reserve(1).unwrap();
        assert!(pool.try_reserve(0).is_some());
    }

    #[test]
    fn overflowing_request_is_rejected() {
        let pool = Pool::new(usize::max_value());
        let _some = pool.try_reserve(10).unwrap();
        assert!(pool.try_reserve(usize::max_value()).is_none());
    }

    #[test]
    fn concurrent_reservations_never_exceed_capacity() {
        let pool = Pool::new(1000);
        let handles = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || (0..100).filter_map(|_| pool.try_reserve(7)).collect::<Vec<_>>())
            })
            .collect::<Vec<_>>();
        let reservations = handles.into_iter().flat_map(|h| h.join().unwrap()).collect::<Vec<_>>();

        assert_eq!(reservations.len(), 1000 / 7);
        assert_eq!(pool.used(), reservations.len() * 7);
        drop(reservations);
        assert_eq!(pool.used(), 0);
    }
}
