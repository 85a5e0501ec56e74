//! Reusable scratch buffers.
//!
//! Cross-format compositing converts the whole source region into the
//! destination format before blending, and bulk conversion stages profile
//! floats for the transform engine. A [`ScratchArena`] keeps one byte
//! buffer and one float buffer between calls and hands them out through a
//! guard, so the memory is returned when the guard drops. A caller that
//! finds a buffer busy gets a private one instead of waiting.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, TryLockError};

/// Growable byte and float buffers handed out one borrower at a time.
#[derive(Debug, Default)]
pub struct ScratchArena {
    bytes: Mutex<Vec<u8>>,
    floats: Mutex<Vec<f32>>,
}

impl ScratchArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows `len` zeroed bytes.
    ///
    /// Grows the shared buffer when needed. If another borrower holds it, a
    /// fresh buffer is allocated for this guard only.
    pub fn acquire(&self, len: usize) -> ScratchGuard<'_> {
        borrow(&self.bytes, len)
    }

    /// Borrows `len` zeroed floats. Same sharing rules as [`acquire`](Self::acquire).
    pub fn acquire_floats(&self, len: usize) -> ScratchGuard<'_, f32> {
        borrow(&self.floats, len)
    }

    /// Current capacity of the shared byte buffer.
    pub fn capacity(&self) -> usize {
        len_of(&self.bytes)
    }

    /// Current capacity of the shared float buffer, in floats.
    pub fn float_capacity(&self) -> usize {
        len_of(&self.floats)
    }
}

fn borrow<T: Copy + Default>(buf: &Mutex<Vec<T>>, len: usize) -> ScratchGuard<'_, T> {
    let inner = match buf.try_lock() {
        Ok(guard) => Inner::Shared(guard),
        Err(TryLockError::Poisoned(p)) => Inner::Shared(p.into_inner()),
        Err(TryLockError::WouldBlock) => Inner::Owned(Vec::new()),
    };
    let mut guard = ScratchGuard { inner, len };
    let v = guard.vec_mut();
    if v.len() < len {
        v.resize(len, T::default());
    }
    v[..len].fill(T::default());
    guard
}

fn len_of<T>(buf: &Mutex<Vec<T>>) -> usize {
    match buf.lock() {
        Ok(b) => b.len(),
        Err(p) => p.into_inner().len(),
    }
}

enum Inner<'a, T> {
    Shared(MutexGuard<'a, Vec<T>>),
    Owned(Vec<T>),
}

/// Scoped access to scratch memory. Derefs to exactly the requested length.
pub struct ScratchGuard<'a, T = u8> {
    inner: Inner<'a, T>,
    len: usize,
}

impl<T> ScratchGuard<'_, T> {
    fn vec_mut(&mut self) -> &mut Vec<T> {
        match &mut self.inner {
            Inner::Shared(g) => &mut **g,
            Inner::Owned(v) => v,
        }
    }

    /// Returns `true` if this guard borrowed the arena's shared buffer.
    pub fn is_shared(&self) -> bool {
        matches!(self.inner, Inner::Shared(_))
    }
}

impl<T> Deref for ScratchGuard<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match &self.inner {
            Inner::Shared(g) => &g[..self.len],
            Inner::Owned(v) => &v[..self.len],
        }
    }
}

impl<T> DerefMut for ScratchGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        let len = self.len;
        &mut self.vec_mut()[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_and_reuses() {
        let arena = ScratchArena::new();
        {
            let mut g = arena.acquire(16);
            assert_eq!(g.len(), 16);
            g[3] = 9;
            assert!(g.is_shared());
        }
        assert_eq!(arena.capacity(), 16);
        {
            let g = arena.acquire(8);
            assert_eq!(g.len(), 8);
            assert!(g.iter().all(|&b| b == 0));
        }
        assert_eq!(arena.capacity(), 16);
    }

    #[test]
    fn test_contended_gets_private_buffer() {
        let arena = ScratchArena::new();
        let first = arena.acquire(4);
        let second = arena.acquire(32);
        assert!(first.is_shared());
        assert!(!second.is_shared());
        assert_eq!(second.len(), 32);
    }

    #[test]
    fn test_float_buffer_is_separate() {
        let arena = ScratchArena::new();
        let bytes = arena.acquire(4);
        let mut floats = arena.acquire_floats(6);
        assert!(bytes.is_shared());
        assert!(floats.is_shared());
        floats[5] = 0.5;
        drop(floats);
        drop(bytes);
        assert_eq!(arena.float_capacity(), 6);
        let floats = arena.acquire_floats(3);
        assert!(floats.iter().all(|&v| v == 0.0));
        assert_eq!(arena.capacity(), 4);
    }
}
