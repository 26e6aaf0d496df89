//! Append-only growable buffers.
//!
//! [`GrowableBuffer`] tracks its own logical capacity so growth always follows
//! the same schedule: an empty buffer jumps to [`INITIAL_CAPACITY`] slots and
//! every later growth multiplies by [`CAPACITY_MULTIPLIER`]. Storage is freed
//! either explicitly through [`GrowableBuffer::release`] or when the buffer is
//! dropped, so every exit path of the owning scope gives the allocation back.
use std::{ffi::CString, fmt, ops::Deref};

/// Number of slots allocated by the first growth of an empty buffer.
pub const INITIAL_CAPACITY: usize = 4;

/// Factor applied to the capacity whenever an append would overflow it.
pub const CAPACITY_MULTIPLIER: usize = 2;

/// Contiguous, heap-allocated, append-only array.
#[derive(Clone, PartialEq, Eq)]
pub struct GrowableBuffer<T> {
    data: Vec<T>,
    capacity: usize,
}

impl<T> GrowableBuffer<T> {
    /// Creates an empty buffer without allocating.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
        }
    }

    /// Number of elements in use.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when no element has been appended.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of allocated slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a single element, growing the storage when it is full.
    pub fn append(&mut self, value: T) {
        self.reserve_for(1);
        self.data.push(value);
    }

    /// Resets the element count to zero while keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Frees the backing storage. The buffer stays usable and starts over
    /// from an empty, unallocated state.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.capacity = 0;
    }

    /// Borrows the elements in use.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Makes room for `additional` more elements in a single growth pass.
    fn reserve_for(&mut self, additional: usize) {
        let required = self.data.len() + additional;
        if required <= self.capacity {
            return;
        }

        let mut capacity = self.capacity.max(INITIAL_CAPACITY);
        while capacity < required {
            capacity *= CAPACITY_MULTIPLIER;
        }

        self.data.reserve_exact(capacity - self.data.len());
        self.capacity = capacity;
    }
}

impl<T: Clone> GrowableBuffer<T> {
    /// Appends `values` in order after growing at most once.
    pub fn append_many(&mut self, values: &[T]) {
        self.reserve_for(values.len());
        self.data.extend_from_slice(values);
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for GrowableBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> Extend<T> for GrowableBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.append(value);
        }
    }
}

impl<T> FromIterator<T> for GrowableBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = Self::new();
        buffer.extend(iter);
        buffer
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrowableBuffer")
            .field("count", &self.data.len())
            .field("capacity", &self.capacity)
            .field("data", &self.data)
            .finish()
    }
}

/// Growable buffer of UTF-8 text built from whole string fragments.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StringBuffer {
    bytes: GrowableBuffer<u8>,
}

impl StringBuffer {
    /// Creates an empty string buffer.
    pub const fn new() -> Self {
        Self {
            bytes: GrowableBuffer::new(),
        }
    }

    /// Appends every fragment in order.
    pub fn append(&mut self, fragments: &[&str]) {
        for fragment in fragments {
            self.bytes.append_many(fragment.as_bytes());
        }
    }

    /// Printable length in bytes. Never counts a terminator.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of allocated bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Borrows the text appended so far.
    pub fn as_str(&self) -> &str {
        // Bytes only ever come from whole `&str` fragments.
        std::str::from_utf8(self.bytes.as_slice()).unwrap_or_default()
    }

    /// Returns a NUL-terminated copy of the text.
    ///
    /// Fails when one of the appended fragments contained an interior NUL.
    pub fn to_terminated(&self) -> Result<CString, std::ffi::NulError> {
        CString::new(self.bytes.as_slice())
    }

    /// Frees the backing storage.
    pub fn release(&mut self) {
        self.bytes.release();
    }
}

impl fmt::Display for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
