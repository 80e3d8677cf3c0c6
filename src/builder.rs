use std::{
    ffi::CStr,
    fmt::{self, Write},
};

use ecow::EcoVec;

/// Capacity of a builder on first use.
pub const INITIAL_CAPACITY: usize = 255;

/// A growable byte string that can hand out a NUL-terminated view.
///
/// The builder starts out without storage and allocates on first use. Once
/// initialized, the buffer always ends with a single NUL byte that is not
/// part of the contents.
#[derive(Clone, Debug, Default)]
pub struct StringBuilder {
    buf: EcoVec<u8>,
}

impl StringBuilder {
    pub fn new() -> StringBuilder {
        StringBuilder { buf: EcoVec::new() }
    }

    fn init(&mut self) {
        if self.buf.is_empty() {
            self.buf = EcoVec::with_capacity(INITIAL_CAPACITY);
            self.buf.push(0);
        }
    }

    pub fn append_char(&mut self, c: u8) {
        self.init();
        if self.buf.len() >= self.buf.capacity() {
            let additional = self.buf.capacity().max(1);
            self.buf.reserve(additional);
        }
        let last = self.buf.len() - 1;
        self.buf.make_mut()[last] = c;
        self.buf.push(0);
    }

    /// Appends formatted text. The output is measured first so the buffer
    /// grows at most once before the bytes are copied in.
    pub fn append(&mut self, args: fmt::Arguments<'_>) {
        let mut measure = Measure(0);
        if measure.write_fmt(args).is_err() {
            return;
        }
        self.init();
        let needed = self.buf.len() + measure.0;
        if needed > self.buf.capacity() {
            let additional = (needed - self.buf.len()).max(self.buf.capacity());
            self.buf.reserve(additional);
        }
        // Writing into the builder itself cannot fail.
        let _ = self.write_fmt(args);
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self.buf.split_last() {
            Some((_, contents)) => contents,
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// A NUL-terminated view of the contents. A builder that was never
    /// written to is initialized to an empty string.
    ///
    /// Contents holding an interior NUL are cut short at it.
    pub fn to_view(&mut self) -> &CStr {
        self.init();
        CStr::from_bytes_until_nul(&self.buf).unwrap_or_default()
    }

    /// Drops the storage. The builder stays usable and reallocates lazily.
    pub fn release(&mut self) {
        self.buf = EcoVec::new();
    }
}

impl Write for StringBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.append_char(byte);
        }
        Ok(())
    }
}

struct Measure(usize);

impl Write for Measure {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}
