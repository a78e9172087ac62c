//! Extension points for user-supplied mutation logic.
//!
//! Both hooks are trusted: the dispatcher only checks that their result fits
//! the declared capacity and panics otherwise.

/// Replaces the built-in strategies entirely when installed.
pub trait CustomMutator {
    /// Mutates `data[..size]` in place and returns the new size.
    ///
    /// `data` is exactly `max_size` bytes long. Returning `0` means the hook
    /// could not mutate this input.
    fn mutate(&mut self, data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize;
}

impl<F> CustomMutator for F
where
    F: FnMut(&mut [u8], usize, usize, u32) -> usize,
{
    fn mutate(&mut self, data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
        self(data, size, max_size, seed)
    }
}

/// Combines two inputs into `out`; appended to the active strategies.
pub trait CustomCrossOver {
    /// Writes the combination of `first` and `second` into `out` and returns
    /// the number of bytes written, or `0` on failure.
    fn cross_over(&mut self, first: &[u8], second: &[u8], out: &mut [u8], seed: u32) -> usize;
}

impl<F> CustomCrossOver for F
where
    F: FnMut(&[u8], &[u8], &mut [u8], u32) -> usize,
{
    fn cross_over(&mut self, first: &[u8], second: &[u8], out: &mut [u8], seed: u32) -> usize {
        self(first, second, out, seed)
    }
}
