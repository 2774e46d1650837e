//! Grow-and-retry enumeration
//!
//! Several OS listing calls fill a caller-sized buffer and report how many
//! entries they had, truncating silently when the buffer is too small. This
//! helper keeps the retry loop out of the catalog-merge logic: it re-queries
//! with a doubled buffer until the reported count confirms the buffer held
//! the full set.

/// First buffer size used for OS enumeration calls.
pub const INITIAL_CAPACITY: usize = 1024;

/// Query `fill` with a growing buffer until the result fits.
///
/// `fill` writes up to `buf.len()` entries and returns the total number of
/// entries the OS has. A report equal to the buffer length may mean
/// truncation, so only a strictly smaller report terminates the loop.
pub fn retry_with_growth<T, E, F>(initial: usize, mut fill: F) -> Result<Vec<T>, E>
where
    T: Default + Clone,
    F: FnMut(&mut [T]) -> Result<usize, E>,
{
    let mut buf: Vec<T> = vec![T::default(); initial.max(1)];
    loop {
        let available = fill(&mut buf)?;
        if available < buf.len() {
            buf.truncate(available);
            return Ok(buf);
        }
        let doubled = buf.len() * 2;
        buf.resize(doubled, T::default());
    }
}
