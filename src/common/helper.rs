//! Helper utilities and common functions

/// Helper function to align values to a boundary
pub fn align_value(value: usize, alignment: usize) -> usize {
    (value + alignment - 1) & !(alignment - 1)
}

/// Helper function to check if a value is aligned
pub fn is_aligned(value: usize, alignment: usize) -> bool {
    value & (alignment - 1) == 0
}

/// Helper function to get the next power of two
pub fn next_power_of_two(mut n: usize) -> usize {
    if n <= 1 {
        return 1;
    }

    n -= 1;
    n |= n >> 1;
    n |= n >> 2;
    n |= n >> 4;
    n |= n >> 8;
    n |= n >> 16;
    n |= n >> 32;
    n + 1
}

/// `keep_percent` percent of `len`, rounded down, without overflowing
pub fn percent_of(len: usize, keep_percent: usize) -> usize {
    if len > usize::MAX / 100 {
        (len / 100) * keep_percent
    } else {
        (len * keep_percent) / 100
    }
}
