//! Miscellaneous utility functions.

/// Iterates over `0..count` starting at `start` and wrapping around,
/// visiting every index exactly once.
pub fn rotated_range(count: usize, start: usize) -> impl Iterator<Item = usize> {
    (0..count)
        .map(move |i| i + start)
        .map(move |i| if i >= count { i - count } else { i })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wraps_around() {
        let indices = rotated_range(5, 3).collect::<Vec<_>>();
        assert_eq!(indices, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn empty_range() {
        assert_eq!(rotated_range(0, 0).count(), 0);
    }
}
