//! Row-parallel execution with a sequential fallback.
//!
//! With the `parallel` feature rows are spread over the rayon pool; without
//! it (e.g. for single-threaded embedders) the same closure runs row by row
//! on the calling thread. Results come back in row order either way.

/// Map every row of `0..rows` to a batch of items and concatenate the
/// batches in row order.
pub(crate) fn flat_map_rows<T, F>(rows: usize, per_row: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> Vec<T> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        (0..rows).into_par_iter().flat_map_iter(per_row).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..rows).flat_map(per_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_stay_in_order() {
        let items = flat_map_rows(50, |row| vec![row * 10, row * 10 + 1]);
        assert_eq!(items.len(), 100);
        assert!(items.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_rows() {
        let items: Vec<usize> = flat_map_rows(0, |row| vec![row]);
        assert!(items.is_empty());
        let items: Vec<usize> = flat_map_rows(3, |_| Vec::new());
        assert!(items.is_empty());
    }
}
