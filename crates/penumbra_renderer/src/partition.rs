//! Row-band partitioning of the image across workers.
//!
//! Every worker gets one contiguous band of output rows. Bands are laid out
//! top to bottom in rank order and together cover the image exactly once.
//! When the height does not divide evenly, the first `height % workers`
//! ranks take one extra row each.

use std::ops::Range;

/// A contiguous, half-open range of output rows `[start, end)`.
///
/// Output row 0 is the top of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowBand {
    /// First row of the band
    pub start: u32,
    /// One past the last row of the band
    pub end: u32,
}

impl RowBand {
    /// Create a new band. `start` must not exceed `end`.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "band start {start} is past its end {end}");
        Self { start, end }
    }

    /// Band covering the whole image.
    pub fn full(height: u32) -> Self {
        Self::new(0, height)
    }

    /// Band owned by `rank` out of `workers`.
    ///
    /// Panics if `workers` is zero or `rank >= workers`.
    pub fn for_rank(height: u32, workers: usize, rank: usize) -> Self {
        assert!(rank < workers, "rank {rank} out of range for {workers} workers");

        let height = height as u64;
        let workers = workers as u64;
        let rank = rank as u64;

        let base = height / workers;
        let extra = height % workers;
        let start = rank * base + rank.min(extra);
        let len = base + u64::from(rank < extra);

        // start + len <= height, which came from a u32
        Self::new(start as u32, (start + len) as u32)
    }

    /// Number of rows in the band.
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Iterate over the rows of the band.
    pub fn rows(&self) -> Range<u32> {
        self.start..self.end
    }

    /// True if `row` belongs to this band.
    pub fn contains(&self, row: u32) -> bool {
        self.start <= row && row < self.end
    }
}

/// Split `height` rows into one band per worker, in rank order.
///
/// Panics if `workers` is zero.
pub fn partition_rows(height: u32, workers: usize) -> Vec<RowBand> {
    (0..workers)
        .map(|rank| RowBand::for_rank(height, workers, rank))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_exact_fit() {
        let bands = partition_rows(512, 4);
        assert_eq!(
            bands,
            vec![
                RowBand::new(0, 128),
                RowBand::new(128, 256),
                RowBand::new(256, 384),
                RowBand::new(384, 512),
            ]
        );
    }

    #[test]
    fn test_partition_remainder_goes_to_first_ranks() {
        let bands = partition_rows(10, 4);
        let lens: Vec<u32> = bands.iter().map(RowBand::len).collect();
        assert_eq!(lens, vec![3, 3, 2, 2]);
        assert_eq!(bands[3], RowBand::new(8, 10));
    }

    #[test]
    fn test_more_workers_than_rows() {
        let bands = partition_rows(3, 5);
        let lens: Vec<u32> = bands.iter().map(RowBand::len).collect();
        assert_eq!(lens, vec![1, 1, 1, 0, 0]);
        assert!(bands[4].is_empty());
        assert_eq!(bands[4].start, 3);
    }

    #[test]
    fn test_partition_covers_every_row_once() {
        for height in 0..70u32 {
            for workers in 1..17usize {
                let bands = partition_rows(height, workers);
                assert_eq!(bands.len(), workers);

                let mut seen = vec![0u32; height as usize];
                for band in &bands {
                    for row in band.rows() {
                        seen[row as usize] += 1;
                    }
                }
                assert!(
                    seen.iter().all(|&count| count == 1),
                    "height={height} workers={workers} coverage={seen:?}"
                );

                // Contiguous and ordered
                assert_eq!(bands[0].start, 0);
                assert_eq!(bands[workers - 1].end, height);
                for pair in bands.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                }

                // Balanced to within one row
                let max = bands.iter().map(RowBand::len).max().unwrap();
                let min = bands.iter().map(RowBand::len).min().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn test_huge_height() {
        let bands = partition_rows(u32::MAX, 3);
        assert_eq!(bands[2].end, u32::MAX);
        let total: u64 = bands.iter().map(|b| b.len() as u64).sum();
        assert_eq!(total, u32::MAX as u64);
    }

    #[test]
    fn test_band_contains() {
        let band = RowBand::new(4, 8);
        assert!(band.contains(4));
        assert!(band.contains(7));
        assert!(!band.contains(8));
        assert!(!band.contains(3));
    }

    #[test]
    #[should_panic]
    fn test_rank_out_of_range() {
        RowBand::for_rank(10, 2, 2);
    }
}
