//! Histogram used as the basis for counting discrete observations, such as
//! the character codes seen on FASTQ quality lines.
//!
//! # Overview
//!
//! The histogram follows two simple rules:
//!
//! 1. Only discrete numbers are considered as bins. In other words, bins
//!    represent values in the range of `[0, 1, 2, 3, ..., n]`.
//! 2. The range of numerical values always starts at zero and ends at the
//!    capacity specified in the constructor.
//!
//! # Usage
//!
//! ```
//! use readprep::utils::histogram::Histogram;
//! let mut hist = Histogram::zero_based_with_capacity(10);
//!
//! // Increments the zero bin by one.
//! let result = hist.increment(0);
//! assert!(result.is_ok());
//!
//! // Increments the one bin by fourty-two.
//! let result = hist.increment_by(1, 42);
//! assert!(result.is_ok());
//!
//! // Ensure that we actually recorded these values.
//! assert_eq!(hist.get(0), 1);
//! assert_eq!(hist.get(1), 42);
//! assert_eq!(hist.max_observed(), Some(1));
//! ```
//!
//! Incrementing a bin that falls outside the range of the [`Histogram`]
//! returns a [`BinOutOfBoundsError`].
//!
//! ```
//! use readprep::utils::histogram::Histogram;
//! use readprep::utils::histogram::BinOutOfBoundsError;
//! let mut hist = Histogram::zero_based_with_capacity(10);
//!
//! let result = hist.increment(11);
//! assert_eq!(result.unwrap_err(), BinOutOfBoundsError);
//! ```

use serde::{Deserialize, Serialize};

/// Histogram of discrete observations. For more in depth information, please
/// see the [module-level documentation].
///
/// [module-level documentation]: self
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Histogram {
    // Vec-backed value store for the histogram.
    values: Vec<usize>,
    // Ending range for the histogram.
    range_stop: usize,
}

/// An error that occurs if we try to increment a bin of the histogram that is
/// out-of-bounds for that histogram.
#[derive(Debug, PartialEq, Eq)]
pub struct BinOutOfBoundsError;

impl Histogram {
    //=================//
    // Initializations //
    //=================//

    /// Creates a zero-based histogram with a given capacity.
    pub fn zero_based_with_capacity(capacity: usize) -> Self {
        Self {
            values: vec![0; capacity + 1],
            range_stop: capacity,
        }
    }

    /// Creates a histogram with one bin for every possible byte value.
    pub fn for_bytes() -> Self {
        Self::zero_based_with_capacity(u8::MAX as usize)
    }

    //=================================//
    // Getting and incrementing values //
    //=================================//

    /// Increments a particular bin in the histogram by one.
    pub fn increment(&mut self, bin: usize) -> Result<(), BinOutOfBoundsError> {
        self.increment_by(bin, 1)
    }

    /// Increments a particular bin in the histogram by the specified value.
    pub fn increment_by(&mut self, bin: usize, value: usize) -> Result<(), BinOutOfBoundsError> {
        if bin > self.range_stop {
            return Err(BinOutOfBoundsError);
        }

        self.values[bin] += value;
        Ok(())
    }

    /// Gets a value for a bin within a histogram. Bins outside of the range
    /// hold nothing.
    pub fn get(&self, bin: usize) -> usize {
        self.values.get(bin).copied().unwrap_or_default()
    }

    /// Simply returns the values in the distribution by ref.
    pub fn values(&self) -> &[usize] {
        self.values.as_ref()
    }

    /// Gives the stopping position for the range of the histogram.
    pub fn range_stop(&self) -> usize {
        self.range_stop
    }

    //========================//
    // Numerical computations //
    //========================//

    /// Computes the sum of the values within the distribution.
    pub fn sum(&self) -> usize {
        self.values.iter().sum()
    }

    /// The lowest bin with a non-zero count, if any.
    pub fn min_observed(&self) -> Option<usize> {
        self.values.iter().position(|count| *count > 0)
    }

    /// The highest bin with a non-zero count, if any.
    pub fn max_observed(&self) -> Option<usize> {
        self.values.iter().rposition(|count| *count > 0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::for_bytes()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    pub fn test_initialization() {
        let s = Histogram::zero_based_with_capacity(100);
        assert_eq!(s.range_stop(), 100);
        assert_eq!(s.values().len(), 101);
        assert_eq!(s.sum(), 0);
    }

    #[test]
    pub fn test_valid_incremements() {
        let mut s = Histogram::zero_based_with_capacity(100);
        s.increment(25).unwrap();
        s.increment(50).unwrap();
        s.increment_by(75, 3).unwrap();
        s.increment_by(100, 5).unwrap();

        assert_eq!(s.get(25), 1);
        assert_eq!(s.get(50), 1);
        assert_eq!(s.get(75), 3);
        assert_eq!(s.get(100), 5);
        assert_eq!(s.get(1000), 0);
        assert_eq!(s.sum(), 10);
    }

    #[test]
    pub fn test_invalid_increments() {
        let mut s = Histogram::zero_based_with_capacity(100);
        assert_eq!(s.increment(101).unwrap_err(), BinOutOfBoundsError);
    }

    #[test]
    pub fn test_observed_bounds() {
        let mut s = Histogram::for_bytes();
        assert_eq!(s.min_observed(), None);
        assert_eq!(s.max_observed(), None);

        s.increment(b'#' as usize).unwrap();
        s.increment_by(b'J' as usize, 10).unwrap();
        assert_eq!(s.min_observed(), Some(35));
        assert_eq!(s.max_observed(), Some(74));

        s.increment(255).unwrap();
        assert_eq!(s.max_observed(), Some(255));
    }

    #[test]
    pub fn test_default_covers_every_byte() {
        let default = Histogram::default();
        assert_eq!(default.range_stop(), 255);
        assert_eq!(default.values().len(), 256);
    }
}
