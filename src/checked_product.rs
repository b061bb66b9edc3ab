//! Overflow-checked product of an iterator of integers.

use num_traits::{CheckedMul, One};

/// Iterator extension for multiplying items together with overflow checking.
pub trait CheckedProduct<T> {
    /// Multiplies every item, returning `None` on overflow. An empty iterator yields one.
    fn checked_product(self) -> Option<T>;
}

impl<T, I> CheckedProduct<T> for I
where
    T: CheckedMul + One,
    I: Iterator<Item = T>,
{
    fn checked_product(mut self) -> Option<T> {
        self.try_fold(T::one(), |acc, value| acc.checked_mul(&value))
    }
}
