//! A fixed-size bitboard implementation using const generics.
//!
//! Boards are represented as an `N×N` grid packed into an unsigned integer `T`
//! and addressed by row-major cell index. The placement validator uses them to
//! build ship masks and the ring of cells around them.

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};
use num_traits::{PrimInt, Unsigned, Zero};
use thiserror::Error;

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitBoardError {
    /// Cell index is outside `[0, N*N)`.
    #[error("cell index {index} is out of bounds")]
    IndexOutOfBounds { index: usize },
}

/// A fixed-size N×N bitboard stored in the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    /// Number of usable bits in the board (`N * N`).
    const BOARD_BITS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::BOARD_BITS == T::zero().count_zeros() as usize {
            !T::zero()
        } else {
            (T::one() << Self::BOARD_BITS) - T::one()
        }
    }

    /// Every cell except the ones in column `col`.
    fn without_column(col: usize) -> T {
        let mut bits = T::zero();
        for row in 0..N {
            bits = bits | (T::one() << (row * N + col));
        }
        !bits & Self::mask()
    }

    /// Create a new empty bitboard.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns true if no bits are set.
    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// Gets the bit at `index`.
    pub fn get(&self, index: usize) -> Result<bool, BitBoardError> {
        Self::check_bounds(index)?;
        Ok(((self.bits >> index) & T::one()) != T::zero())
    }

    /// Sets the bit at `index`.
    pub fn set(&mut self, index: usize) -> Result<(), BitBoardError> {
        Self::check_bounds(index)?;
        self.bits = self.bits | (T::one() << index);
        Ok(())
    }

    #[inline]
    fn check_bounds(index: usize) -> Result<(), BitBoardError> {
        if index >= Self::BOARD_BITS {
            Err(BitBoardError::IndexOutOfBounds { index })
        } else {
            Ok(())
        }
    }

    /// Creates a bitboard from an iterator over cell indices.
    pub fn from_indices<I>(iter: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut board = Self::new();
        for index in iter {
            board.set(index)?;
        }
        Ok(board)
    }

    /// This board grown by one step in all eight directions. Set bits never
    /// wrap from one row into the next.
    pub fn dilate(&self) -> Self {
        let b = self.bits;
        let horizontal = b
            | ((b << 1) & Self::without_column(0))
            | ((b >> 1) & Self::without_column(N - 1));
        let grown = horizontal | (horizontal << N) | (horizontal >> N);
        BitBoard {
            bits: grown & Self::mask(),
        }
    }

    /// Iterator over the indices of the set bits.
    #[inline]
    pub fn iter_set_bits(&self) -> SetBits<'_, T, N> {
        SetBits {
            board: self,
            idx: 0,
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", N)?;
        for r in 0..N {
            for c in 0..N {
                let bit = if ((self.bits >> (r * N + c)) & T::one()) != T::zero() {
                    '■'
                } else {
                    '□'
                };
                write!(f, "{} ", bit)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the set bits of a bitboard.
#[derive(Clone, Copy)]
pub struct SetBits<'a, T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    board: &'a BitBoard<T, N>,
    idx: usize,
}

impl<'a, T, const N: usize> Iterator for SetBits<'a, T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = usize;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if ((self.board.bits >> idx) & T::one()) != T::zero() {
                return Some(idx);
            }
        }
        None
    }
}

impl<T, const N: usize> BitAnd for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits & rhs.bits,
        }
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits | rhs.bits,
        }
    }
}

impl<T, const N: usize> BitOrAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

/// Inverts a bitboard within board bounds.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        BitBoard {
            bits: !self.bits & Self::mask(),
        }
    }
}
