//! Address in the inspected process.

use std::fmt;
use std::ops::Add;

/// Strongly typed address in the inspected address space
///
/// Keeps addresses apart from sizes, counts and offsets, which are all plain
/// `u64` as well. Arithmetic wraps: a corrupt pointer must surface as a failed
/// read, not as a panic in the inspector.
///
/// ## Example
///
/// ```rust
/// use usedsize_core::types::Address;
///
/// let node = Address::from(0x1000);
/// assert_eq!((node + 0x20).value(), 0x1020);
/// assert!(Address::NULL.is_null());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const NULL: Self = Address(0);

    /// Create a new address from a `u64` value, usable in const contexts.
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw `u64` value of this address.
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address.
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset, returning `None` on overflow.
    ///
    /// ```rust
    /// use usedsize_core::types::Address;
    ///
    /// assert_eq!(Address::from(0x1000).checked_add(0x10), Some(Address::from(0x1010)));
    /// assert_eq!(Address::from(u64::MAX).checked_add(1), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Distance in bytes from `start` to `self`, or `None` if `self` lies below `start`.
    pub fn distance_from(self, start: Address) -> Option<u64>
    {
        self.0.checked_sub(start.0)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
