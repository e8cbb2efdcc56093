//! Counter modules.

/// Circular pointer.
///
/// The bound is a live signal rather than a type parameter, so a counter sized for the largest
/// configuration can cycle through a smaller one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WrapCounter {
    value: usize,
}

impl WrapCounter {
    /// Creates a counter at `value`.
    pub fn new(value: usize) -> Self { Self { value } }

    /// Returns the current value.
    pub fn value(self) -> usize { self.value }

    /// Returns the pair of the next counter and whether it wrapped around `bound`.
    ///
    /// A bound of zero behaves like a bound of one.
    pub fn next(self, bound: usize) -> (Self, bool) {
        let value = self.value + 1;
        if value >= bound {
            (Self::new(0), true)
        } else {
            (Self::new(value), false)
        }
    }

    /// Returns the next counter if `enable`, itself otherwise.
    pub fn next_if(self, enable: bool, bound: usize) -> (Self, bool) {
        if enable {
            self.next(bound)
        } else {
            (self, false)
        }
    }
}
