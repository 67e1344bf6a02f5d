//! Center-square crop geometry.
//!
//! Pure integer math, kept apart from pixel work so it can be checked
//! exhaustively.

/// A centered square region inside a `width × height` source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SquareCrop {
    /// Left edge of the region.
    pub x: u32,
    /// Top edge of the region.
    pub y: u32,
    /// Edge length, equal to the shorter source edge.
    pub size: u32,
}

impl SquareCrop {
    /// Computes the largest centered square for the given dimensions.
    ///
    /// The offset on the longer axis is `(dimension - size) / 2`, rounded
    /// down, so odd leftovers favour the right/bottom edge.
    pub fn centered(width: u32, height: u32) -> Self {
        let size = width.min(height);
        Self {
            x: (width - size) / 2,
            y: (height - size) / 2,
            size,
        }
    }

    /// Returns true when the region covers the whole source.
    #[inline]
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.size == width && self.size == height
    }

    /// Returns true if the region has no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
