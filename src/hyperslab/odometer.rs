//! Row-major enumeration of the coordinates inside a hyperslab.

/// Index vector over the box `start .. start + count`.
///
/// The last axis varies fastest. `increment` advances the innermost axis and
/// carries into more significant axes when an axis wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Odometer {
    start: Vec<usize>,
    end: Vec<usize>,
    current: Vec<usize>,
    exhausted: bool,
}

impl Odometer {
    /// `start` and `count` must have equal length. A zero count on any axis
    /// produces an empty odometer.
    pub fn new(start: &[usize], count: &[usize]) -> Self {
        debug_assert_eq!(start.len(), count.len());
        let end = start.iter().zip(count).map(|(s, c)| s + c).collect();
        Self {
            start: start.to_vec(),
            end,
            current: start.to_vec(),
            exhausted: count.iter().any(|c| *c == 0),
        }
    }

    pub fn current(&self) -> &[usize] {
        &self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of coordinates in the box.
    pub fn total(&self) -> usize {
        self.start
            .iter()
            .zip(&self.end)
            .map(|(s, e)| e - s)
            .product()
    }

    /// Advance to the next coordinate. Returns false once the carry runs past
    /// the outermost axis.
    pub fn increment(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        for axis in (0..self.current.len()).rev() {
            self.current[axis] += 1;
            if self.current[axis] < self.end[axis] {
                return true;
            }
            self.current[axis] = self.start[axis];
        }
        self.exhausted = true;
        false
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.current.clone();
        self.increment();
        Some(item)
    }
}
