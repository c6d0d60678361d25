/// Row-major block positions in scan order.
///
/// Diagonal `d` holds every position with `row + column == d`. Even diagonals
/// are visited with increasing row, odd ones with decreasing row, so the scan
/// leaves the DC position downwards.
pub fn zig_zag_ordered_block_indexes(size: usize) -> Vec<usize> {
    let mut indexes = Vec::with_capacity(size * size);
    for diagonal in 0..size.saturating_mul(2).saturating_sub(1) {
        let first_row = diagonal.saturating_sub(size - 1);
        let last_row = diagonal.min(size - 1);
        let rows = first_row..=last_row;
        let positions = rows.map(|row| row * size + (diagonal - row));
        if diagonal % 2 == 0 {
            indexes.extend(positions);
        } else {
            indexes.extend(positions.rev());
        }
    }
    indexes
}

/// A square block of transform coefficients in row-major order
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyBlock<T> {
    data: Vec<T>,
}

impl<T: Copy + Default> FrequencyBlock<T> {
    pub fn new(size: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), size * size);
        Self { data }
    }

    /// Inverse of [`FrequencyBlock::iter_zig_zag`]
    pub fn from_zig_zag(size: usize, scanned: &[T], order: &[usize]) -> Self {
        let mut data = vec![T::default(); size * size];
        for (&block_index, &value) in order.iter().zip(scanned) {
            data[block_index] = value;
        }
        Self { data }
    }

    pub fn iter_zig_zag<'a>(&'a self, order: &'a [usize]) -> impl Iterator<Item = T> + 'a {
        order.iter().map(|&block_index| self.data[block_index])
    }

    pub fn dc(&self) -> T {
        self.data[0]
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}
