// Tables from JPEG Annex K (vips and libjpeg default)
#[rustfmt::skip]
pub const SPECIFICATION_LUMINANCE_QUANTIZATION_TABLE: [u8; 64] =  [
    16,  11,  10,  16,  24,  40,  51,  61,
    12,  12,  14,  19,  26,  58,  60,  55,
    14,  13,  16,  24,  40,  57,  69,  56,
    14,  17,  22,  29,  51,  87,  80,  62,
    18,  22,  37,  56,  68, 109, 103,  77,
    24,  35,  55,  64,  81, 104, 113,  92,
    49,  64,  78,  87, 103, 121, 120, 101,
    72,  92,  95,  98, 112, 100, 103,  99,
];

#[rustfmt::skip]
pub const SPECIFICATION_CHROMINANCE_QUANTIZATION_TABLE: [u8; 64] = [
    17,  18,  24,  47,  99,  99,  99,  99,
    18,  21,  26,  66,  99,  99,  99,  99,
    24,  26,  56,  99,  99,  99,  99,  99,
    47,  66,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
    99,  99,  99,  99,  99,  99,  99,  99,
];

const BASE_SIZE: usize = 8;

/// Elementwise divisors of one block size
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizationTable {
    divisors: Vec<f64>,
}

impl QuantizationTable {
    pub fn luminance(size: usize) -> Self {
        Self::resampled(&SPECIFICATION_LUMINANCE_QUANTIZATION_TABLE, size)
    }

    pub fn chrominance(size: usize) -> Self {
        Self::resampled(&SPECIFICATION_CHROMINANCE_QUANTIZATION_TABLE, size)
    }

    /// Nearest neighbour resampling of an 8x8 table to `size` x `size`
    fn resampled(table: &[u8; 64], size: usize) -> Self {
        let mut divisors = Vec::with_capacity(size * size);
        for row in 0..size {
            for column in 0..size {
                let source_row = row * BASE_SIZE / size;
                let source_column = column * BASE_SIZE / size;
                divisors.push(table[source_row * BASE_SIZE + source_column] as f64);
            }
        }
        Self { divisors }
    }

    /// Divides and rounds to the nearest integer
    pub fn quantize(&self, block: &[f64]) -> Vec<i32> {
        block
            .iter()
            .zip(&self.divisors)
            .map(|(&value, &divisor)| (value / divisor).round() as i32)
            .collect()
    }

    pub fn dequantize(&self, block: &[i32]) -> Vec<f64> {
        block
            .iter()
            .zip(&self.divisors)
            .map(|(&value, &divisor)| value as f64 * divisor)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::{QuantizationTable, SPECIFICATION_LUMINANCE_QUANTIZATION_TABLE};

    #[test]
    fn table_of_base_size_is_unchanged() {
        let table = QuantizationTable::luminance(8);
        let expected: Vec<f64> = SPECIFICATION_LUMINANCE_QUANTIZATION_TABLE
            .iter()
            .map(|&value| value as f64)
            .collect();
        assert_eq!(table.divisors, expected);
    }

    #[test]
    fn resample_to_smaller_and_larger_blocks() {
        let table = QuantizationTable::luminance(4);
        assert_eq!(table.divisors, vec![
            16.0, 10.0, 24.0, 51.0,
            14.0, 16.0, 40.0, 69.0,
            18.0, 37.0, 68.0, 103.0,
            49.0, 78.0, 103.0, 120.0,
        ]);
        let table = QuantizationTable::chrominance(16);
        assert_eq!(table.divisors.len(), 256);
        assert_eq!(table.divisors[0], 17.0);
        assert_eq!(table.divisors[2], 18.0);
        assert_eq!(table.divisors[255], 99.0);
    }

    #[test]
    fn quantize_rounds_to_nearest() {
        let table = QuantizationTable::luminance(8);
        let mut block = vec![0.0; 64];
        block[0] = 24.1;
        block[1] = -5.4;
        block[2] = 4.9;
        let quantized = table.quantize(&block);
        assert_eq!(&quantized[..3], &[2, 0, 0]);
        block[2] = 5.1;
        assert_eq!(table.quantize(&block)[2], 1);
        let dequantized = table.dequantize(&quantized);
        assert_eq!(dequantized[0], 32.0);
    }
}
