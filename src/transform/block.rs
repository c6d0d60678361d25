pub mod frequency_block;
pub mod quantizer;

use log::debug;

use crate::{
    cosine_transform::{separated::SeparatedDiscreteCosineTransformer, DiscreteCosineTransformer},
    error::Error,
    image::ColorChannel,
    Result,
};
use frequency_block::{zig_zag_ordered_block_indexes, FrequencyBlock};
use quantizer::QuantizationTable;

/// Offset subtracted from every sample before the transform
pub const LEVEL_SHIFT: f64 = 128.0;

/// Quantized coefficients of one channel
#[derive(Clone, Debug, PartialEq)]
pub struct BlockCoefficients {
    /// first DC absolute, every further one relative to its predecessor
    pub dc_differences: Vec<i32>,
    /// zigzag scanned AC coefficients of all blocks, concatenated
    pub ac: Vec<i32>,
    pub width: usize,
    pub height: usize,
}

/// Splits into row-major `size` x `size` blocks; edges must be multiples of `size`.
pub fn split_into_blocks<T: Copy>(channel: &ColorChannel<T>, size: usize) -> Vec<Vec<T>> {
    let blocks_per_row = channel.width / size;
    let blocks_per_column = channel.height / size;
    let mut blocks = Vec::with_capacity(blocks_per_row * blocks_per_column);
    for block_row in 0..blocks_per_column {
        for block_column in 0..blocks_per_row {
            let mut block = Vec::with_capacity(size * size);
            for y in 0..size {
                let row = channel.row(block_row * size + y);
                let start = block_column * size;
                block.extend_from_slice(&row[start..start + size]);
            }
            blocks.push(block);
        }
    }
    blocks
}

/// Inverse of [`split_into_blocks`]
pub fn merge_blocks<T: Copy + Default>(
    blocks: &[Vec<T>],
    size: usize,
    width: usize,
    height: usize,
) -> ColorChannel<T> {
    let blocks_per_row = width / size;
    let mut channel = ColorChannel::filled(width, height, T::default());
    for (block_index, block) in blocks.iter().enumerate() {
        let origin_x = (block_index % blocks_per_row) * size;
        let origin_y = (block_index / blocks_per_row) * size;
        for (index, &value) in block.iter().enumerate() {
            channel.set_dot(origin_x + index % size, origin_y + index / size, value);
        }
    }
    channel
}

pub fn differential_dc(dcs: &[i32]) -> Vec<i32> {
    let mut previous = 0;
    dcs.iter()
        .map(|&dc| {
            let difference = dc - previous;
            previous = dc;
            difference
        })
        .collect()
}

pub fn cumulative_sum(differences: &[i32]) -> Vec<i32> {
    differences
        .iter()
        .scan(0, |sum, &difference| {
            *sum += difference;
            Some(*sum)
        })
        .collect()
}

pub struct BlockTransform {
    size: usize,
    transformer: SeparatedDiscreteCosineTransformer,
    zig_zag_order: Vec<usize>,
}

impl BlockTransform {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidSettings("block size must be at least 1"));
        }
        Ok(Self {
            size,
            transformer: SeparatedDiscreteCosineTransformer::new(size),
            zig_zag_order: zig_zag_ordered_block_indexes(size),
        })
    }

    fn padded_edge(&self, edge: usize) -> usize {
        edge.div_ceil(self.size) * self.size
    }

    /// Level shift, zero padding, per block DCT, quantization and zigzag scan
    pub fn forward(
        &self,
        channel: &ColorChannel<f64>,
        table: &QuantizationTable,
    ) -> BlockCoefficients {
        let shifted = channel
            .map(|dot| dot - LEVEL_SHIFT)
            .padded(
                self.padded_edge(channel.width),
                self.padded_edge(channel.height),
                0.0,
            );
        let blocks = split_into_blocks(&shifted, self.size);
        debug!(
            "Transforming {} blocks of {}x{} for a {}x{} channel",
            blocks.len(),
            self.size,
            self.size,
            channel.width,
            channel.height
        );
        let mut dcs = Vec::with_capacity(blocks.len());
        let mut ac = Vec::with_capacity(blocks.len() * (self.size * self.size - 1));
        for mut block in blocks {
            self.transformer.transform(&mut block);
            let quantized = FrequencyBlock::new(self.size, table.quantize(&block));
            dcs.push(quantized.dc());
            ac.extend(quantized.iter_zig_zag(&self.zig_zag_order).skip(1));
        }
        BlockCoefficients {
            dc_differences: differential_dc(&dcs),
            ac,
            width: channel.width,
            height: channel.height,
        }
    }

    pub fn inverse(
        &self,
        coefficients: &BlockCoefficients,
        table: &QuantizationTable,
    ) -> Result<ColorChannel<f64>> {
        let padded_width = self.padded_edge(coefficients.width);
        let padded_height = self.padded_edge(coefficients.height);
        let block_count = (padded_width / self.size) * (padded_height / self.size);
        let ac_per_block = self.size * self.size - 1;
        if coefficients.dc_differences.len() != block_count
            || coefficients.ac.len() != block_count * ac_per_block
        {
            return Err(Error::DimensionMismatch(format!(
                "{} DC and {} AC coefficients do not cover a {}x{} channel",
                coefficients.dc_differences.len(),
                coefficients.ac.len(),
                coefficients.width,
                coefficients.height
            )));
        }
        let dcs = cumulative_sum(&coefficients.dc_differences);
        let mut blocks = Vec::with_capacity(block_count);
        let mut scanned = Vec::with_capacity(self.size * self.size);
        for (block_index, &dc) in dcs.iter().enumerate() {
            scanned.clear();
            scanned.push(dc);
            let start = block_index * ac_per_block;
            scanned.extend_from_slice(&coefficients.ac[start..start + ac_per_block]);
            let quantized = FrequencyBlock::from_zig_zag(self.size, &scanned, &self.zig_zag_order);
            let mut block = table.dequantize(&quantized.into_data());
            self.transformer.inverse_transform(&mut block);
            blocks.push(block);
        }
        let channel = merge_blocks(&blocks, self.size, padded_width, padded_height);
        Ok(channel
            .cropped(coefficients.width, coefficients.height)
            .map(|dot| dot + LEVEL_SHIFT))
    }
}
