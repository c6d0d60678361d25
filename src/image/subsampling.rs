use std::cmp;

use clap::{builder::PossibleValue, ValueEnum};

use super::ColorChannel;

/// Chroma resolution relative to luma, in the usual J:a:b notation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChromaSubsamplingPreset {
    P444,
    P422,
    P420,
}

impl ValueEnum for ChromaSubsamplingPreset {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::P444, Self::P422, Self::P420]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        let name = match self {
            Self::P444 => "P444",
            Self::P422 => "P422",
            Self::P420 => "P420",
        };
        Some(PossibleValue::new(name))
    }
}

impl ChromaSubsamplingPreset {
    /// `(vertical, horizontal)` rate
    pub fn rates(&self) -> (usize, usize) {
        match self {
            Self::P444 => (1, 1),
            Self::P422 => (1, 2),
            Self::P420 => (2, 2),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SubsamplingMethod {
    /// keep the top left dot of every rectangle
    Skip,
    /// mean of every rectangle
    Average,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubsamplingConfig {
    pub vertical_rate: usize,
    pub horizontal_rate: usize,
    pub method: SubsamplingMethod,
}

impl From<ChromaSubsamplingPreset> for SubsamplingConfig {
    fn from(preset: ChromaSubsamplingPreset) -> Self {
        let (vertical_rate, horizontal_rate) = preset.rates();
        let method = if preset == ChromaSubsamplingPreset::P444 {
            SubsamplingMethod::Skip
        } else {
            SubsamplingMethod::Average
        };
        Self {
            vertical_rate,
            horizontal_rate,
            method,
        }
    }
}

/// Reduces one channel to one dot per `horizontal_rate` x `vertical_rate`
/// rectangle. Rectangles reaching past the border repeat the last row or
/// column.
pub struct Subsampler<'a> {
    channel: &'a ColorChannel<f64>,
    config: &'a SubsamplingConfig,
}

impl<'a> Subsampler<'a> {
    pub fn new(channel: &'a ColorChannel<f64>, config: &'a SubsamplingConfig) -> Self {
        Self { channel, config }
    }

    /// `(height, width)` of the subsampled channel, the ceiled quotients of
    /// the original edges and the rates
    pub fn shape(&self) -> (usize, usize) {
        (
            self.channel.height.div_ceil(self.config.vertical_rate),
            self.channel.width.div_ceil(self.config.horizontal_rate),
        )
    }

    fn sample(&self, column_index: usize, row_index: usize) -> f64 {
        let left = column_index * self.config.horizontal_rate;
        let top = row_index * self.config.vertical_rate;
        match self.config.method {
            SubsamplingMethod::Skip => self.channel.dot(left, top),
            SubsamplingMethod::Average => {
                let last_column = self.channel.width - 1;
                let last_row = self.channel.height - 1;
                let mut sum = 0.0;
                for y in top..top + self.config.vertical_rate {
                    for x in left..left + self.config.horizontal_rate {
                        sum += self
                            .channel
                            .dot(cmp::min(x, last_column), cmp::min(y, last_row));
                    }
                }
                sum / (self.config.vertical_rate * self.config.horizontal_rate) as f64
            }
        }
    }

    pub fn subsample(&self) -> ColorChannel<f64> {
        let (height, width) = self.shape();
        let dots = (0..height)
            .flat_map(|row_index| {
                (0..width).map(move |column_index| self.sample(column_index, row_index))
            })
            .collect();
        ColorChannel {
            width,
            height,
            dots,
        }
    }
}

/// Replicates every dot of a subsampled channel by the ceiled ratio of the
/// target and source edges, then crops to `width` x `height`.
pub fn upsample<T: Copy>(channel: &ColorChannel<T>, width: usize, height: usize) -> ColorChannel<T> {
    let horizontal_rate = width.div_ceil(channel.width).max(1);
    let vertical_rate = height.div_ceil(channel.height).max(1);
    let mut dots = Vec::with_capacity(width * height);
    for row_index in 0..height {
        let source_row = cmp::min(row_index / vertical_rate, channel.height - 1);
        for column_index in 0..width {
            let source_column = cmp::min(column_index / horizontal_rate, channel.width - 1);
            dots.push(channel.dot(source_column, source_row));
        }
    }
    ColorChannel {
        width,
        height,
        dots,
    }
}

#[cfg(test)]
mod test {
    use super::{upsample, ChromaSubsamplingPreset, Subsampler, SubsamplingConfig, SubsamplingMethod};
    use crate::image::ColorChannel;

    #[rustfmt::skip]
    const TEST_CHANNEL_ONE: &[f64] = &[
         1.0,  2.0,  3.0,  4.0,
         5.0,  6.0,  7.0,  8.0,
         9.0, 10.0, 11.0, 12.0,
        13.0, 14.0, 15.0, 16.0,
    ];

    fn test_channel() -> ColorChannel<f64> {
        ColorChannel::new(4, 4, Vec::from(TEST_CHANNEL_ONE)).unwrap()
    }

    fn subsample(config: SubsamplingConfig) -> ColorChannel<f64> {
        let channel = test_channel();
        Subsampler::new(&channel, &config).subsample()
    }

    #[test]
    fn full_resolution_keeps_channel() {
        let subsampled = subsample(SubsamplingConfig::from(ChromaSubsamplingPreset::P444));
        assert_eq!(subsampled, test_channel());
    }

    #[test]
    fn skip_keeps_top_left_dots() {
        let subsampled = subsample(SubsamplingConfig {
            vertical_rate: 1,
            horizontal_rate: 2,
            method: SubsamplingMethod::Skip,
        });
        assert_eq!(subsampled.shape(), (4, 2));
        assert_eq!(subsampled.row(1), &[5.0, 7.0]);
    }

    #[test]
    fn average_vertical_pairs() {
        let subsampled = subsample(SubsamplingConfig {
            vertical_rate: 2,
            horizontal_rate: 1,
            method: SubsamplingMethod::Average,
        });
        assert_eq!(subsampled.shape(), (2, 4));
        assert_eq!(subsampled.dot(1, 1), 12.0);
    }

    #[test]
    fn average_repeats_border() {
        let subsampled = subsample(SubsamplingConfig {
            vertical_rate: 3,
            horizontal_rate: 2,
            method: SubsamplingMethod::Average,
        });
        assert_eq!(subsampled.shape(), (2, 2));
        // row 3 repeated past the border, columns 2 and 3
        assert_eq!(subsampled.dot(1, 1), 15.5);
    }

    #[test]
    fn subsample_with_420_preset() {
        let subsampled = subsample(SubsamplingConfig::from(ChromaSubsamplingPreset::P420));
        assert_eq!(subsampled.dots, vec![3.5, 5.5, 11.5, 13.5]);
    }

    #[test]
    fn subsample_odd_edges_to_ceiled_shape() {
        let channel = ColorChannel::new(5, 3, (0..15).map(f64::from).collect()).unwrap();
        let config = SubsamplingConfig::from(ChromaSubsamplingPreset::P420);
        let subsampler = Subsampler::new(&channel, &config);
        assert_eq!(subsampler.shape(), (2, 3));
        let subsampled = subsampler.subsample();
        assert_eq!(subsampled.dots.len(), 6);
        // last sample repeats column 4 and row 2
        assert_eq!(subsampled.dots[5], 14.0);
    }

    #[test]
    fn upsample_replicates_and_crops() {
        let channel = ColorChannel::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        let upsampled = upsample(&channel, 3, 4);
        #[rustfmt::skip]
        let expected = vec![
            1, 1, 2,
            1, 1, 2,
            3, 3, 4,
            3, 3, 4,
        ];
        assert_eq!(upsampled.dots, expected);
    }
}
