use std::{io, thread};

use crate::{
    error::Error, image::subsampling::ChromaSubsamplingPreset, transform::wavelet::Wavelet,
    Result,
};

/// Channels are padded to a multiple of `2^levels`
pub const MAX_WAVELET_LEVELS: usize = 10;
pub const MAX_BLOCK_SIZE: usize = 256;
/// Largest number of dots a decoded or padded channel may hold
pub const MAX_CHANNEL_AREA: usize = 1 << 26;

/// Tunables of both codec families.
///
/// Built once at the program boundary and handed to every stage by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// filter family of the subband decomposition
    pub wavelet: Wavelet,
    /// number of decomposition levels
    pub wavelet_levels: usize,
    /// detail subbands at level `i` are divided by `multiplier * (i² + 1)`, 0 disables
    pub subband_quantization_multiplier: f64,
    /// fraction of coefficients kept by magnitude, in `[0, 1]`
    pub quality_factor: f64,
    /// detail coefficients with a smaller magnitude are zeroed
    pub coefficient_threshold: f64,
    /// edge length of the cosine transform blocks
    pub block_size: usize,
    /// longest zero run a single run-length record may carry
    pub max_run_length: usize,
    pub chroma_subsampling: ChromaSubsamplingPreset,
    pub number_of_threads: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wavelet: Wavelet::Haar,
            wavelet_levels: 3,
            subband_quantization_multiplier: 0.0,
            quality_factor: 1.0,
            coefficient_threshold: 10.0,
            block_size: 8,
            max_run_length: 15,
            chroma_subsampling: ChromaSubsamplingPreset::P444,
            number_of_threads: get_number_of_threads().unwrap_or(1),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.wavelet_levels == 0 {
            return Err(Error::InvalidSettings("wavelet levels must be at least 1"));
        }
        if self.wavelet_levels > MAX_WAVELET_LEVELS {
            return Err(Error::InvalidSettings("wavelet levels are out of range"));
        }
        if self.subband_quantization_multiplier.is_nan() || self.subband_quantization_multiplier < 0.0
        {
            return Err(Error::InvalidSettings(
                "subband quantization multiplier must not be negative",
            ));
        }
        if !(0.0..=1.0).contains(&self.quality_factor) {
            return Err(Error::InvalidSettings("quality factor must be within [0, 1]"));
        }
        if self.coefficient_threshold.is_nan() || self.coefficient_threshold < 0.0 {
            return Err(Error::InvalidSettings(
                "coefficient threshold must not be negative",
            ));
        }
        if self.block_size == 0 {
            return Err(Error::InvalidSettings("block size must be at least 1"));
        }
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidSettings("block size is out of range"));
        }
        if self.max_run_length == 0 {
            return Err(Error::InvalidSettings("max run length must be at least 1"));
        }
        if self.number_of_threads == 0 {
            return Err(Error::InvalidSettings("number of threads must be at least 1"));
        }
        Ok(())
    }
}

pub fn get_number_of_threads() -> io::Result<usize> {
    Ok(thread::available_parallelism()?.get())
}
