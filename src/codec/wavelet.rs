use log::debug;
use threadpool::ThreadPool;

use super::{
    assemble_segments, checked_area, disassemble_segments, expect_segment, join_runs,
    run_per_channel, shape_from_payload, shape_to_payload, split_runs, ChannelSegments,
};
use crate::{
    container::{CodecType, ContainerImage, Payload},
    error::Error,
    image::{ColorChannel, ColorChannels, Image, CHANNEL_NAMES},
    run_length::RunLengthCoder,
    settings::{Settings, MAX_WAVELET_LEVELS},
    transform::wavelet::{
        derive_levels,
        quantizer::{dequantize, quantize, threshold_by_quality, threshold_details},
        SubbandPyramid, Wavelet, WaveletTransform,
    },
    Result,
};

/// run values and zero runs
const ROLES: usize = 2;

/// Header values the decoder cannot derive from the subband shapes
#[derive(Clone, Copy, Debug, PartialEq)]
struct WaveletHeader {
    wavelet: Wavelet,
    multiplier: f64,
    height: usize,
    width: usize,
}

impl WaveletHeader {
    fn to_payloads(self) -> Result<Vec<Payload>> {
        Ok(vec![
            Payload::Plain(self.wavelet.name().to_owned()),
            Payload::Plain(self.multiplier.to_string()),
            shape_to_payload((self.height, self.width))?,
        ])
    }

    fn from_payloads(payloads: Vec<Payload>) -> Result<Self> {
        let mut payloads = payloads.into_iter();
        let wavelet = expect_segment(&mut payloads, "wavelet")?
            .into_plain()?
            .parse::<Wavelet>()?;
        let multiplier = expect_segment(&mut payloads, "multiplier")?.into_plain()?;
        let multiplier = multiplier
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| {
                Error::CorruptBitstream(format!("invalid multiplier '{}'", multiplier))
            })?;
        let (height, width) = shape_from_payload(expect_segment(&mut payloads, "image shape")?)?;
        Ok(Self {
            wavelet,
            multiplier,
            height,
            width,
        })
    }
}

/// Coded segments with the smallest and largest subband shapes
struct EncodedChannel {
    segments: ChannelSegments,
    smallest_shape: (usize, usize),
    largest_shape: (usize, usize),
}

fn encode_channel(
    channel_index: usize,
    channel: &ColorChannel<f64>,
    settings: &Settings,
) -> Result<EncodedChannel> {
    let transform = WaveletTransform::new(settings.wavelet, settings.wavelet_levels)?;
    let mut pyramid = quantize(
        &transform.forward(channel),
        settings.subband_quantization_multiplier,
    );
    threshold_by_quality(&mut pyramid, settings.quality_factor);
    threshold_details(&mut pyramid, settings.coefficient_threshold);
    let coefficients = pyramid.linearize();
    let runs = RunLengthCoder::new(settings.max_run_length)?.encode(&coefficients);
    debug!(
        "{} channel keeps {} of {} subband coefficients in {} runs",
        CHANNEL_NAMES[channel_index],
        coefficients.iter().filter(|&&value| value != 0).count(),
        coefficients.len(),
        runs.len()
    );
    let (values, zeros) = split_runs(&runs)?;
    let mut segments = ChannelSegments::default();
    segments.push_role(&values)?;
    segments.push_role(&zeros)?;
    Ok(EncodedChannel {
        segments,
        smallest_shape: pyramid.smallest_shape(),
        largest_shape: pyramid.largest_shape(),
    })
}

fn decode_channel(
    channel_index: usize,
    segments: ChannelSegments,
    header: &WaveletHeader,
    levels: usize,
    smallest_shape: (usize, usize),
    length: usize,
) -> Result<ColorChannel<f64>> {
    let mut roles = segments.into_roles()?.into_iter();
    let (Some(values), Some(zeros)) = (roles.next(), roles.next()) else {
        return Err(Error::CorruptBitstream(format!(
            "channel {} lacks one of its streams",
            channel_index
        )));
    };
    let coefficients = RunLengthCoder::new(1)?.decode(&join_runs(&values, &zeros)?, length)?;
    let pyramid = SubbandPyramid::from_linear(&coefficients, smallest_shape, levels)?;
    WaveletTransform::new(header.wavelet, levels)?.inverse(
        &dequantize(&pyramid, header.multiplier),
        header.width,
        header.height,
    )
}

pub fn encode(image: &Image, settings: &Settings, threadpool: &ThreadPool) -> Result<ContainerImage> {
    let extent = 1 << settings.wavelet_levels;
    checked_area((
        image.height().next_multiple_of(extent),
        image.width().next_multiple_of(extent),
    ))?;
    let header = WaveletHeader {
        wavelet: settings.wavelet,
        multiplier: settings.subband_quantization_multiplier,
        height: image.height(),
        width: image.width(),
    };
    let channel_settings = settings.clone();
    let [luma, chroma_blue, chroma_red] = run_per_channel(
        threadpool,
        image.to_channels().into_array(),
        move |index, channel| encode_channel(index, &channel, &channel_settings),
    )?;
    debug!(
        "Subbands range from {:?} to {:?}",
        luma.smallest_shape, luma.largest_shape
    );
    let shapes = vec![
        shape_to_payload(luma.smallest_shape)?,
        shape_to_payload(luma.largest_shape)?,
    ];
    ContainerImage::new(
        CodecType::Wavelet,
        header.to_payloads()?,
        assemble_segments(
            [luma.segments, chroma_blue.segments, chroma_red.segments],
            shapes,
        ),
    )
}

pub fn decode(container: ContainerImage, _settings: &Settings, threadpool: &ThreadPool) -> Result<Image> {
    let (_, header, segments) = container.into_parts();
    let header = WaveletHeader::from_payloads(header)?;
    let (channels, trailer) = disassemble_segments(segments, ROLES)?;
    let mut trailer = trailer.into_iter();
    let smallest_shape = shape_from_payload(expect_segment(&mut trailer, "smallest shape")?)?;
    let largest_shape = shape_from_payload(expect_segment(&mut trailer, "largest shape")?)?;
    let (levels, shapes) = derive_levels(smallest_shape, largest_shape)?;
    if levels > MAX_WAVELET_LEVELS {
        return Err(Error::DimensionMismatch(format!(
            "{} decomposition levels exceed the maximum of {}",
            levels, MAX_WAVELET_LEVELS
        )));
    }
    let padded_shape = (smallest_shape.0 << levels, smallest_shape.1 << levels);
    let length = checked_area(padded_shape)?;
    if header.height > padded_shape.0 || header.width > padded_shape.1 {
        return Err(Error::DimensionMismatch(format!(
            "{}x{} image does not fit the {:?} subbands",
            header.width, header.height, padded_shape
        )));
    }
    debug!(
        "Recomposing {} levels over subband shapes {:?}",
        levels, shapes
    );
    let channels = run_per_channel(threadpool, channels, move |index, segments| {
        decode_channel(index, segments, &header, levels, smallest_shape, length)
    })?;
    Image::from_channels(&ColorChannels::from_array(channels))
}
