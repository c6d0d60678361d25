use log::debug;
use threadpool::ThreadPool;

use super::{
    assemble_segments, checked_area, disassemble_segments, expect_segment, join_runs,
    run_per_channel, shape_from_payload, shape_to_payload, split_runs, ChannelSegments,
};
use crate::{
    container::{CodecType, ContainerImage, Payload},
    error::Error,
    image::{
        subsampling::{upsample, Subsampler, SubsamplingConfig},
        ColorChannel, ColorChannels, Image, CHANNEL_NAMES,
    },
    run_length::RunLengthCoder,
    settings::{Settings, MAX_BLOCK_SIZE},
    transform::block::{quantizer::QuantizationTable, BlockCoefficients, BlockTransform},
    Result,
};

/// DC differences, AC values and AC zero runs
const ROLES: usize = 3;

fn quantization_table(channel_index: usize, block_size: usize) -> QuantizationTable {
    if channel_index == 0 {
        QuantizationTable::luminance(block_size)
    } else {
        QuantizationTable::chrominance(block_size)
    }
}

fn encode_channel(
    channel_index: usize,
    channel: &ColorChannel<f64>,
    block_size: usize,
    max_run_length: usize,
) -> Result<ChannelSegments> {
    let transform = BlockTransform::new(block_size)?;
    let coefficients = transform.forward(channel, &quantization_table(channel_index, block_size));
    let runs = RunLengthCoder::new(max_run_length)?.encode(&coefficients.ac);
    debug!(
        "{} channel yields {} DC values and {} AC runs",
        CHANNEL_NAMES[channel_index],
        coefficients.dc_differences.len(),
        runs.len()
    );
    let (values, zeros) = split_runs(&runs)?;
    let mut segments = ChannelSegments::default();
    segments.push_role(&coefficients.dc_differences)?;
    segments.push_role(&values)?;
    segments.push_role(&zeros)?;
    Ok(segments)
}

fn decode_channel(
    channel_index: usize,
    segments: ChannelSegments,
    (height, width): (usize, usize),
    block_size: usize,
) -> Result<ColorChannel<f64>> {
    let mut roles = segments.into_roles()?.into_iter();
    let (Some(dc_differences), Some(values), Some(zeros)) = (roles.next(), roles.next(), roles.next())
    else {
        return Err(Error::CorruptBitstream(format!(
            "channel {} lacks one of its streams",
            channel_index
        )));
    };
    let block_count = width.div_ceil(block_size) * height.div_ceil(block_size);
    let ac_length = block_count * (block_size * block_size - 1);
    // the decoder never splits runs, so any chunk length will do
    let ac = RunLengthCoder::new(1)?.decode(&join_runs(&values, &zeros)?, ac_length)?;
    let coefficients = BlockCoefficients {
        dc_differences,
        ac,
        width,
        height,
    };
    BlockTransform::new(block_size)?
        .inverse(&coefficients, &quantization_table(channel_index, block_size))
}

pub fn encode(image: &Image, settings: &Settings, threadpool: &ThreadPool) -> Result<ContainerImage> {
    let [luma, chroma_blue, chroma_red] = image.to_channels().into_array();
    let config = SubsamplingConfig::from(settings.chroma_subsampling);
    let chroma_blue = Subsampler::new(&chroma_blue, &config).subsample();
    let chroma_red = Subsampler::new(&chroma_red, &config).subsample();
    let luma_shape = luma.shape();
    let chroma_shape = chroma_blue.shape();
    debug!(
        "Block coding luma {:?} and chroma {:?} with {}x{} blocks",
        luma_shape, chroma_shape, settings.block_size, settings.block_size
    );
    let block_size = settings.block_size;
    let max_run_length = settings.max_run_length;
    let channels = run_per_channel(
        threadpool,
        [luma, chroma_blue, chroma_red],
        move |index, channel| encode_channel(index, &channel, block_size, max_run_length),
    )?;
    let shapes = Payload::List(vec![
        shape_to_payload(luma_shape)?,
        shape_to_payload(chroma_shape)?,
    ]);
    ContainerImage::new(
        CodecType::Block,
        vec![Payload::Plain(block_size.to_string())],
        assemble_segments(channels, vec![shapes]),
    )
}

fn parse_block_size(settings: Vec<Payload>) -> Result<usize> {
    let mut settings = settings.into_iter();
    let block_size = expect_segment(&mut settings, "block size")?.into_plain()?;
    block_size
        .parse::<usize>()
        .ok()
        .filter(|&size| size > 0 && size <= MAX_BLOCK_SIZE)
        .ok_or_else(|| Error::CorruptBitstream(format!("invalid block size '{}'", block_size)))
}

pub fn decode(container: ContainerImage, _settings: &Settings, threadpool: &ThreadPool) -> Result<Image> {
    let (_, header, segments) = container.into_parts();
    let block_size = parse_block_size(header)?;
    let (channels, trailer) = disassemble_segments(segments, ROLES)?;
    let mut trailer = trailer.into_iter();
    let mut shapes = expect_segment(&mut trailer, "shape")?.into_list()?.into_iter();
    let luma_shape = shape_from_payload(expect_segment(&mut shapes, "luma shape")?)?;
    let chroma_shape = shape_from_payload(expect_segment(&mut shapes, "chroma shape")?)?;
    checked_area(luma_shape)?;
    if chroma_shape.0 > luma_shape.0 || chroma_shape.1 > luma_shape.1 {
        return Err(Error::DimensionMismatch(format!(
            "chroma shape {:?} exceeds luma shape {:?}",
            chroma_shape, luma_shape
        )));
    }
    let [luma, chroma_blue, chroma_red] = channels;
    let inputs = [
        (luma, luma_shape),
        (chroma_blue, chroma_shape),
        (chroma_red, chroma_shape),
    ];
    let [luma, chroma_blue, chroma_red] = run_per_channel(
        threadpool,
        inputs,
        move |index, (segments, shape)| decode_channel(index, segments, shape, block_size),
    )?;
    let (height, width) = luma_shape;
    let chroma_blue = upsample(&chroma_blue, width, height);
    let chroma_red = upsample(&chroma_red, width, height);
    Image::from_channels(&ColorChannels::from_array([luma, chroma_blue, chroma_red]))
}
