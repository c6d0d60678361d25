pub mod block;
pub mod wavelet;

use std::sync::{mpsc, Arc};

use log::{debug, info};
use threadpool::ThreadPool;

use crate::{
    container::{table_from_payload, table_to_payload, CodecType, ContainerImage, Payload},
    error::Error,
    huffman::HuffmanCoder,
    image::Image,
    run_length::RunLength,
    settings::{Settings, MAX_CHANNEL_AREA},
    Result,
};

/// Compresses `image` with the given codec family into container bytes
pub fn encode(image: &Image, codec_type: CodecType, settings: &Settings) -> Result<Vec<u8>> {
    settings.validate()?;
    let threadpool = ThreadPool::new(settings.number_of_threads);
    info!(
        "Encoding {}x{} image with the {} codec on {} threads",
        image.width(),
        image.height(),
        codec_type,
        settings.number_of_threads
    );
    let container = match codec_type {
        CodecType::Block => block::encode(image, settings, &threadpool)?,
        CodecType::Wavelet => wavelet::encode(image, settings, &threadpool)?,
    };
    let bytes = container.to_bytes()?;
    info!("Encoded image into {} bytes", bytes.len());
    Ok(bytes)
}

/// Restores an image from container bytes. Everything needed to decode is
/// read from the container; `settings` only sizes the worker pool.
pub fn decode(bytes: &[u8], settings: &Settings) -> Result<Image> {
    settings.validate()?;
    let threadpool = ThreadPool::new(settings.number_of_threads);
    let container = ContainerImage::from_bytes(bytes)?;
    info!(
        "Decoding {} bytes of a {} container",
        bytes.len(),
        container.codec_type()
    );
    let image = match container.codec_type() {
        CodecType::Block => block::decode(container, settings, &threadpool)?,
        CodecType::Wavelet => wavelet::decode(container, settings, &threadpool)?,
    };
    info!("Decoded {}x{} image", image.width(), image.height());
    Ok(image)
}

/// Huffman tables and coded streams of one channel, one entry per role
#[derive(Debug, Default)]
pub(crate) struct ChannelSegments {
    pub tables: Vec<Payload>,
    pub streams: Vec<Payload>,
}

impl ChannelSegments {
    /// Builds a tree over `symbols` and stores its table next to the coded stream
    pub fn push_role(&mut self, symbols: &[i32]) -> Result<()> {
        let coder = HuffmanCoder::from_data(symbols)?;
        let bits = coder.encode(symbols)?;
        debug!(
            "Coded {} symbols with {} table entries into {} bits",
            symbols.len(),
            coder.table().len(),
            bits.len()
        );
        self.tables.push(table_to_payload(&coder.table())?);
        self.streams.push(Payload::Bits(bits));
        Ok(())
    }

    /// Decodes the roles in the order they were pushed
    pub fn into_roles(self) -> Result<Vec<Vec<i32>>> {
        self.tables
            .into_iter()
            .zip(self.streams)
            .map(|(table, stream)| {
                let coder = HuffmanCoder::from_table(&table_from_payload(table)?)?;
                coder.decode(&stream.into_bits()?)
            })
            .collect()
    }
}

/// Tables of all channels, then the streams of all channels, then `trailer`
pub(crate) fn assemble_segments(
    channels: [ChannelSegments; 3],
    trailer: Vec<Payload>,
) -> Vec<Payload> {
    let mut tables = Vec::new();
    let mut streams = Vec::new();
    for channel in channels {
        tables.extend(channel.tables);
        streams.extend(channel.streams);
    }
    tables.into_iter().chain(streams).chain(trailer).collect()
}

/// Inverse of [`assemble_segments`] for `roles` tables and streams per channel
pub(crate) fn disassemble_segments(
    segments: Vec<Payload>,
    roles: usize,
) -> Result<([ChannelSegments; 3], Vec<Payload>)> {
    if segments.len() < 6 * roles {
        return Err(Error::DimensionMismatch(format!(
            "{} segments cannot hold {} roles of three channels",
            segments.len(),
            roles
        )));
    }
    let mut remaining = segments.into_iter();
    let mut channels: [ChannelSegments; 3] = Default::default();
    for channel in channels.iter_mut() {
        channel.tables.extend(remaining.by_ref().take(roles));
    }
    for channel in channels.iter_mut() {
        channel.streams.extend(remaining.by_ref().take(roles));
    }
    Ok((channels, remaining.collect()))
}

/// Zero run lengths and values as two separate symbol streams
pub(crate) fn split_runs(runs: &[RunLength]) -> Result<(Vec<i32>, Vec<i32>)> {
    let mut values = Vec::with_capacity(runs.len());
    let mut zeros = Vec::with_capacity(runs.len());
    for run in runs {
        values.push(run.value);
        zeros.push(i32::try_from(run.zeros).map_err(|_| {
            Error::DimensionMismatch(format!("zero run of {} is too long", run.zeros))
        })?);
    }
    Ok((values, zeros))
}

pub(crate) fn join_runs(values: &[i32], zeros: &[i32]) -> Result<Vec<RunLength>> {
    if values.len() != zeros.len() {
        return Err(Error::CorruptBitstream(format!(
            "{} run values but {} run lengths",
            values.len(),
            zeros.len()
        )));
    }
    values
        .iter()
        .zip(zeros)
        .map(|(&value, &zeros)| {
            usize::try_from(zeros)
                .map(|zeros| RunLength::new(zeros, value))
                .map_err(|_| Error::CorruptBitstream(format!("negative zero run {}", zeros)))
        })
        .collect()
}

pub(crate) fn shape_to_payload((height, width): (usize, usize)) -> Result<Payload> {
    let convert = |edge: usize| {
        i32::try_from(edge)
            .map_err(|_| Error::DimensionMismatch(format!("edge {} is too long", edge)))
    };
    Ok(Payload::Pair(convert(height)?, convert(width)?))
}

/// `(height, width)`, both at least 1
pub(crate) fn shape_from_payload(payload: Payload) -> Result<(usize, usize)> {
    let (height, width) = payload.into_pair()?;
    match (usize::try_from(height), usize::try_from(width)) {
        (Ok(height), Ok(width)) if height > 0 && width > 0 => Ok((height, width)),
        _ => Err(Error::CorruptBitstream(format!(
            "invalid shape {}x{}",
            width, height
        ))),
    }
}

/// Number of dots in a `(height, width)` channel, bounded by [`MAX_CHANNEL_AREA`]
pub(crate) fn checked_area((height, width): (usize, usize)) -> Result<usize> {
    height
        .checked_mul(width)
        .filter(|&area| area <= MAX_CHANNEL_AREA)
        .ok_or_else(|| {
            Error::DimensionMismatch(format!(
                "{}x{} channel exceeds {} dots",
                width, height, MAX_CHANNEL_AREA
            ))
        })
}

/// Runs `job` once per channel on the pool and returns the results in
/// channel order, no matter which worker finishes first.
pub(crate) fn run_per_channel<I, O, F>(
    threadpool: &ThreadPool,
    inputs: [I; 3],
    job: F,
) -> Result<[O; 3]>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(usize, I) -> Result<O> + Send + Sync + 'static,
{
    let job = Arc::new(job);
    let (sender, receiver) = mpsc::channel();
    for (index, input) in inputs.into_iter().enumerate() {
        let sender = sender.clone();
        let job = Arc::clone(&job);
        threadpool.execute(move || {
            // the receiver is gone once another channel failed
            let _ = sender.send((index, job(index, input)));
        });
    }
    drop(sender);
    let mut results: [Option<O>; 3] = [None, None, None];
    for (index, result) in receiver {
        results[index] = Some(result?);
    }
    let [luma, chroma_blue, chroma_red] = results;
    Ok([
        luma.ok_or(Error::ChannelWorkerFailed)?,
        chroma_blue.ok_or(Error::ChannelWorkerFailed)?,
        chroma_red.ok_or(Error::ChannelWorkerFailed)?,
    ])
}

pub(crate) fn expect_segment(segments: &mut impl Iterator<Item = Payload>, name: &str) -> Result<Payload> {
    segments
        .next()
        .ok_or_else(|| Error::CorruptBitstream(format!("missing {} segment", name)))
}

#[cfg(test)]
mod test {
    use super::{
        assemble_segments, checked_area, disassemble_segments, join_runs, run_per_channel,
        shape_from_payload, split_runs, ChannelSegments,
    };
    use crate::container::Payload;
    use crate::error::Error;
    use crate::run_length::RunLength;
    use threadpool::ThreadPool;

    fn channel(prefix: i32) -> ChannelSegments {
        ChannelSegments {
            tables: vec![Payload::Pair(prefix, 0), Payload::Pair(prefix, 1)],
            streams: vec![Payload::Pair(prefix, 2), Payload::Pair(prefix, 3)],
        }
    }

    #[test]
    fn segments_are_ordered_tables_then_streams() {
        let segments = assemble_segments(
            [channel(0), channel(1), channel(2)],
            vec![Payload::Plain("shape".to_owned())],
        );
        #[rustfmt::skip]
        let expected_order = [
            (0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1),
            (0, 2), (0, 3), (1, 2), (1, 3), (2, 2), (2, 3),
        ];
        for (index, &(first, second)) in expected_order.iter().enumerate() {
            assert_eq!(
                segments[index],
                Payload::Pair(first, second),
                "Segment {} is out of order",
                index
            );
        }
        let (channels, trailer) = disassemble_segments(segments, 2).unwrap();
        assert_eq!(trailer, vec![Payload::Plain("shape".to_owned())]);
        assert_eq!(channels[1].tables, channel(1).tables);
        assert_eq!(channels[2].streams, channel(2).streams);
    }

    #[test]
    fn roles_survive_entropy_coding() {
        let mut segments = ChannelSegments::default();
        segments.push_role(&[5, 5, 5, -1]).unwrap();
        segments.push_role(&[0]).unwrap();
        assert_eq!(
            segments.into_roles().unwrap(),
            vec![vec![5, 5, 5, -1], vec![0]]
        );
    }

    #[test]
    fn runs_split_into_two_streams() {
        let runs = [RunLength::new(1, -59), RunLength::new(15, 0), RunLength::SENTINEL];
        let (values, zeros) = split_runs(&runs).unwrap();
        assert_eq!(values, vec![-59, 0, 0]);
        assert_eq!(zeros, vec![1, 15, 0]);
        assert_eq!(join_runs(&values, &zeros).unwrap(), runs);
        assert!(matches!(
            join_runs(&values, &zeros[..2]),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_empty_shape() {
        assert!(matches!(
            shape_from_payload(Payload::Pair(0, 4)),
            Err(Error::CorruptBitstream(_))
        ));
        assert_eq!(shape_from_payload(Payload::Pair(3, 4)).unwrap(), (3, 4));
    }

    #[test]
    fn bound_channel_area() {
        assert_eq!(checked_area((3, 4)).unwrap(), 12);
        assert!(matches!(
            checked_area((1 << 20, 1 << 20)),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(matches!(
            checked_area((usize::MAX, 2)),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn results_keep_channel_order() {
        let pool = ThreadPool::new(3);
        let results = run_per_channel(&pool, [30_u64, 0, 10], |index, delay| {
            std::thread::sleep(std::time::Duration::from_millis(delay));
            Ok(index * 10)
        })
        .unwrap();
        assert_eq!(results, [0, 10, 20]);
    }

    #[test]
    fn first_failing_channel_is_reported() {
        let pool = ThreadPool::new(2);
        let result = run_per_channel(&pool, [0, 1, 2], |_, input: i32| {
            if input == 1 {
                Err(Error::EmptyImage)
            } else {
                Ok(input)
            }
        });
        assert!(matches!(result, Err(Error::EmptyImage)));
    }
}
