use crate::container::CodecType;
use crate::image::subsampling::ChromaSubsamplingPreset;
use crate::settings::{get_number_of_threads, Settings};
use crate::transform::wavelet::Wavelet;
use crate::Arguments;
use clap::{
    arg, crate_authors, crate_description, crate_name, crate_version, value_parser, Arg,
    ArgMatches, Command,
};
use std::ffi::OsString;
use std::path::PathBuf;

pub struct CLIParser {
    command: Command,
}

impl CLIParser {
    pub fn new() -> Self {
        let command = Self::create_base_command();
        let command = Self::register_arguments(command);
        CLIParser { command }
    }

    pub fn parse<I, T>(&mut self, itr: I) -> Arguments
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .try_get_matches_from_mut(itr)
            .unwrap_or_else(|e| e.exit());
        Self::extract_arguments(&matches)
    }

    fn register_arguments(command: Command) -> Command {
        let command = Self::register_file_arguments(command);
        let command = Self::register_decompress_argument(command);
        let command = Self::register_codec_argument(command);
        let command = Self::register_wavelet_arguments(command);
        let command = Self::register_block_arguments(command);
        let command = Self::register_max_run_length_argument(command);
        Self::register_threads_argument(command)
    }

    fn register_file_arguments(command: Command) -> Command {
        command
            .arg(Self::create_input_file_argument())
            .arg(Self::create_output_file_argument())
    }

    fn register_decompress_argument(command: Command) -> Command {
        command.arg(Self::create_decompress_argument())
    }

    fn register_codec_argument(command: Command) -> Command {
        command.arg(Self::create_codec_argument())
    }

    fn register_wavelet_arguments(command: Command) -> Command {
        command
            .arg(Self::create_wavelet_argument())
            .arg(Self::create_wavelet_levels_argument())
            .arg(Self::create_multiplier_argument())
            .arg(Self::create_quality_argument())
            .arg(Self::create_threshold_argument())
    }

    fn register_block_arguments(command: Command) -> Command {
        command
            .arg(Self::create_block_size_argument())
            .arg(Self::create_chroma_subsampling_preset_argument())
    }

    fn register_max_run_length_argument(command: Command) -> Command {
        command.arg(Self::create_max_run_length_argument())
    }

    fn register_threads_argument(command: Command) -> Command {
        command.arg(Self::create_threads_argument())
    }

    fn create_base_command() -> Command {
        Command::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about(crate_description!())
    }

    fn create_input_file_argument() -> Arg {
        Arg::new("input_file")
            .help("Path to the PPM input file, or the compressed file with --decompress")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_output_file_argument() -> Arg {
        Arg::new("output_file")
            .help("Path to the compressed output file, or the PPM file with --decompress")
            .value_parser(value_parser!(PathBuf))
            .required(true)
    }

    fn create_decompress_argument() -> Arg {
        arg!(decompress: -d --decompress "Restore a PPM image from a compressed file")
    }

    fn create_codec_argument() -> Arg {
        arg!(codec: -c --codec <CODEC> "Codec family used for compression")
            .default_value("wavelet")
            .value_parser(value_parser!(CodecType))
    }

    fn create_wavelet_argument() -> Arg {
        arg!(wavelet: -w --wavelet <WAVELET> "Wavelet filter family")
            .default_value("haar")
            .value_parser(value_parser!(Wavelet))
    }

    fn create_wavelet_levels_argument() -> Arg {
        arg!(wavelet_levels: -l --levels <LEVELS> "Number of wavelet decomposition levels")
            .default_value("3")
            .value_parser(value_parser!(usize))
    }

    fn create_multiplier_argument() -> Arg {
        arg!(multiplier: -m --multiplier <MULTIPLIER> "Subband quantization multiplier, 0 disables it")
            .default_value("0")
            .value_parser(value_parser!(f64))
    }

    fn create_quality_argument() -> Arg {
        arg!(quality: -q --quality <QUALITY> "Fraction of wavelet coefficients kept by magnitude")
            .default_value("1.0")
            .value_parser(value_parser!(f64))
    }

    fn create_threshold_argument() -> Arg {
        arg!(threshold: --threshold <THRESHOLD> "Detail coefficients below this magnitude are dropped")
            .default_value("10")
            .value_parser(value_parser!(f64))
    }

    fn create_block_size_argument() -> Arg {
        arg!(block_size: -b --block_size <SIZE> "Edge length of the cosine transform blocks")
            .default_value("8")
            .value_parser(value_parser!(usize))
    }

    fn create_chroma_subsampling_preset_argument() -> Arg {
        arg!(chroma_subsampling_preset: -p --chroma_subsampling_preset <PRESET> "Chroma subsampling preset")
            .default_value("P444").value_parser(value_parser!(ChromaSubsamplingPreset))
    }

    fn create_max_run_length_argument() -> Arg {
        arg!(max_run_length: -r --max_run_length <LENGTH> "Longest zero run of one run-length record")
            .default_value("15")
            .value_parser(value_parser!(usize))
    }

    fn create_threads_argument() -> Arg {
        arg!(-t --threads <THREADS> "Number of Threads")
            .default_value(get_number_of_threads().unwrap_or(1).to_string())
            .required(false)
            .value_parser(value_parser!(usize))
    }

    fn extract_arguments(matches: &ArgMatches) -> Arguments {
        Arguments {
            input_file: Self::extract_value::<PathBuf>(matches, "input_file"),
            output_file: Self::extract_value::<PathBuf>(matches, "output_file"),
            decompress: matches.get_flag("decompress"),
            codec_type: Self::extract_value::<CodecType>(matches, "codec"),
            settings: Self::extract_settings(matches),
        }
    }

    fn extract_settings(matches: &ArgMatches) -> Settings {
        Settings {
            wavelet: Self::extract_value(matches, "wavelet"),
            wavelet_levels: Self::extract_value(matches, "wavelet_levels"),
            subband_quantization_multiplier: Self::extract_value(matches, "multiplier"),
            quality_factor: Self::extract_value(matches, "quality"),
            coefficient_threshold: Self::extract_value(matches, "threshold"),
            block_size: Self::extract_value(matches, "block_size"),
            max_run_length: Self::extract_value(matches, "max_run_length"),
            chroma_subsampling: Self::extract_value(matches, "chroma_subsampling_preset"),
            number_of_threads: Self::extract_value(matches, "threads"),
        }
    }

    /// Panics for arguments that are neither required nor defaulted
    fn extract_value<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> T {
        matches
            .get_one::<T>(id)
            .unwrap_or_else(|| panic!("Argument {} is required or defaulted, but was unset", id))
            .clone()
    }
}

impl Default for CLIParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{error::ErrorKind, Command};

    use super::{CLIParser, ChromaSubsamplingPreset};
    use crate::container::CodecType;
    use crate::transform::wavelet::Wavelet;

    const PROGRAM_NAME_ARGUMENT: &str = "test_program_name";

    #[test]
    fn parse_file_arguments_in_order() {
        let command = Command::new("test");
        let command = CLIParser::register_file_arguments(command);
        let matches =
            command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "photo.ppm", "photo.hic"]);
        let input_file = CLIParser::extract_value::<PathBuf>(&matches, "input_file");
        let output_file = CLIParser::extract_value::<PathBuf>(&matches, "output_file");
        assert_eq!(input_file, PathBuf::from("photo.ppm"));
        assert_eq!(output_file, PathBuf::from("photo.hic"));
    }

    #[test]
    fn reject_missing_output_file() {
        let command = Command::new("test");
        let command = CLIParser::register_file_arguments(command);
        let result = command.try_get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "photo.ppm"]);
        assert!(matches!(
            result.map_err(|error| error.kind()),
            Err(ErrorKind::MissingRequiredArgument)
        ));
    }

    #[test]
    fn parse_codec_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_codec_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--codec", "block"]);
        let codec_type = CLIParser::extract_value::<CodecType>(&matches, "codec");
        assert_eq!(codec_type, CodecType::Block);
    }

    #[test]
    fn parse_codec_illegal_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_codec_argument(command);
        let result = command.try_get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "-c", "png"]);
        if let Err(error) = result {
            assert_eq!(error.kind(), ErrorKind::InvalidValue);
        } else {
            panic!("Illegal value for codec not detected");
        }
    }

    #[test]
    fn parse_wavelet_arguments() {
        let command = Command::new("test");
        let command = CLIParser::register_wavelet_arguments(command);
        let matches = command.get_matches_from(vec![
            PROGRAM_NAME_ARGUMENT,
            "-w",
            "legall53",
            "--levels",
            "5",
            "-m",
            "2.5",
            "-q",
            "0.2",
            "--threshold",
            "4",
        ]);
        assert_eq!(
            CLIParser::extract_value::<Wavelet>(&matches, "wavelet"),
            Wavelet::LeGall53
        );
        assert_eq!(CLIParser::extract_value::<usize>(&matches, "wavelet_levels"), 5);
        assert_eq!(CLIParser::extract_value::<f64>(&matches, "multiplier"), 2.5);
        assert_eq!(CLIParser::extract_value::<f64>(&matches, "quality"), 0.2);
        assert_eq!(CLIParser::extract_value::<f64>(&matches, "threshold"), 4.0);
    }

    #[test]
    fn parse_chroma_subsampling_preset_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_block_arguments(command);
        let matches = command.get_matches_from(vec![
            PROGRAM_NAME_ARGUMENT,
            "--chroma_subsampling_preset",
            "P420",
        ]);
        assert_eq!(
            CLIParser::extract_value::<ChromaSubsamplingPreset>(&matches, "chroma_subsampling_preset"),
            ChromaSubsamplingPreset::P420
        );
        assert_eq!(CLIParser::extract_value::<usize>(&matches, "block_size"), 8);
    }

    #[test]
    fn parse_number_of_threads_argument() {
        let command = Command::new("test");
        let command = CLIParser::register_threads_argument(command);
        let matches = command.get_matches_from(vec![PROGRAM_NAME_ARGUMENT, "--threads", "5"]);
        assert_eq!(CLIParser::extract_value::<usize>(&matches, "threads"), 5);
    }

    #[test]
    fn parse_required_arguments_only() {
        let input_file_name = "inputfile.ppm";
        let input_file_path = format!("/input_directory/{}", input_file_name);
        let output_file_name = "outputfile.hic";
        let output_file_path = format!("/output_directory/{}", output_file_name);
        let mut cli_parser = CLIParser::default();
        let arguments = cli_parser.parse(vec![
            PROGRAM_NAME_ARGUMENT,
            &input_file_path,
            &output_file_path,
            "-t",
            "8",
        ]);
        assert_eq!(
            arguments.input_file.file_name().unwrap(),
            input_file_name,
            "input file does not match"
        );
        assert_eq!(
            arguments.output_file.file_name().unwrap(),
            output_file_name,
            "output file does not match"
        );
        assert!(!arguments.decompress, "decompress does not match");
        assert_eq!(
            arguments.codec_type,
            CodecType::Wavelet,
            "codec does not match"
        );
        assert_eq!(
            arguments.settings.chroma_subsampling,
            ChromaSubsamplingPreset::P444,
            "chroma_subsampling_preset does not match"
        );
        assert_eq!(
            arguments.settings.number_of_threads, 8,
            "number_of_threads does not match"
        );
        assert_eq!(
            arguments.settings.block_size, 8,
            "block_size does not match"
        );
        assert_eq!(
            arguments.settings.wavelet,
            Wavelet::Haar,
            "wavelet does not match"
        );
    }

    #[test]
    fn defaults_match_settings_defaults() {
        let mut cli_parser = CLIParser::default();
        let arguments = cli_parser.parse(vec![PROGRAM_NAME_ARGUMENT, "in.ppm", "out.hic", "-d"]);
        assert!(arguments.decompress);
        assert_eq!(arguments.settings, crate::settings::Settings::default());
    }
}
