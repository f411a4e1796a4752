//! Command line interpretation for the rbzip2 binary. Uses the CLAP crate, following the flag
//! conventions of the standard bzip2 program.
//!
use std::fmt::{Display, Formatter};

use clap::{ArgAction, ArgGroup, Parser};
use log::LevelFilter;

use crate::compression::compress::{CompressionLevel, EncoderOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Zip, Unzip, Test
pub enum Mode {
    Zip,
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Define the two output channels
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    name = "rbzip2",
    version,
    about = "A block-sorting file compressor",
    long_about = "
    Compresses files with the Burrows-Wheeler block sorting transform followed by move-to-front,
    run-length and multi-table Huffman coding. Output is compatible with bzip2.

    With no file names, reads standard input and writes standard output."
)]
#[clap(group(ArgGroup::new("level").multiple(false)))]
#[clap(group(ArgGroup::new("mode").multiple(false)))]
pub struct Args {
    /// Files to process
    #[clap()]
    files: Vec<String>,

    /// Perform compression on the input file
    #[clap(short = 'z', long = "compress", group = "mode")]
    compress: bool,

    /// Perform decompression on the input file
    #[clap(short = 'd', long = "decompress", group = "mode")]
    decompress: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test", group = "mode")]
    test: bool,

    /// Keep input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Force overwriting output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Send output to the terminal
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Suppress noncritical messages
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Be verbose; repeat for more detail
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Block size 100k
    #[clap(short = '1', group = "level")]
    l1: bool,
    /// Block size 200k
    #[clap(short = '2', group = "level")]
    l2: bool,
    /// Block size 300k
    #[clap(short = '3', group = "level")]
    l3: bool,
    /// Block size 400k
    #[clap(short = '4', group = "level")]
    l4: bool,
    /// Block size 500k
    #[clap(short = '5', group = "level")]
    l5: bool,
    /// Block size 600k
    #[clap(short = '6', group = "level")]
    l6: bool,
    /// Block size 700k
    #[clap(short = '7', group = "level")]
    l7: bool,
    /// Block size 800k
    #[clap(short = '8', group = "level")]
    l8: bool,
    /// Block size 900k (default)
    #[clap(short = '9', group = "level")]
    l9: bool,

    /// Alias for -1
    #[clap(long = "fast", group = "level")]
    fast: bool,

    /// Alias for -9
    #[clap(long = "best", group = "level")]
    best: bool,

    /// Close blocks on all cores
    #[clap(long = "parallel")]
    parallel: bool,

    /// Huffman table optimisation passes. 4 is the value used by bzip2.
    #[clap(long = "passes", default_value_t = 4)]
    passes: usize,
}

impl Args {
    /// The block size chosen on the command line, if any.
    fn level(&self) -> u8 {
        let flags = [
            self.l1 || self.fast,
            self.l2,
            self.l3,
            self.l4,
            self.l5,
            self.l6,
            self.l7,
            self.l8,
            self.l9 || self.best,
        ];
        flags
            .iter()
            .position(|&set| set)
            .map_or(9, |idx| idx as u8 + 1)
    }
}

/// Settings for one run of the program.
#[derive(Debug)]
pub struct BzOpts {
    /// Vec of names of files to read for input
    pub files: Vec<String>,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Block size, huffman passes and parallelism
    pub encoder: EncoderOptions,
    /// Verbosity of user information
    pub verbosity: LevelFilter,
}

impl From<Args> for BzOpts {
    fn from(args: Args) -> Self {
        let op_mode = if args.decompress {
            Mode::Unzip
        } else if args.test {
            Mode::Test
        } else {
            Mode::Zip
        };
        let verbosity = if args.quiet {
            LevelFilter::Off
        } else {
            match args.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        };
        let encoder = EncoderOptions {
            level: CompressionLevel::new(args.level()),
            huffman_passes: args.passes,
            parallel: args.parallel,
        }
        .normalized();
        // No files means a filter from stdin to stdout
        let output = if args.stdout || args.files.is_empty() {
            Output::Stdout
        } else {
            Output::File
        };
        Self {
            files: args.files,
            op_mode,
            output,
            force_overwrite: args.force,
            keep_input_files: args.keep || args.stdout,
            encoder,
            verbosity,
        }
    }
}

/// Parse the command line.
pub fn bzopts_init() -> BzOpts {
    BzOpts::from(Args::parse())
}

/// Name of the file written when compressing or decompressing `input`.
pub fn output_name(input: &str, mode: Mode) -> String {
    match mode {
        Mode::Unzip => {
            for ext in [".bz2", ".bz"] {
                if let Some(stem) = input.strip_suffix(ext) {
                    if !stem.is_empty() {
                        return stem.to_string();
                    }
                }
            }
            format!("{}.out", input)
        }
        _ => format!("{}.bz2", input),
    }
}

#[cfg(test)]
mod test {
    use super::{output_name, Args, BzOpts, Mode, Output};
    use clap::Parser;
    use log::LevelFilter;

    fn opts(args: &[&str]) -> BzOpts {
        BzOpts::from(Args::parse_from(args))
    }

    #[test]
    fn defaults_test() {
        let o = opts(&["rbzip2", "a.txt"]);
        assert_eq!(o.op_mode, Mode::Zip);
        assert_eq!(o.output, Output::File);
        assert_eq!(o.encoder.level.level(), 9);
        assert_eq!(o.encoder.huffman_passes, 4);
        assert_eq!(o.verbosity, LevelFilter::Warn);
        assert!(!o.keep_input_files);
    }

    #[test]
    fn flags_test() {
        let o = opts(&["rbzip2", "-d", "-k", "-3", "-vv", "x.bz2"]);
        assert_eq!(o.op_mode, Mode::Unzip);
        assert!(o.keep_input_files);
        assert_eq!(o.encoder.level.level(), 3);
        assert_eq!(o.verbosity, LevelFilter::Debug);
        assert_eq!(o.files, vec!["x.bz2".to_string()]);
    }

    #[test]
    fn aliases_and_stdin_test() {
        let o = opts(&["rbzip2", "--fast", "-q", "--parallel"]);
        assert_eq!(o.encoder.level.level(), 1);
        assert_eq!(o.verbosity, LevelFilter::Off);
        assert_eq!(o.output, Output::Stdout);
        assert!(o.encoder.parallel);
    }

    #[test]
    fn conflicting_levels_are_rejected() {
        assert!(Args::try_parse_from(["rbzip2", "-1", "-9"]).is_err());
        assert!(Args::try_parse_from(["rbzip2", "-d", "-t"]).is_err());
    }

    #[test]
    fn output_name_test() {
        assert_eq!(output_name("a.txt", Mode::Zip), "a.txt.bz2");
        assert_eq!(output_name("a.txt.bz2", Mode::Unzip), "a.txt");
        assert_eq!(output_name("a.bz", Mode::Unzip), "a");
        assert_eq!(output_name("a.dat", Mode::Unzip), "a.dat.out");
        assert_eq!(output_name(".bz2", Mode::Unzip), ".bz2.out");
    }
}
