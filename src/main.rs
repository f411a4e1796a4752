//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use rbzip2::tools::cli::{bzopts_init, output_name, BzOpts, Mode, Output};
use rbzip2::{compress_parallel, test_integrity, BzError, Bz2Reader, Bz2Writer, Result};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> ExitCode {
    let options = bzopts_init();

    // Available log levels are Error, Warn, Info, Debug, Trace. Messages go to stderr so they
    // never mix with -c output.
    if let Err(e) = TermLogger::init(
        options.verbosity,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Could not start the logger: {}", e);
    }

    //----- Figure how what we need to do and go do it
    let mut failures = 0;
    if options.files.is_empty() {
        if let Err(e) = process_stdin(&options) {
            error!("(stdin): {}", e);
            failures += 1;
        }
    } else {
        for name in &options.files {
            if let Err(e) = process_file(&options, name) {
                error!("{}: {}", name, e);
                failures += 1;
            }
        }
    }

    info!("Done.");
    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Filter standard input to standard output.
fn process_stdin(opts: &BzOpts) -> Result<()> {
    let stdin = io::stdin();
    let input = stdin.lock();
    match opts.op_mode {
        Mode::Test => report_test(opts, "(stdin)", input),
        _ => {
            let stdout = io::stdout();
            let output = stdout.lock();
            run(opts, input, output)
        }
    }
}

/// Compress, decompress or test one named file.
fn process_file(opts: &BzOpts, name: &str) -> Result<()> {
    let path = Path::new(name);
    if !path.is_file() {
        warn!("{}: not a regular file, skipping.", name);
        return Ok(());
    }
    let input = BufReader::new(File::open(path)?);

    if opts.op_mode == Mode::Test {
        return report_test(opts, name, input);
    }

    if opts.output == Output::Stdout {
        let stdout = io::stdout();
        return run(opts, input, stdout.lock());
    }

    let out_name = output_name(name, opts.op_mode);
    if Path::new(&out_name).exists() && !opts.force_overwrite {
        warn!("{}: output file {} already exists, skipping.", name, out_name);
        return Ok(());
    }
    let output = BufWriter::new(File::create(&out_name)?);
    if let Err(e) = run(opts, input, output) {
        // A partial output file is worthless
        let _ = fs::remove_file(&out_name);
        return Err(e);
    }
    info!("{} -> {}", name, out_name);

    if !opts.keep_input_files {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Move data from `input` to `output` in the selected direction.
fn run<R: Read, W: Write>(opts: &BzOpts, mut input: R, mut output: W) -> Result<()> {
    match opts.op_mode {
        Mode::Zip if opts.encoder.parallel => {
            // Block boundaries are found up front, so the whole input is needed
            let mut data = Vec::new();
            input.read_to_end(&mut data)?;
            output.write_all(&compress_parallel(&data, &opts.encoder)?)?;
            output.flush()?;
        }
        Mode::Zip => {
            let mut writer = Bz2Writer::new(output, opts.encoder);
            io::copy(&mut input, &mut writer)?;
            writer.finish()?.flush()?;
        }
        Mode::Unzip => {
            let mut reader = Bz2Reader::new(input);
            io::copy(&mut reader, &mut output).map_err(unwrap_io)?;
            output.flush()?;
        }
        Mode::Test => {
            test_integrity(input)?;
        }
    }
    Ok(())
}

/// Test one stream and say how it went.
fn report_test<R: Read>(opts: &BzOpts, name: &str, input: R) -> Result<()> {
    let summary = test_integrity(input)?;
    if opts.verbosity >= log::LevelFilter::Warn {
        eprintln!(
            "{}: ok ({} blocks, {} bytes, CRC {:#010x})",
            name, summary.blocks, summary.bytes, summary.stream_crc
        );
    }
    Ok(())
}

/// Recover the BzError an io::Error was built from, if there is one.
fn unwrap_io(e: io::Error) -> BzError {
    if !e.get_ref().map_or(false, |inner| inner.is::<BzError>()) {
        return BzError::Io(e);
    }
    match e.into_inner().map(|inner| inner.downcast::<BzError>()) {
        Some(Ok(bz)) => *bz,
        _ => BzError::Io(io::Error::new(io::ErrorKind::InvalidData, "corrupt stream")),
    }
}
