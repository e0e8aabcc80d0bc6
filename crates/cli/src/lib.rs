#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser};
use digests::to_hex;
use engine::{AlgorithmSet, EngineError, FileHasher, HashOutput, HashRequest, ProgressAction};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Version banner printed by `--version`.
const VERSION_BANNER: &str = concat!("fhash ", env!("CARGO_PKG_VERSION"), "\n");

/// Help text describing the supported command surface.
const HELP_TEXT: &str = concat!(
    "Usage: fhash [-h] [-V] [-a] [-4] [-5] [-c] [-e] [-s] [--progress] [--] FILE...\n",
    "\n",
    "Computes file checksums in a single read pass. Any combination of the\n",
    "supported algorithms may be selected:\n",
    "  -a, --all        Hash with every supported algorithm.\n",
    "  -4, --md4        Compute the MD4 digest of the input file(s).\n",
    "  -5, --md5        Compute the MD5 digest of the input file(s).\n",
    "  -c, --crc32      Compute the CRC32 checksum of the input file(s).\n",
    "  -e, --ed2k       Compute the composite ed2k block hash of the input file(s).\n",
    "  -s, --sha1       Compute the SHA-1 digest of the input file(s).\n",
    "      --progress   Report hashing progress on standard error.\n",
    "  -h, --help       Print this help screen and exit.\n",
    "  -V, --version    Print version information and exit.\n",
    "\n",
    "Options may be separated from the file list with two dashes ('--');\n",
    "file names after the separator may begin with a dash. Without any\n",
    "algorithm option every algorithm is computed, as with --all. Repeated\n",
    "file names are hashed once.\n",
    "\n",
    "EXAMPLES:\n",
    "  fhash -c --ed2k -- file1.mkv file2.mkv\n",
    "      Compute the CRC32 and ed2k hashes of both files.\n",
    "  fhash file1.mkv\n",
    "      Compute every hash of file1.mkv.\n",
);

/// Parsed command produced by [`parse_args`].
#[derive(Debug)]
struct ParsedArgs {
    show_help: bool,
    show_version: bool,
    algorithms: AlgorithmSet,
    progress: bool,
    files: Vec<OsString>,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new("fhash")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg_required_else_help(false)
        .arg(
            Arg::new("all")
                .long("all")
                .short('a')
                .help("Hash with every supported algorithm.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("md4")
                .long("md4")
                .short('4')
                .help("Compute the MD4 digest of the input file(s).")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("md5")
                .long("md5")
                .short('5')
                .help("Compute the MD5 digest of the input file(s).")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("crc32")
                .long("crc32")
                .short('c')
                .help("Compute the CRC32 checksum of the input file(s).")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ed2k")
                .long("ed2k")
                .short('e')
                .help("Compute the composite ed2k block hash of the input file(s).")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sha1")
                .long("sha1")
                .short('s')
                .help("Compute the SHA-1 digest of the input file(s).")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Report hashing progress on standard error.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Print this help screen and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Print version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("files")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from("fhash"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    let mut algorithms = AlgorithmSet::EMPTY;
    if matches.get_flag("crc32") {
        algorithms |= AlgorithmSet::CRC32;
    }
    if matches.get_flag("ed2k") {
        algorithms |= AlgorithmSet::ED2K;
    }
    if matches.get_flag("md4") {
        algorithms |= AlgorithmSet::MD4;
    }
    if matches.get_flag("md5") {
        algorithms |= AlgorithmSet::MD5;
    }
    if matches.get_flag("sha1") {
        algorithms |= AlgorithmSet::SHA1;
    }
    // No algorithm option selects everything, matching --all.
    if matches.get_flag("all") || algorithms.is_empty() {
        algorithms = AlgorithmSet::ALL;
    }

    let files = matches
        .remove_many::<OsString>("files")
        .map(|values| values.collect())
        .unwrap_or_default();

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        algorithms,
        progress: matches.get_flag("progress"),
        files,
    })
}

/// Drops repeated operands, keeping the first occurrence order.
fn dedup_files(files: Vec<OsString>) -> Vec<OsString> {
    let mut unique: Vec<OsString> = Vec::with_capacity(files.len());
    for file in files {
        if !unique.contains(&file) {
            unique.push(file);
        }
    }
    unique
}

/// Installs the stderr logging subscriber.
///
/// `RUST_LOG` selects the filter. Repeated calls keep the first
/// subscriber, so tests can drive [`run`] more than once.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

/// Runs the hasher using the provided argument iterator and output handles.
///
/// The first argument is the program name, matching `std::env::args_os`.
/// Returns the process exit code: `0` when every file hashed, non-zero
/// otherwise.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    init_tracing();
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            1
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    let ParsedArgs {
        show_help,
        show_version,
        algorithms,
        progress,
        files,
    } = parsed;

    if show_help {
        if stdout.write_all(HELP_TEXT.as_bytes()).is_err() {
            return 1;
        }
        return 0;
    }

    if show_version {
        if stdout.write_all(VERSION_BANNER.as_bytes()).is_err() {
            return 1;
        }
        return 0;
    }

    if files.is_empty() {
        let _ = writeln!(stderr, "fhash: missing file operands");
        let _ = stderr.write_all(HELP_TEXT.as_bytes());
        return 1;
    }

    let files = dedup_files(files);
    debug!(?algorithms, files = files.len(), "hashing file list");

    let hasher = FileHasher::new();
    let mut any_failed = false;
    for (index, file) in files.into_iter().enumerate() {
        let request = HashRequest::new(index as u64, algorithms, PathBuf::from(file));
        match hash_one(&hasher, &request, progress, stderr) {
            Ok(output) => {
                if render_output(stdout, &request.path, &output).is_err() {
                    return 1;
                }
            }
            Err(error) => {
                any_failed = true;
                let _ = writeln!(
                    stderr,
                    "{}: {}",
                    request.path.display(),
                    failure_reason(&error)
                );
            }
        }
    }

    i32::from(any_failed)
}

/// Hashes one file, rendering a carriage-return progress line when asked.
fn hash_one<Err>(
    hasher: &FileHasher,
    request: &HashRequest,
    progress: bool,
    stderr: &mut Err,
) -> Result<HashOutput, EngineError>
where
    Err: Write,
{
    if !progress {
        return hasher.hash_file(request);
    }

    let label = request.path.display().to_string();
    let result = hasher.hash_file_with_progress(request, |update| {
        let _ = write!(stderr, "\r{label}: {:5.1}%", update.percentage());
        let _ = stderr.flush();
        ProgressAction::Continue
    });
    let _ = writeln!(stderr);
    result
}

/// Writes the per-file digest block, one labelled hex line per slot.
fn render_output<W: Write>(writer: &mut W, path: &Path, output: &HashOutput) -> io::Result<()> {
    writeln!(writer, "{}:", path.display())?;
    if let Some(crc32) = output.crc32() {
        writeln!(writer, "    {:>5}: {}", "CRC32", to_hex(&crc32))?;
    }
    if let Some(md4) = output.md4() {
        writeln!(writer, "    {:>5}: {}", "MD4", to_hex(&md4))?;
    }
    if let Some(md5) = output.md5() {
        writeln!(writer, "    {:>5}: {}", "MD5", to_hex(&md5))?;
    }
    if let Some(sha1) = output.sha1() {
        writeln!(writer, "    {:>5}: {}", "SHA1", to_hex(&sha1))?;
    }
    if let Some(ed2k) = output.ed2k() {
        writeln!(writer, "    {:>5}: {}", "ED2K", to_hex(&ed2k))?;
    }
    Ok(())
}

/// Maps an engine failure to the short reason printed after the path.
fn failure_reason(error: &EngineError) -> String {
    match error {
        EngineError::Open { source, .. } => format!("unable to open file ({source})"),
        EngineError::IsDirectory { .. } => String::from("cannot process directories"),
        EngineError::Read { source, .. } => format!("unable to read file ({source})"),
        other => other.to_string(),
    }
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}
