//! Family BASIC cassette tape tool

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand};

use fbasic::data::{load_encoding_profile, FileInfo, FileType, TapeFile};
use fbasic::detokenizer::program_to_text;
use fbasic::tape_file;
use fbasic::tokenizer::text_to_program;

use tape::{TapeEncodingInfo, TapeReader, TapeWriter};

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

macro_rules! error {
    ($($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit(1);
    }};
}

#[derive(Parser)]
#[command(author, version)]
#[command(about = "Family BASIC cassette tape tool")]
#[command(arg_required_else_help = true)]
struct ArgParser {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a cassette recording into the files it carries
    Play(PlayArgs),

    /// Encode a binary file into a playable cassette recording
    Record(RecordArgs),

    /// Convert BASIC files to/from text representation
    Basic(BasicArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct OutputArg {
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "output file"
    )]
    path: Option<PathBuf>,

    #[arg(long, help = "Write to stdout")]
    stdout: bool,
}

enum OutputTarget {
    Path(PathBuf),
    Stdout,
}

impl OutputArg {
    fn validate(&self) -> OutputTarget {
        match (&self.path, self.stdout) {
            (Some(path), false) => OutputTarget::Path(path.clone()),
            (None, true) => OutputTarget::Stdout,
            _ => error!("Expected either --output or --stdout"),
        }
    }
}

#[derive(Args)]
struct EncodingArg {
    #[arg(
        long,
        value_name = "FILE",
        help = "tape encoding profile (JSON), overriding the defaults"
    )]
    profile: Option<PathBuf>,
}

impl EncodingArg {
    fn load(&self) -> TapeEncodingInfo {
        match &self.profile {
            None => TapeEncodingInfo::default(),
            Some(path) => match load_encoding_profile(path) {
                Ok(enc) => enc,
                Err(e) => error!("{}", e),
            },
        }
    }
}

// Play
// ====

#[derive(Args)]
struct PlayArgs {
    #[arg(value_name = "WAV", help = "input recording")]
    input: PathBuf,

    #[arg(value_name = "OUT_DIR", default_value = ".", help = "output directory")]
    out_dir: PathBuf,

    #[arg(
        short = 'r',
        long,
        help = "store raw metadata and preserve split files"
    )]
    raw: bool,

    #[command(flatten)]
    encoding: EncodingArg,
}

fn create_output_file(path: &Path, data: &[u8]) {
    let mut f = match File::create(path) {
        Ok(f) => f,
        Err(e) => error!("Unable to create {}: {}", path.display(), e),
    };
    if let Err(e) = f.write_all(data) {
        error!("Unable to write {}: {}", path.display(), e);
    }
}

fn play(args: PlayArgs) {
    let mut input = match File::open(&args.input) {
        Ok(f) => BufReader::new(f),
        Err(e) => error!("Unable to open {}: {}", args.input.display(), e),
    };

    let mut reader = match TapeReader::new(&mut input, args.encoding.load()) {
        Ok(r) => r,
        Err(e) => error!("Unable to read {}: {}", args.input.display(), e),
    };

    // Decode until the stream ends, keeping everything read so far.
    let mut files: Vec<TapeFile> = Vec::new();
    loop {
        match tape_file::read_file(&mut reader) {
            Ok(decoded) => {
                for w in &decoded.warnings {
                    eprintln!("warning: {}", w);
                }
                files.push(decoded.file);
            }
            Err(e) => {
                eprintln!("{}", e);
                break;
            }
        }
    }

    // Group same-named files, keeping their tape order.
    let mut groups: Vec<(String, Vec<&TapeFile>)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    for file in &files {
        let name = file.info.name_string();
        match group_index.get(&name) {
            Some(&i) => groups[i].1.push(file),
            None => {
                group_index.insert(name.clone(), groups.len());
                groups.push((name, vec![file]));
            }
        }
    }

    if args.raw {
        println!("found {} files", files.len());
    } else {
        println!("found {} files", groups.len());
    }

    for (name, group) in &groups {
        let extension = group[0].info.file_type.extension();

        if args.raw {
            for (i, file) in group.iter().enumerate() {
                println!(
                    "- {} ({}, {} bytes)",
                    name, file.info.file_type, file.info.length
                );

                let file_name = if group.len() >= 2 {
                    format!("{}_{}.{}", name, i, extension)
                } else {
                    format!("{}.{}", name, extension)
                };

                let path = args.out_dir.join(&file_name);
                create_output_file(&path, &file.data);
                create_output_file(
                    &path.with_file_name(format!("{}.info", file_name)),
                    &file.info.to_bytes(),
                );
            }
        } else {
            println!("- {} ({})", name, group[0].info.file_type);

            let mut data = Vec::new();
            for file in group {
                data.extend_from_slice(&file.data);
            }
            let path = args.out_dir.join(format!("{}.{}", name, extension));
            create_output_file(&path, &data);
        }
    }
}

// Record
// ======

#[derive(Args)]
struct RecordArgs {
    #[arg(value_name = "FILE", help = "input file (.prg or .gfx)")]
    input: PathBuf,

    #[arg(value_name = "OUT_WAV", help = "output file (default: FILE.wav)")]
    output: Option<PathBuf>,

    #[arg(
        short = 'r',
        long,
        value_name = "HZ",
        default_value_t = 32000,
        help = "audio sample rate"
    )]
    rate: u32,

    #[arg(long, value_name = "NAME", help = "tape file name")]
    name: Option<String>,

    #[command(flatten)]
    encoding: EncodingArg,
}

fn file_info_for_extension(extension: &str) -> Option<FileInfo> {
    match extension {
        "prg" => {
            let mut info = FileInfo::new(FileType::Basic);
            info.load_address = 0x6006;
            info.execution_address = 0x2020;
            Some(info)
        }
        "gfx" => {
            let mut info = FileInfo::new(FileType::BgGraphics);
            info.length = 0x100;
            info.load_address = 0x0700;
            info.execution_address = 0x2000;
            Some(info)
        }
        _ => None,
    }
}

fn record(args: RecordArgs) {
    let extension = args
        .input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut info = match file_info_for_extension(&extension) {
        Some(info) => info,
        None => error!("Cannot determine file type of {}", args.input.display()),
    };

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let tape_name = match &args.name {
        Some(name) => name.clone(),
        None => {
            let mut name = stem;
            if name.len() <= 13
                && info.file_type == FileType::BgGraphics
                && !name.ends_with(" BG")
            {
                name.push_str(" BG");
            }
            name
        }
    };
    if let Err(e) = info.set_name(&tape_name) {
        error!("Invalid tape name: {}", e);
    }

    let data = match std::fs::read(&args.input) {
        Ok(data) => data,
        Err(e) => error!("Unable to open {}: {}", args.input.display(), e),
    };

    if info.length == 0 {
        info.length = match u16::try_from(data.len()) {
            Ok(len) => len,
            Err(_) => error!("{} is too large for one tape file", args.input.display()),
        };
    }
    let chunk_size = usize::from(info.length);
    if !data.is_empty() && data.len() % chunk_size != 0 {
        error!(
            "{} is not a multiple of {} bytes",
            args.input.display(),
            chunk_size
        );
    }

    let output = match &args.output {
        Some(path) => path.clone(),
        None => {
            let mut os = args.input.as_os_str().to_owned();
            os.push(".wav");
            PathBuf::from(os)
        }
    };
    let out_file = match File::create(&output) {
        Ok(f) => BufWriter::new(f),
        Err(e) => error!("Unable to create {}: {}", output.display(), e),
    };

    let mut writer = match TapeWriter::new(out_file, args.encoding.load(), args.rate) {
        Ok(w) => w,
        Err(e) => error!("Unable to write {}: {}", output.display(), e),
    };

    // a zero-byte input records as bare leader silence, no data blocks
    let files: Vec<TapeFile> = if data.is_empty() {
        Vec::new()
    } else {
        data.chunks(chunk_size)
            .map(|chunk| TapeFile {
                info: info.clone(),
                data: chunk.to_vec(),
            })
            .collect()
    };

    if let Err(e) = tape_file::write_recording(&mut writer, &files) {
        error!("Unable to write {}: {}", output.display(), e);
    }

    match writer.finish() {
        Ok(mut w) => {
            if let Err(e) = w.flush() {
                error!("Unable to write {}: {}", output.display(), e);
            }
        }
        Err(e) => error!("Unable to write {}: {}", output.display(), e),
    }
}

// Basic
// =====

#[derive(Args)]
struct BasicArgs {
    #[command(flatten)]
    output: OutputArg,

    #[arg(value_name = "FILE", help = "input file")]
    input: PathBuf,

    #[arg(short = 'e', long, help = "encode to binary")]
    encode: bool,
}

fn write_output(target: &OutputTarget, data: &[u8]) {
    match target {
        OutputTarget::Path(path) => create_output_file(path, data),
        OutputTarget::Stdout => {
            if let Err(e) = std::io::stdout().write_all(data) {
                error!("Unable to write stdout: {}", e);
            }
        }
    }
}

fn basic(args: BasicArgs) {
    let output = args.output.validate();

    if args.encode {
        let text = match std::fs::read_to_string(&args.input) {
            Ok(text) => text,
            Err(e) => error!("Unable to open {}: {}", args.input.display(), e),
        };
        let program = match text_to_program(&text) {
            Ok(program) => program,
            Err(e) => error!("{}", e),
        };
        write_output(&output, &program);
    } else {
        let mut input = match File::open(&args.input) {
            Ok(f) => BufReader::new(f),
            Err(e) => error!("Unable to open {}: {}", args.input.display(), e),
        };
        let program = match program_to_text(&mut input) {
            Ok(program) => program,
            Err(e) => error!("{}", e),
        };
        for w in &program.warnings {
            eprintln!("warning: {}", w);
        }
        write_output(&output, program.text.as_bytes());
    }
}

fn main() {
    let args = ArgParser::parse();

    match args.command {
        Command::Play(args) => play(args),
        Command::Record(args) => record(args),
        Command::Basic(args) => basic(args),
    }
}
