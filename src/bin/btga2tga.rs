//! Batch converter: decodes each BTGA texture and writes `<input>.tga` next to it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::{Level, info, warn};
use zenbtga::{BtgaError, DecodeRequest, FormatVersion, IoSource, Unstoppable};

fn usage(program: &str) -> ExitCode {
    eprintln!("Usage: {program} [-v] <version 1-4> <file or directory>...");
    ExitCode::from(2)
}

fn is_tga(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("tga"))
}

/// Expand directories (non-recursively) into the files they contain.
fn collect_inputs(paths: &[String]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for arg in paths {
        let path = PathBuf::from(arg);
        if !path.is_dir() {
            inputs.push(path);
            continue;
        }
        match fs::read_dir(&path) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.is_file() && !is_tga(p))
                    .collect();
                files.sort();
                inputs.extend(files);
            }
            Err(e) => warn!(path = %path.display(), "cannot read directory: {e}"),
        }
    }
    inputs
}

fn output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".tga");
    PathBuf::from(name)
}

/// Write `bytes` to a sibling temp file, then rename it over `output`.
///
/// On failure the temp file is removed and `output` is left untouched.
fn write_output(output: &Path, bytes: &[u8]) -> Result<(), BtgaError> {
    let mut partial = output.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let written = fs::write(&partial, bytes);
    if let Err(e) = written.and_then(|()| fs::rename(&partial, output)) {
        let _ = fs::remove_file(&partial);
        return Err(BtgaError::Output(e));
    }
    Ok(())
}

/// Decode one file and write its TGA. Nothing is written unless decoding succeeds.
fn convert(request: &DecodeRequest<'_>, input: &Path) -> Result<PathBuf, BtgaError> {
    let file = fs::File::open(input)?;
    let mut source = IoSource::new(std::io::BufReader::new(file))?;
    let decoded = request.decode_source(&mut source, Unstoppable)?;
    let tga = decoded.to_tga(Unstoppable)?;

    let output = output_path(input);
    write_output(&output, &tga)?;
    Ok(output)
}

fn main() -> ExitCode {
    let mut args: Vec<String> = env::args().collect();
    let program = if args.is_empty() {
        String::from("btga2tga")
    } else {
        args.remove(0)
    };

    let verbose = args.first().is_some_and(|a| a == "-v");
    if verbose {
        args.remove(0);
    }

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    if args.len() < 2 {
        return usage(&program);
    }
    let version: FormatVersion = match args[0].parse() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            return usage(&program);
        }
    };

    let request = DecodeRequest::new(version);
    let inputs = collect_inputs(&args[1..]);
    let mut converted = 0usize;
    for input in &inputs {
        match convert(&request, input) {
            Ok(output) => {
                info!(input = %input.display(), output = %output.display(), "converted");
                converted += 1;
            }
            Err(e) => warn!(input = %input.display(), "{e}"),
        }
    }

    println!("Successfully converted {converted} files");
    ExitCode::SUCCESS
}
