use std::fs::File;
use std::io::{ErrorKind, Read};

use framelock_frame::FrameAssembler;

use crate::cmd::DecodeArgs;
use crate::exit::{config_error, io_error, settings_error, CliResult, SUCCESS};
use crate::output::{print_sample, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = framelock_settings::read_file(&args.config)
        .map_err(|err| settings_error("loading layout failed", err))?;
    layout
        .validate()
        .map_err(|err| config_error("layout is not usable", err))?;

    let mut assembler = FrameAssembler::new(layout);

    let mut reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).map_err(|err| io_error("opening input", err))?),
        None => Box::new(std::io::stdin().lock()),
    };

    let chunk_size = args.chunk_size.max(1);
    let mut chunk = vec![0u8; chunk_size];
    let mut bytes_in = 0u64;
    let mut printed = 0usize;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("reading input", err)),
        };

        let (consumed, samples) = assembler.process(&chunk[..read]);
        bytes_in += consumed as u64;

        for sample in samples {
            print_sample(printed, &sample, format);
            printed += 1;

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }

    tracing::info!(bytes = bytes_in, frames = printed, "input drained");
    Ok(SUCCESS)
}
