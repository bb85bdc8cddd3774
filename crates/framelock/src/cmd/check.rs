use serde::Serialize;

use crate::cmd::CheckArgs;
use crate::exit::{settings_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{sync_word_hex, OutputFormat};

#[derive(Serialize)]
struct CheckOutput<'a> {
    schema_id: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    sync_word: String,
    payload_size: usize,
    wire_size: usize,
    num_channels: usize,
}

pub fn run(args: CheckArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = framelock_settings::read_file(&args.config)
        .map_err(|err| settings_error("loading layout failed", err))?;

    let error = layout.validate().err();
    let valid = error.is_none();

    match format {
        OutputFormat::Json => {
            let out = CheckOutput {
                schema_id: "https://schemas.3leaps.dev/framelock/cli/v1/layout-check.schema.json",
                valid,
                error: error.as_ref().map(|err| err.to_string()),
                sync_word: sync_word_hex(&layout),
                payload_size: layout.payload_size(),
                wire_size: layout.wire_size(),
                num_channels: layout.num_channels(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => match &error {
            Some(err) => println!("layout is invalid: {err}"),
            None => println!(
                "layout is valid: sync [{}], payload {} bytes, {} bytes on the wire, {} channels",
                sync_word_hex(&layout),
                layout.payload_size(),
                layout.wire_size(),
                layout.num_channels()
            ),
        },
    }

    Ok(if valid { SUCCESS } else { DATA_INVALID })
}
