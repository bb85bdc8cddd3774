use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{settings_error, CliResult, SUCCESS};
use crate::output::{sync_word_hex, OutputFormat};

#[derive(Serialize)]
struct ChannelOutput {
    index: usize,
    byte_offset: usize,
    byte_length: usize,
    format: &'static str,
    endianness: &'static str,
    enabled: bool,
}

#[derive(Serialize)]
struct InfoOutput<'a> {
    schema_id: &'a str,
    sync_word: String,
    total_length: usize,
    payload_size: usize,
    wire_size: usize,
    checksum: &'a str,
    checksum_enabled: bool,
    channels: Vec<ChannelOutput>,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = framelock_settings::read_file(&args.config)
        .map_err(|err| settings_error("loading layout failed", err))?;

    let channels: Vec<ChannelOutput> = layout
        .channels
        .iter()
        .enumerate()
        .map(|(index, channel)| ChannelOutput {
            index,
            byte_offset: channel.byte_offset,
            byte_length: channel.byte_length(),
            format: channel.format.as_str(),
            endianness: channel.byte_order.as_str(),
            enabled: channel.enabled,
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = InfoOutput {
                schema_id: "https://schemas.3leaps.dev/framelock/cli/v1/layout-info.schema.json",
                sync_word: sync_word_hex(&layout),
                total_length: layout.total_length,
                payload_size: layout.payload_size(),
                wire_size: layout.wire_size(),
                checksum: layout.checksum.algorithm.as_str(),
                checksum_enabled: layout.checksum.enabled,
                channels,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!(
                "sync [{}]  payload {}B  wire {}B  checksum {}{}",
                sync_word_hex(&layout),
                layout.payload_size(),
                layout.wire_size(),
                layout.checksum.algorithm,
                if layout.checksum.enabled { "" } else { " (off)" }
            );

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "CHANNEL", "OFFSET", "LENGTH", "FORMAT", "ORDER", "ENABLED",
                ]);
            for channel in &channels {
                table.add_row(vec![
                    channel.index.to_string(),
                    channel.byte_offset.to_string(),
                    channel.byte_length.to_string(),
                    channel.format.to_string(),
                    channel.endianness.to_string(),
                    channel.enabled.to_string(),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(SUCCESS)
}
