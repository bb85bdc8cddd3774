use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use framelock_frame::{FrameFormat, SampleRecord};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SampleOutput<'a> {
    schema_id: &'a str,
    frame: usize,
    values: &'a [Option<f64>],
}

pub fn print_sample(frame: usize, sample: &SampleRecord, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SampleOutput {
                schema_id: "https://schemas.3leaps.dev/framelock/cli/v1/sample-record.schema.json",
                frame,
                values: sample.values(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            let mut header = vec!["FRAME".to_string()];
            header.extend((0..sample.num_channels()).map(|i| format!("CH{i}")));

            let mut row = vec![frame.to_string()];
            row.extend(sample.values().iter().map(|value| match value {
                Some(v) => v.to_string(),
                None => "-".to_string(),
            }));

            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header)
                .add_row(row);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let values: Vec<String> = sample
                .values()
                .iter()
                .enumerate()
                .map(|(i, value)| match value {
                    Some(v) => format!("ch{i}={v}"),
                    None => format!("ch{i}=-"),
                })
                .collect();
            println!("frame={} {}", frame, values.join(" "));
        }
    }
}

pub fn sync_word_hex(format: &FrameFormat) -> String {
    format
        .sync_word
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
