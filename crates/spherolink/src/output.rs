use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use spherolink_stream::DecodedFrame;

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

/// Print one result. `rows` is the human-readable rendering of `value`.
pub fn print_record<T: Serialize>(value: &T, rows: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(value)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in rows {
                table.add_row(vec![field.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let width = rows.iter().map(|(field, _)| field.len()).max().unwrap_or(0);
            for (field, value) in rows {
                println!("{field:<width$}  {value}");
            }
        }
    }
}

/// Print decoded sensor frames, one line or row per frame.
pub fn print_frames(frames: &[DecodedFrame], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for frame in frames {
                println!("{}", to_json(frame));
            }
        }
        OutputFormat::Table => {
            let Some(first) = frames.first() else {
                return;
            };
            let header: Vec<String> = first
                .readings
                .iter()
                .flat_map(|reading| {
                    reading
                        .group
                        .fields()
                        .iter()
                        .map(move |field| format!("{}.{field}", reading.group))
                })
                .collect();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header);
            for frame in frames {
                table.add_row(
                    frame
                        .readings
                        .iter()
                        .flat_map(|reading| reading.values.iter().map(|value| format!("{value:.4}")))
                        .collect::<Vec<_>>(),
                );
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in frames {
                let line = frame
                    .readings
                    .iter()
                    .map(|reading| {
                        let values = reading
                            .group
                            .fields()
                            .iter()
                            .zip(&reading.values)
                            .map(|(field, value)| format!("{field}={value:.4}"))
                            .collect::<Vec<_>>()
                            .join(" ");
                        format!("{} [{values}]", reading.group)
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
