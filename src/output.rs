//! Rendering a filtered view of JSON records

use crate::config::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};

/// Write `view` for the settled `query`, printing at most `limit` records.
pub fn write_view<W, T>(
    out: &mut W,
    view: &[&T],
    query: &str,
    format: OutputFormat,
    limit: Option<usize>,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    let shown = &view[..view.len().min(limit.unwrap_or(usize::MAX))];

    match format {
        OutputFormat::Text => {
            if view.is_empty() {
                writeln!(out, "No matches for {query:?}.")?;
            } else {
                writeln!(out, "Found {} matches for {query:?}:", view.len())?;
                for record in shown {
                    writeln!(out, "  {}", serde_json::to_string(record)?)?;
                }
                if shown.len() < view.len() {
                    writeln!(out, "  ({} more)", view.len() - shown.len())?;
                }
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, shown)?;
            writeln!(out)?;
        }
        OutputFormat::JsonL => {
            for record in shown {
                serde_json::to_writer(&mut *out, record)?;
                writeln!(out)?;
            }
        }
    }

    out.flush()
}
