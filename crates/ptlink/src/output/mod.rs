//! Output formatting (JSON/text) for Path Tracing records.

mod printable;

use std::io::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Don't resolve names (show interface indexes).
    pub numeric: bool,
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Trait for types that can be printed.
pub trait Printable {
    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()>;

    /// Convert to JSON value.
    fn to_json(&self, opts: &OutputOptions) -> serde_json::Value;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> std::io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w, opts),
            OutputFormat::Json => write_json(w, &self.to_json(opts), opts),
        }
    }
}

/// Print a list of items to stdout.
///
/// JSON output is a single array, so an empty list prints `[]`.
pub fn print_all<T: Printable>(
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    print_all_to(&mut stdout, items, format, opts)
}

/// Print a list of items to a custom writer.
pub fn print_all_to<W: Write, T: Printable>(
    w: &mut W,
    items: &[T],
    format: OutputFormat,
    opts: &OutputOptions,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => {
            for item in items {
                item.print_text(w, opts)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let json: Vec<_> = items.iter().map(|i| i.to_json(opts)).collect();
            write_json(w, &serde_json::Value::Array(json), opts)
        }
    }
}

fn write_json<W: Write>(w: &mut W, json: &serde_json::Value, opts: &OutputOptions) -> std::io::Result<()> {
    if opts.pretty {
        serde_json::to_writer_pretty(&mut *w, json)?;
    } else {
        serde_json::to_writer(&mut *w, json)?;
    }
    writeln!(w)
}

/// Interface label: the name, or the bare index in numeric mode or when
/// the interface no longer exists.
pub fn dev_label(ifindex: i32, opts: &OutputOptions) -> String {
    if opts.numeric {
        ifindex.to_string()
    } else {
        crate::util::name_or_index(ifindex)
    }
}
