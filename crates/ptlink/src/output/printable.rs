//! Printable implementations for Path Tracing records.

use std::io::Write;

use crate::netlink::genl::hoppt::{HopptEntry, InterfaceBinding};
use crate::output::{OutputOptions, Printable, dev_label};

impl Printable for HopptEntry {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(
            w,
            "dev {} id {} (0x{:x}) tts {}",
            dev_label(self.ifindex, opts),
            self.id,
            self.id,
            self.template
        )
    }

    fn to_json(&self, opts: &OutputOptions) -> serde_json::Value {
        serde_json::json!({
            "dev": dev_label(self.ifindex, opts),
            "id": self.id,
            "tts": self.template.name(),
        })
    }
}

impl Printable for InterfaceBinding {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        writeln!(w, "incoming dev {}", dev_label(self.ifindex, opts))
    }

    fn to_json(&self, opts: &OutputOptions) -> serde_json::Value {
        serde_json::json!({ "incoming dev": dev_label(self.ifindex, opts) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::genl::hoppt::TtsTemplate;
    use crate::output::{OutputFormat, print_all_to};

    const NUMERIC: OutputOptions = OutputOptions {
        numeric: true,
        pretty: false,
    };

    fn render<T: Printable>(items: &[T], format: OutputFormat) -> String {
        let mut out = Vec::new();
        print_all_to(&mut out, items, format, &NUMERIC).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_entry_text() {
        let entries = [
            HopptEntry::new(7, 3, TtsTemplate::Template2),
            HopptEntry::new(4095, 12, TtsTemplate::Unspecified),
        ];
        assert_eq!(
            render(&entries, OutputFormat::Text),
            "dev 3 id 7 (0x7) tts template2\ndev 12 id 4095 (0xfff) tts unspec\n"
        );
    }

    #[test]
    fn test_invalid_template_text() {
        let entry = HopptEntry::new(1, 2, TtsTemplate::Invalid(9));
        assert_eq!(
            render(&[entry], OutputFormat::Text),
            "dev 2 id 1 (0x1) tts <invalid>\n"
        );
    }

    #[test]
    fn test_entry_json() {
        let out = render(&[HopptEntry::new(7, 3, TtsTemplate::Template4)], OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json, serde_json::json!([{ "dev": "3", "id": 7, "tts": "template4" }]));
    }

    #[test]
    fn test_source_text_and_json() {
        let sources = [InterfaceBinding::new(5), InterfaceBinding::new(6)];
        assert_eq!(
            render(&sources, OutputFormat::Text),
            "incoming dev 5\nincoming dev 6\n"
        );
        let json: serde_json::Value =
            serde_json::from_str(&render(&sources, OutputFormat::Json)).unwrap();
        assert_eq!(json[1]["incoming dev"], "6");
    }

    #[test]
    fn test_empty_list() {
        let none: [HopptEntry; 0] = [];
        assert_eq!(render(&none, OutputFormat::Text), "");
        assert_eq!(render(&none, OutputFormat::Json), "[]\n");
    }

    #[test]
    fn test_single_item_print() {
        let mut out = Vec::new();
        InterfaceBinding::new(9)
            .print(&mut out, OutputFormat::Json, &NUMERIC)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\"incoming dev\":\"9\"}\n");
    }
}
