//! 📊 The run report: what came in, what went out, and what got left behind.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};

use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub role: Role,
    /// lines, or the single slurped document
    pub pages_read: u64,
    pub entities_extracted: u64,
    pub records_delivered: u64,
    pub records_abandoned: u64,
    pub diagnostics: u64,
}

impl RunReport {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            pages_read: 0,
            entities_extracted: 0,
            records_delivered: 0,
            records_abandoned: 0,
            diagnostics: 0,
        }
    }

    /// 🍽️ Two columns, numbers right-aligned. Printed to stderr by the CLI on `--summary`.
    ///
    /// Mappers never abandon a record, so they don't get an abandoned row.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![Cell::new(self.role.to_string()), Cell::new("count")]);

        let mut rows = vec![
            ("pages read", self.pages_read),
            ("entities extracted", self.entities_extracted),
            ("records delivered", self.records_delivered),
        ];
        if self.role.is_reducer() {
            rows.push(("records abandoned", self.records_abandoned));
        }
        rows.push(("diagnostics", self.diagnostics));
        for (label, count) in rows {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
        table.to_string()
    }
}
