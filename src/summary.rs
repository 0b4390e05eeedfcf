use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportResult {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failure(&mut self, row: usize, title: Option<&str>, message: impl Into<String>) {
        self.errors += 1;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown");
        self.failures.push(RowFailure {
            row,
            title: title.to_owned(),
            message: message.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.success + self.skipped + self.errors
    }

    pub fn write_summary(&self, heading: &str, out: &mut dyn Write) -> io::Result<()> {
        let rule = "=".repeat(50);
        writeln!(out)?;
        writeln!(out, "{rule}")?;
        writeln!(out, "{heading}")?;
        writeln!(out, "{rule}")?;
        writeln!(out, "Succeeded: {}", self.success)?;
        writeln!(out, "Skipped (duplicates): {}", self.skipped)?;
        writeln!(out, "Errors: {}", self.errors)?;
        writeln!(out, "Total processed: {}", self.total())?;

        if !self.failures.is_empty() {
            writeln!(out)?;
            writeln!(out, "Error details:")?;
            for failure in &self.failures {
                writeln!(
                    out,
                    "  Row {} ({}): {}",
                    failure.row, failure.title, failure.message
                )?;
            }
        }

        writeln!(out, "{rule}")?;
        Ok(())
    }
}
