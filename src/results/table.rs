use std::fmt::{self, Write};

use super::ResultSet;

fn text_width(s: &str) -> usize {
    s.chars().count()
}

fn write_rule(
    out: &mut impl Write,
    widths: &[usize],
    left: char,
    mid: char,
    right: char,
) -> fmt::Result {
    out.write_char(left)?;
    for (i, w) in widths.iter().enumerate() {
        out.write_str(&"─".repeat(w + 2))?;
        if i + 1 < widths.len() {
            out.write_char(mid)?;
        }
    }
    out.write_char(right)?;
    out.write_char('\n')
}

fn write_cells<'a>(
    out: &mut impl Write,
    widths: &[usize],
    mut cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    out.write_char('│')?;
    for &w in widths {
        let cell = cells.next().unwrap_or("");
        write!(out, " {cell:<w$} │")?;
    }
    out.write_char('\n')
}

impl ResultSet {
    /// Width of each column: the widest of its header and every cell under it.
    #[must_use]
    pub fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.columns().iter().map(|c| text_width(c)).collect();
        for row in self.data() {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(text_width(cell));
            }
        }
        widths
    }

    /// Render a fixed-width box table followed by a row-count footer.
    ///
    /// # Errors
    /// Propagates errors from the underlying writer.
    pub fn write_table(&self, out: &mut impl Write) -> fmt::Result {
        if self.columns().is_empty() {
            return out.write_str("(no columns)\n");
        }

        let widths = self.column_widths();
        write_rule(out, &widths, '┌', '┬', '┐')?;
        write_cells(out, &widths, self.columns().iter().map(String::as_str))?;
        write_rule(out, &widths, '├', '┼', '┤')?;
        for row in self.data() {
            write_cells(out, &widths, row.iter().map(String::as_str))?;
        }
        write_rule(out, &widths, '└', '┴', '┘')?;
        writeln!(out, "{} rows returned.", self.rows())
    }

    /// Print the table to stdout.
    pub fn print(&self) {
        print!("{self}");
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_table(f)
    }
}
