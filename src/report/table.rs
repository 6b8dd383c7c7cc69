//! Fixed-width text tables.

/// Horizontal alignment of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// One column: header, minimum width, alignment and value accessor.
pub struct Column<'a, T> {
    header: String,
    width: usize,
    align: Align,
    value: Box<dyn Fn(&T) -> String + 'a>,
}

impl<'a, T> Column<'a, T> {
    /// Left-aligned column.
    pub fn new(header: &str, width: usize, value: impl Fn(&T) -> String + 'a) -> Self {
        Self {
            header: header.to_string(),
            width,
            align: Align::Left,
            value: Box::new(value),
        }
    }

    /// Right-align this column.
    pub fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    fn pad(&self, text: &str) -> String {
        match self.align {
            Align::Left => format!("{:<width$}", text, width = self.width),
            Align::Right => format!("{:>width$}", text, width = self.width),
        }
    }
}

/// Table rendered as `|`-delimited rows with a dash separator.
pub struct Table<'a, T> {
    columns: Vec<Column<'a, T>>,
}

impl<'a, T> Table<'a, T> {
    pub fn new(columns: Vec<Column<'a, T>>) -> Self {
        Self { columns }
    }

    /// Render header, separator, one row per item and the total line.
    pub fn render(&self, items: &[T], noun: &str) -> String {
        let mut output = String::new();

        output.push_str(&self.row(self.columns.iter().map(|c| c.pad(&c.header))));
        output.push_str(&self.row(self.columns.iter().map(|c| "-".repeat(c.width))));

        for item in items {
            output.push_str(&self.row(self.columns.iter().map(|c| c.pad(&(c.value)(item)))));
        }

        output.push('\n');
        output.push_str(&format!("Total: {} {}\n", items.len(), noun));

        output
    }

    fn row(&self, cells: impl Iterator<Item = String>) -> String {
        let mut line = String::from("|");
        for cell in cells {
            line.push_str(&cell);
            line.push('|');
        }
        line.push('\n');
        line
    }
}

/// Average as a whole number; empty when there was no data.
pub fn format_average(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        format!("{:.0}", value)
    }
}

/// Average with two decimals; empty when there was no data.
pub fn format_decimal(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate;
    use crate::models::{GroupSummary, Measure, NormalizedRecord};

    fn company_table<'a>() -> Table<'a, GroupSummary<String>> {
        Table::new(vec![
            Column::new("Company", 10, |g: &GroupSummary<String>| g.key.clone()),
            Column::new("Count", 5, |g: &GroupSummary<String>| g.count.to_string()).right(),
            Column::new("Salary", 8, |g: &GroupSummary<String>| {
                format_average(g.average(Measure::Salary))
            }),
        ])
    }

    #[test]
    fn test_render_layout() {
        let groups = vec![GroupSummary {
            key: "Acme".to_string(),
            count: 2,
            averages: vec![(Measure::Salary, 150.0)],
        }];

        let text = company_table().render(&groups, "companies");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "|Company   |Count|Salary  |");
        assert_eq!(lines[1], "|----------|-----|--------|");
        assert_eq!(lines[2], "|Acme      |    2|150     |");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Total: 1 companies");
    }

    #[test]
    fn test_zero_average_renders_empty() {
        let records = vec![NormalizedRecord {
            company: "Acme".to_string(),
            ..NormalizedRecord::default()
        }];
        let groups = aggregate(&records, |r| r.company.clone(), &[Measure::Salary]);

        let text = company_table().render(&groups, "companies");
        let row = text.lines().nth(2).unwrap();

        assert_eq!(row, "|Acme      |    1|        |");
        assert!(!row.contains('0'));
    }

    #[test]
    fn test_empty_table() {
        let text = company_table().render(&[], "companies");
        assert_eq!(text.lines().count(), 4);
        assert!(text.ends_with("Total: 0 companies\n"));
    }

    #[test]
    fn test_long_values_are_not_truncated() {
        let table: Table<&str> = Table::new(vec![Column::new("Name", 3, |s: &&str| s.to_string())]);
        let text = table.render(&["abcdef"], "names");
        assert!(text.contains("|abcdef|"));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_average(0.0), "");
        assert_eq!(format_average(149.6), "150");
        assert_eq!(format_decimal(0.0), "");
        assert_eq!(format_decimal(3.14159), "3.14");
    }
}
