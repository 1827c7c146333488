use super::TabularFormatter;
use std::convert::Infallible;

/// Column-aligned plain text with a bold header line and a rule under it.
pub struct TextFormatter<'a> {
    no_headers: bool,
    separator: &'a str,
}

impl<'a> TextFormatter<'a> {
    pub fn new(no_headers: bool, separator: &'a str) -> Self {
        Self {
            no_headers,
            separator,
        }
    }

    fn push_row(&self, output: &mut String, cells: &[String], widths: &[usize], bold: bool) {
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if bold {
                output.push_str("\x1b[1m");
                output.push_str(cell);
                output.push_str("\x1b[0m");
            } else {
                output.push_str(cell);
            }
            if i != widths.len() - 1 {
                output.push_str(&" ".repeat(width - cell.chars().count()));
                output.push_str(self.separator);
            }
        }
    }
}

impl TabularFormatter for TextFormatter<'_> {
    type Error = Infallible;

    fn format<R, C>(&self, headers: &[&str], rows: R) -> Result<String, Self::Error>
    where
        R: IntoIterator<Item = Vec<C>>,
        C: ToString,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                rows.iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::new();
        if !self.no_headers && !headers.is_empty() {
            let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
            let mut line = String::new();
            self.push_row(&mut line, &header_cells, &widths, true);
            lines.push(line);
            let rule_len =
                widths.iter().sum::<usize>() + (widths.len() - 1) * self.separator.len();
            lines.push("-".repeat(rule_len));
        }
        for row in &rows {
            let mut line = String::new();
            self.push_row(&mut line, row, &widths, false);
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_formatter_aligns_columns() {
        let formatter = TextFormatter::new(true, " | ");
        let rows = vec![vec!["DEV", "eu-west-1"], vec!["PRODUCTION", "us-east-1"]];
        let output = formatter.format(&["Name", "Region"], rows).unwrap();
        assert_eq!(output, "DEV        | eu-west-1\nPRODUCTION | us-east-1");
    }

    #[test]
    fn test_text_formatter_headers() {
        let formatter = TextFormatter::new(false, " | ");
        let output = formatter.format(&["Name", "Region"], vec![vec!["DEV", "eu-west-1"]]).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "\x1b[1mName\x1b[0m | \x1b[1mRegion\x1b[0m");
        assert_eq!(lines[1], "-".repeat(4 + 3 + 9));
        assert_eq!(lines[2], "DEV  | eu-west-1");
    }
}
