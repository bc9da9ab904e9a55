use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Heading {
    pub title: String,
    pub justify: Justify,
}

impl Heading {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            justify: Justify::Left,
        }
    }

    pub fn right(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            justify: Justify::Right,
        }
    }
}

/// Fixed-width text table, meant for a monospace code block
#[derive(Debug, Clone)]
pub struct Table {
    headings: Vec<Heading>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headings: Vec<Heading>) -> Self {
        Self {
            headings,
            rows: Vec::new(),
        }
    }

    /// Missing cells are rendered empty, extra cells are dropped
    pub fn add_row(&mut self, cells: Vec<String>) {
        let mut row = cells;
        row.resize(self.headings.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headings
            .iter()
            .enumerate()
            .map(|(column, heading)| {
                self.rows
                    .iter()
                    .map(|row| row[column].chars().count())
                    .chain(std::iter::once(heading.title.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn write_line<'a>(
        &self,
        f: &mut fmt::Formatter<'_>,
        cells: impl Iterator<Item = &'a str>,
        widths: &[usize],
    ) -> fmt::Result {
        let rendered: Vec<String> = cells
            .zip(self.headings.iter())
            .zip(widths)
            .map(|((cell, heading), width)| match heading.justify {
                Justify::Left => format!("{:<width$}", cell, width = width),
                Justify::Right => format!("{:>width$}", cell, width = width),
            })
            .collect();
        writeln!(f, "{}", rendered.join(" | ").trim_end())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        self.write_line(f, self.headings.iter().map(|h| h.title.as_str()), &widths)?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in &self.rows {
            self.write_line(f, row.iter().map(String::as_str), &widths)?;
        }
        Ok(())
    }
}
