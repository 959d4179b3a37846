use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use csv::{ReaderBuilder, Trim};
use log::debug;

use super::error::{MapViewError, Result};

/// Rectangular grid of integer cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<i32>,
}

// Initialization
impl Grid {
    pub fn load<P: AsRef<Path>>(file_path: P) -> Result<Grid> {
        let start_time = Instant::now();
        let file = File::open(file_path.as_ref())?;
        let grid = Grid::from_reader(file)?;

        debug!(
            "Loaded {}x{} grid from {:?} in {:?}",
            grid.width,
            grid.height,
            file_path.as_ref(),
            start_time.elapsed()
        );
        Ok(grid)
    }

    /// Parses comma-delimited rows of integers. There is no header row and blank
    /// lines are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Grid> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut width: Option<usize> = None;
        let mut height = 0;
        let mut cells = Vec::new();

        for (row_idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            match width {
                Some(expected) if expected != record.len() => {
                    return Err(MapViewError::RaggedRow {
                        row: row_idx,
                        expected,
                        found: record.len(),
                    });
                }
                Some(_) => (),
                None => width = Some(record.len()),
            }

            for (column, field) in record.iter().enumerate() {
                match field.parse::<i32>() {
                    Ok(value) => cells.push(value),
                    Err(_) => {
                        return Err(MapViewError::InvalidCell {
                            row: row_idx,
                            column,
                            value: field.to_string(),
                        })
                    }
                }
            }
            height += 1;
        }

        match width {
            Some(width) if width > 0 => Ok(Grid {
                width,
                height,
                cells,
            }),
            _ => Err(MapViewError::EmptyGrid),
        }
    }
}

impl Grid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[i32]> + '_ {
        self.cells.chunks_exact(self.width)
    }
}

// Construction and serialization used by the round-trip tests.
#[cfg(test)]
impl Grid {
    // rows must be non-empty and of equal length
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Grid> {
        let width = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => return Err(MapViewError::EmptyGrid),
        };

        let mut cells = Vec::with_capacity(width * rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(MapViewError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }

        Ok(Grid {
            width,
            height: rows.len(),
            cells,
        })
    }

    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        for row in self.rows() {
            csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, file_path: P) -> Result<()> {
        let file = File::create(file_path)?;
        self.write(file)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<i32> {
        if row >= self.height || column >= self.width {
            return None;
        }
        Some(self.cells[row * self.width + column])
    }
}
