//! Plain-text matrix and vector files
//!
//! ```text
//! matrix:  "rows cols\n" then one line of space-separated values per row
//! vector:  "size\n" then the values, space-separated
//! ```
//!
//! Values are written with Rust's shortest round-trip float formatting, so
//! loading a saved matrix reproduces it bit for bit.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, VitError};
use crate::matrix::Matrix;

fn write_file(path: &Path, body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>) -> Result<()> {
    let file = File::create(path).map_err(|e| VitError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| VitError::io(path, e))
}

fn parse_next<'a, T: std::str::FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    what: &'static str,
    field: &str,
) -> Result<T> {
    let token = tokens
        .next()
        .ok_or_else(|| VitError::format(what, format!("missing {field}")))?;
    token
        .parse()
        .map_err(|_| VitError::format(what, format!("invalid {field} '{token}'")))
}

pub fn save_matrix(matrix: &Matrix, path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), |w| {
        writeln!(w, "{} {}", matrix.rows(), matrix.cols())?;
        for i in 0..matrix.rows() {
            let line: Vec<String> = matrix.row(i).iter().map(|v| v.to_string()).collect();
            writeln!(w, "{}", line.join(" "))?;
        }
        Ok(())
    })
}

pub fn load_matrix(path: impl AsRef<Path>) -> Result<Matrix> {
    const WHAT: &str = "matrix file";
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| VitError::io(path, e))?;
    let mut tokens = contents.split_whitespace();

    let rows: usize = parse_next(&mut tokens, WHAT, "row count")?;
    let cols: usize = parse_next(&mut tokens, WHAT, "column count")?;
    let mut data = Vec::with_capacity(rows * cols);
    for _ in 0..rows * cols {
        data.push(parse_next(&mut tokens, WHAT, "value")?);
    }
    if tokens.next().is_some() {
        return Err(VitError::format(WHAT, "trailing values after matrix data"));
    }
    Matrix::from_vec(rows, cols, data)
}

pub fn save_vector(values: &[f64], path: impl AsRef<Path>) -> Result<()> {
    write_file(path.as_ref(), |w| {
        writeln!(w, "{}", values.len())?;
        let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", line.join(" "))
    })
}

pub fn load_vector(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    const WHAT: &str = "vector file";
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| VitError::io(path, e))?;
    let mut tokens = contents.split_whitespace();

    let size: usize = parse_next(&mut tokens, WHAT, "size")?;
    (0..size)
        .map(|_| parse_next(&mut tokens, WHAT, "value"))
        .collect()
}
