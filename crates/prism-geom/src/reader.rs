use std::path::Path;
use std::str::FromStr;

use crate::error::{LoadError, ParseError};
use crate::geometry::{Geometry, POINT_COMPONENTS, TRIANGLE_CORNERS};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Section {
    None,
    Points,
    Indices,
}

/// Parses geometry text.
///
/// Recognised lines:
/// - `[points]` / `[indices]` switch the current section
/// - `#...` comments and blank lines are skipped
/// - data rows hold 5 floats (points) or 3 `u16` corners (indices)
///
/// A trailing `\r` is stripped from every line so CRLF files read the same as LF.
pub fn parse_str(src: &str) -> Result<Geometry, ParseError> {
    let mut geometry = Geometry::default();
    let mut section = Section::None;

    // (line, highest index on that line) checked once all points are known;
    // sections may appear in either order.
    let mut index_rows: Vec<(usize, u16)> = Vec::new();

    for (n, raw) in src.lines().enumerate() {
        let line_no = n + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw).trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = match line {
                "[points]" => Section::Points,
                "[indices]" => Section::Indices,
                other => {
                    return Err(ParseError::new(format!("unknown section {other}"), line_no));
                }
            };
            continue;
        }

        match section {
            Section::Points => {
                let row: [f32; POINT_COMPONENTS] = parse_row(line, line_no, "point")?;
                geometry.points.extend_from_slice(&row);
            }
            Section::Indices => {
                let row: [u16; TRIANGLE_CORNERS] = parse_row(line, line_no, "index")?;
                let highest = row.iter().copied().max().unwrap_or(0);
                index_rows.push((line_no, highest));
                geometry.indices.extend_from_slice(&row);
            }
            Section::None => {
                return Err(ParseError::new(
                    "data row outside of a [points] or [indices] section",
                    line_no,
                ));
            }
        }
    }

    let point_count = geometry.point_count();
    if let Some((line_no, highest)) = index_rows
        .into_iter()
        .find(|(_, highest)| usize::from(*highest) >= point_count)
    {
        return Err(ParseError::new(
            format!("index {highest} out of range ({point_count} points)"),
            line_no,
        ));
    }

    Ok(geometry)
}

/// Reads and parses a geometry file.
pub fn load_file(path: impl AsRef<Path>) -> Result<Geometry, LoadError> {
    let path = path.as_ref();
    let src = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&src).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_row<T, const N: usize>(line: &str, line_no: usize, what: &str) -> Result<[T; N], ParseError>
where
    T: FromStr + Copy + Default,
{
    let mut row = [T::default(); N];
    let mut fields = line.split_whitespace();

    for (i, slot) in row.iter_mut().enumerate() {
        let field = fields.next().ok_or_else(|| {
            ParseError::new(format!("{what} row has {i} values, expected {N}"), line_no)
        })?;
        *slot = field
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {what} value `{field}`"), line_no))?;
    }

    if fields.next().is_some() {
        return Err(ParseError::new(
            format!("{what} row has more than {N} values"),
            line_no,
        ));
    }

    Ok(row)
}
