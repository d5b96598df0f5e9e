//! Parsers for the catalog and similarity matrix files.
//!
//! - catalog: CSV with a header row; `movie_id` (or `id`) and `title` columns
//! - matrix: `.json` nested arrays, `.bin` little-endian dump, or plain text
//!   rows of comma/whitespace separated numbers
//!
//! Every error carries the file name, and the line number where one exists.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{Position, ReaderBuilder, StringRecord};
use rayon::prelude::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read a whole file, turning a missing file into `FileNotFound`
fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// File name used in error messages
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decode a whole file as UTF-8; a bad byte fails the load at its line
fn decode_utf8<'a>(bytes: &'a [u8], file: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let valid = &bytes[..e.valid_up_to()];
        DataLoadError::ParseError {
            file: file.to_string(),
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
            reason: format!("Invalid UTF-8: {}", e),
        }
    })
}

// =============================================================================
// Catalog
// =============================================================================

/// 1-based line a CSV record starts on
fn csv_line(position: Option<&Position>) -> usize {
    position.map_or(0, |pos| pos.line() as usize)
}

fn csv_error(file: &str, e: csv::Error) -> DataLoadError {
    DataLoadError::ParseError {
        file: file.to_string(),
        line: csv_line(e.position()),
        reason: e.to_string(),
    }
}

/// Position of `name` in the header, ignoring case and surrounding spaces
fn column_index(header: &StringRecord, names: &[&str]) -> Option<usize> {
    header.iter().position(|column| {
        let column = column.trim();
        names.iter().any(|name| column.eq_ignore_ascii_case(name))
    })
}

/// Parse catalog CSV text into movies, in file order.
///
/// Quoted fields may hold commas, doubled quotes and newlines. Only the
/// `movie_id` (or `id`) and `title` columns are read.
pub fn parse_catalog_str(content: &str, file: &str) -> Result<Vec<Movie>> {
    // Exported CSVs sometimes start with a UTF-8 byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader.headers().map_err(|e| csv_error(file, e))?.clone();
    if header.iter().all(|column| column.trim().is_empty()) {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: 1,
            reason: "Missing header row".to_string(),
        });
    }

    let id_col = column_index(&header, &["movie_id", "id"]).ok_or_else(|| {
        DataLoadError::MissingColumn {
            file: file.to_string(),
            column: "movie_id".to_string(),
        }
    })?;
    let title_col = column_index(&header, &["title"]).ok_or_else(|| {
        DataLoadError::MissingColumn {
            file: file.to_string(),
            column: "title".to_string(),
        }
    })?;

    let mut movies = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(file, e))?;
        // Whitespace-only lines count as blank
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let line = csv_line(record.position());
        let field = |index: usize, name: &str| {
            record.get(index).ok_or_else(|| DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: format!("Missing {}", name),
            })
        };

        let id = field(id_col, "movie_id")?;
        let title = field(title_col, "title")?;

        let movie = Movie {
            id: id.trim().parse().map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line,
                reason: format!("Invalid movie_id '{}': {}", id, e),
            })?,
            title: title.to_string(),
        };
        movies.push(movie);
    }

    Ok(movies)
}

/// Parse the catalog CSV file
pub fn parse_catalog(path: &Path) -> Result<Vec<Movie>> {
    let bytes = read_bytes(path)?;
    let file = display_name(path);
    parse_catalog_str(decode_utf8(&bytes, &file)?, &file)
}

// =============================================================================
// Similarity matrix
// =============================================================================

/// Width of one score in the binary format
const SCORE_BYTES: usize = std::mem::size_of::<f64>();

/// Reject NaN and infinite scores; ranking relies on a total order
fn ensure_finite(matrix: &SimilarityMatrix) -> Result<()> {
    for i in 0..matrix.dim() {
        let Some(row) = matrix.row(i) else { break };
        if let Some((j, score)) = row.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(DataLoadError::InvalidValue {
                field: format!("similarity[{}][{}]", i, j),
                value: score.to_string(),
            });
        }
    }
    Ok(())
}

/// Parse a matrix stored as a JSON array of arrays
pub fn parse_matrix_json(bytes: &[u8], file: &str) -> Result<SimilarityMatrix> {
    let rows: Vec<Vec<f64>> =
        serde_json::from_slice(bytes).map_err(|source| DataLoadError::Json {
            file: file.to_string(),
            source,
        })?;

    let dim = rows.len();
    if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != dim) {
        return Err(DataLoadError::ValidationError(format!(
            "{}: row {} has {} columns but the matrix has {} rows",
            file,
            index + 1,
            row.len(),
            dim
        )));
    }

    let matrix = SimilarityMatrix::from_rows(rows).ok_or_else(|| {
        DataLoadError::ValidationError(format!("{}: similarity matrix is not square", file))
    })?;
    ensure_finite(&matrix)?;
    Ok(matrix)
}

/// Parse a matrix stored as text, one row per line.
///
/// Values may be separated by commas, spaces or tabs. Rows are parsed in
/// parallel since real matrices run to thousands of lines.
pub fn parse_matrix_text(content: &str, file: &str) -> Result<SimilarityMatrix> {
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let rows: Vec<Vec<f64>> = lines
        .par_iter()
        .map(|&(line_no, line)| {
            line.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|token| !token.is_empty())
                .map(|token| {
                    token.parse::<f64>().map_err(|e| DataLoadError::ParseError {
                        file: file.to_string(),
                        line: line_no,
                        reason: format!("Invalid score '{}': {}", token, e),
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let dim = rows.len();
    for (row, &(line_no, _)) in rows.iter().zip(&lines) {
        if row.len() != dim {
            return Err(DataLoadError::FieldCountMismatch {
                expected: dim,
                found: row.len(),
                line: line_no,
            });
        }
    }

    let matrix = SimilarityMatrix::from_rows(rows).ok_or_else(|| {
        DataLoadError::ValidationError(format!("{}: similarity matrix is not square", file))
    })?;
    ensure_finite(&matrix)?;
    Ok(matrix)
}

/// Parse a binary matrix: `u64` dimension then `dim * dim` `f64`s, all
/// little-endian, row-major
pub fn parse_matrix_binary(bytes: &[u8], file: &str) -> Result<SimilarityMatrix> {
    let (header, body) = bytes.split_first_chunk::<8>().ok_or_else(|| {
        DataLoadError::ValidationError(format!("{}: too short for a matrix header", file))
    })?;

    let dim = u64::from_le_bytes(*header);
    let expected = usize::try_from(dim)
        .ok()
        .and_then(|dim| dim.checked_mul(dim))
        .and_then(|cells| cells.checked_mul(SCORE_BYTES));
    if expected != Some(body.len()) {
        return Err(DataLoadError::ValidationError(format!(
            "{}: header says {}x{} but body has {} bytes",
            file,
            dim,
            dim,
            body.len()
        )));
    }

    let scores: Vec<f64> = body
        .chunks_exact(SCORE_BYTES)
        .map(|chunk| {
            let mut le = [0u8; SCORE_BYTES];
            le.copy_from_slice(chunk);
            f64::from_le_bytes(le)
        })
        .collect();

    let matrix = SimilarityMatrix::from_flat(dim as usize, scores).ok_or_else(|| {
        DataLoadError::ValidationError(format!("{}: similarity matrix is not square", file))
    })?;
    ensure_finite(&matrix)?;
    Ok(matrix)
}

/// Parse the similarity matrix file, picking the format from its extension
pub fn parse_matrix(path: &Path) -> Result<SimilarityMatrix> {
    let bytes = read_bytes(path)?;
    let file = display_name(path);
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "json" => parse_matrix_json(&bytes, &file),
        "bin" => parse_matrix_binary(&bytes, &file),
        _ => parse_matrix_text(decode_utf8(&bytes, &file)?, &file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_catalog_with_extra_columns() {
        let csv = "movie_id,title,tags\n19995,Avatar,action space\n285,Pirates of the Caribbean: At World's End,adventure\n";
        let movies = parse_catalog_str(csv, "movies.csv").unwrap();

        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0], Movie { id: 19995, title: "Avatar".to_string() });
        assert_eq!(movies[1].id, 285);
    }

    #[test]
    fn test_parse_catalog_quoted_fields() {
        let csv = "id,title\r\n1,\"Crouching Tiger, Hidden Dragon\"\r\n2,\"The \"\"Best\"\" Movie\"\r\n";
        let movies = parse_catalog_str(csv, "movies.csv").unwrap();

        assert_eq!(movies[0].title, "Crouching Tiger, Hidden Dragon");
        assert_eq!(movies[1].title, "The \"Best\" Movie");
    }

    #[test]
    fn test_parse_catalog_multiline_field() {
        let csv = "movie_id,title,overview\n1,A,\"two\nlines\"\n\n2,B,ok\n";
        let movies = parse_catalog_str(csv, "movies.csv").unwrap();

        let titles: Vec<_> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_catalog_bad_id_reports_line() {
        let csv = "movie_id,title\n1,A\nx,B\n";
        let err = parse_catalog_str(csv, "movies.csv").unwrap_err();

        match err {
            DataLoadError::ParseError { file, line, reason } => {
                assert_eq!(file, "movies.csv");
                assert_eq!(line, 3);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_catalog_strips_bom_and_index_column() {
        let csv = "\u{feff},movie_id,title\n0,7,Seven\n";
        let movies = parse_catalog_str(csv, "movies.csv").unwrap();
        assert_eq!(movies, vec![Movie { id: 7, title: "Seven".to_string() }]);
    }

    #[test]
    fn test_parse_catalog_missing_title_column() {
        let err = parse_catalog_str("movie_id,name\n1,A\n", "movies.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "title"));
    }

    #[test]
    fn test_parse_catalog_missing_header() {
        let err = parse_catalog_str("", "movies.csv").unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { .. }));
    }

    #[test]
    fn test_parse_catalog_rejects_invalid_utf8() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(b"movie_id,title\n1,Am\xe9lie\n").expect("write catalog");

        let err = parse_catalog(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn test_parse_matrix_text_rejects_invalid_utf8() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        file.write_all(b"1 0\n0 \xff\n").expect("write matrix");

        let err = parse_matrix(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn test_parse_matrix_text_mixed_separators() {
        let text = "1.0, 0.5 0.2\n\n0.5\t1.0,0.1\n0.2 0.1 1.0\n";
        let matrix = parse_matrix_text(text, "similarity.csv").unwrap();

        assert_eq!(matrix.dim(), 3);
        assert_eq!(matrix.row(1).unwrap(), &[0.5, 1.0, 0.1]);
    }

    #[test]
    fn test_parse_matrix_text_ragged_row() {
        let err = parse_matrix_text("1 0\n0 1 2\n", "similarity.txt").unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::FieldCountMismatch { expected: 2, found: 3, line: 2 }
        ));
    }

    #[test]
    fn test_parse_matrix_text_rejects_nan() {
        let err = parse_matrix_text("1 NaN\n0 1\n", "similarity.txt").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_matrix_json() {
        let matrix = parse_matrix_json(b"[[1.0, 0.25], [0.25, 1.0]]", "similarity.json").unwrap();
        assert_eq!(matrix.get(0, 1), Some(0.25));

        let err = parse_matrix_json(b"[[1.0, 0.25], [0.25]]", "similarity.json").unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError(_)));

        let err = parse_matrix_json(b"{\"not\": \"a matrix\"}", "similarity.json").unwrap_err();
        assert!(matches!(err, DataLoadError::Json { .. }));
    }

    #[test]
    fn test_parse_matrix_keeps_double_precision() {
        let json = b"[[1.0, 0.3000000001, 0.3000000002], [0, 1, 0], [0, 0, 1]]";
        let matrix = parse_matrix_json(json, "similarity.json").unwrap();
        let row = matrix.row(0).unwrap();
        assert!(row[2] > row[1]);

        let text = "1 0.3000000001 0.3000000002\n0 1 0\n0 0 1\n";
        let matrix = parse_matrix_text(text, "similarity.txt").unwrap();
        assert_eq!(matrix.get(0, 2), Some(0.3000000002));
    }

    #[test]
    fn test_parse_matrix_binary() {
        let mut bytes = 2u64.to_le_bytes().to_vec();
        for score in [1.0f64, 0.75, 0.75, 1.0] {
            bytes.extend_from_slice(&score.to_le_bytes());
        }
        let matrix = parse_matrix_binary(&bytes, "similarity.bin").unwrap();
        assert_eq!(matrix.row(0).unwrap(), &[1.0, 0.75]);

        // Truncated body
        let err = parse_matrix_binary(&bytes[..bytes.len() - 1], "similarity.bin").unwrap_err();
        assert!(matches!(err, DataLoadError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_catalog(Path::new("/definitely/not/here/movies.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::FileNotFound { .. }));
    }
}
