//! Loader for position logs written by the simulation.
//!
//! The first line is a header and is skipped. Every following line is
//! `time,node_address,ip_address,x,y,z`; the ip address is not used.

use super::TrackLog;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use ultraviolet::Vec3;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },
}

const FIELDS: usize = 6;

const TIME: usize = 0;
const NODE_ADDRESS: usize = 1;
const X: usize = 3;
const Y: usize = 4;
const Z: usize = 5;

pub fn load_path(path: impl AsRef<Path>) -> Result<TrackLog, LoadError> {
    let file = File::open(path)?;
    load(BufReader::new(file))
}

/// Reads a whole log. Any malformed line fails the load.
pub fn load<R: Read>(reader: R) -> Result<TrackLog, LoadError> {
    // The header is the first physical line, even when blank
    let mut reader = BufReader::new(reader);
    reader.read_until(b'\n', &mut Vec::new())?;

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(parse_row(&record)?);
    }

    let log = TrackLog::from_rows(rows);
    log::debug!(
        "Loaded {} samples of {} entities",
        log.samples().len(),
        log.registry().len()
    );
    Ok(log)
}

fn parse_row(record: &StringRecord) -> Result<(String, f64, Vec3), LoadError> {
    // Lines counted from 1 including the header
    let line = record.position().map_or(0, |p| p.line()) + 1;
    if record.len() != FIELDS {
        return Err(LoadError::Parse {
            line,
            message: format!("expected {} fields, found {}", FIELDS, record.len()),
        });
    }

    let name = &record[NODE_ADDRESS];
    if name.is_empty() {
        return Err(LoadError::Parse {
            line,
            message: "empty node_address".to_owned(),
        });
    }

    let time: f64 = parse_number(record, TIME, "time", line)?;
    let position = Vec3::new(
        parse_number(record, X, "x", line)?,
        parse_number(record, Y, "y", line)?,
        parse_number(record, Z, "z", line)?,
    );
    Ok((name.to_owned(), time, position))
}

/// Parses at the precision it is stored in, so values overflowing `T` are rejected too.
fn parse_number<T: FromStr + Copy + Into<f64>>(
    record: &StringRecord,
    column: usize,
    column_name: &str,
    line: u64,
) -> Result<T, LoadError> {
    let text = &record[column];
    match text.parse::<T>() {
        Ok(value) if value.into().is_finite() => Ok(value),
        _ => Err(LoadError::Parse {
            line,
            message: format!("{} is not a finite number: {:?}", column_name, text),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "time,node_address,ip_address,x,y,z\n";

    fn parse_err(input: &str) -> (u64, String) {
        match load(input.as_bytes()) {
            Err(LoadError::Parse { line, message }) => (line, message),
            other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_interleaved_entities() {
        let input = format!(
            "{}0,A,10.1.1.1,0,0,0\n0.5,B,10.1.1.2,1,2,3\n10,A,10.1.1.1,10,0,0\n",
            HEADER
        );
        let log = load(input.as_bytes()).unwrap();
        assert_eq!(log.registry().len(), 2);
        assert_eq!(log.samples().len(), 3);

        let b = log.registry().id("B").unwrap();
        assert_eq!(log.samples()[1].entity, b);
        assert_eq!(log.samples()[1].position, Vec3::new(1., 2., 3.));
        assert_eq!(log.samples()[2].time, 10.);
    }

    #[test]
    fn test_header_is_ignored_whatever_it_says() {
        let log = load("whatever\n1,A,ip,1,1,1\n".as_bytes()).unwrap();
        assert_eq!(log.samples().len(), 1);
    }

    #[test]
    fn test_whitespace_and_blank_lines() {
        let input = format!("{}\n 1 , A , ip , 1 , 2 , 3 \n\n", HEADER);
        let log = load(input.as_bytes()).unwrap();
        assert_eq!(log.registry().id("A").map(|id| id.index()), Some(0));
        assert_eq!(log.samples()[0].position, Vec3::new(1., 2., 3.));
    }

    #[test]
    fn test_header_only() {
        let log = load(HEADER.as_bytes()).unwrap();
        assert!(log.samples().is_empty());
        assert!(log.registry().is_empty());
    }

    #[test]
    fn test_wrong_field_count() {
        let (line, message) = parse_err(&format!("{}0,A,ip,0,0,0\n1,A,ip,0,0\n", HEADER));
        assert_eq!(line, 3);
        assert!(message.contains("found 5"), "{}", message);
    }

    #[test]
    fn test_non_numeric_coordinate() {
        let (line, message) = parse_err(&format!("{}0,A,ip,0,north,0\n", HEADER));
        assert_eq!(line, 2);
        assert!(message.starts_with("y "), "{}", message);
        assert!(message.contains("north"), "{}", message);
    }

    #[test]
    fn test_non_finite_time() {
        let (_, message) = parse_err(&format!("{}NaN,A,ip,0,0,0\n", HEADER));
        assert!(message.starts_with("time "), "{}", message);
    }

    #[test]
    fn test_coordinate_out_of_f32_range() {
        let (line, message) = parse_err(&format!("{}0,A,ip,1e39,0,0\n10,A,ip,0,0,0\n", HEADER));
        assert_eq!(line, 2);
        assert!(message.starts_with("x "), "{}", message);
        assert!(message.contains("1e39"), "{}", message);

        // Still fine as a time
        let log = load(format!("{}1e39,A,ip,0,0,0\n", HEADER).as_bytes()).unwrap();
        assert_eq!(log.samples()[0].time, 1e39);
    }

    #[test]
    fn test_blank_first_line_is_the_header() {
        let log = load("\n0,A,ip,1,2,3\n".as_bytes()).unwrap();
        assert_eq!(log.samples().len(), 1);
        assert_eq!(log.samples()[0].position, Vec3::new(1., 2., 3.));

        let (line, _) = parse_err("\n0,A,ip,1,2\n");
        assert_eq!(line, 2);
    }

    #[test]
    fn test_empty_input() {
        let log = load("".as_bytes()).unwrap();
        assert!(log.samples().is_empty());
    }

    #[test]
    fn test_empty_node_address() {
        let (line, _) = parse_err(&format!("{}0,,ip,0,0,0\n", HEADER));
        assert_eq!(line, 2);
    }

    #[test]
    fn test_load_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}2,A,ip,0,0,0\n1,A,ip,1,1,1\n", HEADER).unwrap();

        let log = load_path(file.path()).unwrap();
        let times: Vec<f64> = log.samples().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![1., 2.]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match load_path(dir.path().join("missing.csv")) {
            Err(LoadError::Io(_)) => {}
            other => panic!("expected an IO error, got {:?}", other.map(|_| ())),
        }
    }
}
