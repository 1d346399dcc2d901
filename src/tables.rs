//! CSV tables the pipeline reads and writes. Column names are contractual.

use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::matrix::IncidenceMatrix;
use crate::models::{Assignment, Judge, Poster, PosterAssignmentRow, Professor, RubricScore};

pub const POSTER_ID: &str = "Poster #";
pub const JUDGE_OUTPUT_ID: &str = "Judge No. #";
pub const POSTER_NUMBER: &str = "Poster Number";
pub const JUDGE_NUMBER: &str = "Judge #";

const POSTER_COLUMNS: [&str; 3] = [POSTER_ID, "Program", "Abstract"];
const JUDGE_COLUMNS: [&str; 5] = [
    "Judge",
    "Judge FirstName",
    "Judge LastName",
    "Department",
    "Hour available",
];
const PROFESSOR_COLUMNS: [&str; 1] = ["Professor Name"];
const RUBRIC_COLUMNS: [&str; 6] = [
    POSTER_NUMBER,
    JUDGE_NUMBER,
    "Innovation",
    "Clarity",
    "Presentation",
    "Total",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("missing required column in {table} table: {column}")]
    MissingColumn { table: &'static str, column: String },

    #[error("failed to read {table} table at {path}: {source}")]
    Csv {
        table: &'static str,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid value in {table} table row {row}, column {column}: {value:?}")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: String,
        value: String,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn require_columns(
    table: &'static str,
    headers: &StringRecord,
    required: &[&str],
) -> Result<(), TableError> {
    for column in required {
        if !headers.iter().any(|header| header.trim() == *column) {
            return Err(TableError::MissingColumn {
                table,
                column: (*column).to_string(),
            });
        }
    }
    Ok(())
}

fn open(table: &'static str, path: &Path) -> Result<(csv::Reader<std::fs::File>, StringRecord), TableError> {
    let wrap = |source| TableError::Csv {
        table,
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(wrap)?;
    let headers = reader.headers().map_err(wrap)?.clone();
    Ok((reader, headers))
}

/// Reads a typed table after checking its required columns.
pub fn read_table<T: DeserializeOwned>(
    table: &'static str,
    path: &Path,
    required: &[&str],
) -> Result<Vec<T>, TableError> {
    let (mut reader, headers) = open(table, path)?;
    require_columns(table, &headers, required)?;

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(|source| TableError::Csv {
            table,
            path: path.to_path_buf(),
            source,
        })?);
    }
    Ok(rows)
}

pub fn read_posters(path: &Path) -> Result<Vec<Poster>, TableError> {
    read_table("poster", path, &POSTER_COLUMNS)
}

pub fn read_judges(path: &Path) -> Result<Vec<Judge>, TableError> {
    read_table("judge", path, &JUDGE_COLUMNS)
}

pub fn read_professors(path: &Path) -> Result<Vec<Professor>, TableError> {
    read_table("professor", path, &PROFESSOR_COLUMNS)
}

pub fn read_rubric(path: &Path) -> Result<Vec<RubricScore>, TableError> {
    read_table("rubric", path, &RUBRIC_COLUMNS)
}

fn write_records<I>(path: &Path, header: &[String], records: I) -> Result<(), TableError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let wrap = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    writer.write_record(header).map_err(wrap)?;
    for record in records {
        writer.write_record(&record).map_err(wrap)?;
    }
    writer
        .flush()
        .map_err(|err| wrap(csv::Error::from(err)))?;
    Ok(())
}

pub fn write_serialized<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), TableError> {
    let wrap = |source| TableError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    for row in rows {
        writer.serialize(row).map_err(wrap)?;
    }
    writer
        .flush()
        .map_err(|err| wrap(csv::Error::from(err)))?;
    Ok(())
}

fn assigned_header(prefix: &str, slots: usize) -> impl Iterator<Item = String> + '_ {
    (1..=slots).map(move |slot| format!("Assigned {prefix} {slot} ID"))
}

fn slot_values(ids: &[u32], slots: usize) -> impl Iterator<Item = String> + '_ {
    (0..slots).map(move |slot| ids.get(slot).map(u32::to_string).unwrap_or_default())
}

/// Poster input columns plus one `Assigned Judge N ID` column per poster slot.
pub fn write_poster_assignments(
    path: &Path,
    posters: &[Poster],
    assignment: &Assignment,
    slots: usize,
) -> Result<(), TableError> {
    let header: Vec<String> = POSTER_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(assigned_header("Judge", slots))
        .collect();
    let records = posters.iter().map(|poster| {
        let mut record = vec![
            poster.id.to_string(),
            poster.program.clone(),
            poster.abstract_text.clone(),
        ];
        record.extend(slot_values(assignment.judges_for(poster.id), slots));
        record
    });
    write_records(path, &header, records)
}

/// Judge columns plus one `Assigned Poster N ID` column per judge slot.
pub fn write_judge_assignments(
    path: &Path,
    judges: &[Judge],
    assignment: &Assignment,
    slots: usize,
) -> Result<(), TableError> {
    let header: Vec<String> = [
        JUDGE_OUTPUT_ID,
        "Judge FirstName",
        "Judge LastName",
        "Department",
        "Hour available",
    ]
    .iter()
    .map(|c| c.to_string())
    .chain(assigned_header("Poster", slots))
    .collect();
    let records = judges.iter().map(|judge| {
        let mut record = vec![
            judge.id.to_string(),
            judge.first_name.clone(),
            judge.last_name.clone(),
            judge.department.clone(),
            String::from(judge.availability),
        ];
        record.extend(slot_values(assignment.posters_for(judge.id), slots));
        record
    });
    write_records(path, &header, records)
}

/// Reads `Poster #` and every `Assigned Judge N ID` column of a poster output table.
/// Slot columns are numbered from 1 without gaps; only the first is required.
pub fn read_poster_assignments(path: &Path) -> Result<Vec<PosterAssignmentRow>, TableError> {
    const TABLE: &str = "poster output";
    let (mut reader, headers) = open(TABLE, path)?;
    require_columns(TABLE, &headers, &[POSTER_ID, "Assigned Judge 1 ID"])?;

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let id_col = position(POSTER_ID).unwrap_or_default();
    let judge_cols: Vec<usize> = (1..)
        .map(|slot| position(format!("Assigned Judge {slot} ID").as_str()))
        .take_while(Option::is_some)
        .flatten()
        .collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| TableError::Csv {
            table: TABLE,
            path: path.to_path_buf(),
            source,
        })?;
        let raw_id = record.get(id_col).unwrap_or_default().trim();
        let poster_id = parse_id(raw_id).ok_or_else(|| TableError::InvalidValue {
            table: TABLE,
            row: index + 1,
            column: POSTER_ID.to_string(),
            value: raw_id.to_string(),
        })?;
        let assigned_judges = judge_cols
            .iter()
            .map(|col| {
                let raw = record.get(*col).unwrap_or_default().trim();
                parse_id(raw).map(|id| id.to_string()).unwrap_or_else(|| raw.to_string())
            })
            .collect();
        rows.push(PosterAssignmentRow {
            poster_id,
            assigned_judges,
        });
    }
    Ok(rows)
}

/// Reads the `Judge No. #` column of a judge output table.
pub fn read_judge_ids(path: &Path) -> Result<Vec<String>, TableError> {
    const TABLE: &str = "judge output";
    let (mut reader, headers) = open(TABLE, path)?;
    require_columns(TABLE, &headers, &[JUDGE_OUTPUT_ID])?;
    let col = headers
        .iter()
        .position(|h| h.trim() == JUDGE_OUTPUT_ID)
        .unwrap_or_default();

    let mut ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| TableError::Csv {
            table: TABLE,
            path: path.to_path_buf(),
            source,
        })?;
        let raw = record.get(col).unwrap_or_default().trim();
        ids.push(parse_id(raw).map(|id| id.to_string()).unwrap_or_else(|| raw.to_string()));
    }
    Ok(ids)
}

/// Integer ids, also accepting the `12.0` form spreadsheets export.
fn parse_id(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32)
    })
}

pub fn write_matrix(path: &Path, matrix: &IncidenceMatrix) -> Result<(), TableError> {
    let header: Vec<String> = std::iter::once(POSTER_ID.to_string())
        .chain(matrix.judge_ids().iter().cloned())
        .collect();
    let records = matrix.rows().map(|(poster_id, cells)| {
        std::iter::once(poster_id.to_string())
            .chain(cells.iter().map(u8::to_string))
            .collect()
    });
    write_records(path, &header, records)
}

/// Reads an incidence matrix: the `Poster #` column holds poster ids, every
/// other column is a judge.
pub fn read_matrix(path: &Path) -> Result<IncidenceMatrix, TableError> {
    const TABLE: &str = "incidence matrix";
    let (mut reader, headers) = open(TABLE, path)?;
    require_columns(TABLE, &headers, &[POSTER_ID])?;
    let id_col = headers
        .iter()
        .position(|h| h.trim() == POSTER_ID)
        .unwrap_or_default();
    let judge_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(col, _)| *col != id_col)
        .map(|(col, h)| (col, h.trim().to_string()))
        .collect();
    let judge_ids: Vec<String> = judge_cols.iter().map(|(_, id)| id.clone()).collect();

    let mut poster_ids = Vec::new();
    let mut cells = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|source| TableError::Csv {
            table: TABLE,
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |column: &str, value: &str| TableError::InvalidValue {
            table: TABLE,
            row: index + 1,
            column: column.to_string(),
            value: value.to_string(),
        };
        let raw_id = record.get(id_col).unwrap_or_default().trim();
        poster_ids.push(parse_id(raw_id).ok_or_else(|| invalid(POSTER_ID, raw_id))?);

        let mut row = Vec::with_capacity(judge_cols.len());
        for (col, judge) in &judge_cols {
            let raw = record.get(*col).unwrap_or_default().trim();
            match parse_id(raw) {
                Some(0) => row.push(0),
                Some(1) => row.push(1),
                _ => return Err(invalid(judge.as_str(), raw)),
            }
        }
        cells.push(row);
    }
    Ok(IncidenceMatrix::from_parts(poster_ids, judge_ids, cells))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, RankedRubricRow, TimeSlot};

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_judges_with_availability() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "judges.csv",
            "Judge,Judge FirstName,Judge LastName,Department,Hour available\n\
             10,Ada,Lovelace,Computer Science,both\n\
             11,Alan,Turing,Mathematics,2\n",
        );
        let judges = read_judges(&path).unwrap();
        assert_eq!(judges.len(), 2);
        assert_eq!(judges[0].availability, Availability::Both);
        assert_eq!(judges[1].availability, Availability::Slot(TimeSlot::Second));
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posters.csv", "Poster #,Abstract\n1,text\n");
        let err = read_posters(&path).unwrap_err();
        match err {
            TableError::MissingColumn { table, column } => {
                assert_eq!(table, "poster");
                assert_eq!(column, "Program");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_professor_fields_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "professors.csv",
            "Professor Name,Link,Profile Title,Areas of Interest / Research Interests,Description,Current Research,Publications\n\
             Ada Lovelace,,,,,engines,\n",
        );
        let professors = read_professors(&path).unwrap();
        assert_eq!(professors[0].description, "");
        assert_eq!(professors[0].current_research, "engines");
    }

    #[test]
    fn assignment_tables_round_trip_into_matrix_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let posters = vec![
            Poster { id: 1, program: "CS".into(), abstract_text: "a, \"quoted\" abstract".into() },
            Poster { id: 2, program: "ME".into(), abstract_text: String::new() },
        ];
        let judges = vec![Judge {
            id: 12,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            department: "CS".into(),
            availability: Availability::Both,
        }];
        let mut assignment = Assignment::new([1, 2], [12]);
        assignment.commit(1, 12);

        let poster_path = dir.path().join("posters_out.csv");
        let judge_path = dir.path().join("judges_out.csv");
        write_poster_assignments(&poster_path, &posters, &assignment, 2).unwrap();
        write_judge_assignments(&judge_path, &judges, &assignment, 6).unwrap();

        let rows = read_poster_assignments(&poster_path).unwrap();
        assert_eq!(rows[0].assigned_judges, vec!["12".to_string(), String::new()]);
        assert_eq!(rows[1].assigned_judges, vec![String::new(), String::new()]);
        assert_eq!(read_judge_ids(&judge_path).unwrap(), vec!["12".to_string()]);

        let judge_header = std::fs::read_to_string(&judge_path).unwrap();
        assert!(judge_header.lines().next().unwrap().ends_with("Assigned Poster 6 ID"));
    }

    #[test]
    fn matrix_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![PosterAssignmentRow { poster_id: 3, assigned_judges: vec!["12".into()] }];
        let matrix = IncidenceMatrix::build(&rows, vec!["12".to_string(), "9".to_string()]);
        let path = dir.path().join("matrix.csv");
        write_matrix(&path, &matrix).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Poster #,9,12\n3,0,1\n");
        assert_eq!(read_matrix(&path).unwrap(), matrix);
    }

    #[test]
    fn poster_id_column_need_not_come_first_in_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "matrix.csv", "12,Poster #,9\n1,3,0\n0,4,1\n");
        let matrix = read_matrix(&path).unwrap();
        assert_eq!(matrix.poster_ids(), &[3, 4]);
        assert_eq!(matrix.judge_ids(), &["12".to_string(), "9".to_string()]);
        assert_eq!(matrix.get(3, "12"), Some(1));
        assert_eq!(matrix.get(3, "9"), Some(0));
        assert_eq!(matrix.get(4, "9"), Some(1));
    }

    #[test]
    fn single_judge_slot_poster_table_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "posters_out.csv",
            "Poster #,Program,Abstract,Assigned Judge 1 ID\n1,CS,text,12\n2,ME,text,\n",
        );
        let rows = read_poster_assignments(&path).unwrap();
        assert_eq!(rows[0].assigned_judges, vec!["12".to_string()]);
        assert_eq!(rows[1].assigned_judges, vec![String::new()]);
    }

    #[test]
    fn poster_table_without_any_judge_slot_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "posters_out.csv", "Poster #,Program\n1,CS\n");
        let err = read_poster_assignments(&path).unwrap_err();
        assert!(err.to_string().contains("Assigned Judge 1 ID"));
    }

    #[test]
    fn spreadsheet_style_float_ids_are_accepted() {
        assert_eq!(parse_id("12.0"), Some(12));
        assert_eq!(parse_id("12.5"), None);
        assert_eq!(parse_id("nan"), None);
    }

    #[test]
    fn ranked_rubric_rows_serialize_with_rank_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranked.csv");
        let rows = vec![RankedRubricRow {
            poster_id: 1,
            judge_id: 2,
            innovation: 3,
            clarity: 4,
            presentation: 5,
            total: 12,
            rank: 1,
        }];
        write_serialized(&path, &rows).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "Poster Number,Judge #,Innovation,Clarity,Presentation,Total,Rank\n1,2,3,4,5,12,1\n"
        );
        assert_eq!(read_rubric(&path).unwrap()[0].total, 12);
    }
}
