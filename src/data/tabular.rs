// ============================================================
// Layer 4 — Tabular Dataset Loader
// ============================================================
// Reads the registered CSV datasets into labelled feature rows.
//
//   name   file(s)                          task          shape       label
//   pima   pima.csv                         binary        [8]         last
//   iris   iris.csv                         3 classes     [4]         last
//   MNIST  mnist_train.csv, mnist_test.csv  10 classes    [1,28,28]   first
//
// "mnist" is accepted as an alias of "MNIST".
//
// Parsing rules:
//   - a first line whose feature cells are not numbers is a header
//     and is skipped; any later non-numeric row is MalformedDataset
//   - a row with the wrong number of columns is MalformedDataset
//   - a label is either a number or one of the dataset's class names
//   - single-file datasets are split 80/20 with a fixed seed

use std::{fs, path::{Path, PathBuf}};

use crate::data::splitter::{split_train_test, SPLIT_SEED, TRAIN_FRACTION};
use crate::domain::error::{EngineError, Result};
use crate::domain::table::{ClassSample, TabularData, TabularSplit};
use crate::domain::task::TaskKind;
use crate::domain::traits::DatasetSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelColumn {
    First,
    Last,
}

#[derive(Debug, Clone, Copy)]
enum Files {
    /// One file, split with the seeded splitter.
    Single(&'static str),
    /// Pre-split train and test files.
    Split(&'static str, &'static str),
}

/// Everything needed to read one registered dataset.
#[derive(Debug, Clone, Copy)]
struct TableSpec {
    name:          &'static str,
    aliases:       &'static [&'static str],
    files:         Files,
    task:          TaskKind,
    feature_shape: &'static [usize],
    label:         LabelColumn,
    scale:         f32,
    class_names:   &'static [&'static str],
}

const TABLES: &[TableSpec] = &[
    TableSpec {
        name:          "pima",
        aliases:       &[],
        files:         Files::Single("pima.csv"),
        task:          TaskKind::Binary,
        feature_shape: &[8],
        label:         LabelColumn::Last,
        scale:         1.0,
        class_names:   &[],
    },
    TableSpec {
        name:          "iris",
        aliases:       &[],
        files:         Files::Single("iris.csv"),
        task:          TaskKind::MultiClass { classes: 3 },
        feature_shape: &[4],
        label:         LabelColumn::Last,
        scale:         1.0,
        class_names:   &["setosa", "versicolor", "virginica"],
    },
    TableSpec {
        name:          "MNIST",
        aliases:       &["mnist"],
        files:         Files::Split("mnist_train.csv", "mnist_test.csv"),
        task:          TaskKind::MultiClass { classes: 10 },
        feature_shape: &[1, 28, 28],
        label:         LabelColumn::First,
        scale:         255.0,
        class_names:   &[],
    },
];

/// Reads registered tabular datasets from one directory.
#[derive(Debug, Clone)]
pub struct TabularLoader {
    dir: PathBuf,
}

impl TabularLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read(&self, spec: &TableSpec, file: &str) -> Result<Vec<ClassSample>> {
        let path = self.dir.join(file);
        tracing::debug!("Reading dataset '{}' from {}", spec.name, path.display());
        let text = fs::read_to_string(&path)?;
        let rows = parse_rows(spec, &text)?;
        if rows.is_empty() {
            return Err(EngineError::EmptyDataset(display(&path)));
        }
        Ok(rows)
    }
}

impl DatasetSource for TabularLoader {
    fn load_split(&self, name: &str) -> Result<TabularSplit> {
        let spec = find_table(name).ok_or_else(|| EngineError::DatasetNotFound(name.to_string()))?;

        let (train, test) = match spec.files {
            Files::Single(file) => {
                let rows = self.read(spec, file)?;
                split_train_test(rows, TRAIN_FRACTION, SPLIT_SEED)
            }
            Files::Split(train_file, test_file) => {
                (self.read(spec, train_file)?, self.read(spec, test_file)?)
            }
        };

        tracing::info!(
            "Dataset '{}': {} train rows, {} test rows, task {}",
            name,
            train.len(),
            test.len(),
            spec.task.name(),
        );

        let shape = spec.feature_shape.to_vec();
        Ok(TabularSplit {
            train: TabularData::new(train, shape.clone(), spec.task),
            test:  TabularData::new(test,  shape,         spec.task),
        })
    }
}

fn find_table(name: &str) -> Option<&'static TableSpec> {
    TABLES
        .iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

// ─── CSV Parsing ──────────────────────────────────────────────────────────────
fn parse_rows(spec: &TableSpec, text: &str) -> Result<Vec<ClassSample>> {
    let feature_len: usize = spec.feature_shape.iter().product();
    let columns = feature_len + 1;
    let mut rows = Vec::new();
    let mut first = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let header_allowed = std::mem::replace(&mut first, false);
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();

        let (label_cell, feature_cells) = match spec.label {
            LabelColumn::First => (cells[0], &cells[1..]),
            LabelColumn::Last  => (cells[cells.len() - 1], &cells[..cells.len() - 1]),
        };

        let features: Option<Vec<f32>> = feature_cells
            .iter()
            .map(|c| c.parse::<f32>().ok())
            .collect();
        let Some(features) = features else {
            if header_allowed {
                tracing::debug!("{}: skipping header line {}", spec.name, i + 1);
                continue;
            }
            return Err(EngineError::MalformedDataset {
                name:   spec.name.to_string(),
                line:   i + 1,
                reason: "feature cells must be numbers".into(),
            });
        };

        if cells.len() != columns {
            return Err(EngineError::MalformedDataset {
                name:   spec.name.to_string(),
                line:   i + 1,
                reason: format!("expected {} columns, found {}", columns, cells.len()),
            });
        }

        let label = parse_label(spec, label_cell).ok_or_else(|| EngineError::MalformedDataset {
            name:   spec.name.to_string(),
            line:   i + 1,
            reason: format!("unrecognised label '{}'", label_cell),
        })?;

        rows.push(ClassSample {
            features: features.into_iter().map(|v| v / spec.scale).collect(),
            label,
        });
    }

    Ok(rows)
}

fn parse_label(spec: &TableSpec, cell: &str) -> Option<i64> {
    let label = match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 => v as i64,
        Ok(_) => return None,
        Err(_) => {
            // "Iris-setosa" and "setosa" both name class 0
            let name = cell.trim_matches('"');
            let name = name.rsplit('-').next().unwrap_or(name);
            spec.class_names
                .iter()
                .position(|c| c.eq_ignore_ascii_case(name))? as i64
        }
    };

    let classes = match spec.task {
        TaskKind::Binary                  => 2,
        TaskKind::MultiClass { classes }  => classes as i64,
        TaskKind::Sequence                => return None,
    };
    (0..classes).contains(&label).then_some(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> &'static TableSpec {
        find_table(name).unwrap()
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("dme-tabular-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_header_is_skipped() {
        let text = "a,b,c,d,e,f,g,h,outcome\n6,148,72,35,0,33.6,0.627,50,1\n1,85,66,29,0,26.6,0.351,31,0\n";
        let rows = parse_rows(table("pima"), text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, 1);
        assert_eq!(rows[1].features[1], 85.0);
    }

    #[test]
    fn test_wrong_column_count_is_malformed() {
        let text = "6,148,72,35,0,33.6,0.627,50,1\n1,85,66,1\n";
        match parse_rows(table("pima"), text) {
            Err(EngineError::MalformedDataset { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_later_non_numeric_row_is_malformed() {
        let text = "a,b,c,d,e,f,g,h,outcome\n6,148,72,35,0,33.6,0.627,50,1\n1,85,,29,0,26.6,0.351,31,0\n";
        match parse_rows(table("pima"), text) {
            Err(EngineError::MalformedDataset { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_mnist_by_registered_name_and_alias() {
        let dir = scratch_dir("mnist");
        let row = |label: usize| {
            let mut line = label.to_string();
            for _ in 0..784 {
                line.push_str(",0");
            }
            line.push('\n');
            line
        };
        fs::write(dir.join("mnist_train.csv"), format!("{}{}", row(1), row(2))).unwrap();
        fs::write(dir.join("mnist_test.csv"), row(3)).unwrap();

        let loader = TabularLoader::new(&dir);
        let split = loader.load_split("MNIST").unwrap();
        assert_eq!(split.train.len(), 2);
        assert_eq!(split.test.len(), 1);
        assert_eq!(split.train.feature_shape, vec![1, 28, 28]);
        assert_eq!(split.test.samples[0].label, 3);

        assert_eq!(loader.load_split("mnist").unwrap().train.len(), 2);
    }

    #[test]
    fn test_iris_species_names() {
        let text = "sepal_length,sepal_width,petal_length,petal_width,species\n\
                    5.1,3.5,1.4,0.2,Iris-setosa\n\
                    6.3,3.3,6.0,2.5,virginica\n";
        let rows = parse_rows(table("iris"), text).unwrap();
        assert_eq!(rows.iter().map(|r| r.label).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_mnist_label_first_and_scaled() {
        let mut line = String::from("7");
        for _ in 0..784 {
            line.push_str(",255");
        }
        let rows = parse_rows(table("mnist"), &line).unwrap();
        assert_eq!(rows[0].label, 7);
        assert_eq!(rows[0].features.len(), 784);
        assert!((rows[0].features[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_label_out_of_range() {
        let text = "1,2,3,4,5,6,7,8,3\n";
        assert!(matches!(
            parse_rows(table("pima"), text),
            Err(EngineError::MalformedDataset { .. })
        ));
    }

    #[test]
    fn test_unknown_dataset() {
        let loader = TabularLoader::new(scratch_dir("unknown"));
        assert!(matches!(
            loader.load_split("titanic"),
            Err(EngineError::DatasetNotFound(n)) if n == "titanic"
        ));
    }

    #[test]
    fn test_single_file_split_is_seeded() {
        let dir = scratch_dir("pima");
        let mut text = String::new();
        for i in 0..20 {
            text.push_str(&format!("{i},1,2,3,4,5,6,7,{}\n", i % 2));
        }
        fs::write(dir.join("pima.csv"), text).unwrap();

        let loader = TabularLoader::new(&dir);
        let a = loader.load_split("pima").unwrap();
        let b = loader.load_split("pima").unwrap();

        assert_eq!(a.train.len(), 16);
        assert_eq!(a.test.len(),  4);
        assert_eq!(a.train.samples, b.train.samples);
        assert_eq!(a.train.feature_shape, vec![8]);
        assert_eq!(a.train.task, TaskKind::Binary);
    }
}
