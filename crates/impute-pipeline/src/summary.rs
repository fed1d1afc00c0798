//! Table summaries: `head`, `describe` and missing-value checks.

use crate::error::Result;
use crate::utils::{
    is_numeric_dtype, mean, missing_count, observed_values, quantile_sorted, sample_std,
    series_of, sorted,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// First `n` rows of the table.
pub fn head(df: &DataFrame, n: usize) -> DataFrame {
    df.head(Some(n))
}

/// Summary statistics of one numeric column. All statistics ignore missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    /// Observed (non-missing) values.
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnDescription {
    fn from_series(series: &Series) -> Result<Self> {
        let observed = observed_values(series)?;
        let ordered = sorted(&observed);

        Ok(Self {
            name: series.name().to_string(),
            count: observed.len(),
            mean: mean(&observed),
            std: sample_std(&observed),
            min: ordered.first().copied(),
            q25: quantile_sorted(&ordered, 0.25),
            median: quantile_sorted(&ordered, 0.5),
            q75: quantile_sorted(&ordered, 0.75),
            max: ordered.last().copied(),
        })
    }

    fn stat_rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ]
    }
}

/// Summary statistics of every numeric column, in table order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDescription {
    pub columns: Vec<ColumnDescription>,
}

impl TableDescription {
    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }
}

const STAT_LABEL_WIDTH: usize = 6;
const MIN_CELL_WIDTH: usize = 12;

impl fmt::Display for TableDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.columns.is_empty() {
            return writeln!(f, "(no numeric columns)");
        }

        let widths: Vec<usize> = self
            .columns
            .iter()
            .map(|c| c.name.len().max(MIN_CELL_WIDTH))
            .collect();

        write!(f, "{:<w$}", "", w = STAT_LABEL_WIDTH)?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, " {:>w$}", column.name, w = width)?;
        }
        writeln!(f)?;

        for row in 0..8 {
            let label = self.columns[0].stat_rows()[row].0;
            write!(f, "{:<w$}", label, w = STAT_LABEL_WIDTH)?;
            for (column, width) in self.columns.iter().zip(&widths) {
                match column.stat_rows()[row].1 {
                    Some(v) => write!(f, " {:>w$.3}", v, w = width)?,
                    None => write!(f, " {:>w$}", "NaN", w = width)?,
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Describe every numeric column of the table.
pub fn describe(df: &DataFrame) -> Result<TableDescription> {
    let columns = df
        .get_columns()
        .iter()
        .filter(|col| is_numeric_dtype(col.dtype()))
        .map(|col| ColumnDescription::from_series(col.as_materialized_series()))
        .collect::<Result<Vec<_>>>()?;

    Ok(TableDescription { columns })
}

/// Missing entries per column, in table order. NaN counts as missing.
pub fn missing_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|col| {
            (
                col.name().to_string(),
                missing_count(col.as_materialized_series()),
            )
        })
        .collect()
}

/// Whether a column has any missing entry.
pub fn has_missing(df: &DataFrame, column: &str) -> Result<bool> {
    Ok(missing_count(series_of(df, column)?) > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImputeError;

    fn sample() -> DataFrame {
        df![
            "age" => [Some(57i64), Some(63), None, Some(59), Some(41)],
            "gender" => ["Female", "Female", "Male", "Male", "Female"],
            "store_exp" => [Some(529.1), Some(478.0), Some(f64::NAN), Some(490.8), Some(227.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_head() {
        let df = sample();
        assert_eq!(head(&df, 2).height(), 2);
        assert_eq!(head(&df, 10).height(), 5);
    }

    #[test]
    fn test_describe_numeric_columns_only() {
        let description = describe(&sample()).unwrap();
        let names: Vec<&str> = description.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["age", "store_exp"]);
    }

    #[test]
    fn test_describe_statistics() {
        let description = describe(&sample()).unwrap();
        let age = description.column("age").unwrap();

        // observed: 41, 57, 59, 63
        assert_eq!(age.count, 4);
        assert_eq!(age.mean, Some(55.0));
        assert_eq!(age.min, Some(41.0));
        assert_eq!(age.q25, Some(53.0));
        assert_eq!(age.median, Some(58.0));
        assert_eq!(age.q75, Some(60.0));
        assert_eq!(age.max, Some(63.0));

        let store_exp = description.column("store_exp").unwrap();
        assert_eq!(store_exp.count, 4); // NaN is missing
    }

    #[test]
    fn test_describe_all_missing_column() {
        let df = df!["income" => [Option::<f64>::None, None]].unwrap();
        let income = describe(&df).unwrap().columns.remove(0);
        assert_eq!(income.count, 0);
        assert_eq!(income.mean, None);
        assert_eq!(income.max, None);
    }

    #[test]
    fn test_describe_display() {
        let rendered = describe(&sample()).unwrap().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 9);
        assert!(lines[0].contains("age") && lines[0].contains("store_exp"));
        assert!(lines[1].starts_with("count"));
        assert!(lines[2].contains("55.000"));
        assert!(lines[5].starts_with("25%"));
    }

    #[test]
    fn test_missing_counts() {
        let counts = missing_counts(&sample());
        assert_eq!(
            counts,
            vec![
                ("age".to_string(), 1),
                ("gender".to_string(), 0),
                ("store_exp".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_has_missing() {
        let df = sample();
        assert!(has_missing(&df, "age").unwrap());
        assert!(!has_missing(&df, "gender").unwrap());
        assert!(matches!(
            has_missing(&df, "income").unwrap_err(),
            ImputeError::ColumnNotFound(_)
        ));
    }
}
