use std::path::Path;

/// On-disk representation of a standings table, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    /// Anything that is not recognisably JSON or Parquet is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "json" => Format::Json,
            "parquet" | "pq" => Format::Parquet,
            _ => Format::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_by_extension() {
        assert_eq!(Format::from_path(Path::new("tables.csv")), Format::Csv);
        assert_eq!(Format::from_path(Path::new("tables.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("t.pq")), Format::Parquet);
        assert_eq!(Format::from_path(Path::new("t.parquet")), Format::Parquet);
        assert_eq!(Format::from_path(Path::new("tables")), Format::Csv);
        assert_eq!(Format::from_path(Path::new("tables.txt")), Format::Csv);
    }
}
