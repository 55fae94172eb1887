use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// One historical laptop entry. Empty cells in the source file are absent here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub attributes: BTreeMap<String, String>,
    pub price: f64,
}

impl CatalogRecord {
    pub fn new(price: f64) -> Self {
        Self { attributes: BTreeMap::new(), price }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into(), value.into());
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).map(String::as_str)
    }
}

/// Read-only reference table. Record order is the file order and is preserved.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    records: Vec<CatalogRecord>,
}

impl Catalog {
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self { records }
    }

    pub fn from_csv_path(path: &Path, price_column: &str) -> Result<Self, CatalogError> {
        let file = File::open(path)
            .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;
        Self::from_csv_reader(file, price_column)
    }

    /// Parses a header-first CSV. Text fields that are not valid UTF-8 are
    /// decoded as Latin-1, so arbitrary bytes never fail the load.
    pub fn from_csv_reader<R: Read>(reader: R, price_column: &str) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(|source| CatalogError::Parse { line: 1, source })?
            .iter()
            .map(decode_field)
            .collect();

        let price_index = headers
            .iter()
            .position(|header| header == price_column)
            .ok_or_else(|| CatalogError::MissingPriceColumn(price_column.to_owned()))?;

        let mut records = Vec::new();
        let mut raw = csv::ByteRecord::new();
        loop {
            let line = reader.position().line();
            match reader.read_byte_record(&mut raw) {
                Ok(false) => break,
                Ok(true) => {}
                Err(source) => return Err(CatalogError::Parse { line, source }),
            }
            let line = raw.position().map(|position| position.line()).unwrap_or(line);

            let raw_price = raw.get(price_index).map(decode_field).unwrap_or_default();
            let price = raw_price
                .trim()
                .parse::<f64>()
                .map_err(|_| CatalogError::InvalidPrice { line, value: raw_price.clone() })?;

            let mut record = CatalogRecord::new(price);
            for (index, field) in raw.iter().enumerate() {
                if index == price_index {
                    continue;
                }
                let value = decode_field(field);
                if value.trim().is_empty() {
                    continue;
                }
                record.attributes.insert(headers[index].clone(), value);
            }
            records.push(record);
        }

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.records.iter().any(|record| record.attributes.contains_key(attribute))
    }

    /// Distinct values of `attribute` in first-appearance order.
    pub fn distinct_values(&self, attribute: &str) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|record| record.get(attribute))
            .filter(|value| seen.insert(*value))
            .collect()
    }

    /// Sorted distinct values, or `None` when no record carries the attribute.
    pub fn attribute_domain(&self, attribute: &str) -> Option<Vec<String>> {
        let values: BTreeSet<&str> =
            self.records.iter().filter_map(|record| record.get(attribute)).collect();
        if values.is_empty() {
            return None;
        }
        Some(values.into_iter().map(str::to_owned).collect())
    }
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => bytes.iter().copied().map(char::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CatalogRecord};
    use crate::errors::CatalogError;

    fn sample() -> Catalog {
        Catalog::new(vec![
            CatalogRecord::new(1899.0).with_attribute("RAM", "16GB").with_attribute("Company", "Dell"),
            CatalogRecord::new(499.0).with_attribute("RAM", "8GB").with_attribute("Company", "Acer"),
            CatalogRecord::new(1299.0).with_attribute("RAM", "16GB").with_attribute("Company", "Apple"),
            CatalogRecord::new(349.0).with_attribute("RAM", "4GB"),
        ])
    }

    #[test]
    fn distinct_values_keep_first_appearance_order() {
        let catalog = sample();

        assert_eq!(catalog.distinct_values("RAM"), vec!["16GB", "8GB", "4GB"]);
        assert_eq!(catalog.distinct_values("Company"), vec!["Dell", "Acer", "Apple"]);
        assert!(catalog.distinct_values("Gpu").is_empty());
    }

    #[test]
    fn attribute_domain_is_sorted_and_absent_for_unknown_attributes() {
        let catalog = sample();

        assert_eq!(
            catalog.attribute_domain("Company"),
            Some(vec!["Acer".to_owned(), "Apple".to_owned(), "Dell".to_owned()])
        );
        assert_eq!(catalog.attribute_domain("Gpu"), None);
        assert!(catalog.has_attribute("RAM"));
        assert!(!catalog.has_attribute("Gpu"));
    }

    #[test]
    fn csv_loader_decodes_latin1_bytes_and_skips_empty_cells() {
        let mut data = b"Company,Product,Price_euros\n".to_vec();
        data.extend_from_slice(b"Acer,Aspire \xe9dition,499.5\n");
        data.extend_from_slice(b"Dell,,1200\n");

        let catalog = Catalog::from_csv_reader(data.as_slice(), "Price_euros")
            .expect("latin-1 catalog should load");

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.records()[0].get("Product"), Some("Aspire \u{e9}dition"));
        assert_eq!(catalog.records()[0].price, 499.5);
        assert_eq!(catalog.records()[1].get("Product"), None);
        assert_eq!(catalog.records()[1].get("Company"), Some("Dell"));
    }

    #[test]
    fn csv_loader_rejects_missing_price_column() {
        let data = "Company,Cpu\nAcer,i5\n";

        let error = Catalog::from_csv_reader(data.as_bytes(), "Price")
            .expect_err("price column is required");

        assert!(matches!(error, CatalogError::MissingPriceColumn(ref column) if column == "Price"));
    }

    #[test]
    fn csv_loader_reports_line_of_invalid_price() {
        let data = "Company,Price\nAcer,499\nDell,expensive\n";

        let error = Catalog::from_csv_reader(data.as_bytes(), "Price")
            .expect_err("non-numeric price should fail");

        assert!(matches!(
            error,
            CatalogError::InvalidPrice { line: 3, ref value } if value == "expensive"
        ));
    }

    #[test]
    fn csv_loader_rejects_ragged_rows() {
        let data = "Company,Price\nAcer,499,extra\n";

        let error = Catalog::from_csv_reader(data.as_bytes(), "Price")
            .expect_err("ragged rows should fail");

        assert!(matches!(error, CatalogError::Parse { .. }));
    }
}
