//! Tagged record types for list package data.

use serde::{Deserialize, Serialize};

use mf_core::{MfError, MfResult};

/// Element type of a list column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Dense grid coordinates of a node reference.
    Cell,
    Int,
    Double,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One cell of a record, or one scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Double(f64),
    Text(String),
    Cell(Vec<usize>),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Int(_) => "int",
            FieldValue::Double(_) => "double",
            FieldValue::Text(_) => "text",
            FieldValue::Cell(_) => "cell",
        }
    }

    /// Numeric value, widening ints.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Double(v) if v.fract() == 0.0 => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&[usize]> {
        match self {
            FieldValue::Cell(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<Vec<usize>> for FieldValue {
    fn from(v: Vec<usize>) -> Self {
        FieldValue::Cell(v)
    }
}

/// An ordered sequence of records sharing one column layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListData {
    columns: Vec<Column>,
    rows: Vec<Vec<FieldValue>>,
}

impl ListData {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FieldValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> MfResult<usize> {
        self.column_index(name).ok_or_else(|| MfError::KeyNotAccessible {
            key: name.to_string(),
            package: "list data".to_string(),
        })
    }

    fn check_row(&self, row: &[FieldValue]) -> MfResult<()> {
        if row.len() != self.columns.len() {
            return Err(MfError::ShapeMismatch {
                what: "list record".to_string(),
                expected: vec![self.columns.len()],
                actual: vec![row.len()],
            });
        }
        Ok(())
    }

    /// Append a record; it must have one value per column.
    pub fn push(&mut self, row: Vec<FieldValue>) -> MfResult<()> {
        self.check_row(&row)?;
        self.rows.push(row);
        Ok(())
    }

    pub fn get(&self, row: usize, column: &str) -> MfResult<&FieldValue> {
        let j = self.require_column(column)?;
        let len = self.rows.len();
        self.rows
            .get(row)
            .map(|r| &r[j])
            .ok_or(MfError::IndexOutOfRange {
                what: "list record",
                index: row,
                len,
            })
    }

    /// Every value of one column, in record order.
    pub fn column(&self, name: &str) -> MfResult<Vec<&FieldValue>> {
        let j = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| &r[j]).collect())
    }

    pub fn set(&mut self, row: usize, column: &str, value: FieldValue) -> MfResult<()> {
        let j = self.require_column(column)?;
        let len = self.rows.len();
        let r = self.rows.get_mut(row).ok_or(MfError::IndexOutOfRange {
            what: "list record",
            index: row,
            len,
        })?;
        r[j] = value;
        Ok(())
    }

    pub fn set_record(&mut self, row: usize, values: Vec<FieldValue>) -> MfResult<()> {
        self.check_row(&values)?;
        let len = self.rows.len();
        let r = self.rows.get_mut(row).ok_or(MfError::IndexOutOfRange {
            what: "list record",
            index: row,
            len,
        })?;
        *r = values;
        Ok(())
    }

    /// Replace one column; `values` must cover every record.
    pub fn set_column(&mut self, name: &str, values: Vec<FieldValue>) -> MfResult<()> {
        let j = self.require_column(name)?;
        if values.len() != self.rows.len() {
            return Err(MfError::ShapeMismatch {
                what: format!("column {name}"),
                expected: vec![self.rows.len()],
                actual: vec![values.len()],
            });
        }
        for (row, v) in self.rows.iter_mut().zip(values) {
            row[j] = v;
        }
        Ok(())
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[&str]) -> MfResult<ListData> {
        let idx = names
            .iter()
            .map(|n| self.require_column(n))
            .collect::<MfResult<Vec<_>>>()?;
        Ok(ListData {
            columns: idx.iter().map(|&j| self.columns[j].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|&j| r[j].clone()).collect())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wel() -> ListData {
        let mut data = ListData::new(vec![
            Column::new("nodelist", ColumnKind::Cell),
            Column::new("flux", ColumnKind::Double),
        ]);
        data.push(vec![FieldValue::Cell(vec![0, 0, 5]), FieldValue::Double(-1.0)])
            .unwrap();
        data.push(vec![FieldValue::Cell(vec![0, 1, 2]), FieldValue::Double(-2.0)])
            .unwrap();
        data
    }

    #[test]
    fn records_are_addressed_by_column_name() {
        let mut data = wel();
        assert_eq!(data.get(1, "FLUX").unwrap(), &FieldValue::Double(-2.0));
        data.set(0, "flux", 3.5.into()).unwrap();
        assert_eq!(data.column("flux").unwrap()[0].as_f64(), Some(3.5));
        assert!(matches!(
            data.get(0, "cond"),
            Err(MfError::KeyNotAccessible { .. })
        ));
        assert!(matches!(
            data.get(2, "flux"),
            Err(MfError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn row_width_is_checked() {
        let mut data = wel();
        assert!(matches!(
            data.push(vec![1.0.into()]),
            Err(MfError::ShapeMismatch { .. })
        ));
        assert!(data.set_column("flux", vec![1.0.into()]).is_err());
    }

    #[test]
    fn select_reorders_columns() {
        let data = wel().select(&["flux", "nodelist"]).unwrap();
        assert_eq!(data.columns()[0].name, "flux");
        assert_eq!(data.rows()[1][1].as_cell(), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn list_data_serializes_to_yaml() {
        let data = wel();
        let yaml = serde_yaml::to_string(&data).unwrap();
        let back: ListData = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, data);
    }
}
