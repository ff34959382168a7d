//! List view: variable-length records rebuilt from independent engine buffers.
//!
//! A list package stores its records column-wise across several engine
//! variables: a live count, a node-number vector, a record-major bound
//! matrix and an auxiliary matrix whose column names live in yet another
//! variable. Reads reassemble records from the live buffers; writes encode
//! every column into copies first and only then store them, so a failed
//! write leaves the engine untouched.

use std::rc::Rc;

use mf_core::{DType, MfError, MfResult, RawBuffer, Session, Variable};
use mf_grid::Discretization;
use tracing::debug;

use crate::record::{Column, ColumnKind, FieldValue, ListData};
use crate::schema::BoundSchema;

struct PlainColumn {
    name: &'static str,
    var: Variable,
    kind: ColumnKind,
}

struct AuxBinding {
    count: Variable,
    names: Option<Variable>,
    values: Option<Variable>,
}

/// Record capacity: its own engine variable, or fixed at bind time when
/// the package keeps a single count.
enum Capacity {
    Live(Variable),
    Fixed(usize),
}

/// Where a named column is stored.
#[derive(Debug, Clone, Copy)]
enum Target {
    Node,
    Plain(usize),
    Bound(usize),
    Aux(usize),
}

/// Record view over one list package.
pub struct ListView {
    package: String,
    schema: &'static BoundSchema,
    grid: Option<Rc<Discretization>>,
    base: i32,
    nbound: Variable,
    capacity: Capacity,
    node: Option<Variable>,
    plain: Vec<PlainColumn>,
    bound: Option<Variable>,
    aux: Option<AuxBinding>,
}

fn column_kind(dtype: DType) -> ColumnKind {
    match dtype {
        DType::Double => ColumnKind::Double,
        DType::Int | DType::Bool => ColumnKind::Int,
        DType::Text => ColumnKind::Text,
    }
}

fn as_count(value: i32, what: &str) -> MfResult<usize> {
    usize::try_from(value).map_err(|_| MfError::InvalidArg {
        what: format!("{what} = {value}"),
    })
}

impl ListView {
    /// Bind the schema's variables under `component[/subcomponent]`.
    ///
    /// `grid` enables node-number translation; without it node fields read
    /// as raw integers.
    pub fn bind(
        session: &Session,
        schema: &'static BoundSchema,
        component: &str,
        subcomponent: Option<&str>,
        grid: Option<Rc<Discretization>>,
    ) -> MfResult<Self> {
        let package = match subcomponent {
            Some(sub) => format!("{component}/{sub}"),
            None => component.to_string(),
        };
        let addr = |name: &str| session.var_address(name, component, subcomponent);

        let counts = schema.counts.ok_or_else(|| MfError::CapabilityMismatch {
            package: package.clone(),
            expected: "list",
        })?;
        let nbound = Variable::bind(session, &addr(counts.nbound))?;
        let separate = if counts.maxbound == counts.nbound {
            None
        } else {
            Variable::bind_optional(session, &addr(counts.maxbound))?
        };
        let capacity = match separate {
            Some(var) => Capacity::Live(var),
            None => Capacity::Fixed(as_count(nbound.read_i32()?, nbound.address())?),
        };

        let node = match schema.node_field {
            Some(name) => Variable::bind_optional(session, &addr(name))?,
            None => None,
        };

        let mut plain = Vec::new();
        for &name in schema.fields {
            if let Some(var) = Variable::bind_optional(session, &addr(name))? {
                let kind = column_kind(var.read()?.dtype());
                plain.push(PlainColumn { name, var, kind });
            }
        }

        let bound = match schema.bound {
            Some(b) => Variable::bind_optional(session, &addr(b.name))?,
            None => None,
        };
        if let (Some(var), Some(b)) = (&bound, schema.bound) {
            let raw = var.read()?;
            if raw.cols() < b.columns.len() {
                return Err(MfError::ShapeMismatch {
                    what: var.address().to_string(),
                    expected: vec![raw.rows(), b.columns.len()],
                    actual: raw.shape().to_vec(),
                });
            }
        }

        let aux = match schema.aux {
            Some(a) => match Variable::bind_optional(session, &addr(a.count))? {
                Some(count) => Some(AuxBinding {
                    count,
                    names: Variable::bind_optional(session, &addr(a.names))?,
                    values: Variable::bind_optional(session, &addr(a.values))?,
                }),
                None => None,
            },
            None => None,
        };

        Ok(Self {
            package,
            schema,
            grid,
            base: session.node_index_base(),
            nbound,
            capacity,
            node,
            plain,
            bound,
            aux,
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Current number of records.
    pub fn nbound(&self) -> MfResult<usize> {
        as_count(self.nbound.read_i32()?, self.nbound.address())
    }

    /// Record capacity.
    pub fn maxbound(&self) -> MfResult<usize> {
        match &self.capacity {
            Capacity::Live(var) => as_count(var.read_i32()?, var.address()),
            Capacity::Fixed(n) => Ok(*n),
        }
    }

    /// Auxiliary column names, read live.
    fn aux_names(&self) -> MfResult<Vec<String>> {
        let Some(aux) = &self.aux else {
            return Ok(Vec::new());
        };
        let naux = as_count(aux.count.read_i32()?, aux.count.address())?;
        if naux == 0 {
            return Ok(Vec::new());
        }
        let names = aux.names.as_ref().ok_or_else(|| MfError::AddressNotFound {
            address: format!("{}/AUXNAME_CST", self.package),
        })?;
        let raw = names.read()?;
        let texts = raw.as_texts()?;
        if texts.len() < naux {
            return Err(MfError::IndexOutOfRange {
                what: "auxiliary name",
                index: naux - 1,
                len: texts.len(),
            });
        }
        Ok(texts[..naux]
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect())
    }

    /// Column layout of the records, in read order.
    pub fn columns(&self) -> MfResult<Vec<Column>> {
        let mut columns = Vec::new();
        if let (Some(_), Some(name)) = (&self.node, self.schema.node_field) {
            let kind = if self.grid.is_some() {
                ColumnKind::Cell
            } else {
                ColumnKind::Int
            };
            columns.push(Column::new(name, kind));
        }
        for p in &self.plain {
            columns.push(Column::new(p.name, p.kind));
        }
        if let (Some(_), Some(b)) = (&self.bound, self.schema.bound) {
            for &name in b.columns {
                columns.push(Column::new(name, ColumnKind::Double));
            }
        }
        for name in self.aux_names()? {
            columns.push(Column::new(name, ColumnKind::Double));
        }
        Ok(columns)
    }

    fn target(&self, name: &str, aux_names: &[String]) -> Option<Target> {
        let name = name.to_ascii_lowercase();
        if self.node.is_some() && self.schema.node_field == Some(name.as_str()) {
            return Some(Target::Node);
        }
        if let Some(k) = self.plain.iter().position(|p| p.name == name) {
            return Some(Target::Plain(k));
        }
        if self.bound.is_some() {
            if let Some(k) = self
                .schema
                .bound
                .and_then(|b| b.columns.iter().position(|&c| c == name))
            {
                return Some(Target::Bound(k));
            }
        }
        aux_names.iter().position(|a| *a == name).map(Target::Aux)
    }

    fn decode_node(&self, raw: i32) -> MfResult<FieldValue> {
        let Some(grid) = &self.grid else {
            return Ok(FieldValue::Int(raw));
        };
        let map = grid.node_map()?;
        let reduced = usize::try_from(raw - self.base).map_err(|_| MfError::InvalidArg {
            what: format!("{} node number {raw}", self.package),
        })?;
        let dense = map.to_dense(reduced)?;
        Ok(FieldValue::Cell(grid.shape()?.unravel(dense)?))
    }

    fn encode_node(&self, value: &FieldValue) -> MfResult<i32> {
        let Some(grid) = &self.grid else {
            return value.as_i32().ok_or_else(|| MfError::TypeMismatch {
                what: format!("{} node", self.package),
                expected: "int",
                actual: value.kind_name(),
            });
        };
        let coords = value.as_cell().ok_or_else(|| MfError::TypeMismatch {
            what: format!("{} node", self.package),
            expected: "cell",
            actual: value.kind_name(),
        })?;
        let dense = grid.shape()?.ravel(coords)?;
        let reduced = grid.node_map()?.to_reduced(dense)?;
        Ok(reduced as i32 + self.base)
    }

    fn numeric(&self, column: &str, value: &FieldValue) -> MfResult<f64> {
        value.as_f64().ok_or_else(|| MfError::TypeMismatch {
            what: format!("{}.{column}", self.package),
            expected: "double",
            actual: value.kind_name(),
        })
    }

    /// Reassemble the current records from the live buffers.
    pub fn read(&self) -> MfResult<ListData> {
        let mut data = ListData::new(self.columns()?);
        let n = self.nbound()?;
        if n == 0 {
            return Ok(data);
        }

        let node = self.node.as_ref().map(Variable::read).transpose()?;
        let plain = self
            .plain
            .iter()
            .map(|p| p.var.read())
            .collect::<MfResult<Vec<_>>>()?;
        let bound = self.bound.as_ref().map(Variable::read).transpose()?;
        let bound_cols = self.schema.bound.map_or(0, |b| b.columns.len());
        let naux = self.aux_names()?.len();
        let auxvar = if naux == 0 {
            None
        } else {
            let values = self
                .aux
                .as_ref()
                .and_then(|a| a.values.as_ref())
                .ok_or_else(|| MfError::AddressNotFound {
                    address: format!("{}/AUXVAR", self.package),
                })?;
            Some(values.read()?)
        };

        for i in 0..n {
            let mut row = Vec::with_capacity(data.columns().len());
            if let Some(buf) = &node {
                row.push(self.decode_node(buf.get_i32(i)?)?);
            }
            for (p, buf) in self.plain.iter().zip(&plain) {
                row.push(match p.kind {
                    ColumnKind::Int => FieldValue::Int(buf.get_i32(i)?),
                    ColumnKind::Text => {
                        let texts = buf.as_texts()?;
                        let text = texts.get(i).ok_or(MfError::IndexOutOfRange {
                            what: "list record",
                            index: i,
                            len: texts.len(),
                        })?;
                        FieldValue::Text(text.clone())
                    }
                    _ => FieldValue::Double(buf.get_f64(i)?),
                });
            }
            if let Some(buf) = &bound {
                let width = buf.cols();
                for j in 0..bound_cols {
                    row.push(FieldValue::Double(buf.get_f64(i * width + j)?));
                }
            }
            if let Some(buf) = &auxvar {
                let width = buf.cols();
                for j in 0..naux {
                    row.push(FieldValue::Double(buf.get_f64(i * width + j)?));
                }
            }
            data.push(row)?;
        }
        Ok(data)
    }

    /// Replace all records. `None` or an empty list sets the length to zero.
    ///
    /// Columns the view does not know are rejected; columns omitted from
    /// `data` keep their engine values. Growing the list requires the node
    /// and integer columns, since the new slots hold no valid values.
    pub fn write(&self, data: Option<&ListData>) -> MfResult<()> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            self.nbound.write_i32(0)?;
            debug!(package = %self.package, "list cleared");
            return Ok(());
        };

        let n = data.len();
        let maxbound = self.maxbound()?;
        if n > maxbound {
            return Err(MfError::CapacityExceeded {
                what: self.package.clone(),
                requested: n,
                maxbound,
            });
        }

        let aux_names = self.aux_names()?;
        let targets = data
            .columns()
            .iter()
            .map(|c| {
                self.target(&c.name, &aux_names)
                    .ok_or_else(|| MfError::KeyNotAccessible {
                        key: c.name.clone(),
                        package: self.package.clone(),
                    })
            })
            .collect::<MfResult<Vec<_>>>()?;
        if n > self.nbound()? {
            self.ensure_identity_columns(&targets)?;
        }

        let mut node: Option<RawBuffer> = None;
        let mut plain: Vec<Option<RawBuffer>> = vec![None; self.plain.len()];
        let mut bound: Option<RawBuffer> = None;
        let mut auxvar: Option<RawBuffer> = None;

        for (j, (column, target)) in data.columns().iter().zip(&targets).enumerate() {
            for (i, row) in data.rows().iter().enumerate() {
                let value = &row[j];
                match *target {
                    Target::Node => {
                        let buf = match &mut node {
                            Some(b) => b,
                            slot => slot.insert(self.read_var(self.node.as_ref())?),
                        };
                        buf.set_i32(i, self.encode_node(value)?)?;
                    }
                    Target::Plain(k) => {
                        let buf = match &mut plain[k] {
                            Some(b) => b,
                            slot => slot.insert(self.plain[k].var.read()?),
                        };
                        match value {
                            FieldValue::Int(v) => buf.set_i32(i, *v)?,
                            FieldValue::Double(v) => buf.set_f64(i, *v)?,
                            FieldValue::Text(s) => buf.set_text(i, s)?,
                            FieldValue::Cell(_) => {
                                return Err(MfError::TypeMismatch {
                                    what: format!("{}.{}", self.package, column.name),
                                    expected: "scalar",
                                    actual: "cell",
                                });
                            }
                        }
                    }
                    Target::Bound(k) => {
                        let v = self.numeric(&column.name, value)?;
                        let buf = match &mut bound {
                            Some(b) => b,
                            slot => slot.insert(self.read_var(self.bound.as_ref())?),
                        };
                        let width = buf.cols();
                        buf.set_f64(i * width + k, v)?;
                    }
                    Target::Aux(k) => {
                        let v = self.numeric(&column.name, value)?;
                        let buf = match &mut auxvar {
                            Some(b) => b,
                            slot => slot.insert(
                                self.read_var(self.aux.as_ref().and_then(|a| a.values.as_ref()))?,
                            ),
                        };
                        let width = buf.cols();
                        buf.set_f64(i * width + k, v)?;
                    }
                }
            }
        }

        if let (Some(buf), Some(var)) = (&node, &self.node) {
            var.write(buf)?;
        }
        for (buf, p) in plain.iter().zip(&self.plain) {
            if let Some(buf) = buf {
                p.var.write(buf)?;
            }
        }
        if let (Some(buf), Some(var)) = (&bound, &self.bound) {
            var.write(buf)?;
        }
        if let (Some(buf), Some(var)) = (
            &auxvar,
            self.aux.as_ref().and_then(|a| a.values.as_ref()),
        ) {
            var.write(buf)?;
        }
        self.nbound.write_i32(n as i32)?;
        debug!(package = %self.package, records = n, "list written");
        Ok(())
    }

    /// Node and integer columns must all be supplied.
    fn ensure_identity_columns(&self, targets: &[Target]) -> MfResult<()> {
        let missing = |key: &str| MfError::KeyNotAccessible {
            key: key.to_string(),
            package: self.package.clone(),
        };
        if let (Some(_), Some(name)) = (&self.node, self.schema.node_field) {
            if !targets.iter().any(|t| matches!(t, Target::Node)) {
                return Err(missing(name));
            }
        }
        for (k, p) in self.plain.iter().enumerate() {
            if p.kind == ColumnKind::Int
                && !targets.iter().any(|t| matches!(t, Target::Plain(j) if *j == k))
            {
                return Err(missing(p.name));
            }
        }
        Ok(())
    }

    fn read_var(&self, var: Option<&Variable>) -> MfResult<RawBuffer> {
        var.ok_or_else(|| MfError::AddressNotFound {
            address: self.package.clone(),
        })?
        .read()
    }

    /// Replace one column across all current records.
    pub fn set_column(&self, name: &str, values: Vec<FieldValue>) -> MfResult<()> {
        let mut data = self.read()?;
        data.set_column(name, values)?;
        self.write(Some(&data))
    }

    /// Replace one whole record.
    pub fn set_record(&self, index: usize, values: Vec<FieldValue>) -> MfResult<()> {
        let mut data = self.read()?;
        data.set_record(index, values)?;
        self.write(Some(&data))
    }

    /// Replace one field of one record.
    pub fn set_value(&self, index: usize, name: &str, value: FieldValue) -> MfResult<()> {
        let mut data = self.read()?;
        data.set(index, name, value)?;
        self.write(Some(&data))
    }

    /// Append a record; node fields are given as dense coordinates.
    pub fn push(&self, values: Vec<FieldValue>) -> MfResult<()> {
        let mut data = self.read()?;
        data.push(values)?;
        self.write(Some(&data))
    }
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("package", &self.package)
            .field("kind", &self.schema.kind)
            .finish_non_exhaustive()
    }
}
