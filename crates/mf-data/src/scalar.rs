//! Scalar view: named configuration and state values.

use std::collections::BTreeMap;

use mf_core::{DType, MfError, MfResult, Session, Variable};

use crate::record::FieldValue;

/// Named scalars of one package, keyed by lower-case name.
///
/// Some engine "scalars" are per-period vectors (`NSTP`, `PERLEN`);
/// [`ScalarView::get`] reads the first element and [`ScalarView::get_at`]
/// any other.
#[derive(Debug, Clone, Default)]
pub struct ScalarView {
    package: String,
    values: BTreeMap<String, Variable>,
}

impl ScalarView {
    /// Bind every listed name the engine exposes under `component[/subcomponent]`.
    pub fn bind(
        session: &Session,
        names: &[&str],
        component: &str,
        subcomponent: Option<&str>,
    ) -> MfResult<Self> {
        let package = match subcomponent {
            Some(sub) => format!("{component}/{sub}"),
            None => component.to_string(),
        };
        let mut values = BTreeMap::new();
        for &name in names {
            let address = session.var_address(name, component, subcomponent);
            if let Some(var) = Variable::bind_optional(session, &address)? {
                values.insert(name.to_lowercase(), var);
            }
        }
        Ok(Self { package, values })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Bound names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&name.to_lowercase())
    }

    fn var(&self, name: &str) -> MfResult<&Variable> {
        self.values
            .get(&name.to_lowercase())
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: self.package.clone(),
            })
    }

    pub fn get(&self, name: &str) -> MfResult<FieldValue> {
        self.get_at(name, 0)
    }

    /// Element `index` of a vector-valued scalar.
    pub fn get_at(&self, name: &str, index: usize) -> MfResult<FieldValue> {
        let raw = self.var(name)?.read()?;
        match raw.dtype() {
            DType::Double => Ok(FieldValue::Double(raw.get_f64(index)?)),
            DType::Int | DType::Bool => Ok(FieldValue::Int(raw.get_i32(index)?)),
            DType::Text => {
                let texts = raw.as_texts()?;
                texts
                    .get(index)
                    .map(|s| FieldValue::Text(s.trim().to_string()))
                    .ok_or(MfError::IndexOutOfRange {
                        what: "scalar element",
                        index,
                        len: texts.len(),
                    })
            }
        }
    }

    pub fn get_f64(&self, name: &str) -> MfResult<f64> {
        self.var(name)?.read_f64()
    }

    pub fn get_i32(&self, name: &str) -> MfResult<i32> {
        self.var(name)?.read_i32()
    }

    /// Number of elements behind `name`.
    pub fn len_of(&self, name: &str) -> MfResult<usize> {
        Ok(self.var(name)?.read()?.len())
    }

    pub fn set(&self, name: &str, value: FieldValue) -> MfResult<()> {
        let var = self.var(name)?;
        let mut raw = var.read()?;
        match value {
            FieldValue::Int(v) => raw.set_i32(0, v)?,
            FieldValue::Double(v) => raw.set_f64(0, v)?,
            FieldValue::Text(s) => raw.set_text(0, &s)?,
            FieldValue::Cell(_) => {
                return Err(MfError::TypeMismatch {
                    what: format!("{}.{name}", self.package),
                    expected: "scalar",
                    actual: "cell",
                });
            }
        }
        var.write(&raw)
    }

    /// Fold another view's scalars into this one.
    ///
    /// Names already present here are inserted as `{prefix}{name}`.
    pub fn merge_prefixed(&mut self, other: ScalarView, prefix: &str) {
        for (name, var) in other.values {
            let key = if self.values.contains_key(&name) {
                format!("{prefix}{name}")
            } else {
                name
            };
            self.values.insert(key, var);
        }
    }
}
