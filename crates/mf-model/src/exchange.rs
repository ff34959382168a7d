//! Model-to-model exchanges (`GWF-GWF_n`, `GWT-GWT_n`).

use mf_core::{AddressIndex, MfError, MfResult, Session};
use mf_data::ListData;
use tracing::debug;

use crate::model::declared_packages;
use crate::package::{Package, PackagePath};

/// Component prefixes that mark an exchange.
pub const EXCHANGE_PREFIXES: &[&str] = &["GWF-GWF", "GWT-GWT"];

/// Exchange kind for a component name, if it is one.
pub fn exchange_kind(component: &str) -> Option<&'static str> {
    let upper = component.to_ascii_uppercase();
    EXCHANGE_PREFIXES
        .iter()
        .zip(["gwf-gwf", "gwt-gwt"])
        .find(|(prefix, _)| upper.starts_with(**prefix))
        .map(|(_, kind)| kind)
}

/// An exchange: its own connection list plus any coupled sub-packages.
#[derive(Debug)]
pub struct Exchange {
    name: String,
    connections: Package,
    packages: Vec<Package>,
}

impl Exchange {
    pub fn bind(session: &Session, index: &AddressIndex, name: &str) -> MfResult<Self> {
        let kind = exchange_kind(name).ok_or_else(|| MfError::InvalidArg {
            what: format!("{name} is not an exchange"),
        })?;
        let connections =
            Package::bind(session, name, kind, PackagePath::simulation(name), None)?;
        let mut packages = Vec::new();
        for (package, kind) in declared_packages(session, index, name)? {
            packages.push(Package::bind(
                session,
                &package,
                &kind,
                PackagePath::model(name, &package),
                None,
            )?);
        }
        debug!(exchange = name, packages = packages.len(), "exchange bound");
        Ok(Self {
            name: name.to_lowercase(),
            connections,
            packages,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connection list package, named like the exchange.
    pub fn connections(&self) -> &Package {
        &self.connections
    }

    /// Current connection records (`nodem1`, `nodem2`, `cl1`, `cl2`, `ihc`).
    pub fn records(&self) -> MfResult<ListData> {
        self.connections().records()
    }

    /// Coupled sub-packages declared under the exchange.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// The connection list first, then the sub-packages.
    pub fn package_names(&self) -> Vec<&str> {
        std::iter::once(&self.connections)
            .chain(&self.packages)
            .map(Package::name)
            .collect()
    }

    pub fn package(&self, name: &str) -> MfResult<&Package> {
        std::iter::once(&self.connections)
            .chain(&self.packages)
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: self.name.clone(),
            })
    }
}
