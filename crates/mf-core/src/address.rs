//! Hierarchical variable addresses in the engine namespace.
//!
//! Addresses are `COMPONENT/NAME` or `COMPONENT/SUBCOMPONENT/NAME`, upper-case.

use core::fmt;

const SEPARATOR: char = '/';

/// A parsed `component[/subcomponent]/name` path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableAddress {
    component: String,
    subcomponent: Option<String>,
    name: String,
}

impl VariableAddress {
    pub fn new(name: &str, component: &str, subcomponent: Option<&str>) -> Self {
        Self {
            component: component.to_uppercase(),
            subcomponent: subcomponent
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase),
            name: name.to_uppercase(),
        }
    }

    /// Split an enumerated address. Returns `None` unless it has two or three parts.
    pub fn parse(address: &str) -> Option<Self> {
        let parts: Vec<&str> = address.split(SEPARATOR).collect();
        match parts.as_slice() {
            [component, name] => Some(Self {
                component: (*component).to_string(),
                subcomponent: None,
                name: (*name).to_string(),
            }),
            [component, sub, name] => Some(Self {
                component: (*component).to_string(),
                subcomponent: Some((*sub).to_string()),
                name: (*name).to_string(),
            }),
            _ => None,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn subcomponent(&self) -> Option<&str> {
        self.subcomponent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of path parts (2 or 3).
    pub fn depth(&self) -> usize {
        if self.subcomponent.is_some() { 3 } else { 2 }
    }

    /// True if this address lives directly under `component[/subcomponent]`.
    pub fn is_under(&self, component: &str, subcomponent: Option<&str>) -> bool {
        self.component.eq_ignore_ascii_case(component)
            && match (self.subcomponent.as_deref(), subcomponent) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }
}

impl fmt::Display for VariableAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subcomponent {
            Some(sub) => write!(f, "{}/{}/{}", self.component, sub, self.name),
            None => write!(f, "{}/{}", self.component, self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_upper_cases_all_parts() {
        let addr = VariableAddress::new("nodelist", "gwf_1", Some("wel_0"));
        assert_eq!(addr.to_string(), "GWF_1/WEL_0/NODELIST");
        let sim = VariableAddress::new("delt", "tdis", None);
        assert_eq!(sim.to_string(), "TDIS/DELT");
    }

    #[test]
    fn empty_subcomponent_is_dropped() {
        let addr = VariableAddress::new("nexg", "GWF-GWF_1", Some(""));
        assert_eq!(addr.depth(), 2);
        assert_eq!(addr.to_string(), "GWF-GWF_1/NEXG");
    }

    #[test]
    fn parse_two_and_three_parts() {
        let a = VariableAddress::parse("SLN_1/MXITER").unwrap();
        assert_eq!(a.component(), "SLN_1");
        assert_eq!(a.subcomponent(), None);
        assert_eq!(a.name(), "MXITER");

        let b = VariableAddress::parse("GWF_1/DIS/NODES").unwrap();
        assert_eq!(b.depth(), 3);
        assert!(b.is_under("gwf_1", Some("dis")));
        assert!(!b.is_under("GWF_1", None));

        assert!(VariableAddress::parse("X").is_none());
        assert!(VariableAddress::parse("A/B/C/D").is_none());
    }
}
