//! Static per-kind metadata describing which engine variables a package has.
//!
//! Lookup is by package kind (`"wel"`, `"npf"`, `"tdis"`, ...). Kinds with no
//! entry get [`ADVANCED`], which exposes every variable through opaque access.

use serde::{Deserialize, Serialize};

/// How a package's variables are presented to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Named dense grid arrays.
    Array,
    /// Variable-length record list.
    List,
    /// Named scalars.
    Scalar,
    /// Opaque, address-level access only.
    Advanced,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Array => "array",
            Capability::List => "list",
            Capability::Scalar => "scalar",
            Capability::Advanced => "advanced",
        }
    }
}

/// Multi-column matrix whose columns are named by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundMatrix {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Fields controlling list length and capacity. May name the same variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountFields {
    pub nbound: &'static str,
    pub maxbound: &'static str,
}

/// Auxiliary columns, named at run time from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuxFields {
    pub count: &'static str,
    pub names: &'static str,
    pub values: &'static str,
}

const STANDARD_COUNTS: CountFields = CountFields {
    nbound: "nbound",
    maxbound: "maxbound",
};

const STANDARD_AUX: AuxFields = AuxFields {
    count: "naux",
    names: "auxname_cst",
    values: "auxvar",
};

/// Declarative layout of one package kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundSchema {
    pub kind: &'static str,
    pub capability: Capability,
    /// Plain fields, one engine variable each.
    pub fields: &'static [&'static str],
    /// Field holding engine node numbers.
    pub node_field: Option<&'static str>,
    pub bound: Option<BoundMatrix>,
    pub counts: Option<CountFields>,
    pub aux: Option<AuxFields>,
}

impl BoundSchema {
    const fn array(kind: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            kind,
            capability: Capability::Array,
            fields,
            node_field: None,
            bound: None,
            counts: None,
            aux: None,
        }
    }

    const fn scalar(kind: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            kind,
            capability: Capability::Scalar,
            fields,
            node_field: None,
            bound: None,
            counts: None,
            aux: None,
        }
    }

    /// Standard boundary package: nodelist, bound matrix and aux columns.
    const fn boundary(kind: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            kind,
            capability: Capability::List,
            fields: &[],
            node_field: Some("nodelist"),
            bound: Some(BoundMatrix {
                name: "bound",
                columns,
            }),
            counts: Some(STANDARD_COUNTS),
            aux: Some(STANDARD_AUX),
        }
    }

    /// List whose length and capacity share one count variable.
    const fn counted(kind: &'static str, count: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            kind,
            capability: Capability::List,
            fields,
            node_field: None,
            bound: None,
            counts: Some(CountFields {
                nbound: count,
                maxbound: count,
            }),
            aux: None,
        }
    }

    /// True if `name` is one of the variables this schema binds.
    pub fn covers(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        let name = name.as_str();
        self.fields.contains(&name)
            || self.node_field == Some(name)
            || self
                .bound
                .is_some_and(|b| b.name == name || b.columns.contains(&name))
            || self
                .counts
                .is_some_and(|c| c.nbound == name || c.maxbound == name)
            || self
                .aux
                .is_some_and(|a| a.count == name || a.names == name || a.values == name)
    }
}

pub const DIS: BoundSchema = BoundSchema::array("dis", &["top", "bot", "area", "idomain"]);
pub const IC: BoundSchema = BoundSchema::array("ic", &["strt"]);
pub const NPF: BoundSchema = BoundSchema::array(
    "npf",
    &["k11", "k22", "k33", "angle1", "angle2", "angle3", "icelltype"],
);
pub const STO: BoundSchema = BoundSchema::array("sto", &["iconvert", "ss", "sy"]);
pub const ADV: BoundSchema =
    BoundSchema::array("adv", &["diffc", "alh", "alv", "ath1", "ath2", "atv"]);
pub const IST: BoundSchema = BoundSchema::array(
    "ist",
    &[
        "cim",
        "thtaim",
        "zetaim",
        "decay",
        "decay_sorbed",
        "bulk_density",
        "distcoef",
    ],
);
pub const MST: BoundSchema = BoundSchema::array(
    "mst",
    &["porosity", "decay", "decay_sorbed", "bulk_density", "distcoef"],
);

pub const CHD: BoundSchema = BoundSchema::boundary("chd", &["head"]);
pub const DRN: BoundSchema = BoundSchema::boundary("drn", &["elev", "cond"]);
pub const EVT: BoundSchema = BoundSchema::boundary("evt", &["surface", "rate", "depth"]);
pub const GHB: BoundSchema = BoundSchema::boundary("ghb", &["bhead", "cond"]);
pub const RCH: BoundSchema = BoundSchema::boundary("rch", &["recharge"]);
pub const WEL: BoundSchema = BoundSchema::boundary("wel", &["flux"]);
pub const CNC: BoundSchema = BoundSchema::boundary("cnc", &["conc"]);
pub const SRC: BoundSchema = BoundSchema::boundary("src", &["smassrate"]);

const EXCHANGE_FIELDS: &[&str] = &["nodem1", "nodem2", "cl1", "cl2", "ihc"];
pub const GWF_GWF: BoundSchema = BoundSchema::counted("gwf-gwf", "nexg", EXCHANGE_FIELDS);
pub const GWT_GWT: BoundSchema = BoundSchema::counted("gwt-gwt", "nexg", EXCHANGE_FIELDS);

pub const ATS: BoundSchema = BoundSchema::counted(
    "ats",
    "maxats",
    &["iperats", "dt0", "dtmin", "dtmax", "dtadj", "dtfailadj"],
);

pub const TDIS: BoundSchema = BoundSchema::scalar(
    "tdis",
    &[
        "nper", "itmuni", "kper", "kstp", "delt", "pertim", "totim", "perlen", "nstp", "tsmult",
    ],
);
pub const SLN: BoundSchema = BoundSchema::scalar(
    "sln",
    &[
        "mxiter",
        "dvclose",
        "gamma",
        "theta",
        "akappa",
        "amomentum",
        "numtrack",
        "btol",
        "breduc",
        "res_lim",
    ],
);
pub const IMS: BoundSchema = BoundSchema::scalar(
    "ims",
    &[
        "niterc", "dvclose", "rclose", "relax", "ipc", "droptol", "north", "iscl", "iord",
    ],
);

/// Fallback for kinds with no declared layout.
pub const ADVANCED: BoundSchema = BoundSchema {
    kind: "advanced",
    capability: Capability::Advanced,
    fields: &[],
    node_field: None,
    bound: None,
    counts: None,
    aux: None,
};

/// Schema for a package kind; case-insensitive.
pub fn lookup(kind: &str) -> &'static BoundSchema {
    match kind.to_ascii_lowercase().as_str() {
        "dis" | "disu" | "disv" => &DIS,
        "ic" => &IC,
        "npf" => &NPF,
        "sto" => &STO,
        "adv" => &ADV,
        "ist" => &IST,
        "mst" => &MST,
        "chd" => &CHD,
        "drn" => &DRN,
        "evt" => &EVT,
        "ghb" => &GHB,
        "rch" => &RCH,
        "wel" => &WEL,
        "cnc" => &CNC,
        "src" => &SRC,
        "gwf-gwf" => &GWF_GWF,
        "gwt-gwt" => &GWT_GWT,
        "ats" => &ATS,
        "tdis" => &TDIS,
        "sln" => &SLN,
        "ims" => &IMS,
        // Many engine packages are only reachable through opaque access.
        _ => &ADVANCED,
    }
}
