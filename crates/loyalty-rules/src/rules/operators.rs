use serde::Serialize;

use super::domain::OperatorOption;

/// Operator family and the concrete operators it offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorFamily {
    pub name: &'static str,
    pub operators: &'static [(&'static str, &'static str)],
}

impl OperatorFamily {
    pub fn options(&self) -> Vec<OperatorOption> {
        self.operators
            .iter()
            .map(|(value, display_name)| OperatorOption {
                value: (*value).to_string(),
                display_name: (*display_name).to_string(),
            })
            .collect()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.operators.iter().any(|(candidate, _)| *candidate == value)
    }
}

const FAMILIES: &[OperatorFamily] = &[
    OperatorFamily {
        name: "Numeric",
        operators: &[
            ("equals", "Equals"),
            ("not_equals", "Not Equals"),
            ("greater_than", "Greater Than"),
            ("greater_than_or_equal", "Greater Than Or Equal"),
            ("less_than", "Less Than"),
            ("less_than_or_equal", "Less Than Or Equal"),
        ],
    },
    OperatorFamily {
        name: "String",
        operators: &[
            ("equals", "Equals"),
            ("not_equals", "Not Equals"),
            ("contains", "Contains"),
            ("starts_with", "Starts With"),
            ("ends_with", "Ends With"),
        ],
    },
    OperatorFamily {
        name: "Date",
        operators: &[
            ("on", "On"),
            ("before", "Before"),
            ("after", "After"),
        ],
    },
    OperatorFamily {
        name: "Boolean",
        operators: &[("is_true", "Is True"), ("is_false", "Is False")],
    },
    OperatorFamily {
        name: "List",
        operators: &[("in", "In"), ("not_in", "Not In")],
    },
];

/// Static, pre-loaded operator table. Lookups never touch the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorCatalog;

impl OperatorCatalog {
    pub fn families(&self) -> &'static [OperatorFamily] {
        FAMILIES
    }

    pub fn family(&self, name: &str) -> Option<&'static OperatorFamily> {
        FAMILIES.iter().find(|family| family.name == name)
    }

    /// Sub-operators of a family; empty for unknown names.
    pub fn sub_operators(&self, name: &str) -> Vec<OperatorOption> {
        self.family(name)
            .map(OperatorFamily::options)
            .unwrap_or_default()
    }
}
