use std::collections::BTreeMap;

/// Contract-prefix → branch (sala) table.
const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("A0", "ESPARTANOS"),
    ("B0", "AGUILAS"),
    ("C0", "0"),
    ("D0", "SOLES"),
    ("DD", "SOLES"),
    ("E0", "0"),
    ("F0", "ESPARTANOS SLRC"),
    ("FA", "ESPARTANOS SLRC"),
    ("G0", "TORRE FUERTE"),
    ("H0", "LOBOS"),
    ("I0", "VICTORIA"),
    ("IN", "VICTORIA"),
    ("J0", "DIAMANTE"),
    ("JJ", "DIAMANTE"),
    ("K0", "AGUILAS SLRC"),
    ("L0", "INNOVA"),
    ("LA", "INNOVA"),
    ("LB", "INNOVA"),
    ("LL", "INNOVA"),
    ("M0", "LEGIONARIOS SLRC"),
    ("MA", "0"),
    ("MF", "0"),
    ("N0", "HALCONES SLRC"),
    ("O0", "ALFAS"),
    ("OO", "ALFAS"),
    ("OP", "ALFAS"),
    ("P0", "EMPLEADO"),
    ("Q0", "EAR OLIMPO"),
    ("R0", "ELITE"),
    ("S0", "ALFAS MXL"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct BranchTable {
    prefixes: BTreeMap<String, String>,
}

impl Default for BranchTable {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES
                .iter()
                .map(|(p, b)| (p.to_string(), b.to_string()))
                .collect(),
        }
    }
}

impl BranchTable {
    /// Default table with `extra` entries added or overriding.
    pub fn with_overrides<'a, I>(extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut table = Self::default();
        for (prefix, branch) in extra {
            table.prefixes.insert(prefix.to_uppercase(), branch.clone());
        }
        table
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Branch for a contract key, looked up by its uppercased two-character
    /// prefix. Unmapped prefixes give an empty string.
    pub fn lookup(&self, contract: &str) -> String {
        let prefix: String = contract.trim().chars().take(2).collect::<String>().to_uppercase();
        self.prefixes.get(&prefix).cloned().unwrap_or_default()
    }
}
