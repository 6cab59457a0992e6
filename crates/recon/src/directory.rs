//! Contract directory: one resolved row per ledger contract.

use std::collections::{HashMap, HashSet};

use crate::branch::BranchTable;
use crate::dates::parse_date;
use crate::error::ReportError;
use crate::model::{ContractRecord, ReportInput, Weekday};
use crate::table::{cell, contract_key, SourceTable};

pub const KEY_COLUMN: &str = "contrato";
pub const PROJECTION_KEY_COLUMN: &str = "Contrato";
pub const LEDGER_COLUMNS: [&str; 7] = [
    "contrato",
    "cliente",
    "domicilio",
    "colonia",
    "localidad",
    "telefono",
    "promotor",
];
pub const SIGGO_COLUMNS: [&str; 5] = [
    "contrato",
    "forma_pago",
    "estatus",
    "cobrador",
    "Dia de visita semanal",
];
pub const CONTRACT_DATE_COLUMN: &str = "fecha_contrato";
pub const CURRENT_PAYMENT_COLUMN: &str = "monto_pago_actual";
pub const BRANCH_COLUMN: &str = "sala";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractDirectory {
    /// In ledger order.
    pub contracts: Vec<ContractRecord>,
    /// Ledger rows ignored because their key was already seen.
    pub duplicate_contracts: usize,
    /// True when no `sala` column existed and branches came from key prefixes.
    pub branch_derived: bool,
}

/// A status source keyed by normalized contract key (first occurrence wins).
struct KeyedSource<'a> {
    table: &'a SourceTable,
    rows: HashMap<String, usize>,
}

impl<'a> KeyedSource<'a> {
    fn new(table: &'a SourceTable) -> Result<Self, ReportError> {
        let key_idx = table.require(KEY_COLUMN)?;
        let mut rows = HashMap::new();
        let mut duplicates = 0usize;
        for (i, row) in table.rows.iter().enumerate() {
            let key = contract_key(cell(row, key_idx));
            if key.is_empty() {
                continue;
            }
            if rows.contains_key(&key) {
                duplicates += 1;
            } else {
                rows.insert(key, i);
            }
        }
        if duplicates > 0 {
            log::warn!(
                "{}: {} duplicate contract row(s) ignored, first occurrence kept",
                table.source,
                duplicates
            );
        }
        Ok(Self { table, rows })
    }

    fn row(&self, key: &str) -> Option<&'a [String]> {
        self.rows.get(key).map(|&i| self.table.rows[i].as_slice())
    }

    fn value(&self, key: &str, col: usize) -> String {
        self.row(key)
            .map(|r| cell(r, col).trim().to_string())
            .unwrap_or_default()
    }
}

/// Where a joined ledger+PABS column is read from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum JoinedColumn {
    Pabs(usize),
    Ledger(usize),
}

fn locate(pabs: &SourceTable, cartera: &SourceTable, column: &str) -> Option<JoinedColumn> {
    pabs.column(column)
        .map(JoinedColumn::Pabs)
        .or_else(|| cartera.column(column).map(JoinedColumn::Ledger))
}

/// Remove every digit from a collector name ("COBRADOR 12" → "COBRADOR ").
pub fn strip_digits(s: &str) -> String {
    s.chars().filter(|c| !c.is_ascii_digit()).collect()
}

/// Normalized contract keys listed in the projections source.
pub fn projection_keys(proyecciones: &SourceTable) -> Result<HashSet<String>, ReportError> {
    let idx = proyecciones.require(PROJECTION_KEY_COLUMN)?;
    Ok(proyecciones
        .rows
        .iter()
        .map(|r| contract_key(cell(r, idx)))
        .filter(|k| !k.is_empty())
        .collect())
}

/// Check every column the directory needs before any row is touched.
pub fn validate_sources(input: &ReportInput) -> Result<(), ReportError> {
    for table in [&input.cartera, &input.pabs, &input.siggo, &input.proyecciones] {
        table.require_header()?;
    }
    for col in LEDGER_COLUMNS {
        input.cartera.require(col)?;
    }
    input.pabs.require(KEY_COLUMN)?;
    for col in SIGGO_COLUMNS {
        input.siggo.require(col)?;
    }
    input.proyecciones.require(PROJECTION_KEY_COLUMN)?;
    for col in [CONTRACT_DATE_COLUMN, CURRENT_PAYMENT_COLUMN] {
        if locate(&input.pabs, &input.cartera, col).is_none() {
            return Err(ReportError::missing_column(&input.pabs.source, col));
        }
    }
    Ok(())
}

/// Join ledger, PABS, SIGGO and projections into the contract directory.
pub fn build_directory(
    input: &ReportInput,
    branches: &BranchTable,
) -> Result<ContractDirectory, ReportError> {
    validate_sources(input)?;

    let cartera = &input.cartera;
    let ledger_idx: Vec<usize> = LEDGER_COLUMNS
        .iter()
        .map(|c| cartera.require(c))
        .collect::<Result<_, _>>()?;
    let siggo_idx: Vec<usize> = SIGGO_COLUMNS
        .iter()
        .map(|c| input.siggo.require(c))
        .collect::<Result<_, _>>()?;

    let pabs = KeyedSource::new(&input.pabs)?;
    let siggo = KeyedSource::new(&input.siggo)?;
    let projections = projection_keys(&input.proyecciones)?;

    let missing = |col: &str| ReportError::missing_column(&input.pabs.source, col);
    let date_col = locate(&input.pabs, cartera, CONTRACT_DATE_COLUMN)
        .ok_or_else(|| missing(CONTRACT_DATE_COLUMN))?;
    let payment_col = locate(&input.pabs, cartera, CURRENT_PAYMENT_COLUMN)
        .ok_or_else(|| missing(CURRENT_PAYMENT_COLUMN))?;
    let branch_col = locate(&input.pabs, cartera, BRANCH_COLUMN);
    if branch_col.is_none() {
        log::warn!(
            "column '{}' not found in {} or {}; deriving branch from contract prefix",
            BRANCH_COLUMN,
            input.pabs.source,
            cartera.source
        );
    }

    let joined = |key: &str, ledger_row: &[String], col: JoinedColumn| -> String {
        match col {
            JoinedColumn::Pabs(i) => pabs.value(key, i),
            JoinedColumn::Ledger(i) => cell(ledger_row, i).trim().to_string(),
        }
    };

    let mut directory = ContractDirectory {
        branch_derived: branch_col.is_none(),
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::new();
    let mut blank_keys = 0usize;

    for row in &cartera.rows {
        let field = |n: usize| cell(row, ledger_idx[n]).trim().to_string();

        let key = contract_key(cell(row, ledger_idx[0]));
        if key.is_empty() {
            blank_keys += 1;
            continue;
        }
        if !seen.insert(key.clone()) {
            directory.duplicate_contracts += 1;
            continue;
        }

        let collector = siggo.value(&key, siggo_idx[3]);
        let branch = match branch_col {
            Some(col) => joined(&key, row, col),
            None => branches.lookup(&key),
        };

        directory.contracts.push(ContractRecord {
            contract_date: parse_date(&joined(&key, row, date_col)),
            payment_method: siggo.value(&key, siggo_idx[1]),
            status: siggo.value(&key, siggo_idx[2]),
            branch,
            client: field(1),
            street: field(2),
            neighborhood: field(3),
            locality: field(4),
            phone: field(5),
            promoter: field(6),
            scheduled_day: Weekday::parse_label(&siggo.value(&key, siggo_idx[4])),
            current_payment: joined(&key, row, payment_col),
            collector_unsegmented: strip_digits(&collector),
            collector,
            has_projection: projections.contains(&key),
            contract: key,
        });
    }

    if directory.duplicate_contracts > 0 {
        log::warn!(
            "{}: {} duplicate contract row(s) ignored, first occurrence kept",
            cartera.source,
            directory.duplicate_contracts
        );
    }
    if blank_keys > 0 {
        log::warn!("{}: {} row(s) without contract skipped", cartera.source, blank_keys);
    }
    log::info!("directory: {} contracts", directory.contracts.len());

    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn table(source: &str, headers: &[&str], rows: &[&[&str]]) -> SourceTable {
        SourceTable::new(source, s(headers), rows.iter().map(|r| s(r)).collect())
    }

    fn input(cartera_rows: &[&[&str]], pabs: SourceTable) -> ReportInput {
        ReportInput {
            cartera: table(
                "cartera",
                &LEDGER_COLUMNS,
                cartera_rows,
            ),
            pabs,
            siggo: table(
                "siggo",
                &SIGGO_COLUMNS,
                &[
                    &["A0001", "SEMANAL", "ACTIVO", "COBRADOR 12", "Jueves"],
                    &["z9001", "MENSUAL", "ACTIVO", "", "lunes"],
                ],
            ),
            ecobro: SourceTable::default(),
            proyecciones: table("proyecciones", &["Contrato"], &[&["A0003"], &[" z9001 "]]),
        }
    }

    fn pabs_with_sala() -> SourceTable {
        table(
            "pabs",
            &["contrato", "fecha_contrato", "monto_pago_actual", "sala"],
            &[&["A0001", "2024-05-01", "150", "CENTRO"]],
        )
    }

    fn pabs_without_sala() -> SourceTable {
        table(
            "pabs",
            &["contrato", "fecha_contrato", "monto_pago_actual"],
            &[&["A0001", "2024-05-01 00:00:00", "150"]],
        )
    }

    const ROW_A: &[&str] = &["A0001", "Ana", "Calle 1", "Centro", "Tijuana", "555", "Pedro"];
    const ROW_Z: &[&str] = &["z9001", "Zoe", "Calle 9", "Norte", "Mexicali", "556", "Luis"];
    const ROW_LOWER: &[&str] = &["a0003", "Alba", "Calle 3", "Sur", "Tecate", "557", "Pedro"];

    #[test]
    fn joins_status_sources() {
        let dir = build_directory(&input(&[ROW_A], pabs_without_sala()), &BranchTable::default())
            .unwrap();
        assert_eq!(dir.contracts.len(), 1);
        let c = &dir.contracts[0];
        assert_eq!(c.contract, "A0001");
        assert_eq!(c.client, "Ana");
        assert_eq!(c.payment_method, "SEMANAL");
        assert_eq!(c.collector, "COBRADOR 12");
        assert_eq!(c.collector_unsegmented, "COBRADOR ");
        assert_eq!(c.scheduled_day, Some(Weekday::Jueves));
        assert_eq!(c.current_payment, "150");
        assert_eq!(c.contract_date, chrono::NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(c.branch, "ESPARTANOS");
        assert!(dir.branch_derived);
    }

    #[test]
    fn explicit_branch_column_wins() {
        let dir = build_directory(&input(&[ROW_A, ROW_Z], pabs_with_sala()), &BranchTable::default())
            .unwrap();
        assert!(!dir.branch_derived);
        assert_eq!(dir.contracts[0].branch, "CENTRO");
        // No PABS row for Z9001: joined value is blank.
        assert_eq!(dir.contracts[1].branch, "");
    }

    #[test]
    fn unknown_prefix_keeps_row() {
        let dir = build_directory(&input(&[ROW_Z], pabs_without_sala()), &BranchTable::default())
            .unwrap();
        assert_eq!(dir.contracts.len(), 1);
        let c = &dir.contracts[0];
        assert_eq!(c.contract, "Z9001");
        assert_eq!(c.branch, "");
        assert_eq!(c.scheduled_day, Some(Weekday::Lunes));
        assert!(c.has_projection);
        assert_eq!(c.current_payment, "");
        assert_eq!(c.contract_date, None);
    }

    #[test]
    fn projection_matches_after_uppercasing() {
        let dir = build_directory(&input(&[ROW_LOWER], pabs_without_sala()), &BranchTable::default())
            .unwrap();
        let c = &dir.contracts[0];
        assert_eq!(c.contract, "A0003");
        assert!(c.has_projection);
        assert_eq!(c.projection_label(), "Proyeccion");
        // No SIGGO row: no schedule.
        assert_eq!(c.scheduled_day, None);
    }

    #[test]
    fn duplicate_ledger_keys_keep_first() {
        let dup: &[&str] = &["a0001", "Otra", "", "", "", "", ""];
        let dir = build_directory(&input(&[ROW_A, dup], pabs_without_sala()), &BranchTable::default())
            .unwrap();
        assert_eq!(dir.contracts.len(), 1);
        assert_eq!(dir.contracts[0].client, "Ana");
        assert_eq!(dir.duplicate_contracts, 1);
    }

    #[test]
    fn payment_columns_may_come_from_ledger() {
        let mut inp = input(&[], table("pabs", &["contrato"], &[]));
        inp.cartera = table(
            "cartera",
            &[
                "contrato", "cliente", "domicilio", "colonia", "localidad", "telefono", "promotor",
                "fecha_contrato", "monto_pago_actual",
            ],
            &[&["A0001", "Ana", "", "", "", "", "", "01/02/2024", "$200"]],
        );
        let dir = build_directory(&inp, &BranchTable::default()).unwrap();
        assert_eq!(dir.contracts[0].current_payment, "$200");
        assert_eq!(dir.contracts[0].contract_date, chrono::NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn missing_ledger_column_names_source() {
        let mut inp = input(&[ROW_A], pabs_without_sala());
        inp.cartera = table("cartera", &["contrato", "cliente"], &[]);
        let err = build_directory(&inp, &BranchTable::default()).unwrap_err();
        assert_eq!(err, ReportError::missing_column("cartera", "domicilio"));
    }

    #[test]
    fn missing_payment_column_names_pabs() {
        let inp = input(&[ROW_A], table("pabs", &["contrato", "fecha_contrato"], &[]));
        let err = build_directory(&inp, &BranchTable::default()).unwrap_err();
        assert_eq!(err, ReportError::missing_column("pabs", "monto_pago_actual"));
    }

    #[test]
    fn missing_schedule_column_names_siggo() {
        let mut inp = input(&[ROW_A], pabs_without_sala());
        inp.siggo = table("siggo", &["contrato", "forma_pago", "estatus", "cobrador"], &[]);
        let err = build_directory(&inp, &BranchTable::default()).unwrap_err();
        assert_eq!(err, ReportError::missing_column("siggo", "Dia de visita semanal"));
    }

    #[test]
    fn strip_digits_passthrough() {
        assert_eq!(strip_digits("JUAN 3"), "JUAN ");
        assert_eq!(strip_digits("A1B22C"), "ABC");
        assert_eq!(strip_digits(""), "");
    }
}
