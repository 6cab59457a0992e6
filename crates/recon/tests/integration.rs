use cobranza_recon::report::COLUMNS;
use cobranza_recon::{build_report, BranchTable, Report, ReportError, ReportInput, ReportValue, SourceTable};

fn s(v: &[&str]) -> Vec<String> {
    v.iter().map(|x| x.to_string()).collect()
}

fn table(source: &str, headers: &[&str], rows: &[&[&str]]) -> SourceTable {
    SourceTable::new(source, s(headers), rows.iter().map(|r| s(r)).collect())
}

/// A week running Thursday 2025-03-06 through Wednesday 2025-03-12.
fn week_input() -> ReportInput {
    ReportInput {
        cartera: table(
            "cartera",
            &["contrato", "cliente", "domicilio", "colonia", "localidad", "telefono", "promotor"],
            &[
                &["B0002", "Beto", "Calle 2", "Centro", "Tijuana", "552", "Pedro"],
                &["A0001", "Ana", "Calle 1", "Centro", "Tijuana", "551", "Pedro"],
                &["Z9001", "Zoe", "Calle 9", "Norte", "Mexicali", "559", "Luis"],
                &["a0003", "Alba", "Calle 3", "Sur", "Tecate", "553", "Luis"],
                &["D0004", "Dora", "Calle 4", "Sur", "Tecate", "554", "Luis"],
            ],
        ),
        pabs: table(
            "pabs",
            &["contrato", "fecha_contrato", "monto_pago_actual"],
            &[
                &["A0001", "2024-01-15", "150"],
                &["B0002", "2023-11-02 00:00:00", "$200.00"],
            ],
        ),
        siggo: table(
            "siggo",
            &["contrato", "forma_pago", "estatus", "cobrador", "Dia de visita semanal"],
            &[
                &["A0001", "SEMANAL", "ACTIVO", "COBRADOR 7", "Jueves"],
                &["B0002", "SEMANAL", "ACTIVO", "COBRADOR 7", "Viernes"],
                &["A0003", "QUINCENAL", "ACTIVO", "COBRADOR 8", "Miércoles"],
                &["D0004", "SEMANAL", "SUSPENDIDO", "COBRADOR 8", "Domingo"],
            ],
        ),
        ecobro: table(
            "ecobro",
            &["Fecha", "No. de Contrato", "Detalle", "Monto"],
            &[
                &["2025-03-06 10:15:00", "A0001", "Cobro", "$150.00"],
                &["2025-03-10 09:00:00", "B0002", "Visita", "$0.00"],
                &["2025-03-12 18:00:00", "a0003", "No estaba", ""],
                &["2025-03-12 11:00:00", "A0003", "Difirió el pago", ""],
                &["2025-03-09 12:00:00", "D0004", "No tenía dinero", "0"],
                &["2025-03-11 12:00:00", "D0004", "Cobro", "$1,000.00"],
                &["2025-03-11 08:00:00", "X0000", "Cobro", "$50.00"],
                &["fecha rota", "A0001", "Cobro", "$999.00"],
            ],
        ),
        proyecciones: table("proyecciones", &["Contrato"], &[&["A0003"], &["D0004"]]),
    }
}

fn row<'a>(report: &'a Report, contract: &str) -> &'a [ReportValue] {
    report
        .rows
        .iter()
        .find(|r| r[0] == ReportValue::Text(contract.into()))
        .unwrap_or_else(|| panic!("no row for {contract}"))
}

fn col(report: &Report, label: &str) -> usize {
    report.column_index(label).unwrap_or_else(|| panic!("no column {label}"))
}

fn text(report: &Report, contract: &str, label: &str) -> String {
    row(report, contract)[col(report, label)].render()
}

#[test]
fn columns_are_fixed() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(report.columns, COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    assert!(report.rows.iter().all(|r| r.len() == COLUMNS.len()));
}

#[test]
fn one_row_per_contract() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(report.rows.len(), 5);
}

#[test]
fn thursday_cobro_scenario() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(text(&report, "A0001", "Jueves"), "Cobro");
    assert_eq!(text(&report, "A0001", "Resultado"), "Cobro");
    assert_eq!(row(&report, "A0001")[col(&report, "Aportacion Actual")], ReportValue::Number(150.0));
    assert_eq!(text(&report, "A0001", "Dia Cobro"), "Jueves");
    assert_eq!(text(&report, "A0001", "Aporto"), "1");
    assert_eq!(text(&report, "A0001", "Dia Visita Correcto"), "Correcto");
    assert_eq!(text(&report, "A0001", "SALA"), "ESPARTANOS");
    assert_eq!(text(&report, "A0001", "FECHA CONTRATO"), "2024-01-15");
    assert_eq!(text(&report, "A0001", "COBRADOR SIN SEGMENTO"), "COBRADOR ");
}

#[test]
fn wrong_day_visit_scenario() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(text(&report, "B0002", "Lunes"), "Visita");
    assert_eq!(text(&report, "B0002", "Resultado"), "Visita");
    assert_eq!(text(&report, "B0002", "Aportacion Actual"), "0");
    assert_eq!(text(&report, "B0002", "Aporto"), "0");
    assert_eq!(text(&report, "B0002", "Dia Cobro"), "");
    assert_eq!(text(&report, "B0002", "Dia Visita Correcto"), "Incorrecto");
    assert_eq!(row(&report, "B0002")[col(&report, "monto_pago_actual")], ReportValue::Number(200.0));
}

#[test]
fn unknown_prefix_scenario() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(text(&report, "Z9001", "SALA"), "");
    // No schedule and no visits.
    assert_eq!(text(&report, "Z9001", "Dia de visita semanal"), "");
    for day in ["Jueves", "Viernes", "Sábado", "Domingo", "Lunes", "Martes", "Miércoles"] {
        assert_eq!(text(&report, "Z9001", day), "");
    }
    assert_eq!(text(&report, "Z9001", "Resultado"), "");
    assert_eq!(text(&report, "Z9001", "Aportacion Actual"), "0");
    assert_eq!(text(&report, "Z9001", "Aporto"), "0");
    assert_eq!(text(&report, "Z9001", "Dia Visita Correcto"), "Incorrecto");
}

#[test]
fn lowercase_key_matches_projection() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(text(&report, "A0003", "proyeccion"), "Proyeccion");
    assert_eq!(text(&report, "A0001", "proyeccion"), "Sin proyeccion");
    // "No estaba" at 18:00 hides the 11:00 deferral from the day slot,
    // so the deferral never reaches the weekly outcome either.
    assert_eq!(text(&report, "A0003", "Miércoles"), "No estaba");
    assert_eq!(text(&report, "A0003", "Resultado"), "No estaba");
    assert_eq!(text(&report, "A0003", "Dia Visita Correcto"), "Correcto");
}

#[test]
fn cobro_beats_earlier_named_detail() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(text(&report, "D0004", "Domingo"), "No tenía dinero");
    assert_eq!(text(&report, "D0004", "Martes"), "Cobro");
    assert_eq!(text(&report, "D0004", "Resultado"), "Cobro");
    assert_eq!(text(&report, "D0004", "Dia Cobro"), "Martes");
    assert_eq!(row(&report, "D0004")[col(&report, "Aportacion Actual")], ReportValue::Number(1000.0));
    assert_eq!(text(&report, "D0004", "Dia Visita Correcto"), "Correcto");
}

#[test]
fn rows_sorted_by_schedule_then_contract() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    let keys: Vec<String> = report.rows.iter().map(|r| r[0].render()).collect();
    // Jueves, Viernes, Domingo, Miércoles, then unscheduled.
    assert_eq!(keys, vec!["A0001", "B0002", "D0004", "A0003", "Z9001"]);
}

#[test]
fn summary_reflects_run() {
    let report = build_report(&week_input(), &BranchTable::default()).unwrap();
    let s = &report.summary;
    assert_eq!(s.contracts, 5);
    assert_eq!(s.with_visits, 4);
    assert_eq!(s.cobros, 2);
    assert_eq!(s.total_collected, 1150.0);
    assert_eq!(s.correct_visits, 3);
    assert_eq!(s.incorrect_visits, 2);
    assert_eq!(s.with_projection, 2);
    assert_eq!(s.events_read, 8);
    assert_eq!(s.dropped_dates, 1);
    assert_eq!(s.unmatched_events, 1);
    assert_eq!(s.events_used, 6);
}

#[test]
fn reconciliation_is_idempotent() {
    let input = week_input();
    let first = build_report(&input, &BranchTable::default()).unwrap();
    let second = build_report(&input, &BranchTable::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn event_order_does_not_matter() {
    let mut input = week_input();
    input.ecobro.rows.reverse();
    let reversed = build_report(&input, &BranchTable::default()).unwrap();
    let original = build_report(&week_input(), &BranchTable::default()).unwrap();
    assert_eq!(reversed.rows, original.rows);
}

#[test]
fn missing_column_aborts_run() {
    let mut input = week_input();
    input.siggo = table("siggo", &["contrato", "forma_pago", "estatus", "Dia de visita semanal"], &[]);
    let err = build_report(&input, &BranchTable::default()).unwrap_err();
    assert_eq!(
        err,
        ReportError::MissingColumn {
            source: "siggo".into(),
            column: "cobrador".into()
        }
    );
    assert!(err.is_schema());
}

#[test]
fn missing_ecobro_column_aborts_run() {
    let mut input = week_input();
    input.ecobro = table("ecobro", &["Fecha", "Detalle", "Monto"], &[]);
    let err = build_report(&input, &BranchTable::default()).unwrap_err();
    assert_eq!(err.to_string(), "source 'ecobro': missing column 'No. de Contrato'");
}
