//! Final report assembly: fixed columns, typed cells, weekly-cycle sort.

use crate::directory::ContractDirectory;
use crate::engine::Reconciliation;
use crate::model::{ContractRecord, ReconciledOutcome, Report, ReportRow, ReportValue, Weekday};
use crate::summary::compute_summary;
use crate::visits::{parse_number, VisitLog};

/// Output columns, in order.
pub const COLUMNS: [&str; 29] = [
    "CONTRATO",
    "FECHA CONTRATO",
    "FORMA PAGO",
    "ESTATUS",
    "SALA",
    "CLIENTE",
    "DOMICILIO",
    "COLONIA",
    "LOCALIDAD",
    "TELEFONO",
    "PROMOTOR",
    "COBRADOR",
    "Dia de visita semanal",
    "monto_pago_actual",
    "Num Cobrador",
    "COBRADOR SIN SEGMENTO",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Dia Visita Correcto",
    "proyeccion",
    "Resultado",
    "Aportacion Actual",
    "Aporto",
    "Dia Cobro",
];

/// Sort key: scheduled weekday in cycle order (unset last), then contract.
fn sort_key(record: &ContractRecord) -> (usize, &str) {
    (
        record.scheduled_day.map_or(Weekday::CYCLE.len(), Weekday::index),
        record.contract.as_str(),
    )
}

/// Join outcomes onto the directory and lay out the report rows.
pub fn assemble(directory: &ContractDirectory, recon: &Reconciliation, log: &VisitLog) -> Report {
    let mut joined: Vec<(&ContractRecord, ReconciledOutcome)> = directory
        .contracts
        .iter()
        .map(|c| (c, recon.outcome(&c.contract)))
        .collect();
    joined.sort_by(|a, b| sort_key(a.0).cmp(&sort_key(b.0)));

    let summary = compute_summary(&joined, recon, log, directory.duplicate_contracts);

    Report {
        columns: COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: joined.iter().map(|(c, o)| report_row(c, o)).collect(),
        summary,
    }
}

fn report_row(c: &ContractRecord, o: &ReconciledOutcome) -> ReportRow {
    let text = |s: &str| ReportValue::text(s);

    let mut row = vec![
        text(&c.contract),
        c.contract_date.map_or(ReportValue::Empty, ReportValue::Date),
        text(&c.payment_method),
        text(&c.status),
        text(&c.branch),
        text(&c.client),
        text(&c.street),
        text(&c.neighborhood),
        text(&c.locality),
        text(&c.phone),
        text(&c.promoter),
        text(&c.collector),
        text(c.scheduled_day.map_or("", Weekday::label)),
        match parse_number(&c.current_payment) {
            Some(n) => ReportValue::Number(n),
            None => text(&c.current_payment),
        },
        ReportValue::Number(1.0),
        text(&c.collector_unsegmented),
    ];

    for day in Weekday::CYCLE {
        row.push(text(o.slot(day).unwrap_or("")));
    }

    row.extend([
        text(o.visit_check.label()),
        text(c.projection_label()),
        text(o.outcome.as_deref().unwrap_or("")),
        ReportValue::Number(o.amount),
        ReportValue::Number(f64::from(o.contributed())),
        text(o.collection_day.map_or("", Weekday::label)),
    ]);

    debug_assert_eq!(row.len(), COLUMNS.len());
    row
}
