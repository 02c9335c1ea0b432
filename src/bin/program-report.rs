/// Program Report CLI
///
/// Prints the status view, budget summary, dashboard, schedule and monthly
/// statistics of a backup snapshot as JSON.
///
/// Usage: program-report <snapshot.json> [config.json]

use log::info;
use program_report::{
    dashboard_summary, load_budget_summary, load_status_report, monthly_statistics, schedule_by_date,
    RecordSource, ReportConfig, Snapshot,
};
use serde_json::json;

fn main() -> program_report::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let mut args = std::env::args().skip(1);
    let Some(snapshot_path) = args.next() else {
        eprintln!("usage: program-report <snapshot.json> [config.json]");
        std::process::exit(2);
    };

    let mut config = match args.next() {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;
    info!("scope: year={:?} organization={:?}", config.year, config.organization);

    let snapshot = Snapshot::load(&snapshot_path)?;
    let session = load_status_report(&snapshot, &config)?;
    let view = session.view();
    info!("{} visible rows", view.len());

    let budget = load_budget_summary(&snapshot, &config)?;

    let records = snapshot.fetch_records(&config.scope())?;
    let dashboard = dashboard_summary(&records, &config.stat_groups, &config.aggregation.budget_buckets);
    let schedule = schedule_by_date(&records);

    let statistics: Vec<serde_json::Value> = match config.year_number() {
        Some(year) => (1..=12)
            .map(|month| monthly_statistics(&records, year, month, &config.stat_groups).to_json())
            .collect(),
        None => Vec::new(),
    };

    let output = json!({
        "status": view.to_json(session.layout()),
        "budget": budget.to_json(),
        "dashboard": dashboard,
        "schedule": schedule,
        "statistics": statistics,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
