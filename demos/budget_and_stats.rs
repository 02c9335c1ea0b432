/// Budget and Statistics Example
///
/// This example demonstrates:
/// - Budget execution per budget line (allocated, spent, balance)
/// - Drill-down details sorted by amount
/// - Monthly attendance statistics by program group
/// - Year dashboard cards and the session schedule

use program_report::{
    dashboard_summary, load_budget_summary, monthly_statistics, schedule_by_date, RecordSource, ReportConfig,
    Snapshot, SortState,
};
use serde_json::json;

fn main() {
    println!("=== Program Report Budget & Statistics Example ===\n");

    let snapshot = Snapshot::from_value(json!({
        "categories": [
            {"key": "2025_예산", "items": [
                {"v1": "독서문화", "v2": "행사", "v3": "강연", "v4": "강사료", "v5": "210-01", "v6": "1,000,000"},
                {"v1": "평생교육", "v2": "강좌", "v3": "재료", "v4": "재료비", "v5": "310-06", "v6": "400,000"}
            ]}
        ],
        "entries": [
            {"id": "p1", "overview": {"year": "2025", "category": "독서문화행사", "title": "작가와의 만남"},
             "budgetItems": [{"v1": "독서문화", "v2": "행사", "v3": "강연", "v4": "강사료", "v5": "210-01", "amount": 350000}],
             "performances": [{"opDate": "2025-05-10", "adultM": 14, "adultF": 31}]},
            {"id": "p2", "overview": {"year": "2025", "category": "독서문화행사", "title": "북토크"},
             "budgetItems": [{"v1": "독서문화", "v2": "행사", "v3": "강연", "v4": "강사료", "v5": "210-01", "amount": 500000}],
             "performances": [{"opDate": "2025-05-24", "adultF": 18, "teenF": 6}]},
            {"id": "p3", "overview": {"year": "2025", "category": "평생교육강좌", "title": "도자기 공예"},
             "budgetItems": [{"v1": "평생교육", "v2": "강좌", "v3": "재료", "v4": "재료비", "v5": "310-06", "amount": 420000}],
             "performances": [{"opDate": "2025-05-03", "adultF": 10}, {"opDate": "2025-06-07", "adultF": 9}]}
        ]
    }))
    .unwrap();

    let config = ReportConfig {
        year: Some("2025".to_string()),
        ..Default::default()
    };

    // 1. Budget lines
    println!("1. Budget execution:");
    let budget = load_budget_summary(&snapshot, &config).unwrap();
    for line in &budget.lines {
        println!(
            "   {:<40} allocated={:>9} spent={:>9} balance={:>9}",
            line.label(),
            line.allocated,
            line.spent,
            line.balance()
        );
    }
    let totals = budget.totals();
    println!(
        "   total allocated={} spent={} balance={}\n",
        totals.allocated, totals.spent, totals.balance
    );

    // 2. Drill-down on the first line
    println!("2. Details of the first line, largest first:");
    for detail in budget.lines[0].sorted_details(&SortState::desc("amount")) {
        println!("   {:<12} {:>9}", detail.title, detail.amount);
    }
    println!();

    // 3. Monthly statistics
    println!("3. May 2025 statistics:");
    let records = snapshot.fetch_records(&config.scope()).unwrap();
    let may = monthly_statistics(&records, 2025, 5, &config.stat_groups);
    for group in may.groups.iter().chain(std::iter::once(&may.total)) {
        println!(
            "   {:<8} programs={} adults={} teens={} children={} total={}",
            group.label,
            group.count,
            group.attendance.adult_total(),
            group.attendance.teen_total(),
            group.attendance.child_total(),
            group.attendance.grand_total()
        );
    }
    println!();

    // 4. Dashboard and schedule
    println!("4. Year dashboard:");
    for card in dashboard_summary(&records, &config.stat_groups, &config.aggregation.budget_buckets) {
        println!(
            "   {:<8} programs={} sessions={} budget={} participants={}",
            card.label, card.programs, card.sessions, card.budget, card.participants
        );
    }
    for (date, entries) in schedule_by_date(&records) {
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        println!("   {} {}", date, titles.join(", "));
    }
    println!();

    println!("=== Example Complete ===");
}
