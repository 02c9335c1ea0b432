/// Status Report Example
///
/// This example demonstrates:
/// - Loading a backup snapshot as a record source
/// - Building the program status screen for one year
/// - Sorting by a column and printing the totals row

use program_report::{load_status_report, ReportConfig, ReportRow, SortState, Snapshot};
use serde_json::json;

fn main() {
    println!("=== Program Report Status Example ===\n");

    // 1. Load a snapshot
    println!("1. Loading snapshot...");
    let snapshot = Snapshot::from_value(json!({
        "users": [
            {"id": "u1", "name": "김사서"},
            {"id": "u2", "name": "이사서"}
        ],
        "categories": [
            {"key": "2025_구분", "items": ["평생교육강좌", "독서문화행사", "전시"]}
        ],
        "entries": [
            {"id": "p1", "userId": "u1", "updatedAt": "2025-03-02T03:15:00Z",
             "overview": {"year": "2025", "category": "독서문화행사", "title": "작가와의 만남", "startDate": "2025-03-08", "place": "시청각실"},
             "budgetItems": [{"v5": "210-01", "amount": 300000}],
             "performances": [{"opDate": "2025-03-08", "adultM": 12, "adultF": 25, "teenF": 4}]},
            {"id": "p2", "userId": "u2",
             "overview": {"year": "2025", "category": "평생교육강좌", "title": "수채화 교실", "startDate": "2025-03-04", "place": "문화교실"},
             "budgetItems": [{"v5": "210-06", "amount": 80000}, {"v5": "310-06", "amount": 45000}],
             "performances": [{"opDate": "2025-03-04", "adultF": 9}, {"opDate": "2025-03-11", "adultF": 8, "adultM": 2}]},
            {"id": "p3",
             "overview": {"year": "2025", "category": "평생교육강좌", "title": "그림책 읽기", "startDate": "2025-04-02", "place": "어린이실"},
             "performances": [{"opDate": "2025-04-02", "childM": 7, "childF": 9}]},
            {"id": "p4",
             "overview": {"year": "2024", "category": "전시", "title": "지난해 전시", "startDate": "2024-10-01"}}
        ]
    }))
    .unwrap();
    println!("   {} records in snapshot\n", snapshot.records().len());

    // 2. Build the status screen for 2025
    println!("2. Building the 2025 status view...");
    let config = ReportConfig {
        year: Some("2025".to_string()),
        ..Default::default()
    };
    let mut session = load_status_report(&snapshot, &config).unwrap();
    print_view(&session.view());

    // 3. Sort by attendance, largest first
    println!("3. Sorting by grand total (descending)...");
    session.set_sort(SortState::desc("grandTotal")).unwrap();
    print_view(&session.view());

    // 4. Totals row as JSON
    println!("4. Totals row:");
    let view = session.view();
    println!("{}\n", serde_json::to_string_pretty(&view.totals.to_json(session.layout())).unwrap());

    println!("=== Example Complete ===");
}

fn print_view(view: &program_report::ViewModel<program_report::DerivedRow>) {
    for row in &view.rows {
        println!(
            "   {:>2}. {:<8} {:<12} attendance={:<4} budget 210-01={}",
            row.display_index().unwrap_or(0),
            row.cell("category").to_filter_string(),
            row.cell("title").to_filter_string(),
            row.cell("grandTotal").to_amount(),
            row.cell("amt21001").to_amount(),
        );
    }
    println!(
        "   {} items, attendance total {}\n",
        view.totals.row_count,
        view.totals.get("grandTotal").unwrap_or(0)
    );
}
