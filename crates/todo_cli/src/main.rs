//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `todo_core` wiring without the Flutter bridge.
//! - Load config from `TODO_APP_*`, seed if needed and print the list.

use std::process::ExitCode;
use std::sync::Arc;
use todo_core::{
    apply_query, core_version, ping, AppConfig, SimulatedTodoApi, StatusFilter, TodoCache,
    TodoQuery, TodoStats,
};

#[tokio::main]
async fn main() -> ExitCode {
    println!("todo_core ping={}", ping());
    println!("todo_core version={}", core_version());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let cache = TodoCache::new(Arc::new(SimulatedTodoApi::from_config(&config)));
    if let Err(err) = cache.refresh().await {
        eprintln!("load failed: {err}");
        return ExitCode::FAILURE;
    }

    let status = std::env::args()
        .nth(1)
        .map_or(StatusFilter::All, |raw| StatusFilter::parse(&raw));
    let snapshot = cache.snapshot();
    let now = chrono::Utc::now();
    for todo in apply_query(&snapshot.todos, &TodoQuery::default().status(status)) {
        let mark = if todo.completed { "x" } else { " " };
        let due = todo
            .due_date
            .map(|due| format!(" due={}", due.format("%Y-%m-%d")))
            .unwrap_or_default();
        let overdue = if todo.is_overdue(now) { " (overdue)" } else { "" };
        println!("[{mark}] {} {}{due}{overdue}", todo.id, todo.title);
    }

    let stats = TodoStats::from_todos(&snapshot.todos, now);
    println!(
        "total={} active={} completed={} overdue={}",
        stats.total, stats.active, stats.completed, stats.overdue
    );
    ExitCode::SUCCESS
}
