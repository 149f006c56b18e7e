// ==========================================
// 车辆排产看板 - 命令行入口
// ==========================================
// 用法:
//   schedule-dashboard import <file.csv|file.xlsx>
//   schedule-dashboard table   [筛选参数]
//   schedule-dashboard summary [筛选参数]
//   schedule-dashboard pivot   [year|month|week|day] [筛选参数]
//   schedule-dashboard export  <out.csv> [筛选参数]
//   schedule-dashboard reminders
//
// 筛选参数: --dealer X --model X --year YYYY --year-month YYYY-MM
//           --model-range ABC --stage LABEL --search TERM --sort COLUMN
//           --sea-freight --show-finished
// 数据库: SCHEDULE_DASHBOARD_DB_PATH，缺省为用户数据目录
// ==========================================

use schedule_dashboard::app::{get_default_db_path, AppState};
use schedule_dashboard::domain::{FilterSpec, StageSelection};
use schedule_dashboard::engine::PivotSelection;
use schedule_dashboard::DashboardSession;
use serde::Serialize;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult<()> {
    schedule_dashboard::logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "summary".to_string());
    let rest: Vec<String> = args.collect();

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;
    let api = &state.dashboard_api;
    let today = chrono::Local::now().date_naive();

    match command.as_str() {
        "import" => {
            let path = rest.first().ok_or("缺少导入文件路径")?;
            let summary = api.import_file(path)?;
            print_json(&summary)?;
        }
        "table" => {
            let (session, _) = parse_session(&state, &rest)?;
            let snapshot = api.load_snapshot()?;
            let ticket = state.recompute_gate.begin();
            let view = state
                .busy_yield
                .run(snapshot.records.len(), || api.table_view(&snapshot, session.query(), today))
                .await;
            if let Some(view) = state.recompute_gate.publish(ticket, view) {
                print_json(&view)?;
            }
        }
        "summary" => {
            let (session, _) = parse_session(&state, &rest)?;
            let snapshot = api.load_snapshot()?;
            print_json(&api.summary(&snapshot, session.query(), today))?;
        }
        "pivot" => {
            let (session, positional) = parse_session(&state, &rest)?;
            let granularity = positional.first().map(String::as_str).unwrap_or("month");
            let snapshot = api.load_snapshot()?;
            print_json(&api.pivot(&snapshot, session.query(), granularity, PivotSelection::all())?)?;
        }
        "export" => {
            let (session, positional) = parse_session(&state, &rest)?;
            let out = positional.first().ok_or("缺少导出文件路径")?;
            let snapshot = api.load_snapshot()?;
            let view = api.table_view(&snapshot, session.query(), today);
            let rows = api.export_csv_to_path(&view, out)?;
            println!("exported={}", rows);
        }
        "reminders" => {
            let snapshot = api.load_snapshot()?;
            print_json(&api.due_reminders(&snapshot)?)?;
        }
        other => return Err(format!("未知命令: {}", other).into()),
    }

    Ok(())
}

/// 解析筛选参数，返回会话与剩余位置参数
fn parse_session(state: &AppState, args: &[String]) -> CliResult<(DashboardSession, Vec<String>)> {
    let mut session = state.dashboard_api.new_session();
    let mut builder = FilterSpec::builder();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || iter.next().map(String::as_str).ok_or_else(|| format!("{} 缺少参数值", arg));
        match arg.as_str() {
            "--dealer" => builder = builder.dealer(value()?),
            "--model" => builder = builder.model(value()?),
            "--year" => builder = builder.forecast_year(value()?)?,
            "--year-month" => builder = builder.forecast_year_month(value()?)?,
            "--model-range" => builder = builder.model_range(value()?),
            "--stage" => builder = builder.stages(StageSelection::only([value()?])),
            "--search" => session.set_search(value()?),
            "--sort" => session.toggle_sort(value()?),
            "--sea-freight" => builder = builder.sea_freighting_only(true),
            "--show-finished" => session.set_hide_finished(false),
            _ => positional.push(arg.clone()),
        }
    }

    session.set_filter(builder.build());
    Ok((session, positional))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
