// ==========================================
// 赛马数据门户 - 运维命令行入口
// ==========================================
// 用法:
//   hkjc-race-portal health
//   hkjc-race-portal race    <日期> <场地> <场次>
//   hkjc-race-portal entries <日期> <场地> <场次>
//   hkjc-race-portal stats   <日期> <场地> <场次> <统计族>
//   hkjc-race-portal horses  [关键字]
//   hkjc-race-portal horse   <horse_id>
//   hkjc-race-portal bulk-edit <角色> <操作人> <JSON文件>
//   hkjc-race-portal audit   [条数]
// 数据库路径: HKJC_PORTAL_DB_PATH，缺省为用户数据目录
// ==========================================

use anyhow::{bail, Context, Result};
use serde::Serialize;

use hkjc_race_portal::app::{get_default_db_path, AppState};
use hkjc_race_portal::logging;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn arg<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    args.get(idx)
        .map(String::as_str)
        .with_context(|| format!("缺少参数: {}", name))
}

fn race_no_arg(args: &[String], idx: usize) -> Result<i64> {
    let raw = arg(args, idx, "场次")?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("场次必须是整数: {}", raw))
}

fn usage() -> &'static str {
    "用法: hkjc-race-portal <health|race|entries|stats|horses|horse|bulk-edit|audit> [参数...]"
}

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(c) => c.as_str(),
        None => bail!(usage()),
    };

    let db_path = get_default_db_path();
    tracing::info!(
        version = hkjc_race_portal::VERSION,
        db_path = %db_path,
        "{} 启动",
        hkjc_race_portal::APP_NAME
    );
    let state = AppState::new(db_path).context("无法初始化AppState")?;

    match command {
        "health" => print_json(&state.health())?,
        "race" => {
            let ctx = state.race_stats_api.resolve_race(
                arg(&args, 1, "日期")?,
                arg(&args, 2, "场地")?,
                race_no_arg(&args, 3)?,
            )?;
            print_json(&ctx)?;
        }
        "entries" => {
            let entries = state.race_stats_api.list_entries(
                arg(&args, 1, "日期")?,
                arg(&args, 2, "场地")?,
                race_no_arg(&args, 3)?,
            )?;
            print_json(&entries)?;
        }
        "stats" => {
            let table = state.race_stats_api.get_stats(
                arg(&args, 1, "日期")?,
                arg(&args, 2, "场地")?,
                race_no_arg(&args, 3)?,
                arg(&args, 4, "统计族")?,
            )?;
            print_json(&table)?;
        }
        "horses" => {
            let keyword = args.get(1).map(String::as_str);
            let horses = state.horse_api.list_horses(keyword, None, None, None)?;
            print_json(&horses)?;
        }
        "horse" => {
            let horse = state.horse_api.get_horse(arg(&args, 1, "horse_id")?)?;
            print_json(&horse)?;
        }
        "bulk-edit" => {
            let role = arg(&args, 1, "角色")?;
            let actor = arg(&args, 2, "操作人")?;
            let path = arg(&args, 3, "JSON文件")?;
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("无法读取文件: {}", path))?;
            let payload: serde_json::Value =
                serde_json::from_str(&raw).with_context(|| format!("JSON 解析失败: {}", path))?;
            let outcome = state.horse_api.bulk_edit_json(role, actor, &payload)?;
            print_json(&outcome)?;
        }
        "audit" => {
            let limit = args
                .get(1)
                .map(|raw| {
                    raw.trim()
                        .parse::<i64>()
                        .with_context(|| format!("条数必须是整数: {}", raw))
                })
                .transpose()?;
            let logs = state.horse_api.recent_bulk_edits(limit)?;
            print_json(&logs)?;
        }
        other => {
            state.shutdown();
            bail!("未知命令: {}\n{}", other, usage());
        }
    }

    state.shutdown();
    Ok(())
}
