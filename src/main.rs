// ==========================================
// 適格請求書合规校验系统 - 批量校验 CLI
// ==========================================
// 用法: jct-invoice-validator <invoices.json> [user_id]
// 输入: 松散发票 JSON 数组; 输出: 批次清单 JSON (stdout)
// ==========================================

use anyhow::{bail, Context, Result};
use jct_invoice_validator::domain::{RawInvoice, RuleSet};
use jct_invoice_validator::{
    logging, AppConfig, BatchOrchestrator, LopdfRenderer, RuleEngine, SqliteAuditSink,
};
use std::fs;
use tracing::info;

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: {} <invoices.json> [user_id]", args[0]);
    }
    let input_path = &args[1];
    let user_id: i64 = match args.get(2) {
        Some(raw) => raw.parse().context("user_id must be an integer")?,
        None => 0,
    };

    let config = AppConfig::from_env();

    let ruleset = match &config.ruleset_path {
        Some(path) => RuleSet::from_path(path)
            .with_context(|| format!("加载规则文件失败: {}", path.display()))?,
        None => RuleSet::builtin().context("内置规则集损坏")?,
    };
    info!(version = ruleset.version(), "规则集已加载");

    let invoices: Vec<RawInvoice> = serde_json::from_str(
        &fs::read_to_string(input_path)
            .with_context(|| format!("读取输入文件失败: {}", input_path))?,
    )
    .context("输入必须是发票 JSON 数组")?;

    let audit = SqliteAuditSink::open(&config.audit_db_path)
        .with_context(|| format!("打开审计库失败: {}", config.audit_db_path.display()))?;

    let orchestrator =
        BatchOrchestrator::new(RuleEngine::new(ruleset), LopdfRenderer::new(), audit, &config);

    let summary = orchestrator
        .run_batch(user_id, &invoices, &config.default_language)
        .context("批次处理失败")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
