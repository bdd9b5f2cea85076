// ==========================================
// 工程 ERP 批量导入 - 命令行入口
// ==========================================
// 命令: preview / import / history / decode-note / config
// 约定: 结果写 stdout,日志写 stderr；失败时退出码非 0
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use erp_bulk_import::api::{ConfigApi, ImportApi, MappingOverride, ReferenceLists};
use erp_bulk_import::app::{ensure_parent_dir, get_default_db_path};
use erp_bulk_import::{logging, AuthSession, EntityKind, ImportSession};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "erp-bulk-import")]
#[command(about = "Bulk import budgets, expenses, invoices and payments from spreadsheets")]
#[command(version)]
struct Cli {
    /// Local database (config + import history)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and show the column mapping and row errors
    Preview {
        file: PathBuf,

        /// budgets | expenses | general-expenses | invoices | payments
        #[arg(long, short = 'e')]
        entity: EntityKind,

        /// Override a mapping: key=Header (key= to unmap)
        #[arg(long = "map", value_parser = parse_mapping)]
        mappings: Vec<MappingOverride>,

        /// JSON file with {"projects": [...], "clients": [...]}
        #[arg(long)]
        references: Option<PathBuf>,

        /// Print the preview rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse, validate and submit the valid rows in one bulk-create call
    Import {
        file: PathBuf,

        #[arg(long, short = 'e')]
        entity: EntityKind,

        #[arg(long = "map", value_parser = parse_mapping)]
        mappings: Vec<MappingOverride>,

        #[arg(long)]
        references: Option<PathBuf>,

        /// Access token sent as Authorization: Bearer
        #[arg(long, env = "ERP_API_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Tenant id header (overrides the tenant_id config)
        #[arg(long, env = "ERP_TENANT_ID")]
        tenant: Option<String>,
    },

    /// List recent import batches
    History {
        #[arg(long, short = 'e')]
        entity: Option<EntityKind>,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Delete batches older than history_retention_days first
        #[arg(long)]
        purge: bool,
    },

    /// Decode the structured note / itemsJson field of an existing record
    DecodeNote {
        #[arg(long, short = 'e')]
        entity: EntityKind,

        note: String,
    },

    /// Read or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all keys with their effective values
    List,
    Get { key: String },
    Set { key: String, value: String },
    /// Remove the override and fall back to the default
    Reset { key: String },
}

fn parse_mapping(raw: &str) -> Result<MappingOverride, String> {
    let (key, header) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=Header, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field key in '{}'", raw));
    }
    let header = header.trim();
    Ok((
        key.to_string(),
        (!header.is_empty()).then(|| header.to_string()),
    ))
}

fn load_references(path: Option<&PathBuf>) -> anyhow::Result<ReferenceLists> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("读取关联列表失败: {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("关联列表格式错误: {}", path.display()))
        }
        None => Ok(ReferenceLists::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_preview(session: &ImportSession) {
    println!(
        "{} <- {}",
        session.entity(),
        session.file_name().unwrap_or("-")
    );
    println!("\nColumn mapping:");
    for field in session.strategy().schema() {
        let marker = if field.required { "*" } else { " " };
        let header = session.mapping().get(&field.key).unwrap_or("(unmapped)");
        println!("  {}{:<16} <- {}", marker, field.key, header);
    }

    let invalid: Vec<_> = session.preview().iter().filter(|r| !r.is_valid()).collect();
    if !invalid.is_empty() {
        println!("\nRows with errors:");
        for row in invalid {
            println!("  row {}: {}", row.row, row.error.as_deref().unwrap_or_default());
        }
    }

    println!(
        "\n{} rows, {} valid, {} invalid",
        session.total_rows(),
        session.valid_count(),
        session.invalid_count()
    );
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    ensure_parent_dir(&db_path)
        .with_context(|| format!("无法创建数据目录: {}", db_path.display()))?;
    tracing::debug!(db_path = %db_path.display(), "使用数据库");

    match cli.command {
        Commands::Preview {
            file,
            entity,
            mappings,
            references,
            json,
        } => {
            let api = ImportApi::new(&db_path, AuthSession::anonymous())?
                .with_references(load_references(references.as_ref())?);
            let session = api.open_session(entity, &file, &mappings).await?;
            if json {
                print_json(&session.preview())?;
            } else {
                print_preview(&session);
            }
        }

        Commands::Import {
            file,
            entity,
            mappings,
            references,
            token,
            tenant,
        } => {
            let mut auth = token.map(AuthSession::new).unwrap_or_default();
            if let Some(tenant) = tenant {
                auth = auth.with_tenant(tenant);
            }
            if !auth.is_authenticated() {
                eprintln!("warning: no access token (--token / ERP_API_TOKEN)");
            }

            let api = ImportApi::new(&db_path, auth)?
                .with_references(load_references(references.as_ref())?);
            let mut session = api.open_session(entity, &file, &mappings).await?;
            print_preview(&session);

            let response = api.confirm(&mut session).await?;
            println!(
                "\nImported {} {} ({} skipped) in {} ms, batch {}",
                response.imported,
                response.entity,
                response.skipped,
                response.elapsed_ms,
                response.batch_id
            );
        }

        Commands::History {
            entity,
            limit,
            purge,
        } => {
            let api = ImportApi::new(&db_path, AuthSession::anonymous())?;
            if purge {
                let deleted = api.purge_history().await?;
                println!("purged {} batches", deleted);
            }
            for batch in api.list_history(entity, limit).await? {
                println!(
                    "{}  {:<16} {:<9} {:>5}/{:<5} {}  {}",
                    batch.imported_at.format("%Y-%m-%d %H:%M:%S"),
                    batch.entity,
                    batch.status,
                    batch.imported_rows,
                    batch.total_rows,
                    batch.file_name.as_deref().unwrap_or("-"),
                    batch.error_message.as_deref().unwrap_or_default()
                );
            }
        }

        Commands::DecodeNote { entity, note } => {
            let api = ImportApi::new(&db_path, AuthSession::anonymous())?;
            print_json(&api.decode_note(entity, &note)?)?;
        }

        Commands::Config { action } => {
            let api = ImportApi::new(&db_path, AuthSession::anonymous())?;
            let config_api = ConfigApi::new(api.config());
            match action {
                ConfigAction::List => {
                    for item in config_api.list_configs()? {
                        let marker = if item.overridden { "*" } else { " " };
                        println!("{}{} = {}", marker, item.key, item.value);
                    }
                }
                ConfigAction::Get { key } => println!("{}", config_api.get_config(&key)?.value),
                ConfigAction::Set { key, value } => {
                    let item = config_api.update_config(&key, &value)?;
                    println!("{} = {}", item.key, item.value);
                }
                ConfigAction::Reset { key } => {
                    let item = config_api.reset_config(&key)?;
                    println!("{} = {}", item.key, item.value);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        assert_eq!(
            parse_mapping("payment_date=Payment Date"),
            Ok(("payment_date".to_string(), Some("Payment Date".to_string())))
        );
        assert_eq!(parse_mapping("amount="), Ok(("amount".to_string(), None)));
        assert!(parse_mapping("amount").is_err());
        assert!(parse_mapping("=Amount").is_err());
    }

    #[test]
    fn test_cli_parses_import() {
        let cli = Cli::try_parse_from([
            "erp-bulk-import",
            "import",
            "budgets.xlsx",
            "--entity",
            "budgets",
            "--map",
            "projectId=Job",
            "--token",
            "abc",
        ])
        .unwrap();
        match cli.command {
            Commands::Import {
                entity,
                mappings,
                token,
                ..
            } => {
                assert_eq!(entity, EntityKind::Budgets);
                assert_eq!(mappings.len(), 1);
                assert_eq!(token.as_deref(), Some("abc"));
            }
            _ => panic!("expected import command"),
        }
    }
}
