use anyhow::Result;
use colored::*;
use database::{initialize_database, CredentialStore, DatabaseConfig, SYSTEM_RESOURCE_ID};
use serde_json::json;
use std::path::Path;
use user::AuthConfig;

/// Execute the health check command
pub async fn execute(database: &Path, files_root: &Path, format: String) -> Result<()> {
    let health_status = check_system_health(database, files_root).await;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&health_status)?);
        }
        _ => {
            print_health_status_text(&health_status);
        }
    }

    Ok(())
}

/// Check the health of the local deployment
async fn check_system_health(database: &Path, files_root: &Path) -> serde_json::Value {
    let mut status = json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "components": {}
    });

    status["components"]["database"] = check_database_health(database).await;
    status["components"]["secrets"] = check_secrets_health();
    status["components"]["files"] = check_files_health(files_root);

    let all_healthy = status["components"]
        .as_object()
        .map(|components| {
            components
                .values()
                .all(|v| v["status"].as_str().unwrap_or("unknown") == "healthy")
        })
        .unwrap_or(false);

    if !all_healthy {
        status["status"] = json!("degraded");
    }

    status
}

/// Check database health
async fn check_database_health(db_path: &Path) -> serde_json::Value {
    if !db_path.exists() {
        return json!({
            "status": "not_initialized",
            "message": "Database file does not exist yet",
            "path": db_path.display().to_string()
        });
    }

    let config = DatabaseConfig::new_with_path(db_path.to_path_buf()).with_create_tables(false);
    let db = match initialize_database(config).await {
        Ok(db) => db,
        Err(e) => {
            return json!({
                "status": "unhealthy",
                "message": format!("Database exists but cannot be accessed: {}", e),
                "path": db_path.display().to_string()
            })
        }
    };

    match db.find_resource_by_id(SYSTEM_RESOURCE_ID).await {
        Ok(_) => json!({
            "status": "healthy",
            "message": "Database is accessible and the drive root is seeded",
            "path": db_path.display().to_string()
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": format!("Drive root missing: {}", e),
            "path": db_path.display().to_string()
        }),
    }
}

/// Check whether the signing secrets were configured
fn check_secrets_health() -> serde_json::Value {
    match AuthConfig::from_env() {
        Ok(config) if config.uses_default_secrets() => json!({
            "status": "warning",
            "message": "JWT_SECRET or SECRET_KEY is unset; the built-in development secret is in use"
        }),
        Ok(config) => json!({
            "status": "healthy",
            "message": format!("Secrets configured, tokens live {}h", config.token_ttl_hours)
        }),
        Err(e) => json!({
            "status": "unhealthy",
            "message": e.to_string()
        }),
    }
}

fn check_files_health(files_root: &Path) -> serde_json::Value {
    if files_root.is_dir() {
        json!({
            "status": "healthy",
            "message": format!("File root at {}", files_root.display())
        })
    } else {
        json!({
            "status": "not_initialized",
            "message": format!("File root {} will be created on first upload", files_root.display())
        })
    }
}

/// Print health status in a formatted text output
fn print_health_status_text(status: &serde_json::Value) {
    println!("{}", "=== Drive Health Check ===".bold());
    println!();

    let overall_status = status["status"].as_str().unwrap_or("unknown");
    let status_display = match overall_status {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        _ => "UNKNOWN".white().bold(),
    };

    println!("Overall Status: {}", status_display);
    println!("Timestamp: {}", status["timestamp"].as_str().unwrap_or(""));
    println!();

    println!("{}", "Components:".bold());
    println!("{}", "─".repeat(50));

    if let Some(components) = status["components"].as_object() {
        for (name, component) in components {
            let comp_status = component["status"].as_str().unwrap_or("unknown");
            let status_icon = match comp_status {
                "healthy" => "✓".green(),
                "unhealthy" => "✗".red(),
                "warning" => "⚠".yellow(),
                "not_initialized" => "○".white(),
                _ => "?".white(),
            };

            let status_text = match comp_status {
                "healthy" => comp_status.green(),
                "unhealthy" => comp_status.red(),
                "warning" => comp_status.yellow(),
                _ => comp_status.white(),
            };

            println!(
                "{} {} ({})",
                status_icon,
                name.to_uppercase().bold(),
                status_text
            );

            if let Some(message) = component["message"].as_str() {
                println!("  {}", message);
            }

            println!();
        }
    }
}
