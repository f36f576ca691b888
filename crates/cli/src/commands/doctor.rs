//! `tallybot doctor` — Diagnose configuration health.

use tallybot_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 TallyBot Doctor — Diagnostics");
    println!("================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `tallybot onboard` (env vars still apply)");
        issues += 1;
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config loads and validates");

            if config.has_bot_token() {
                println!("  ✅ Bot token configured");
            } else {
                println!("  ❌ No bot token — set BOT_TOKEN or add bot_token to config.toml");
                issues += 1;
            }

            println!(
                "  ✅ SMTP relay: {}:{} (from {})",
                config.smtp.host, config.smtp.port, config.smtp.sender
            );

            // History path must be creatable before the first invoice lands.
            let history_path = config.history_path();
            let writable = history_path
                .parent()
                .map(|p| p.exists() || std::fs::create_dir_all(p).is_ok())
                .unwrap_or(false);
            if writable {
                println!("  ✅ History path writable: {}", history_path.display());
            } else {
                println!("  ❌ History path not writable: {}", history_path.display());
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
