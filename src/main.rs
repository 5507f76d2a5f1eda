use anyhow::Context;
use clap::Parser;
use dump_keeper::adapters::lock::LOCK_FILE_NAME;
use dump_keeper::utils::{logger, validation::Validate};
use dump_keeper::{
    CliConfig, DumpError, DumpOrchestrator, ProcessDumpRunner, RunLoop, SingletonGuard,
    SystemClock,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger();

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    // 單一實例鎖, main 結束時釋放
    let _guard = match SingletonGuard::acquire(LOCK_FILE_NAME) {
        Ok(guard) => guard,
        Err(DumpError::LockHeld { .. }) => {
            println!("another instance is already running");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to open the run lock file"),
    };

    let configs_dir = config.configs_dir()?.clone();
    tracing::info!("🚀 Starting dump-keeper with configs from {}", configs_dir.display());

    let run_loop = RunLoop::new(&configs_dir);
    let orchestrator = DumpOrchestrator::new(ProcessDumpRunner::new(), SystemClock);

    let report = run_loop
        .run(&orchestrator)
        .await
        .with_context(|| format!("cannot read configs directory {}", configs_dir.display()))?;

    tracing::info!(
        "🏁 Done: {} dumped, {} skipped, {} failed",
        report.completed(),
        report.skipped(),
        report.failed()
    );

    Ok(())
}
