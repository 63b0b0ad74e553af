use dialysis_metrics_cli::{
    Command, USAGE, log_filter_with, parse_args, read_input, record_schema, render,
    resolve_config, run_aggregate,
};

fn main() -> anyhow::Result<()> {
    // Configure logging from `DIALYSIS_METRICS_LOG_LEVEL` (or fallback to `RUST_LOG`, default `info`).
    let log_env = log_filter_with(|k| std::env::var(k).ok());
    let env_filter = tracing_subscriber::EnvFilter::try_new(&log_env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("dialysis-metrics: log filter: {}", log_env);

    match parse_args(std::env::args().skip(1))? {
        Command::Help => println!("{USAGE}"),
        Command::Schema => println!("{}", record_schema()?),
        Command::Aggregate { input } => {
            let today = chrono::Local::now().date_naive();
            let config = resolve_config(|k| std::env::var(k).ok(), today)?;
            tracing::debug!(
                reference_date = %config.reference_date,
                range = %config.range,
                max_chart_points = config.max_chart_points,
                "dialysis-metrics: resolved configuration"
            );
            let raw = read_input(input.as_deref())?;
            let result = run_aggregate(&raw, &config)?;
            println!("{}", render(&result)?);
        }
    }

    Ok(())
}
