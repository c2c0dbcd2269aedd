use log::debug;

/// Initialize env_logger with a timestamped format. Safe to call more than
/// once; later calls are no-ops (tests in one binary all go through here).
pub fn init_log() {
    use chrono::Utc;
    use std::io::Write;

    let env = env_logger::Env::default().default_filter_or("info");
    let result = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                level_style.value(record.level()),
                record.file().unwrap_or("<unnamed>"),
                record.line().unwrap_or(0),
                &record.args()
            )
        })
        .try_init();

    if result.is_ok() {
        debug!("env_logger initialized");
    }
}
