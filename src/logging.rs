use flexi_logger::{
    opt_format, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle,
    Naming,
};
use std::path::Path;

/// Start the global logger.
///
/// The level comes from `RUST_LOG` when set, else `default_spec`. With a `log_dir` the output
/// goes to rotating files in that directory (warnings are duplicated to stderr); without one it
/// goes to stderr. Keep the returned handle alive for as long as logging is needed.
pub fn setup_logging(
    default_spec: &str,
    log_dir: Option<&Path>,
) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(default_spec)?.format(opt_format);

    match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("muzero"))
            .duplicate_to_stderr(Duplicate::Warn)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start(),
        None => logger.start(),
    }
}
