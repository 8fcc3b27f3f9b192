use flatfiled::cli::Opts;
use flatfiled::dispatcher::Server;
use flatfiled::listener::Listener;
use flatfiled::logger::init_logger;
use std::process::ExitCode;

fn main() -> ExitCode {
    let opts = match Opts::from_args() {
        Ok(opts) => opts,
        Err(e) => return e.report(),
    };

    let (logger, _logger_handle) = init_logger(None);

    let pkg_version = env!("CARGO_PKG_VERSION");
    let commit = option_env!("GIT_COMMIT").unwrap_or("unknown");
    let state = option_env!("GIT_STATE").unwrap_or("unknown");
    let built = option_env!("BUILD_TIME").unwrap_or("unknown time");
    logger.info(format!(
        "flatfiled {} (commit: {}, state: {}, built: {})",
        pkg_version, commit, state, built
    ));

    let listener = match Listener::bind(opts.port, &logger) {
        Ok(l) => l,
        Err(e) => {
            logger.error(format!("failed to bind port {}: {}", opts.port, e));
            return ExitCode::FAILURE;
        }
    };

    let root = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            logger.error(format!("failed to read working directory: {}", e));
            return ExitCode::FAILURE;
        }
    };

    logger.info(format!(
        "flatfiled listening on port {} with {} workers, serving {}",
        opts.port,
        opts.num_workers,
        root.display()
    ));

    let server = Server::new(opts.num_workers, root, logger.clone());
    if let Err(e) = server.run(listener) {
        logger.error(format!("accept loop exited: {}", e));
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
