use std::{env::args, time::Duration};

use anyhow::Result;
use clap::Parser;
use daylog::{
    monitor::{args::MonitorArgs, start_monitor, MonitorOptions},
    utils::{
        dir::{create_application_default_path, default_log_path},
        logging::enable_logging,
        runtime::single_thread_runtime,
    },
};

fn main() {
    run_service(args().collect::<Vec<_>>()).unwrap();
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = MonitorArgs::parse_from(&command_args);

    if args.daemon && !args.force {
        #[cfg(feature = "win")]
        {
            let mut command_args = command_args;
            println!("Starting detached process");
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::DETACHED_PROCESS;

            command_args.push("--force".into());
            let process_name = std::env::current_exe()?;
            let mut command = std::process::Command::new(process_name);
            command.args(command_args.into_iter().skip(1));
            command.creation_flags(DETACHED_PROCESS.0);
            command.stdin(std::process::Stdio::null());
            command.stdout(std::process::Stdio::null());
            command.stderr(std::process::Stdio::null());
            #[allow(clippy::zombie_processes)]
            command.spawn()?;
            println!("Created monitor daemon");
            return Ok(());
        }
        #[cfg(unix)]
        {
            use daemonize::Daemonize;
            use tracing::error;

            let daemonize = Daemonize::new()
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent
                        .inspect_err(|e| error!("Failed to create daemon on parent side {e:?}"))?;
                    println!("Created monitor daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(_) => (),
            }
        }
    }

    run(args)
}

fn run(args: MonitorArgs) -> Result<()> {
    let app_dir = create_application_default_path()?;
    enable_logging(&app_dir, args.log, args.log_console).unwrap();

    let options = MonitorOptions {
        log_path: args.log_path.map_or_else(default_log_path, Ok)?,
        poll_interval: Duration::from_secs(args.interval),
    };
    single_thread_runtime()?.block_on(async move { start_monitor(options).await })?;
    Ok(())
}
