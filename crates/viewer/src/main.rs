use std::env;
use std::process::ExitCode;

mod app;

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let cli = match app::bootstrap::parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n\n{}", app::bootstrap::usage_text());
            return ExitCode::from(2);
        }
    };
    if cli.help {
        println!("{}", app::bootstrap::usage_text());
        return ExitCode::SUCCESS;
    }

    match app::bootstrap::build_app(cli) {
        Ok(wiring) => app::loop_runner::run(wiring),
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
