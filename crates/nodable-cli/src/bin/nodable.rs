use clap::Parser;
use nodable_cli::args::CliArgs;

fn main() {
    let args = CliArgs::parse();
    nodable_cli::init_tracing(args.verbose);

    match nodable_cli::run(args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
