use clap::Parser;
use denox_codegen::cli::Args;
use denox_codegen::pipeline;

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if let Err(err) = pipeline::run(&args) {
        eprintln!("denox-codegen: {err}");
        std::process::exit(1);
    }
}
