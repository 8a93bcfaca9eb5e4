fn main() {
    use clap::Parser;
    let args = novel_scrapers::cli::Args::parse();
    if let Err(e) = novel_scrapers::cli::run(&args) {
        novel_scrapers::cli::report_error(&e, args.verbose, &mut std::io::stderr());
    }
}
