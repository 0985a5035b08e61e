fn main() {
    // Diagnostics are printed inside; only the exit code comes back.
    std::process::exit(oasgen::cli::run());
}
