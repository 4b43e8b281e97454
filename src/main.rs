fn main() {
    seqnash_cli::cli::run();
}
