fn main() {
    retrofit::cli::run();
}
