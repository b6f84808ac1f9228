fn main() {
    jarhttp::cli::run();
}
