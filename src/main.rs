fn main() {
    hardness_map::cli::run();
}
