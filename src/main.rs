fn main() {
    std::process::exit(warehouse_dash::run());
}
