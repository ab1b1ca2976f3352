fn main() {
    // Host-target test builds (`--no-default-features`) have no ESP-IDF
    // environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
