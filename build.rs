fn main() {
    // Exposes package and rustc versions to `crate::build_info`
    built::write_built_file().expect("Failed to generate build info");
}
