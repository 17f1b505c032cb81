pub mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
pub mod constants;
pub mod error;
pub mod spam;
pub mod util {
    pub mod file_utils;
    pub mod history_report;
    pub mod model_logger;
    #[cfg(test)]
    pub mod test_utils;
}
