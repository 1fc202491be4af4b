/// simplelog initialisation from the configured level and log file
pub mod logger;
/// tables of residuals, sources and Jacobians
pub mod pretty_print;
