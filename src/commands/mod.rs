pub mod build;
pub mod check;
pub mod clean;
pub mod fix;
pub mod init;
pub mod patch;
