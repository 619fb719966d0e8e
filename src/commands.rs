pub mod bake;
pub mod check;
pub mod init;
