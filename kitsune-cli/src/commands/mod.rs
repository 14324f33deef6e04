pub mod init_cmd;
pub mod inspect_cmd;
pub mod run_cmd;
