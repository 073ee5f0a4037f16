pub mod config_cmd;
pub mod doctor;
pub mod evaluate;
pub mod replay;
pub mod run;
pub mod train;
