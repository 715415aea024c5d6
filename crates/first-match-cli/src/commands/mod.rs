pub mod correlate;
pub mod explain;
pub mod generate;
pub mod ptx;
pub mod run;
pub mod validate;
pub mod verify;
