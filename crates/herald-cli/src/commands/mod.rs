pub mod deliver;
pub mod fetch;
pub mod pending;
pub mod run;
pub mod source;
