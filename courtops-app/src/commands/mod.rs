pub mod audit;
pub mod run;
pub mod seed;
pub mod status;
pub mod tools;
