pub mod printer;
pub mod run;
