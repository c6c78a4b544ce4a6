pub mod discrete;
