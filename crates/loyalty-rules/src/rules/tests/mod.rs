mod common;
mod compiler;
mod conditions;
mod service;
