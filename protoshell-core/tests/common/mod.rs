#![allow(dead_code)]

pub mod greeter_service_impl;
pub mod in_process;
