#![allow(dead_code)]

pub mod buses;
pub mod order;
pub mod stores;
