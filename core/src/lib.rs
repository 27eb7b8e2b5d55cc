pub mod catalog;
pub mod db;
pub mod kv;
pub mod models;
pub mod planner;
pub mod service;
pub mod shopping;
pub mod store;
pub mod themealdb;
