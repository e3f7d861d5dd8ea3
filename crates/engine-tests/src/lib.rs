#![allow(dead_code)]

pub mod fixtures;
pub mod polling;
pub mod scripted;

// Local databases for the live tests
const TEST_MYSQL_HOST: &str = "localhost";
const TEST_MYSQL_PORT: u16 = 3306;
const TEST_PG_HOST: &str = "localhost";
const TEST_PG_PORT: u16 = 5432;
const TEST_SCHEMA: &str = "testdb";
const TEST_USER: &str = "user";
const TEST_PASSWORD: &str = "password";
